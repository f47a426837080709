//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHasher as _, PasswordVerifier as _,
        SaltString,
    },
    Argon2,
};
#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Platform user.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Username`] of this [`User`].
    pub username: Username,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`Role`] of this [`User`].
    pub role: Role,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Unique name of a [`User`].
///
/// Comparison is case-sensitive.
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `username` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    /// Creates a new [`Username`] if the given `username` is valid.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Option<Self> {
        let username = username.into();
        Self::check(&username).then_some(Self(username))
    }

    /// Checks whether the given `username` is a valid [`Username`].
    fn check(username: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Username`] invariants:
        /// - Must not be empty;
        /// - Must not start/end with whitespace;
        /// - Must not contain control characters;
        /// - Must be at most 64 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s\p{Cc}](?:[^\p{Cc}]{0,62}[^\s\p{Cc}])?$")
                .expect("valid regex")
        });

        REGEX.is_match(username.as_ref())
    }
}

impl FromStr for Username {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Username`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `password` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        password.len() > 1 && password.len() <= 128
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Salted [argon2] hash of a [`User`]'s [`Password`] in the [PHC string]
/// format.
///
/// [argon2]: https://en.wikipedia.org/wiki/Argon2
/// [PHC string]: https://github.com/P-H-C/phc-string-format
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the given [`Password`] with a freshly generated salt.
    ///
    /// # Errors
    ///
    /// If the [`Argon2`] hasher fails.
    pub fn new(password: &Password) -> Result<Self, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .map(|h| Self(h.to_string()))
    }

    /// Verifies whether this [`PasswordHash`] was produced from the given
    /// [`Password`].
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        password_hash::PasswordHash::new(&self.0)
            .and_then(|h| {
                Argon2::default().verify_password(password.0.as_bytes(), &h)
            })
            .is_ok()
    }
}

define_kind! {
    #[doc = "Role of a [`User`]."]
    enum Role {
        #[doc = "Platform administrator."]
        Admin = 1,

        #[doc = "Owner of rented out properties."]
        Owner = 2,

        #[doc = "Tenant looking for a property."]
        Tenant = 3,
    }
}

/// Set of [`Role`]s allowed to perform some operation.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Roles(u8);

impl Roles {
    /// Only [`Role::Admin`].
    pub const ADMIN: Self = Self::of(Role::Admin);

    /// [`Role::Admin`] or [`Role::Owner`].
    pub const ADMIN_OR_OWNER: Self = Self::ADMIN.with(Role::Owner);

    /// Any [`Role`].
    pub const ANY: Self = Self::ADMIN_OR_OWNER.with(Role::Tenant);

    /// Creates [`Roles`] containing only the provided [`Role`].
    #[must_use]
    pub const fn of(role: Role) -> Self {
        Self(1 << role.u8())
    }

    /// Returns these [`Roles`] with the provided [`Role`] added.
    #[must_use]
    pub const fn with(self, role: Role) -> Self {
        Self(self.0 | Self::of(role).0)
    }

    /// Checks whether the provided [`Role`] is one of these [`Roles`].
    #[must_use]
    pub const fn contains(self, role: Role) -> bool {
        self.0 & Self::of(role).0 != 0
    }
}

impl From<Role> for Roles {
    fn from(role: Role) -> Self {
        Self::of(role)
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was deleted.
pub type DeletionDateTime = DateTimeOf<(User, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use super::{Password, PasswordHash, Role, Roles, Username};

    #[test]
    fn username_format() {
        for valid in ["alice", "Bob Smith", "j.doe-42", "Ünïcode"] {
            assert!(Username::new(valid).is_some(), "`{valid}` is rejected");
        }
        for invalid in ["", " alice", "alice ", "a\u{0}b"] {
            assert!(Username::new(invalid).is_none(), "`{invalid}` is accepted");
        }
        assert!(Username::new("x".repeat(64)).is_some());
        assert!(Username::new("x".repeat(65)).is_none());
    }

    #[test]
    fn password_length() {
        assert!(Password::new("x").is_none());
        assert!(Password::new("pw").is_some());
        assert!(Password::new("x".repeat(128)).is_some());
        assert!(Password::new("x".repeat(129)).is_none());
    }

    #[test]
    fn hash_is_salted() {
        let password = Password::new("pw123").unwrap();

        let first = PasswordHash::new(&password).unwrap();
        let second = PasswordHash::new(&password).unwrap();

        assert_ne!(first, second);
        assert!(first.verify(&password));
        assert!(second.verify(&password));
        assert!(!first.verify(&Password::new("pw124").unwrap()));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hash = PasswordHash("plain".into());

        assert!(!hash.verify(&Password::new("plain").unwrap()));
    }

    #[test]
    fn role_sets() {
        assert!(Roles::ADMIN.contains(Role::Admin));
        assert!(!Roles::ADMIN.contains(Role::Owner));
        assert!(!Roles::ADMIN.contains(Role::Tenant));

        assert!(Roles::ADMIN_OR_OWNER.contains(Role::Owner));
        assert!(!Roles::ADMIN_OR_OWNER.contains(Role::Tenant));

        for role in Role::ALL {
            assert!(Roles::ANY.contains(*role));
        }
    }

    #[test]
    fn role_names() {
        assert_eq!(Role::Tenant.to_string(), "tenant");
        assert_eq!("owner".parse::<Role>().unwrap(), Role::Owner);
        assert!("landlord".parse::<Role>().is_err());
    }
}

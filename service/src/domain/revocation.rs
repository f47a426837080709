//! Revoked [`Session`]s definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;
use xxhash_rust::xxh3;

#[cfg(doc)]
use crate::domain::Session;
use crate::domain::user::session;

/// Record of a [`session::Token`] being revoked before its natural expiration.
#[derive(Clone, Debug)]
pub struct Entry {
    /// [`Fingerprint`] of the revoked [`session::Token`].
    pub fingerprint: Fingerprint,

    /// Revoked [`session::Token`] itself.
    pub token: session::Token,

    /// [`DateTime`] when the revoked [`Session`] expires anyway.
    pub expires_at: session::ExpirationDateTime,

    /// [`DateTime`] when the [`session::Token`] was revoked.
    pub revoked_at: RevocationDateTime,
}

impl Entry {
    /// Creates a new [`Entry`] revoking the provided [`session::Token`].
    #[must_use]
    pub fn new(
        token: session::Token,
        expires_at: session::ExpirationDateTime,
        revoked_at: RevocationDateTime,
    ) -> Self {
        Self {
            fingerprint: Fingerprint::new(&token),
            token,
            expires_at,
            revoked_at,
        }
    }
}

/// Fixed-size [xxh3] digest of a [`session::Token`] used to key [`Entry`]s.
///
/// [xxh3]: https://github.com/Cyan4973/xxHash
#[derive(
    Clone, Copy, Debug, Display, Eq, From, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Fingerprint(Uuid);

impl Fingerprint {
    /// Calculates the [`Fingerprint`] of the provided [`session::Token`].
    #[must_use]
    pub fn new(token: &session::Token) -> Self {
        let token: &str = token.as_ref();
        Self(Uuid::from_u128(xxh3::xxh3_128(token.as_bytes())))
    }
}

/// [`DateTime`] when a [`session::Token`] was revoked.
pub type RevocationDateTime = DateTimeOf<(Entry, unit::Revocation)>;

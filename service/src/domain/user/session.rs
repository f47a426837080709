//! [`Session`] definitions.

use std::time::Duration;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::AsRef;
use serde::{Deserialize, Serialize};

use crate::domain::{user, User};

/// User session, carried as the claims of a signed [`Token`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`user::Username`] of the [`User`] at the moment of issuance.
    pub username: user::Username,

    /// [`user::Role`] of the [`User`] at the moment of issuance.
    pub role: user::Role,

    /// [`DateTime`] when this [`Session`] was issued.
    #[serde(rename = "iat", with = "common::datetime::serde::unix_timestamp")]
    pub issued_at: IssuanceDateTime,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Creates a new [`Session`] of the provided [`User`], issued at `now` and
    /// living for the provided `ttl`.
    #[must_use]
    pub fn new(user: &User, now: IssuanceDateTime, ttl: Duration) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            issued_at: now,
            expires_at: (now + ttl).coerce(),
        }
    }

    /// Checks whether this [`Session`] is expired at the provided moment.
    #[must_use]
    pub fn is_expired_at(&self, now: ExpirationDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Eq, Hash, PartialEq)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }

    /// Creates a new [`Token`] if the given `token` looks like a compact
    /// [JWS] (no whitespace, not empty).
    ///
    /// Signature and claims are not verified here.
    ///
    /// [JWS]: https://datatracker.ietf.org/doc/html/rfc7515
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        (!token.is_empty() && !token.contains(char::is_whitespace))
            .then_some(Self(token))
    }
}

/// [`DateTime`] of a [`Session`] issuance.
pub type IssuanceDateTime = DateTimeOf<(Session, unit::Issuance)>;

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

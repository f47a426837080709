//! [JWT] codec of [`Session`]s.
//!
//! [JWT]: https://datatracker.ietf.org/doc/html/rfc7519

use std::time::Duration;

use common::DateTime;
use derive_more::{Debug, Display, Error, From};
use jsonwebtoken::{
    errors::Error as JwtError, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use tracerr::Traced;

use crate::domain::{user::session, Session, User};

/// Signs and verifies [`session::Token`]s with a process-wide HS256 secret.
#[derive(Clone, Debug)]
pub struct Codec {
    /// Key signing the issued [`session::Token`]s.
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// Key verifying the presented [`session::Token`]s.
    #[debug(skip)]
    decoding_key: DecodingKey,

    /// Lifetime of the issued [`Session`]s.
    ttl: Duration,
}

impl Codec {
    /// Creates a new [`Codec`] signing with the provided `secret` and issuing
    /// [`Session`]s living for the provided `ttl`.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Returns the lifetime of the [`Session`]s issued by this [`Codec`].
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a new [`Session`] of the provided [`User`] at the provided
    /// moment, returning it along with its signed [`session::Token`].
    ///
    /// The moment is truncated to whole seconds, as JWT claims carry no
    /// fractions.
    ///
    /// # Errors
    ///
    /// If the claims cannot be encoded.
    pub fn issue(
        &self,
        user: &User,
        now: DateTime,
    ) -> Result<(Session, session::Token), Traced<EncodeError>> {
        let session =
            Session::new(user, now.truncate_to_seconds().coerce(), self.ttl);
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &session,
            &self.encoding_key,
        )
        .map_err(tracerr::wrap!())?;

        // SAFETY: `jsonwebtoken::encode()` always returns a valid compact
        //         JWS representation.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { session::Token::new_unchecked(token) };

        Ok((session, token))
    }

    /// Decodes the provided [`session::Token`], verifying its signature and
    /// whether it's still valid at the provided moment.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Invalid`] if the signature doesn't match or the
    ///   [`session::Token`] is malformed.
    /// - [`DecodeError::Expired`] if `now` is not before the expiration.
    pub fn decode(
        &self,
        token: &session::Token,
        now: DateTime,
    ) -> Result<Session, Traced<DecodeError>> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiration is checked against the provided `now` below.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.decoding_key,
            &validation,
        )
        .map_err(tracerr::from_and_wrap!(=> DecodeError))?
        .claims;

        if session.is_expired_at(now.coerce()) {
            return Err(tracerr::new!(DecodeError::Expired));
        }
        Ok(session)
    }
}

/// Error of encoding a [`Session`] into a [`session::Token`].
pub type EncodeError = JwtError;

/// Error of decoding a [`session::Token`] into a [`Session`].
#[derive(Debug, Display, Error, From)]
pub enum DecodeError {
    /// [`session::Token`] has expired.
    #[display("`Session` has expired")]
    Expired,

    /// [`session::Token`] is malformed or its signature doesn't match.
    #[display("Invalid `Session` token: {_0}")]
    Invalid(JwtError),
}

//! [`Database`]-related implementations.

#[cfg(any(feature = "memory", test))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(feature = "memory", test))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Name of the unique constraint on active [`User`]s' usernames.
///
/// [`User`]: crate::domain::User
pub const UNIQUE_USERNAME: &str = "users_username_uniq";

/// Name of the unique constraint on revoked [`Token`]s' fingerprints.
///
/// [`Token`]: crate::domain::user::session::Token
pub const UNIQUE_REVOCATION: &str = "revoked_sessions_pkey";

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    #[cfg(any(feature = "memory", test))]
    /// [`Memory`] error.
    Memory(memory::Error),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint
    /// (or of any constraint, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
            #[cfg(any(feature = "memory", test))]
            Self::Memory(e) => e.is_unique_violation(constraint),
        }
    }
}

//! Infrastructure layer.

pub mod database;
pub mod jwt;

pub use self::database::Database;
#[cfg(any(feature = "memory", test))]
pub use self::database::Memory;
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};

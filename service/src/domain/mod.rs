//! Domain definitions.

pub mod property;
pub mod revocation;
pub mod user;

pub use self::{
    property::{Property, Review},
    user::{Session, User},
};

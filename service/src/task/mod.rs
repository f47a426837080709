//! Background [`Task`]s definitions.

mod background;
pub mod prune_revoked_sessions;

pub use common::Handler as Task;

pub use self::{
    background::{Background, TaskError},
    prune_revoked_sessions::PruneRevokedSessions,
};

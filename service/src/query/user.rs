//! [`Query`] collection related to a single [`User`].

use common::operations::By;

use crate::domain::{user, User};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an active [`User`] by its [`user::Id`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, DeleteUser},
        domain::user::{self, Role},
        Command as _,
    };

    use super::ById;

    #[tokio::test]
    async fn hides_deleted_users() {
        let svc = fixture::service();
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;

        let found = svc.execute(ById::by(alice.id)).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));

        svc.execute(DeleteUser { user_id: alice.id }).await.unwrap();
        assert!(svc.execute(ById::by(alice.id)).await.unwrap().is_none());
        assert!(svc.execute(ById::by(user::Id::new())).await.unwrap().is_none());
    }
}

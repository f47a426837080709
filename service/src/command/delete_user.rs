//! [`Command`] for deleting a [`User`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`User`].
///
/// The [`User`] is only marked as deleted, which frees its
/// [`user::Username`].
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteUser {
    /// ID of the [`User`] to delete.
    pub user_id: user::Id,
}

impl<Db> Command<DeleteUser> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<User, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<User>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteUser { user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        user.deleted_at = Some(DateTime::now().coerce());
        tx.execute(Update(user))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`DeleteUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{command::fixture, domain::user::Role, Command as _};

    use super::{DeleteUser, ExecutionError};

    #[tokio::test]
    async fn deletes_user_and_frees_username() {
        let svc = fixture::service();
        let user = fixture::register(&svc, "alice", Role::Tenant).await;

        svc.execute(DeleteUser { user_id: user.id }).await.unwrap();

        assert!(fixture::user(&svc, user.id).await.is_none());
        let again = fixture::register(&svc, "alice", Role::Owner).await;
        assert_ne!(again.id, user.id);
    }

    #[tokio::test]
    async fn deletes_only_once() {
        let svc = fixture::service();
        let user = fixture::register(&svc, "alice", Role::Tenant).await;
        svc.execute(DeleteUser { user_id: user.id }).await.unwrap();

        let err = svc
            .execute(DeleteUser { user_id: user.id })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}

//! [`Command`] for changing a [`user::Role`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing a [`user::Role`].
///
/// Already issued [`Session`]s keep the previous [`user::Role`] until they
/// expire.
///
/// [`Session`]: crate::domain::Session
#[derive(Clone, Copy, Debug)]
pub struct UpdateUserRole {
    /// ID of the [`User`] whose [`user::Role`] should be changed.
    pub user_id: user::Id,

    /// New [`user::Role`] of the [`User`].
    pub role: user::Role,
}

impl<Db> Command<UpdateUserRole> for Service<Db>
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
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateUserRole,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUserRole { user_id, role } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;
        if user.role == role {
            return Ok(user);
        }

        user.role = role;
        tx.execute(Update(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user)
    }
}

/// Error of [`UpdateUserRole`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0}` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture,
        domain::user::{self, Role},
        Command as _,
    };

    use super::{ExecutionError, UpdateUserRole};

    #[tokio::test]
    async fn changes_role() {
        let svc = fixture::service();
        let user = fixture::register(&svc, "alice", Role::Tenant).await;

        let updated = svc
            .execute(UpdateUserRole {
                user_id: user.id,
                role: Role::Owner,
            })
            .await
            .unwrap();

        assert_eq!(updated.role, Role::Owner);
        let stored = fixture::user(&svc, user.id).await.unwrap();
        assert_eq!(stored.role, Role::Owner);
    }

    #[tokio::test]
    async fn fails_for_unknown_user() {
        let svc = fixture::service();

        let err = svc
            .execute(UpdateUserRole {
                user_id: user::Id::new(),
                role: Role::Admin,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}

//! [`Command`] for creating a new [`User`].

use argon2::password_hash;
use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tokio::task;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Password, Role, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Username`] of a new [`User`].
    pub username: user::Username,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Role`] of a new [`User`].
    pub role: user::Role,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            username,
            password,
            role,
        } = cmd;

        let u = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::UsernameOccupied(username)));
        }

        let password_hash = task::spawn_blocking(move || {
            user::PasswordHash::new(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let user = User {
            id: user::Id::new(),
            username,
            password_hash,
            role,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        // Another `User` may have taken the `Username` since the check above.
        tx.execute(Insert(user.clone()))
            .await
            .map_err(|e| {
                let unique = Some(database::UNIQUE_USERNAME);
                if e.as_ref().is_unique_violation(unique) {
                    tracerr::new!(E::UsernameOccupied(user.username.clone()))
                } else {
                    (tracerr::map_from_and_wrap!(=> E))(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Password`] hashing failed.
    #[display("Failed to hash `Password`: {_0}")]
    PasswordHashing(password_hash::Error),

    /// Blocking [`Password`] hashing task failed to complete.
    #[display("`Password` hashing task failed: {_0}")]
    PasswordHashingTask(task::JoinError),

    /// [`Username`] is already occupied.
    #[display("`{_0}` username is occupied")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] user::Username),
}

#[cfg(test)]
mod spec {
    use std::cell::Cell;

    use secrecy::SecretBox;

    use crate::{
        command::fixture,
        domain::user::{Password, Role, Username},
        Command as _,
    };

    use super::{CreateUser, ExecutionError};

    #[tokio::test]
    async fn creates_user() {
        let svc = fixture::service();

        let user = svc
            .execute(CreateUser {
                username: Username::new("alice").unwrap(),
                password: SecretBox::new(Box::new(
                    Password::new("pw123").unwrap(),
                )),
                role: Role::Tenant,
            })
            .await
            .unwrap();

        assert_eq!(user.username.to_string(), "alice");
        assert_eq!(user.role, Role::Tenant);
        assert!(user.password_hash.verify(&Password::new("pw123").unwrap()));
        assert!(user.deleted_at.is_none());
    }

    #[tokio::test]
    async fn rejects_occupied_username() {
        let svc = fixture::service();
        drop(fixture::register(&svc, "alice", Role::Tenant).await);

        let err = svc
            .execute(CreateUser {
                username: Username::new("alice").unwrap(),
                password: SecretBox::new(Box::new(
                    Password::new("other").unwrap(),
                )),
                role: Role::Owner,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UsernameOccupied(_)));
    }

    #[tokio::test]
    async fn username_is_case_sensitive() {
        let svc = fixture::service();
        drop(fixture::register(&svc, "alice", Role::Tenant).await);

        let user = fixture::register(&svc, "Alice", Role::Tenant).await;

        assert_eq!(user.username.to_string(), "Alice");
    }

    #[tokio::test]
    async fn hashes_password_without_blocking_executor() {
        let svc = fixture::service();
        let done = Cell::new(false);
        let ticks = Cell::new(0_u32);

        let (user, ()) = tokio::join!(
            async {
                let user = fixture::register(&svc, "alice", Role::Tenant).await;
                done.set(true);
                user
            },
            async {
                while !done.get() {
                    ticks.set(ticks.get() + 1);
                    tokio::task::yield_now().await;
                }
            },
        );

        assert_eq!(user.username.to_string(), "alice");
        assert!(ticks.get() > 1, "executor was blocked by hashing");
    }
}

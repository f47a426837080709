//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tokio::task;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Password, Username};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, jwt, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Clone, Debug)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials.
    ByCredentials {
        /// [`Username`] of a [`User`].
        username: user::Username,

        /// [`Password`] of a [`User`].
        password: SecretBox<user::Password>,
    },
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// Created [`Session`] itself.
    pub session: Session,

    /// [`User`] whose [`Session`] has been created.
    pub user: User,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: for<'l> Database<
        Select<By<Option<User>, &'l user::Username>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByCredentials { username, password } => {
                let user = self
                    .database()
                    .execute(Select(By::new(&username)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or_else(|| E::UserNotExists(username))
                    .map_err(tracerr::wrap!())?;

                let hash = user.password_hash.clone();
                let verified = task::spawn_blocking(move || {
                    hash.verify(password.expose_secret())
                })
                .await
                .map_err(tracerr::from_and_wrap!(=> E))?;
                if !verified {
                    return Err(tracerr::new!(E::WrongPassword));
                }

                user
            }
        };

        let (session, token) = self
            .config()
            .jwt
            .issue(&user, DateTime::now())
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output {
            token,
            session,
            user,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jwt::EncodeError),

    /// Blocking [`Password`] verification task failed to complete.
    #[display("`Password` verification task failed: {_0}")]
    PasswordVerificationTask(task::JoinError),

    /// [`User`] with the provided [`Username`] does not exist.
    #[display("`User(username: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Username),

    /// [`CreateUserSession::ByCredentials`] contains a wrong [`Password`].
    #[display("Wrong `User` password")]
    WrongPassword,
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use secrecy::SecretBox;

    use crate::{
        command::fixture,
        domain::user::{Password, Role, Username},
        Command as _,
    };

    use super::{CreateUserSession, ExecutionError};

    fn login(username: &str, password: &str) -> CreateUserSession {
        CreateUserSession::ByCredentials {
            username: Username::new(username).unwrap(),
            password: SecretBox::new(Box::new(Password::new(password).unwrap())),
        }
    }

    #[tokio::test]
    async fn logs_registered_user_in() {
        let svc = fixture::service();
        let user = fixture::register(&svc, "alice", Role::Tenant).await;

        let out = svc.execute(login("alice", fixture::PASSWORD)).await.unwrap();

        assert_eq!(out.user.id, user.id);
        assert_eq!(out.session.user_id, user.id);
        assert_eq!(out.session.role, Role::Tenant);
        assert_eq!(
            svc.config().jwt.decode(&out.token, DateTime::now()).unwrap(),
            out.session,
        );
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let svc = fixture::service();
        drop(fixture::register(&svc, "alice", Role::Tenant).await);

        let err = svc.execute(login("alice", "pw124")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongPassword));
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let svc = fixture::service();

        let err = svc.execute(login("bob", "pw123")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}

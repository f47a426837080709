//! [`Command`] for authorizing a [`User`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{
        revocation,
        user::{session, Session},
    },
    infra::{database, jwt, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: for<'l> Database<
        Select<By<Option<revocation::Entry>, &'l session::Token>>,
        Ok = Option<revocation::Entry>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = self
            .config()
            .jwt
            .decode(&token, DateTime::now())
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let revoked = self
            .database()
            .execute(Select(By::new(&token)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if revoked.is_some() {
            return Err(tracerr::new!(E::Revoked));
        }

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`session::Token`] cannot be decoded.
    #[display("Failed to decode `Session`: {_0}")]
    Decode(jwt::DecodeError),

    /// [`session::Token`] has been revoked.
    #[display("`Session` has been revoked")]
    Revoked,
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, RevokeUserSession},
        domain::user::{session::Token, Role},
        infra::jwt,
        Command as _,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    #[tokio::test]
    async fn authorizes_issued_session() {
        let svc = fixture::service();
        let user = fixture::register(&svc, "alice", Role::Owner).await;
        let (session, token) = fixture::login(&svc, &user);

        let authorized = svc
            .execute(AuthorizeUserSession { token })
            .await
            .unwrap();

        assert_eq!(authorized, session);
    }

    #[tokio::test]
    async fn rejects_revoked_session() {
        let svc = fixture::service();
        let user = fixture::register(&svc, "alice", Role::Tenant).await;
        let (_, token) = fixture::login(&svc, &user);

        drop(
            svc.execute(RevokeUserSession {
                token: token.clone(),
            })
            .await
            .unwrap(),
        );
        let err = svc
            .execute(AuthorizeUserSession { token })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Revoked));
    }

    #[tokio::test]
    async fn rejects_invalid_token() {
        let svc = fixture::service();

        let err = svc
            .execute(AuthorizeUserSession {
                token: Token::new("not.a.token").unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Decode(jwt::DecodeError::Invalid(_)),
        ));
    }
}

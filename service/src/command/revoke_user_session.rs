//! [`Command`] for revoking a [`Session`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Session;
use crate::{
    domain::{revocation, user::session},
    infra::{database, jwt, Database},
    Service,
};

use super::Command;

/// [`Command`] for revoking a [`Session`] before its expiration (logging out).
#[derive(Clone, Debug, From)]
pub struct RevokeUserSession {
    /// [`Session`] token to revoke.
    pub token: session::Token,
}

impl<Db> Command<RevokeUserSession> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<revocation::Entry>, &'l session::Token>>,
            Ok = Option<revocation::Entry>,
            Err = Traced<database::Error>,
        > + Database<Insert<revocation::Entry>, Err = Traced<database::Error>>,
{
    type Ok = revocation::Entry;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RevokeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RevokeUserSession { token } = cmd;

        let now = DateTime::now();
        let session = self
            .config()
            .jwt
            .decode(&token, now)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = self
            .database()
            .execute(Select(By::new(&token)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::AlreadyRevoked));
        }

        let entry =
            revocation::Entry::new(token, session.expires_at, now.coerce());
        self.database()
            .execute(Insert(entry.clone()))
            .await
            .map_err(|e| {
                let unique = Some(database::UNIQUE_REVOCATION);
                if e.as_ref().is_unique_violation(unique) {
                    tracerr::new!(E::AlreadyRevoked)
                } else {
                    (tracerr::map_from_and_wrap!(=> E))(e)
                }
            })
            .map(drop)?;

        Ok(entry)
    }
}

/// Error of [`RevokeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`session::Token`] cannot be decoded.
    #[display("Failed to decode `Session`: {_0}")]
    Decode(jwt::DecodeError),

    /// [`session::Token`] has been revoked already.
    #[display("`Session` has been revoked already")]
    AlreadyRevoked,
}

#[cfg(test)]
mod spec {
    use crate::{command::fixture, domain::user::Role, Command as _};

    use super::{ExecutionError, RevokeUserSession};

    #[tokio::test]
    async fn revokes_only_once() {
        let svc = fixture::service();
        let user = fixture::register(&svc, "alice", Role::Tenant).await;
        let (session, token) = fixture::login(&svc, &user);

        let entry = svc
            .execute(RevokeUserSession {
                token: token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(entry.token, token);
        assert_eq!(entry.expires_at, session.expires_at);

        let err = svc
            .execute(RevokeUserSession { token })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyRevoked));
    }

    #[tokio::test]
    async fn other_sessions_stay_valid() {
        let svc = fixture::service();
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let bob = fixture::register(&svc, "bob", Role::Tenant).await;
        let (_, alice_token) = fixture::login(&svc, &alice);
        let (bob_session, bob_token) = fixture::login(&svc, &bob);

        drop(
            svc.execute(RevokeUserSession { token: alice_token })
                .await
                .unwrap(),
        );

        assert_eq!(fixture::authorize(&svc, bob_token).await, bob_session);
    }
}

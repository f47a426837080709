//! [`PruneRevokedSessions`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Delete, Perform, Start};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Session;
use crate::{
    domain::{revocation, user::session},
    infra::{database, Database},
    Service,
};

use super::Task;

/// Configuration for [`PruneRevokedSessions`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between [`revocation::Entry`]es pruning.
    pub interval: time::Duration,
}

/// [`Task`] for pruning [`revocation::Entry`]es of already expired
/// [`Session`]s.
///
/// An expired [`Session`] is rejected anyway, so there is no need to remember
/// its revocation any longer.
#[derive(Clone, Copy, Debug)]
pub struct PruneRevokedSessions<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<PruneRevokedSessions<Self>, Config>>> for Service<Db>
where
    PruneRevokedSessions<Service<Db>>:
        Task<Perform<()>, Ok = u64, Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<PruneRevokedSessions<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = PruneRevokedSessions {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::debug!(
                    "`task::PruneRevokedSessions` pruned {n} entries",
                ),
                Err(e) => {
                    log::error!("`task::PruneRevokedSessions` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for PruneRevokedSessions<Service<Db>>
where
    Db: Database<
        Delete<By<revocation::Entry, session::ExpirationDateTime>>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    type Ok = u64;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service
            .database()
            .execute(Delete(By::new(session::ExpirationDateTime::now())))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`PruneRevokedSessions`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::{By, Insert, Perform, Select};

    use crate::{
        command::fixture,
        domain::{
            revocation,
            user::{session, Role},
        },
        infra::Database as _,
    };

    use super::{Config, PruneRevokedSessions};

    #[tokio::test]
    async fn prunes_only_expired_entries() {
        let svc = fixture::service();
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let bob = fixture::register(&svc, "bob", Role::Tenant).await;
        let (_, stale) = fixture::login(&svc, &alice);
        let (_, fresh) = fixture::login(&svc, &bob);
        let now = session::ExpirationDateTime::now();
        for (token, expires_at) in [
            (stale.clone(), now - Duration::from_secs(60)),
            (fresh.clone(), now + Duration::from_secs(3600)),
        ] {
            svc.database()
                .execute(Insert(revocation::Entry::new(
                    token,
                    expires_at,
                    revocation::RevocationDateTime::now(),
                )))
                .await
                .unwrap();
        }
        let task = PruneRevokedSessions {
            config: Config {
                interval: Duration::from_secs(1),
            },
            service: svc.clone(),
        };

        assert_eq!(task.execute(Perform(())).await.unwrap(), 1);
        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);

        let pruned = svc
            .database()
            .execute(Select(By::<Option<revocation::Entry>, _>::new(&stale)))
            .await
            .unwrap();
        assert!(pruned.is_none());
        let kept = svc
            .database()
            .execute(Select(By::<Option<revocation::Entry>, _>::new(&fresh)))
            .await
            .unwrap();
        assert!(kept.is_some());
    }
}

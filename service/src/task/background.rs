//! [`Background`] environment running the periodic [`Task`]s of a
//! [`Service`].

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use derive_more::Display;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::{Service, Task};

/// Background environment running the periodic [`Task`]s of a [`Service`].
///
/// Being awaited, resolves once every spawned [`Task`] is done, or as soon as
/// any of them fails. The rest are cancelled then.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Names and handles of the spawned [`Task`]s.
    tasks: Vec<(&'static str, task::JoinHandle<Result<(), Box<dyn Error>>>)>,
}

impl Background {
    /// Spawns the provided [`Task`] future under the provided `name`.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self.set.spawn_local(async move {
            future.await.map_err(|e| -> Box<dyn Error> { Box::new(e) })
        });
        self.tasks.push((name, handle));
    }

    /// Returns the number of spawned [`Task`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Indicates whether no [`Task`] has been spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, tasks } = self;

        let tasks = tasks.into_iter().map(|(name, handle)| {
            handle.map(move |res| {
                let source: Box<dyn Error> = match res {
                    Ok(Ok(())) => {
                        log::info!("`{name}` background task finished");
                        return Ok(());
                    }
                    Ok(Err(e)) => e,
                    Err(e) => Box::new(e),
                };
                Err(TaskError { task: name, source })
            })
        });

        async move {
            set.run_until(future::try_join_all(tasks)).await.map(drop)
        }
        .boxed_local()
    }
}

/// Failure of a [`Task`] spawned in a [`Background`].
#[derive(Debug, Display)]
#[display("`{task}` failed: {source}")]
pub struct TaskError {
    /// Name of the failed [`Task`].
    pub task: &'static str,

    /// Error the [`Task`] failed with.
    pub source: Box<dyn Error>,
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

#[cfg(test)]
mod spec {
    use std::{future, io};

    use super::Background;

    #[tokio::test]
    async fn resolves_once_all_tasks_finish() {
        let mut bg = Background::default();
        bg.spawn("first", async { Ok::<_, io::Error>(()) });
        bg.spawn("second", async {
            tokio::task::yield_now().await;
            Ok::<_, io::Error>(())
        });
        assert_eq!(bg.len(), 2);

        bg.await.unwrap();
    }

    #[tokio::test]
    async fn fails_with_name_of_failed_task() {
        let mut bg = Background::default();
        bg.spawn("endless", future::pending::<Result<(), io::Error>>());
        bg.spawn("broken", async { Err(io::Error::other("boom")) });

        let err = bg.await.unwrap_err();

        assert_eq!(err.task, "broken");
        assert_eq!(err.to_string(), "`broken` failed: boom");
    }

    #[tokio::test]
    async fn nothing_to_run() {
        let bg = Background::default();
        assert!(bg.is_empty());

        bg.await.unwrap();
    }
}

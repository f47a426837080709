//! In-memory [`Database`] implementation.
//!
//! All the data lives in a single [`State`] behind an async [`Mutex`].
//! A [`Tx`] holds that [`Mutex`] for its whole lifetime and works on a staged
//! copy of the [`State`], which replaces the original one on commit. Dropping
//! a [`Tx`] without committing discards the staged changes.

mod impls;

use std::{collections::HashMap, future::Future, sync::Arc};

use derive_more::{Deref, Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

#[cfg(doc)]
use crate::infra::Database;
use crate::{
    domain::{property, revocation, user, Property, User},
    infra::database,
};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default, Deref)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self(NonTx::default())
    }
}

/// Whole data stored by a [`Memory`] [`Database`].
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`User`]s, including the deleted ones.
    users: HashMap<user::Id, User>,

    /// Stored [`revocation::Entry`]s.
    revocations: HashMap<revocation::Fingerprint, revocation::Entry>,

    /// Stored [`Property`]s.
    properties: HashMap<property::Id, Property>,
}

/// Non-transactional [`Memory`] client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`State`].
    state: Arc<Mutex<State>>,
}

/// Transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Staged`] changes, or [`None`] once committed.
    staged: Arc<Mutex<Option<Staged>>>,
}

/// Changes staged by a [`Tx`].
#[derive(Debug)]
struct Staged {
    /// Exclusive access to the shared [`State`] for the [`Tx`] lifetime.
    guard: OwnedMutexGuard<State>,

    /// Copy of the shared [`State`] the [`Tx`] operates on.
    state: State,
}

impl Tx {
    /// Starts a new [`Tx`], waiting until any other [`Tx`] is finished.
    async fn begin(non_tx: &NonTx) -> Self {
        let guard = Arc::clone(&non_tx.state).lock_owned().await;
        let state = guard.clone();
        Self {
            staged: Arc::new(Mutex::new(Some(Staged { guard, state }))),
        }
    }

    /// Publishes the staged changes of this [`Tx`].
    ///
    /// # Errors
    ///
    /// If this [`Tx`] has been committed already.
    async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Staged { mut guard, state } = self
            .staged
            .lock()
            .await
            .take()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        *guard = state;
        Ok(())
    }
}

/// Access to a [`State`], either directly or through a [`Tx`].
pub trait Connection {
    /// Runs the provided function over the current [`State`].
    ///
    /// # Errors
    ///
    /// If the [`State`] is not accessible anymore.
    fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R + Send,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>> + Send;

    /// Runs the provided function mutating the current [`State`].
    ///
    /// # Errors
    ///
    /// If the [`State`] is not accessible anymore.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> R + Send,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>> + Send;
}

impl Connection for NonTx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R + Send,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&*self.state.lock().await))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> R + Send,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&mut *self.state.lock().await))
    }
}

impl Connection for Tx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R + Send,
    ) -> Result<R, Traced<database::Error>> {
        let staged = self.staged.lock().await;
        let staged = staged
            .as_ref()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        Ok(f(&staged.state))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> R + Send,
    ) -> Result<R, Traced<database::Error>> {
        let mut staged = self.staged.lock().await;
        let staged = staged
            .as_mut()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        Ok(f(&mut staged.state))
    }
}

/// [`Memory`] database [`Error`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Tx`] has been committed already.
    #[display("`Tx` has been committed already")]
    TxFinished,

    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |exp| exp == *c),
            Self::TxFinished => false,
        }
    }
}

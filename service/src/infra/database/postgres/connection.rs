//! [`Connection`] definitions.

use std::{fmt, future::Future, sync::Arc};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio::sync::Mutex;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Generic database connection.
pub trait Connection {
    /// Queries the provided statement with the given parameters and returns the
    /// resulting rows.
    ///
    /// # Errors
    ///
    /// If failed to query the statement.
    fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized + Sync;

    /// Queries the provided statement with the given parameters and returns the
    /// optional resulting row.
    ///
    /// # Errors
    ///
    /// If failed to query the statement.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized + Sync;

    /// Executes the provided statement with the given parameters and returns
    /// the number of affected rows.
    ///
    /// # Errors
    ///
    /// If failed to execute the statement.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized + Sync;
}

/// Non-transactional client taking a [`Pooled`] connection for each
/// statement.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`Pool`] to take connections from.
    pool: Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    /// Returns the [`Pool`] of this [`NonTx`] client.
    pub(crate) fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Takes a [`Pooled`] connection.
    async fn pooled(&self) -> Result<Pooled, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized + Sync,
    {
        self.pooled()
            .await
            .map_err(tracerr::wrap!())?
            .query(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized + Sync,
    {
        self.pooled()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized + Sync,
    {
        self.pooled()
            .await
            .map_err(tracerr::wrap!())?
            .execute(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Open transaction bound to the [`Pooled`] connection it was started on.
#[self_referencing]
struct Transaction {
    /// [`Pooled`] connection the transaction was started on.
    pooled: Pooled,

    /// Transaction started on the [`Pooled`] connection.
    #[borrows(mut pooled)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl Transaction {
    /// Returns the started [`deadpool_postgres::Transaction`], unless it has
    /// been taken for committing.
    fn get(&self) -> Option<&deadpool_postgres::Transaction<'_>> {
        self.with_tx(|tx| tx.as_ref())
    }
}

/// Transactional client running all its statements inside a single database
/// transaction.
///
/// The transaction is rolled back if the client is dropped without being
/// committed.
#[derive(Clone)]
pub struct Tx {
    /// Underlying [`Transaction`], or [`None`] once committed.
    inner: Arc<Mutex<Option<Transaction>>>,
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx").finish_non_exhaustive()
    }
}

impl Tx {
    /// Starts a new [`Tx`] on a connection taken from the provided [`NonTx`]
    /// client's [`Pool`].
    ///
    /// # Errors
    ///
    /// If failed to take a connection or to start a transaction.
    pub(crate) async fn begin(
        non_tx: &NonTx,
    ) -> Result<Self, Traced<database::Error>> {
        let pooled = non_tx.pooled().await.map_err(tracerr::wrap!())?;
        let tx = Transaction::try_new_async_send(pooled, |c| {
            c.transaction().map_ok(Some).boxed()
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Some(tx))),
        })
    }

    /// Commits this [`Tx`].
    ///
    /// Committing an already committed [`Tx`] is a no-op.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub(crate) async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(mut tx) = self.inner.lock().await.take() else {
            return Ok(());
        };
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        let Some(tx) = tx.with_tx_mut(|tx| tx.take()) else {
            return Ok(());
        };
        tx.commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Runs the provided `$method` of a [`deadpool_postgres::Transaction`] inside
/// the [`Tx`].
macro_rules! in_tx {
    ($tx:expr, $method:ident($stmt:expr, $params:expr)) => {{
        let guard = $tx.inner.lock().await;
        guard
            .as_ref()
            .and_then(Transaction::get)
            .ok_or_else(|| tracerr::new!(postgres::Error::TxFinished))
            .map_err(tracerr::map_from)?
            .$method($stmt, $params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }};
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized + Sync,
    {
        in_tx!(self, query(stmt, params))
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized + Sync,
    {
        in_tx!(self, query_opt(stmt, params))
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized + Sync,
    {
        in_tx!(self, execute(stmt, params))
    }
}

//! Running one query inside a serializable, read-only transaction.

use std::fmt;
use std::marker::PhantomData;

use tracing::trace;

use crate::backend::QueryBackend;
use crate::document::Cursor;
use crate::error::ExportError;
use crate::types::Column;

/// Where a [`QueryExecutor`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Nothing has been done to the connection yet.
    Idle,
    /// The read transaction is open.
    Configured,
    /// The query is running and its rows are being consumed.
    Executing,
    /// The query ran and its rows were consumed.
    ResultReady,
    /// A step failed. The executor cannot be used again.
    Failed,
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Configured => "configured",
            Self::Executing => "executing",
            Self::ResultReady => "result-ready",
            Self::Failed => "failed",
        })
    }
}

/// Runs a single query on a borrowed connection.
///
/// The executor opens the transaction but never ends it. Whoever owns the connection rolls the
/// transaction back once [`transaction_open`](Self::transaction_open) reports one was started.
pub struct QueryExecutor<'conn, B: QueryBackend> {
    connection: &'conn B::Connection,
    state: ExecutorState,
    transaction_open: bool,
    backend: PhantomData<fn() -> B>,
}

impl<B: QueryBackend> fmt::Debug for QueryExecutor<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("state", &self.state)
            .field("transaction_open", &self.transaction_open)
            .finish_non_exhaustive()
    }
}

impl<'conn, B: QueryBackend> QueryExecutor<'conn, B> {
    /// An idle executor for `connection`.
    pub fn new(connection: &'conn B::Connection) -> Self {
        Self {
            connection,
            state: ExecutorState::Idle,
            transaction_open: false,
            backend: PhantomData,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Whether a transaction was opened on the connection and still needs to be ended.
    pub fn transaction_open(&self) -> bool {
        self.transaction_open
    }

    fn transition(&mut self, next: ExecutorState) {
        trace!(from = %self.state, to = %next, "query executor state change");
        self.state = next;
    }

    fn require(&mut self, expected: ExecutorState, step: &str) -> Result<(), ExportError> {
        if self.state == expected {
            return Ok(());
        }
        let err = ExportError::query(format!(
            "cannot {step} a query executor that is {}",
            self.state
        ));
        self.transition(ExecutorState::Failed);
        Err(err)
    }

    /// Leave autocommit mode and open a serializable read transaction.
    ///
    /// # Errors
    ///
    /// Fails with [`ExportError::Query`] if the executor is not idle or the engine rejects the
    /// transaction settings.
    #[tracing::instrument(level = "debug", skip(self), fields(state = %self.state))]
    pub fn configure(&mut self) -> Result<(), ExportError> {
        self.require(ExecutorState::Idle, "configure")?;
        match B::begin_read(self.connection) {
            Ok(()) => {
                self.transaction_open = true;
                self.transition(ExecutorState::Configured);
                Ok(())
            }
            Err(err) => {
                self.transition(ExecutorState::Failed);
                Err(ExportError::query(err))
            }
        }
    }

    /// Execute `sql` and hand its column descriptors and cursor to `consume`.
    ///
    /// The statement and cursor are released before this returns, on success and on failure.
    ///
    /// # Errors
    ///
    /// Fails with [`ExportError::Query`] if the executor is not configured or the query cannot be
    /// prepared or executed. Errors returned by `consume` are passed through.
    #[tracing::instrument(level = "debug", skip(self, consume), fields(state = %self.state))]
    pub fn run<T>(
        &mut self,
        sql: &str,
        consume: impl FnOnce(&[Column], &mut dyn Cursor) -> Result<T, ExportError>,
    ) -> Result<T, ExportError> {
        self.require(ExecutorState::Configured, "run")?;
        self.transition(ExecutorState::Executing);
        let result = B::execute(self.connection, sql, consume);
        self.transition(if result.is_ok() {
            ExecutorState::ResultReady
        } else {
            ExecutorState::Failed
        });
        result
    }
}

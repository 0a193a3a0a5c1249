//! One export run: connect, read the script, run it, encode the rows, write the document, release
//! everything.

use std::path::PathBuf;

use tracing::{error, info};

#[cfg(feature = "duckdb")]
use crate::backend::DuckDb;
#[cfg(feature = "sqlite")]
use crate::backend::Sqlite;
use crate::backend::{DatabaseBackend, QueryBackend};
use crate::config::{BackendKind, Config};
use crate::document::encode_document;
use crate::error::{settle, ExportError, ReleaseFailure, Resource};
use crate::executor::QueryExecutor;
use crate::{output, script};

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The document was written to this file.
    Written(PathBuf),
    /// The script was empty, so nothing was run and nothing was written.
    Skipped,
}

/// Format a start or end of run marker.
pub(crate) fn banner(message: &str) -> String {
    format!("========== {message} ==========")
}

/// Run the export described by `config` on the configured backend.
///
/// # Errors
///
/// Every failure ends the run. See [`export_with`].
pub fn export(config: &Config) -> Result<Outcome, ExportError> {
    match config.backend {
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => export_with::<Sqlite>(config),
        #[cfg(feature = "duckdb")]
        BackendKind::DuckDb => export_with::<DuckDb>(config),
    }
}

/// Run the export described by `config` on backend `B`, ignoring `config.backend`.
///
/// Resources are released in order on every path: the statement and cursor by the executor, then
/// the transaction (rolled back) and the connection. A release failure is only returned when
/// nothing failed before it.
///
/// # Errors
///
/// Returns the first failure of the run. An empty script is not an error; it yields
/// [`Outcome::Skipped`].
#[tracing::instrument(skip_all, fields(database = %config.database, input = %config.input.display()))]
pub fn export_with<B: QueryBackend>(config: &Config) -> Result<Outcome, ExportError> {
    info!("{}", banner("export started"));

    let result = connect::<B>(config).and_then(|connection| {
        let mut executor = QueryExecutor::<B>::new(&connection);
        let outcome = query_and_write(&mut executor, config);

        let mut releases = Vec::with_capacity(2);
        if executor.transaction_open() {
            releases.push(
                B::rollback(&connection)
                    .map_err(|err| ReleaseFailure::new(Resource::Transaction, err)),
            );
        }
        releases.push(
            B::close(connection).map_err(|err| ReleaseFailure::new(Resource::Connection, err)),
        );
        settle(outcome, releases)
    });

    match &result {
        Ok(Outcome::Written(path)) => info!(path = %path.display(), "{}", banner("export finished")),
        Ok(Outcome::Skipped) => info!("{}", banner("export skipped")),
        Err(err) => error!(error = %err, "{}", banner("export failed")),
    }
    result
}

fn connect<B: QueryBackend>(config: &Config) -> Result<B::Connection, ExportError> {
    let connection = B::at_location(config.database.clone()).and_then(|backend| backend.connect());
    connection.map_err(|err| {
        error!(database = %config.database, error = %err, "unable to connect");
        ExportError::connection(err)
    })
}

fn query_and_write<B: QueryBackend>(
    executor: &mut QueryExecutor<'_, B>,
    config: &Config,
) -> Result<Outcome, ExportError> {
    let sql = match script::read(&config.input) {
        Ok(sql) => sql,
        Err(ExportError::EmptyScript { path }) => {
            error!(path = %path.display(), "the SQL script is empty, nothing to run");
            return Ok(Outcome::Skipped);
        }
        Err(err) => {
            error!(error = %err, "unable to read the SQL script");
            return Err(err);
        }
    };

    executor.configure().inspect_err(|err| {
        error!(error = %err, "unable to open the read transaction");
    })?;

    let document = executor
        .run(&sql, |columns, cursor| {
            info!(columns = columns.len(), "query executed");
            Ok(encode_document(columns, cursor)?)
        })
        .inspect_err(|err| error!(error = %err, "unable to run the query"))?;
    info!(rows = document.len(), "result encoded");

    let path = output::write_document(&config.output, &document)
        .inspect_err(|err| error!(error = %err, "unable to write the output"))?;
    Ok(Outcome::Written(path))
}

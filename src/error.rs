//! Error types for an export run.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::error;

/// A boxed error from a client library or another collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can end an export run. None of these are retried.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The configuration file could not be read, parsed or validated.
    #[error("configuration could not be loaded from {path}: {source}")]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// Why loading failed.
        #[source]
        source: BoxError,
    },
    /// No connection to the database could be opened.
    #[error("unable to connect to the database: {0}")]
    Connection(#[source] BoxError),
    /// The SQL script could not be read.
    #[error("unable to read the SQL script from {path}: {source}")]
    ScriptRead {
        /// Where the script was read from; `-` for stdin.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The SQL script was read but has no content.
    #[error("the SQL script at {path} has no content")]
    EmptyScript {
        /// Where the script was read from; `-` for stdin.
        path: PathBuf,
    },
    /// Configuring the transaction, preparing or executing the query failed.
    #[error("query execution failed: {0}")]
    Query(#[source] BoxError),
    /// A row could not be read or a cell could not be encoded.
    #[error("processing the query result failed: {0}")]
    ResultProcessing(#[from] CellError),
    /// The output document could not be serialized or written.
    #[error("unable to write the output file {path}: {source}")]
    OutputWrite {
        /// The file being written.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },
    /// A resource could not be released cleanly.
    #[error(transparent)]
    Release(#[from] ReleaseFailure),
}

impl ExportError {
    /// A failure while configuring or executing the query.
    pub fn query(err: impl Into<BoxError>) -> Self {
        Self::Query(err.into())
    }

    /// A failure while opening the connection.
    pub fn connection(err: impl Into<BoxError>) -> Self {
        Self::Connection(err.into())
    }
}

/// Failure to read one cell, or to advance the cursor to the next row.
#[derive(Debug, Error)]
pub enum CellError {
    /// The client library reported an error.
    #[error(transparent)]
    Driver(BoxError),
    /// The stored value cannot be read as the requested kind of value.
    #[error("column {index}: cannot read {found} as {expected}")]
    Conversion {
        /// Zero-based column index.
        index: usize,
        /// The kind of value the accessor produces.
        expected: &'static str,
        /// A description of what was actually stored.
        found: String,
    },
    /// Draining a character stream failed.
    #[error("column {index}: reading the character stream failed: {source}")]
    Stream {
        /// Zero-based column index.
        index: usize,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Encoding the cell of a named column failed.
    #[error("column `{column}`: {source}")]
    InColumn {
        /// The column's name.
        column: String,
        /// The underlying failure.
        #[source]
        source: Box<CellError>,
    },
}

impl CellError {
    /// Wrap a client library error.
    pub fn driver(err: impl Into<BoxError>) -> Self {
        Self::Driver(err.into())
    }

    /// A value that cannot be read as `expected`.
    pub fn conversion(index: usize, expected: &'static str, found: impl fmt::Display) -> Self {
        Self::Conversion {
            index,
            expected,
            found: found.to_string(),
        }
    }

    pub(crate) fn in_column(self, column: &str) -> Self {
        Self::InColumn {
            column: column.to_owned(),
            source: Box::new(self),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for CellError {
    fn from(err: rusqlite::Error) -> Self {
        Self::driver(err)
    }
}

#[cfg(feature = "duckdb")]
impl From<duckdb::Error> for CellError {
    fn from(err: duckdb::Error) -> Self {
        Self::driver(err)
    }
}

/// A resource that is released at the end of a run, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The result cursor.
    Cursor,
    /// The prepared statement.
    Statement,
    /// The read transaction.
    Transaction,
    /// The database connection.
    Connection,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cursor => "cursor",
            Self::Statement => "statement",
            Self::Transaction => "transaction",
            Self::Connection => "connection",
        })
    }
}

/// A resource whose release failed.
#[derive(Debug, Error)]
#[error("unable to release the {resource}: {source}")]
pub struct ReleaseFailure {
    /// What was being released.
    pub resource: Resource,
    /// Why the release failed.
    #[source]
    pub source: BoxError,
}

impl ReleaseFailure {
    /// Record that releasing `resource` failed.
    pub fn new(resource: Resource, source: impl Into<BoxError>) -> Self {
        Self {
            resource,
            source: source.into(),
        }
    }
}

/// Combine the outcome of an operation with the outcomes of the releases that followed it.
///
/// Every release failure is logged. The primary error wins; otherwise the first release failure is
/// returned.
pub(crate) fn settle<T>(
    primary: Result<T, ExportError>,
    releases: impl IntoIterator<Item = Result<(), ReleaseFailure>>,
) -> Result<T, ExportError> {
    let mut first_failure = None;
    for failure in releases.into_iter().filter_map(Result::err) {
        error!(resource = %failure.resource, error = %failure.source, "release failed");
        if first_failure.is_none() {
            first_failure = Some(failure);
        }
    }

    match (primary, first_failure) {
        (Err(err), _) => Err(err),
        (Ok(_), Some(failure)) => Err(failure.into()),
        (Ok(value), None) => Ok(value),
    }
}

//! Database engines a query can be exported from.

#[cfg(feature = "duckdb")]
mod duckdb;
#[cfg(feature = "sqlite")]
mod sqlite;

mod sealed {
    pub trait Sealed {}
    #[cfg(feature = "duckdb")]
    impl Sealed for super::duckdb::DuckDb {}
    #[cfg(feature = "sqlite")]
    impl Sealed for super::sqlite::Sqlite {}
}

#[cfg(feature = "duckdb")]
pub use self::duckdb::DuckDb;
#[cfg(feature = "sqlite")]
pub use self::sqlite::Sqlite;
use crate::document::Cursor;
use crate::error::ExportError;
use crate::types::Column;
use crate::Location;

/// A database engine reachable at a [`Location`].
pub trait DatabaseBackend: sealed::Sealed + Sized {
    /// An open connection.
    type Connection;
    /// The client library's error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Describe the database at `location`. No connection is opened.
    fn at_location(location: Location) -> Result<Self, Self::Error>;

    /// Where the database lives.
    fn location(&self) -> &Location;

    /// Open a new connection to the database.
    fn connect(&self) -> Result<Self::Connection, Self::Error>;
}

/// A database engine that can run one query inside a serializable read transaction.
///
/// The methods are called in order: [`begin_read`](Self::begin_read), [`execute`](Self::execute),
/// [`rollback`](Self::rollback), [`close`](Self::close). Use
/// [`QueryExecutor`](crate::QueryExecutor) rather than calling the first two directly.
pub trait QueryBackend: DatabaseBackend {
    /// Leave autocommit mode by opening a transaction with the strictest isolation the engine
    /// supports, declaring read-only intent where the engine allows it.
    fn begin_read(connection: &Self::Connection) -> Result<(), Self::Error>;

    /// Prepare and execute `sql`, then hand the column descriptors and the result cursor to
    /// `consume`.
    ///
    /// The statement and cursor are released before this returns, whether or not execution or
    /// `consume` succeeded. A failure to release them is reported only if nothing failed earlier.
    fn execute<T>(
        connection: &Self::Connection,
        sql: &str,
        consume: impl FnOnce(&[Column], &mut dyn Cursor) -> Result<T, ExportError>,
    ) -> Result<T, ExportError>;

    /// End the read transaction without committing anything. Only called after
    /// [`begin_read`](Self::begin_read) succeeded.
    fn rollback(connection: &Self::Connection) -> Result<(), Self::Error>;

    /// Close the connection.
    fn close(connection: Self::Connection) -> Result<(), Self::Error>;
}

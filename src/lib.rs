//! Run one SQL query inside a serializable, read-only transaction and dump its result set as a
//! JSON array of objects.
//!
//! Each cell is encoded according to its column's SQL type, never its runtime value: character
//! columns become strings, integer columns integers, numeric columns exact decimals, temporal
//! columns ISO 8601 strings. Binary data is replaced by `"<BLOB>"` and any other type by its
//! declared name in angle brackets.
//!
//! The pieces can be used on their own: [`encode_cell`] maps one cell, [`encode_document`] drains
//! a [`Cursor`], [`QueryExecutor`] runs a query on a backend and [`export()`] performs a whole run
//! from a [`Config`].

pub mod backend;
mod cell;
pub mod config;
mod conv;
mod document;
pub mod error;
mod executor;
pub mod export;
mod location;
pub mod output;
pub mod script;
mod types;

pub use self::cell::{encode_cell, Cell, RowAccess, BLOB_PLACEHOLDER};
pub use self::config::Config;
pub use self::document::{encode_document, Cursor, Document, EncodedRow};
pub use self::error::{CellError, ExportError};
pub use self::executor::{ExecutorState, QueryExecutor};
pub use self::export::{export, Outcome};
pub use self::location::{Location, IN_MEMORY};
pub use self::types::{Column, SqlType};

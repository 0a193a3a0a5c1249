use std::io::{self, Read};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags, Row, Rows, Statement};
use serde_json::Number;

use crate::backend::{DatabaseBackend, QueryBackend};
use crate::cell::RowAccess;
use crate::conv;
use crate::document::Cursor;
use crate::error::{settle, CellError, ExportError, ReleaseFailure, Resource};
use crate::types::{Column, SqlType};
use crate::Location;

/// The declared type reported for result columns SQLite has no declared type for, such as
/// expressions and aggregates.
pub(crate) const UNDECLARED_TYPE: &str = "ANY";

/// A backend utilizing SQLite.
#[derive(Debug)]
pub struct Sqlite {
    location: Location,
}

impl DatabaseBackend for Sqlite {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn at_location(location: Location) -> Result<Self, Self::Error> {
        Ok(Self { location })
    }

    fn location(&self) -> &Location {
        &self.location
    }

    /// On-disk databases are opened read-only and must already exist.
    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        match &self.location {
            Location::InMemory => Connection::open_in_memory(),
            Location::OnDisk { path } => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            ),
        }
    }
}

impl QueryBackend for Sqlite {
    fn begin_read(connection: &Connection) -> Result<(), Self::Error> {
        // SQLite transactions are serializable unless shared-cache dirty reads are enabled.
        connection.execute_batch(
            "PRAGMA read_uncommitted = false;
             PRAGMA query_only = true;
             BEGIN DEFERRED TRANSACTION;",
        )
    }

    fn execute<T>(
        connection: &Connection,
        sql: &str,
        consume: impl FnOnce(&[Column], &mut dyn Cursor) -> Result<T, ExportError>,
    ) -> Result<T, ExportError> {
        let mut statement = prepare_single(connection, sql)?;
        let columns = describe(&statement);

        let outcome = if statement.readonly() {
            match statement.query([]) {
                Ok(mut rows) => consume(&columns, &mut rows),
                Err(err) => Err(ExportError::query(err)),
            }
        } else {
            Err(ExportError::query("the statement would modify the database"))
        };

        let finalized = statement
            .finalize()
            .map_err(|err| ReleaseFailure::new(Resource::Statement, err));
        settle(outcome, [finalized])
    }

    fn rollback(connection: &Connection) -> Result<(), Self::Error> {
        if connection.is_autocommit() {
            return Ok(());
        }
        connection.execute_batch("ROLLBACK")
    }

    fn close(connection: Connection) -> Result<(), Self::Error> {
        connection.close().map_err(|(_connection, err)| err)
    }
}

/// Prepare the only statement of `sql`.
///
/// Blank statements and comments are skipped. A script with no statement, or with anything after
/// the first one, is a query error.
fn prepare_single<'conn>(
    connection: &'conn Connection,
    sql: &str,
) -> Result<Statement<'conn>, ExportError> {
    let mut batch = Batch::new(connection, sql);
    let Some(statement) = batch.next().map_err(ExportError::query)? else {
        return Err(ExportError::query("the script holds no SQL statement"));
    };
    match batch.next() {
        Ok(None) => Ok(statement),
        Ok(Some(_)) | Err(_) => Err(ExportError::query(
            "the script holds more than one SQL statement",
        )),
    }
}

/// Read the column descriptors of a prepared statement.
fn describe(statement: &Statement<'_>) -> Vec<Column> {
    statement
        .columns()
        .iter()
        .map(|column| match column.decl_type() {
            Some(declared) => Column::declared(column.name(), declared),
            None => Column {
                name: column.name().to_owned(),
                sql_type: SqlType::Other,
                declared_type_name: UNDECLARED_TYPE.to_owned(),
            },
        })
        .collect()
}

impl Cursor for Rows<'_> {
    fn next_row(&mut self) -> Result<Option<&dyn RowAccess>, CellError> {
        Ok(self.next()?.map(|row| row as &dyn RowAccess))
    }
}

fn mismatch(index: usize, expected: &'static str, value: ValueRef<'_>) -> CellError {
    CellError::conversion(index, expected, format_args!("{} value", value.data_type()))
}

fn text<'a>(
    index: usize,
    expected: &'static str,
    bytes: &'a [u8],
) -> Result<&'a str, CellError> {
    std::str::from_utf8(bytes).map_err(|_| CellError::conversion(index, expected, "invalid UTF-8"))
}

/// Apply `parse` to a text value, failing with a conversion error when it yields nothing.
fn parse_text<T>(
    index: usize,
    expected: &'static str,
    value: ValueRef<'_>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, CellError> {
    let ValueRef::Text(bytes) = value else {
        return Err(mismatch(index, expected, value));
    };
    let raw = text(index, expected, bytes)?;
    parse(raw)
        .map(Some)
        .ok_or_else(|| CellError::conversion(index, expected, format_args!("text {raw:?}")))
}

impl RowAccess for Row<'_> {
    fn get_string(&self, index: usize) -> Result<Option<String>, CellError> {
        const EXPECTED: &str = "a string";
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            ValueRef::Integer(value) => Ok(Some(value.to_string())),
            ValueRef::Real(value) => Ok(Some(value.to_string())),
            ValueRef::Text(bytes) => Ok(Some(text(index, EXPECTED, bytes)?.to_owned())),
            value @ ValueRef::Blob(_) => Err(mismatch(index, EXPECTED, value)),
        }
    }

    fn get_integer(&self, index: usize) -> Result<Option<i64>, CellError> {
        const EXPECTED: &str = "an integer";
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            ValueRef::Integer(value) => Ok(Some(value)),
            value @ ValueRef::Real(real) => conv::integer_from_f64(real)
                .map(Some)
                .ok_or_else(|| mismatch(index, EXPECTED, value)),
            value => parse_text(index, EXPECTED, value, |raw| raw.trim().parse().ok()),
        }
    }

    fn get_decimal(&self, index: usize) -> Result<Option<Number>, CellError> {
        const EXPECTED: &str = "a decimal";
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            ValueRef::Integer(value) => Ok(Some(Number::from(value))),
            value @ ValueRef::Real(real) => conv::number_from_display(real)
                .map(Some)
                .ok_or_else(|| mismatch(index, EXPECTED, value)),
            value => parse_text(index, EXPECTED, value, conv::number_from_text),
        }
    }

    fn get_date(&self, index: usize) -> Result<Option<NaiveDate>, CellError> {
        const EXPECTED: &str = "a date";
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            value @ ValueRef::Integer(seconds) => conv::timestamp_from_unix(seconds, 0)
                .map(|stamp| Some(stamp.date()))
                .ok_or_else(|| mismatch(index, EXPECTED, value)),
            value => parse_text(index, EXPECTED, value, conv::date_from_text),
        }
    }

    fn get_timestamp(&self, index: usize) -> Result<Option<NaiveDateTime>, CellError> {
        const EXPECTED: &str = "a timestamp";
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            value @ ValueRef::Integer(seconds) => conv::timestamp_from_unix(seconds, 0)
                .map(Some)
                .ok_or_else(|| mismatch(index, EXPECTED, value)),
            value => parse_text(index, EXPECTED, value, conv::timestamp_from_text),
        }
    }

    fn get_time(&self, index: usize) -> Result<Option<NaiveTime>, CellError> {
        const EXPECTED: &str = "a time";
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            value => parse_text(index, EXPECTED, value, conv::time_from_text),
        }
    }

    fn get_character_stream(
        &self,
        index: usize,
    ) -> Result<Option<Box<dyn Read + '_>>, CellError> {
        let stream: Box<dyn Read + '_> = match self.get_ref(index)? {
            ValueRef::Null => return Ok(None),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Box::new(bytes),
            ValueRef::Integer(value) => Box::new(io::Cursor::new(value.to_string())),
            ValueRef::Real(value) => Box::new(io::Cursor::new(value.to_string())),
        };
        Ok(Some(stream))
    }
}

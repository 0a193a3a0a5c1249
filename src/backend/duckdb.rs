use std::io::{self, Read};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use duckdb::arrow::datatypes::DataType;
use duckdb::types::{TimeUnit, Value};
use duckdb::{AccessMode, Config, Connection, Row, Rows, Statement};
use serde_json::Number;

use crate::backend::{DatabaseBackend, QueryBackend};
use crate::cell::RowAccess;
use crate::conv;
use crate::document::Cursor;
use crate::error::{CellError, ExportError};
use crate::types::{Column, SqlType};
use crate::Location;

/// A backend utilizing DuckDB.
#[derive(Debug)]
pub struct DuckDb {
    location: Location,
}

impl DatabaseBackend for DuckDb {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn at_location(location: Location) -> Result<Self, Self::Error> {
        Ok(Self { location })
    }

    fn location(&self) -> &Location {
        &self.location
    }

    /// On-disk databases are opened read-only.
    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        match &self.location {
            Location::InMemory => Connection::open_in_memory(),
            Location::OnDisk { path } => {
                let config = Config::default().access_mode(AccessMode::ReadOnly)?;
                Connection::open_with_flags(path, config)
            }
        }
    }
}

impl QueryBackend for DuckDb {
    // DuckDB transactions always run with snapshot isolation, which is serializable. There is no
    // per-transaction read-only switch; on-disk databases are opened read-only instead.
    fn begin_read(connection: &Connection) -> Result<(), Self::Error> {
        connection.execute_batch("BEGIN TRANSACTION")
    }

    fn execute<T>(
        connection: &Connection,
        sql: &str,
        consume: impl FnOnce(&[Column], &mut dyn Cursor) -> Result<T, ExportError>,
    ) -> Result<T, ExportError> {
        let mut statement = connection.prepare(sql).map_err(ExportError::query)?;
        // DuckDB only knows the result schema once the statement has run.
        let mut rows = statement.query([]).map_err(ExportError::query)?;
        let columns = rows.as_ref().map(describe).unwrap_or_default();
        consume(&columns, &mut rows)
    }

    fn rollback(connection: &Connection) -> Result<(), Self::Error> {
        connection.execute_batch("ROLLBACK")
    }

    fn close(connection: Connection) -> Result<(), Self::Error> {
        connection.close().map_err(|(_connection, err)| err)
    }
}

/// Read the column descriptors of an executed statement.
fn describe(statement: &Statement<'_>) -> Vec<Column> {
    statement
        .column_names()
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let (sql_type, declared_type_name) = classify(&statement.column_type(index));
            Column {
                name,
                sql_type,
                declared_type_name,
            }
        })
        .collect()
}

/// Map a result column's Arrow type to its SQL type and DuckDB's name for it.
fn classify(data_type: &DataType) -> (SqlType, String) {
    let (sql_type, name) = match data_type {
        DataType::Null => (SqlType::Null, "NULL"),
        DataType::Boolean => (SqlType::Boolean, "BOOLEAN"),
        DataType::Int8 => (SqlType::TinyInt, "TINYINT"),
        DataType::Int16 => (SqlType::SmallInt, "SMALLINT"),
        DataType::Int32 => (SqlType::Integer, "INTEGER"),
        DataType::Int64 => (SqlType::BigInt, "BIGINT"),
        // Unsigned values are read into the next wider signed type.
        DataType::UInt8 => (SqlType::SmallInt, "UTINYINT"),
        DataType::UInt16 => (SqlType::Integer, "USMALLINT"),
        DataType::UInt32 => (SqlType::BigInt, "UINTEGER"),
        DataType::UInt64 => (SqlType::Numeric, "UBIGINT"),
        DataType::Float16 | DataType::Float32 => (SqlType::Real, "FLOAT"),
        DataType::Float64 => (SqlType::Double, "DOUBLE"),
        DataType::Decimal128(precision, scale) | DataType::Decimal256(precision, scale) => {
            return (SqlType::Decimal, format!("DECIMAL({precision},{scale})"));
        }
        DataType::Utf8 | DataType::LargeUtf8 => (SqlType::VarChar, "VARCHAR"),
        DataType::Dictionary(..) => (SqlType::VarChar, "ENUM"),
        DataType::Date32 | DataType::Date64 => (SqlType::Date, "DATE"),
        DataType::Time32(_) | DataType::Time64(_) => (SqlType::Time, "TIME"),
        DataType::Timestamp(_, None) => (SqlType::Timestamp, "TIMESTAMP"),
        DataType::Timestamp(_, Some(_)) => {
            (SqlType::TimestampWithTimeZone, "TIMESTAMP WITH TIME ZONE")
        }
        DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => {
            (SqlType::Blob, "BLOB")
        }
        DataType::Interval(_) => (SqlType::Other, "INTERVAL"),
        DataType::List(_) | DataType::LargeList(_) => (SqlType::Array, "LIST"),
        DataType::FixedSizeList(..) => (SqlType::Array, "ARRAY"),
        DataType::Struct(_) => (SqlType::Struct, "STRUCT"),
        DataType::Map(..) => (SqlType::Other, "MAP"),
        DataType::Union(..) => (SqlType::Other, "UNION"),
        other => return (SqlType::Other, other.to_string().to_uppercase()),
    };
    (sql_type, name.to_owned())
}

impl Cursor for Rows<'_> {
    fn next_row(&mut self) -> Result<Option<&dyn RowAccess>, CellError> {
        Ok(self.next()?.map(|row| row as &dyn RowAccess))
    }
}

/// A short description of a stored value for conversion errors.
fn found(value: &Value) -> String {
    const LIMIT: usize = 48;
    let debug = format!("{value:?}");
    match debug.char_indices().nth(LIMIT) {
        Some((end, _)) => format!("{}...", &debug[..end]),
        None => debug,
    }
}

fn mismatch(index: usize, expected: &'static str, value: &Value) -> CellError {
    CellError::conversion(index, expected, found(value))
}

/// Split a time value into whole seconds and nanoseconds.
fn split(unit: &TimeUnit, value: i64) -> (i64, u32) {
    let per_second = match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    };
    conv::split_epoch(per_second, value)
}

fn timestamp(unit: &TimeUnit, value: i64) -> Option<NaiveDateTime> {
    let (seconds, nanos) = split(unit, value);
    conv::timestamp_from_unix(seconds, nanos)
}

/// Read column `index` of `row` and apply `convert` to anything but NULL, failing with a
/// conversion error when it yields nothing.
fn read<T>(
    row: &Row<'_>,
    index: usize,
    expected: &'static str,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> Result<Option<T>, CellError> {
    let value = row.get::<_, Value>(index)?;
    if matches!(value, Value::Null) {
        return Ok(None);
    }
    convert(&value)
        .map(Some)
        .ok_or_else(|| mismatch(index, expected, &value))
}

impl RowAccess for Row<'_> {
    fn get_string(&self, index: usize) -> Result<Option<String>, CellError> {
        read(self, index, "a string", |value| match value {
            Value::Text(text) | Value::Enum(text) => Some(text.clone()),
            Value::Boolean(value) => Some(value.to_string()),
            Value::TinyInt(value) => Some(value.to_string()),
            Value::SmallInt(value) => Some(value.to_string()),
            Value::Int(value) => Some(value.to_string()),
            Value::BigInt(value) => Some(value.to_string()),
            Value::HugeInt(value) => Some(value.to_string()),
            Value::UTinyInt(value) => Some(value.to_string()),
            Value::USmallInt(value) => Some(value.to_string()),
            Value::UInt(value) => Some(value.to_string()),
            Value::UBigInt(value) => Some(value.to_string()),
            Value::Float(value) => Some(value.to_string()),
            Value::Double(value) => Some(value.to_string()),
            Value::Decimal(value) => Some(value.to_string()),
            _ => None,
        })
    }

    fn get_integer(&self, index: usize) -> Result<Option<i64>, CellError> {
        read(self, index, "an integer", |value| match value {
            Value::TinyInt(value) => Some(i64::from(*value)),
            Value::SmallInt(value) => Some(i64::from(*value)),
            Value::Int(value) => Some(i64::from(*value)),
            Value::BigInt(value) => Some(*value),
            Value::HugeInt(value) => i64::try_from(*value).ok(),
            Value::UTinyInt(value) => Some(i64::from(*value)),
            Value::USmallInt(value) => Some(i64::from(*value)),
            Value::UInt(value) => Some(i64::from(*value)),
            Value::UBigInt(value) => i64::try_from(*value).ok(),
            Value::Float(value) => conv::integer_from_f64(f64::from(*value)),
            Value::Double(value) => conv::integer_from_f64(*value),
            Value::Decimal(value) if value.fract().is_zero() => i64::try_from(*value).ok(),
            Value::Text(text) => text.trim().parse().ok(),
            _ => None,
        })
    }

    fn get_decimal(&self, index: usize) -> Result<Option<Number>, CellError> {
        read(self, index, "a decimal", |value| match value {
            Value::Decimal(value) => conv::number_from_display(value),
            Value::TinyInt(value) => Some(Number::from(*value)),
            Value::SmallInt(value) => Some(Number::from(*value)),
            Value::Int(value) => Some(Number::from(*value)),
            Value::BigInt(value) => Some(Number::from(*value)),
            Value::HugeInt(value) => conv::number_from_display(value),
            Value::UTinyInt(value) => Some(Number::from(*value)),
            Value::USmallInt(value) => Some(Number::from(*value)),
            Value::UInt(value) => Some(Number::from(*value)),
            Value::UBigInt(value) => Some(Number::from(*value)),
            // The shortest `f32` form, so `0.1` stays `0.1` instead of its `f64` widening.
            Value::Float(value) => conv::number_from_display(value),
            Value::Double(value) => conv::number_from_display(value),
            Value::Text(text) => conv::number_from_text(text),
            _ => None,
        })
    }

    fn get_date(&self, index: usize) -> Result<Option<NaiveDate>, CellError> {
        read(self, index, "a date", |value| match value {
            Value::Date32(days) => conv::date_from_unix_days(*days),
            Value::Timestamp(unit, value) => timestamp(unit, *value).map(|stamp| stamp.date()),
            Value::Text(text) => conv::date_from_text(text),
            _ => None,
        })
    }

    fn get_timestamp(&self, index: usize) -> Result<Option<NaiveDateTime>, CellError> {
        read(self, index, "a timestamp", |value| match value {
            Value::Timestamp(unit, value) => timestamp(unit, *value),
            Value::Date32(days) => {
                conv::date_from_unix_days(*days).and_then(|date| date.and_hms_opt(0, 0, 0))
            }
            Value::Text(text) => conv::timestamp_from_text(text),
            _ => None,
        })
    }

    fn get_time(&self, index: usize) -> Result<Option<NaiveTime>, CellError> {
        read(self, index, "a time", |value| match value {
            Value::Time64(unit, value) => {
                let (seconds, nanos) = split(unit, *value);
                conv::time_from_midnight(seconds, nanos)
            }
            Value::Timestamp(unit, value) => timestamp(unit, *value).map(|stamp| stamp.time()),
            Value::Text(text) => conv::time_from_text(text),
            _ => None,
        })
    }

    fn get_character_stream(
        &self,
        index: usize,
    ) -> Result<Option<Box<dyn Read + '_>>, CellError> {
        let stream: Box<dyn Read + '_> = match self.get::<_, Value>(index)? {
            Value::Null => return Ok(None),
            Value::Text(text) | Value::Enum(text) => Box::new(io::Cursor::new(text)),
            Value::Blob(bytes) => Box::new(io::Cursor::new(bytes)),
            value => return Err(mismatch(index, "a character stream", &value)),
        };
        Ok(Some(stream))
    }
}

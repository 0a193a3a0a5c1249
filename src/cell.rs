//! Encoding a single cell according to its column's SQL type.

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};

use crate::error::CellError;
use crate::types::{Column, SqlType};

/// The placeholder written in place of binary data.
pub const BLOB_PLACEHOLDER: &str = "<BLOB>";

/// Typed access to the cells of the row a cursor is positioned on.
///
/// Every accessor returns `Ok(None)` for SQL NULL. Indices are zero-based.
pub trait RowAccess {
    /// Read the cell as a character string.
    fn get_string(&self, index: usize) -> Result<Option<String>, CellError>;

    /// Read the cell as a national character string.
    fn get_nstring(&self, index: usize) -> Result<Option<String>, CellError> {
        self.get_string(index)
    }

    /// Read the cell as an integer.
    fn get_integer(&self, index: usize) -> Result<Option<i64>, CellError>;

    /// Read the cell as an exact decimal, holding every digit the database reported.
    fn get_decimal(&self, index: usize) -> Result<Option<Number>, CellError>;

    /// Read the cell as a calendar date.
    fn get_date(&self, index: usize) -> Result<Option<NaiveDate>, CellError>;

    /// Read the cell as a timestamp. Zoned values are normalized to UTC.
    fn get_timestamp(&self, index: usize) -> Result<Option<NaiveDateTime>, CellError>;

    /// Read the cell as a time of day.
    fn get_time(&self, index: usize) -> Result<Option<NaiveTime>, CellError>;

    /// Open the cell as a stream of UTF-8 characters.
    fn get_character_stream(&self, index: usize)
        -> Result<Option<Box<dyn Read + '_>>, CellError>;

    /// Open the cell as a stream of national characters, also UTF-8.
    fn get_ncharacter_stream(
        &self,
        index: usize,
    ) -> Result<Option<Box<dyn Read + '_>>, CellError> {
        self.get_character_stream(index)
    }
}

/// The JSON-compatible value produced for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// SQL NULL, or a column of the NULL type.
    Null,
    /// Character data.
    String(String),
    /// An exact integer.
    Integer(i64),
    /// An exact decimal of any magnitude, written as a JSON number without rounding.
    Decimal(Number),
    /// A calendar date.
    Date(NaiveDate),
    /// A date and time without zone.
    Timestamp(NaiveDateTime),
    /// A time of day.
    Time(NaiveTime),
    /// A fixed stand-in for data that is not serialized, e.g. `<BLOB>`.
    Placeholder(String),
}

impl Cell {
    /// Convert to a JSON value.
    ///
    /// Dates render as `YYYY-MM-DD`, times as `HH:MM:SS` and timestamps as `YYYY-MM-DDTHH:MM:SS`,
    /// each followed by a fractional part only when it is non-zero.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::String(value) | Self::Placeholder(value) => Value::String(value),
            Self::Integer(value) => Value::Number(value.into()),
            Self::Decimal(value) => Value::Number(value),
            Self::Date(value) => Value::String(value.format("%Y-%m-%d").to_string()),
            Self::Timestamp(value) => {
                Value::String(value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Self::Time(value) => Value::String(value.format("%H:%M:%S%.f").to_string()),
        }
    }
}

/// Produce the cell for `column` at `index` of the current row.
///
/// The shape of the result depends only on the column's [`SqlType`], never on the stored value.
pub fn encode_cell(
    column: &Column,
    index: usize,
    row: &(impl RowAccess + ?Sized),
) -> Result<Cell, CellError> {
    let cell = match column.sql_type {
        SqlType::Char | SqlType::VarChar | SqlType::LongVarChar => {
            row.get_string(index)?.map(Cell::String)
        }
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
            row.get_integer(index)?.map(Cell::Integer)
        }
        SqlType::Numeric | SqlType::Decimal | SqlType::Double => {
            row.get_decimal(index)?.map(Cell::Decimal)
        }
        SqlType::Date => row.get_date(index)?.map(Cell::Date),
        SqlType::Timestamp | SqlType::TimestampWithTimeZone => {
            row.get_timestamp(index)?.map(Cell::Timestamp)
        }
        SqlType::Time | SqlType::TimeWithTimeZone => row.get_time(index)?.map(Cell::Time),
        SqlType::NChar | SqlType::NVarChar | SqlType::LongNVarChar => {
            row.get_nstring(index)?.map(Cell::String)
        }
        SqlType::Clob => drain(index, row.get_character_stream(index)?)?.map(Cell::String),
        SqlType::NClob => drain(index, row.get_ncharacter_stream(index)?)?.map(Cell::String),
        SqlType::Blob | SqlType::Binary => Some(Cell::Placeholder(BLOB_PLACEHOLDER.to_owned())),
        SqlType::Null => None,
        SqlType::Bit
        | SqlType::Float
        | SqlType::Real
        | SqlType::VarBinary
        | SqlType::LongVarBinary
        | SqlType::Other
        | SqlType::JavaObject
        | SqlType::Distinct
        | SqlType::Struct
        | SqlType::Array
        | SqlType::Ref
        | SqlType::DataLink
        | SqlType::Boolean
        | SqlType::RowId
        | SqlType::SqlXml
        | SqlType::RefCursor => Some(Cell::Placeholder(format!(
            "<{}>",
            column.declared_type_name
        ))),
    };

    Ok(cell.unwrap_or(Cell::Null))
}

/// Read a character stream to exhaustion. An absent stream stays absent.
fn drain(index: usize, stream: Option<Box<dyn Read + '_>>) -> Result<Option<String>, CellError> {
    let Some(mut stream) = stream else {
        return Ok(None);
    };
    let mut text = String::new();
    let _len = stream
        .read_to_string(&mut text)
        .map_err(|source| CellError::Stream { index, source })?;
    Ok(Some(text))
}

//! Encoding a whole result set into one JSON document.

use std::io::Write;

use serde_json::{Map, Value};

use crate::cell::{encode_cell, RowAccess};
use crate::error::CellError;
use crate::types::Column;

/// A forward-only, single-pass cursor over result rows.
pub trait Cursor {
    /// Advance to the next row and return access to it, or `None` once the rows are exhausted.
    fn next_row(&mut self) -> Result<Option<&dyn RowAccess>, CellError>;
}

/// One encoded row: column names mapped to encoded cells in column order.
pub type EncodedRow = Map<String, Value>;

/// The encoded rows of a result set, in result-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    rows: Vec<EncodedRow>,
}

impl Document {
    /// The encoded rows.
    #[must_use]
    pub fn rows(&self) -> &[EncodedRow] {
        &self.rows
    }

    /// The number of encoded rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result set had no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the document as a pretty-printed JSON array (two-space indentation).
    pub fn write_pretty<W: Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, &self.rows)
    }

    /// Convert into a JSON array value.
    #[must_use]
    pub fn into_json(self) -> Value {
        Value::Array(self.rows.into_iter().map(Value::Object).collect())
    }
}

/// Drain `cursor`, encoding every row by the given column descriptors.
///
/// The cursor is advanced but not closed. Any failure aborts the whole document.
pub fn encode_document<C>(columns: &[Column], cursor: &mut C) -> Result<Document, CellError>
where
    C: Cursor + ?Sized,
{
    let mut document = Document::default();

    while let Some(row) = cursor.next_row()? {
        let mut encoded = Map::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let value = encode_cell(column, index, row)
                .map_err(|err| err.in_column(&column.name))?
                .into_json();
            // Duplicate names keep the first position and the last value.
            let _previous = encoded.insert(column.name.clone(), value);
        }
        document.rows.push(encoded);
    }

    Ok(document)
}

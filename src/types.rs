//! Column metadata: the SQL type categories a result column can report.

use std::fmt;

/// The category of SQL type reported for a result column.
///
/// The variants follow the JDBC type codes so that descriptors coming from any client library can
/// be expressed in one vocabulary. [`SqlType::code`] and [`SqlType::from_code`] convert to and from
/// those integer codes.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Null,
    Other,
    JavaObject,
    Distinct,
    Struct,
    Array,
    Blob,
    Clob,
    Ref,
    DataLink,
    Boolean,
    RowId,
    NChar,
    NVarChar,
    LongNVarChar,
    NClob,
    SqlXml,
    RefCursor,
    TimeWithTimeZone,
    TimestampWithTimeZone,
}

/// Every variant paired with its JDBC code.
const CODES: [(SqlType, i32); 39] = [
    (SqlType::Bit, -7),
    (SqlType::TinyInt, -6),
    (SqlType::SmallInt, 5),
    (SqlType::Integer, 4),
    (SqlType::BigInt, -5),
    (SqlType::Float, 6),
    (SqlType::Real, 7),
    (SqlType::Double, 8),
    (SqlType::Numeric, 2),
    (SqlType::Decimal, 3),
    (SqlType::Char, 1),
    (SqlType::VarChar, 12),
    (SqlType::LongVarChar, -1),
    (SqlType::Date, 91),
    (SqlType::Time, 92),
    (SqlType::Timestamp, 93),
    (SqlType::Binary, -2),
    (SqlType::VarBinary, -3),
    (SqlType::LongVarBinary, -4),
    (SqlType::Null, 0),
    (SqlType::Other, 1111),
    (SqlType::JavaObject, 2000),
    (SqlType::Distinct, 2001),
    (SqlType::Struct, 2002),
    (SqlType::Array, 2003),
    (SqlType::Blob, 2004),
    (SqlType::Clob, 2005),
    (SqlType::Ref, 2006),
    (SqlType::DataLink, 70),
    (SqlType::Boolean, 16),
    (SqlType::RowId, -8),
    (SqlType::NChar, -15),
    (SqlType::NVarChar, -9),
    (SqlType::LongNVarChar, -16),
    (SqlType::NClob, 2011),
    (SqlType::SqlXml, 2009),
    (SqlType::RefCursor, 2012),
    (SqlType::TimeWithTimeZone, 2013),
    (SqlType::TimestampWithTimeZone, 2014),
];

impl SqlType {
    /// The JDBC integer code of this type.
    #[must_use]
    pub fn code(self) -> i32 {
        CODES
            .iter()
            .find_map(|&(ty, code)| (ty == self).then_some(code))
            .unwrap_or(1111)
    }

    /// Look up a type by its JDBC integer code. Unknown codes are reported as [`SqlType::Other`].
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        CODES
            .iter()
            .find_map(|&(ty, c)| (c == code).then_some(ty))
            .unwrap_or(Self::Other)
    }

    /// Classify a declared column type such as `VARCHAR(20)`, `NUMBER(10, 2)` or
    /// `TIMESTAMP WITH TIME ZONE`.
    ///
    /// Matching is case-insensitive and ignores any parenthesized length, precision or scale.
    /// Names that do not belong to a known category are [`SqlType::Other`].
    #[must_use]
    pub fn from_declared(declared: &str) -> Self {
        // Drop size and precision arguments, e.g. `TIMESTAMP(6) WITH TIME ZONE`.
        let mut base = String::with_capacity(declared.len());
        let mut depth = 0_usize;
        for ch in declared.chars() {
            match ch {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if depth == 0 => base.push(ch),
                _ => {}
            }
        }
        let normalized = base
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "BIT" => Self::Bit,
            "TINYINT" | "INT1" => Self::TinyInt,
            "SMALLINT" | "INT2" => Self::SmallInt,
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" => Self::Integer,
            "BIGINT" | "INT8" | "UNSIGNED BIG INT" => Self::BigInt,
            "FLOAT" => Self::Float,
            "REAL" | "FLOAT4" => Self::Real,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => Self::Double,
            "NUMERIC" | "NUMBER" => Self::Numeric,
            "DECIMAL" | "DEC" => Self::Decimal,
            "CHAR" | "CHARACTER" => Self::Char,
            "VARCHAR" | "VARCHAR2" | "CHARACTER VARYING" | "VARYING CHARACTER" | "STRING" => {
                Self::VarChar
            }
            "TEXT" | "LONG" | "LONG VARCHAR" => Self::LongVarChar,
            "NCHAR" | "NATIVE CHARACTER" | "NATIONAL CHARACTER" => Self::NChar,
            "NVARCHAR" | "NVARCHAR2" | "NATIONAL CHARACTER VARYING" => Self::NVarChar,
            "NTEXT" | "LONG NVARCHAR" => Self::LongNVarChar,
            "CLOB" | "CHARACTER LARGE OBJECT" => Self::Clob,
            "NCLOB" | "NATIONAL CHARACTER LARGE OBJECT" => Self::NClob,
            "DATE" => Self::Date,
            "TIME" | "TIME WITHOUT TIME ZONE" => Self::Time,
            "TIME WITH TIME ZONE" | "TIMETZ" => Self::TimeWithTimeZone,
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP WITHOUT TIME ZONE" => Self::Timestamp,
            "TIMESTAMP WITH TIME ZONE" | "TIMESTAMPTZ" | "TIMESTAMP WITH LOCAL TIME ZONE" => {
                Self::TimestampWithTimeZone
            }
            "BINARY" | "RAW" => Self::Binary,
            "VARBINARY" | "BINARY VARYING" => Self::VarBinary,
            "LONG RAW" | "LONGVARBINARY" => Self::LongVarBinary,
            "BLOB" | "BINARY LARGE OBJECT" | "BYTEA" => Self::Blob,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "ROWID" | "UROWID" => Self::RowId,
            "XML" | "XMLTYPE" => Self::SqlXml,
            "NULL" => Self::Null,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bit => "BIT",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Real => "REAL",
            Self::Double => "DOUBLE",
            Self::Numeric => "NUMERIC",
            Self::Decimal => "DECIMAL",
            Self::Char => "CHAR",
            Self::VarChar => "VARCHAR",
            Self::LongVarChar => "LONGVARCHAR",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Binary => "BINARY",
            Self::VarBinary => "VARBINARY",
            Self::LongVarBinary => "LONGVARBINARY",
            Self::Null => "NULL",
            Self::Other => "OTHER",
            Self::JavaObject => "JAVA_OBJECT",
            Self::Distinct => "DISTINCT",
            Self::Struct => "STRUCT",
            Self::Array => "ARRAY",
            Self::Blob => "BLOB",
            Self::Clob => "CLOB",
            Self::Ref => "REF",
            Self::DataLink => "DATALINK",
            Self::Boolean => "BOOLEAN",
            Self::RowId => "ROWID",
            Self::NChar => "NCHAR",
            Self::NVarChar => "NVARCHAR",
            Self::LongNVarChar => "LONGNVARCHAR",
            Self::NClob => "NCLOB",
            Self::SqlXml => "SQLXML",
            Self::RefCursor => "REF_CURSOR",
            Self::TimeWithTimeZone => "TIME_WITH_TIMEZONE",
            Self::TimestampWithTimeZone => "TIMESTAMP_WITH_TIMEZONE",
        })
    }
}

/// Metadata for one result column, read once per query and reused for every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// The column label as reported by the database. Used as the JSON key.
    pub name: String,
    /// The category the column's values are encoded by.
    pub sql_type: SqlType,
    /// The type name as declared or reported by the database, e.g. `VARCHAR(20)`.
    pub declared_type_name: String,
}

impl Column {
    /// Describe a column from its declared type name.
    pub fn declared(name: impl Into<String>, declared_type_name: impl Into<String>) -> Self {
        let declared_type_name = declared_type_name.into();
        Self {
            name: name.into(),
            sql_type: SqlType::from_declared(&declared_type_name),
            declared_type_name,
        }
    }
}

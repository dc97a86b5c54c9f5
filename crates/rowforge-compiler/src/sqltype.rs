// SQL type resolution: declared type -> storage class and row accessor.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::DeclaredType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stored value is read back out of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reader {
    Integer,
    Real,
    Text,
    Bytes,
    /// Stored as epoch milliseconds.
    Date,
    /// Raw bytes handed to the opaque deserializer.
    Opaque,
}

impl Reader {
    /// Name of the row accessor used for this reader.
    pub fn accessor(&self) -> &'static str {
        match self {
            Reader::Integer | Reader::Date => "integer",
            Reader::Real => "real",
            Reader::Text => "text",
            Reader::Bytes | Reader::Opaque => "bytes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    pub storage: SqlType,
    pub reader: Reader,
}

/// Resolves a declared type. `None` means the type has no mapping.
pub fn resolve(declared: &DeclaredType) -> Option<Resolved> {
    let (storage, reader) = match declared {
        DeclaredType::Int8
        | DeclaredType::Int16
        | DeclaredType::Int32
        | DeclaredType::Int64
        | DeclaredType::UInt8
        | DeclaredType::UInt16
        | DeclaredType::UInt32
        | DeclaredType::Boolean => (SqlType::Integer, Reader::Integer),
        DeclaredType::Float32 | DeclaredType::Float64 => (SqlType::Real, Reader::Real),
        DeclaredType::Char | DeclaredType::Text => (SqlType::Text, Reader::Text),
        DeclaredType::Bytes => (SqlType::Blob, Reader::Bytes),
        DeclaredType::DateTime => (SqlType::Integer, Reader::Date),
        DeclaredType::Object(_) => (SqlType::Blob, Reader::Opaque),
        // relations hold the id of the related row
        DeclaredType::OneToOne(_) | DeclaredType::OneToMany(_) => {
            (SqlType::Integer, Reader::Integer)
        }
        DeclaredType::Unsupported(_) => return None,
    };
    Some(Resolved { storage, reader })
}

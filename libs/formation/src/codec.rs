//! Persistence codec for scalar values.
//!
//! Storage drivers hand back column values in whatever representation the
//! wire protocol used. [`StorageValue`] names those representations and
//! [`StorageScalar`] is the capability a type implements to travel through
//! them. Decoding from a representation the type does not understand is an
//! error, never a silent no-op.

use bytes::Bytes;

use crate::error::CodecError;

/// A raw column value as read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageValue<'a> {
    Null,
    Bytes(&'a [u8]),
    Text(&'a str),
    Int(i64),
    Bool(bool),
}

impl StorageValue<'_> {
    /// Name of the representation, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
        }
    }
}

/// A value that can be written to and read back from a single column.
pub trait StorageScalar: Sized {
    /// Name used in decode errors.
    const TARGET: &'static str;

    /// Encodes the value. Never fails.
    fn to_storage_value(&self) -> Bytes;

    /// Decodes a value read from storage.
    fn from_storage_value(value: StorageValue<'_>) -> Result<Self, CodecError>;
}

/// Decodes a byte source as UTF-8 text, rejecting every other representation.
pub(crate) fn utf8_bytes<'a>(
    target: &'static str,
    value: StorageValue<'a>,
) -> Result<&'a str, CodecError> {
    match value {
        StorageValue::Bytes(raw) => {
            std::str::from_utf8(raw).map_err(|e| CodecError::InvalidUtf8 {
                target,
                message: e.to_string(),
            })
        }
        other => Err(CodecError::UnexpectedRepresentation {
            target,
            found: other.kind(),
        }),
    }
}

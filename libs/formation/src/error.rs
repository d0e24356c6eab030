//! Error types for the formation core.

use thiserror::Error;

use crate::process::ProcessType;

/// A constraint spec could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstraintsError {
    /// The spec is neither a preset name nor `<cpu>:<size>`.
    #[error("invalid constraints '{spec}': expected 1X, 2X, PX or <cpu-share>:<size>")]
    InvalidFormat { spec: String },

    /// The CPU share part is not an unsigned integer.
    #[error("invalid cpu share '{value}' in constraints '{spec}'")]
    InvalidCpuShare { spec: String, value: String },

    /// The memory part is not a size literal.
    #[error("invalid memory size '{value}': {reason}")]
    InvalidSize { value: String, reason: &'static str },

    /// An empty spec where a concrete value is required.
    #[error("constraints cannot be empty")]
    Empty,
}

/// A persisted value could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The storage layer handed over a representation the target cannot
    /// be decoded from.
    #[error("cannot decode {target} from {found} value")]
    UnexpectedRepresentation {
        target: &'static str,
        found: &'static str,
    },

    /// Byte source is not valid UTF-8.
    #[error("{target} is not valid UTF-8: {message}")]
    InvalidUtf8 {
        target: &'static str,
        message: String,
    },

    /// hstore text does not follow the composite grammar.
    #[error("malformed hstore at byte {position}: {reason}")]
    Malformed {
        position: usize,
        reason: &'static str,
    },

    /// hstore entry carries NULL where a command is required.
    #[error("hstore key '{key}' has a NULL value")]
    NullValue { key: String },

    /// hstore text repeats a key.
    #[error("hstore key '{key}' appears more than once")]
    DuplicateKey { key: String },
}

/// Errors from operator-driven formation changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormationError {
    /// The formation has no process of the requested type.
    #[error("no process of type '{0}' in formation")]
    UnknownProcessType(ProcessType),

    /// A resize request carried a bad constraint spec.
    #[error(transparent)]
    Constraints(#[from] ConstraintsError),
}

//! Process types, commands and the per-release process row.

use std::collections::BTreeMap;

use bytes::Bytes;
use formation_id::{ProcessId, ReleaseId};
use serde::{Deserialize, Serialize};

use crate::codec::{utf8_bytes, StorageScalar, StorageValue};
use crate::constraints::{Constraints, DEFAULT_CONSTRAINTS};
use crate::error::CodecError;

/// Defines an opaque string newtype that persists as its UTF-8 bytes.
macro_rules! string_scalar {
    ($(#[$meta:meta])* $name:ident, $target:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl StorageScalar for $name {
            const TARGET: &'static str = $target;

            fn to_storage_value(&self) -> Bytes {
                Bytes::copy_from_slice(self.0.as_bytes())
            }

            fn from_storage_value(value: StorageValue<'_>) -> Result<Self, CodecError> {
                utf8_bytes(Self::TARGET, value).map(Self::new)
            }
        }
    };
}

string_scalar!(
    /// Names a class of process, e.g. `web` or `worker`.
    ProcessType,
    "process type"
);

string_scalar!(
    /// Shell command that starts one instance of a process type.
    Command,
    "command"
);

/// Desired instance counts keyed by process type.
pub type ProcessQuantityMap = BTreeMap<ProcessType, u32>;

/// Instance counts for process types seen for the first time. Types not
/// listed start at zero.
pub const DEFAULT_QUANTITIES: [(&str, u32); 1] = [("web", 1)];

/// Initial quantity for a newly declared process type.
pub fn default_quantity(process_type: &ProcessType) -> u32 {
    DEFAULT_QUANTITIES
        .iter()
        .find(|(t, _)| *t == process_type.as_str())
        .map_or(0, |(_, q)| *q)
}

/// Desired state of one process type within a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    /// Owning release. Unset until the formation is bound to a release.
    pub release_id: Option<ReleaseId>,

    /// Row identity. Assigned by the repository on first save.
    pub id: Option<ProcessId>,

    #[serde(rename = "type")]
    pub process_type: ProcessType,

    /// Desired number of running instances.
    pub quantity: u32,

    pub command: Command,

    pub constraints: Constraints,

    /// Assigned by the scheduler at runtime; never persisted.
    #[serde(skip)]
    pub port: Option<u16>,
}

impl Process {
    /// A process at its default scale and size.
    pub fn new(process_type: ProcessType, command: Command) -> Self {
        Self {
            release_id: None,
            id: None,
            quantity: default_quantity(&process_type),
            process_type,
            command,
            constraints: DEFAULT_CONSTRAINTS,
            port: None,
        }
    }
}

//! The per-release mapping of process type to command.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::codec::{StorageScalar, StorageValue};
use crate::error::CodecError;
use crate::hstore;
use crate::process::{Command, ProcessType};

/// Commands declared by a release, keyed by process type.
///
/// Persisted as a single hstore value. Iteration is sorted by type so that
/// encoding is deterministic; callers should not attach meaning to order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandMap {
    inner: BTreeMap<ProcessType, Command>,
}

impl CommandMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects a parsed process declaration (type name to command string).
    pub fn from_declaration<I, K, V>(declaration: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        declaration
            .into_iter()
            .map(|(t, c)| (ProcessType::new(t), Command::new(c)))
            .collect()
    }

    /// Returns the previous command if the type was already declared.
    pub fn insert(&mut self, process_type: ProcessType, command: Command) -> Option<Command> {
        self.inner.insert(process_type, command)
    }

    pub fn get(&self, process_type: &str) -> Option<&Command> {
        self.inner.get(process_type)
    }

    pub fn contains(&self, process_type: &str) -> bool {
        self.inner.contains_key(process_type)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProcessType, &Command)> {
        self.inner.iter()
    }

    pub fn process_types(&self) -> impl Iterator<Item = &ProcessType> {
        self.inner.keys()
    }

    /// Encodes as hstore text.
    pub fn to_hstore(&self) -> String {
        hstore::encode(self.iter().map(|(t, c)| (t.as_str(), c.as_str())))
    }

    /// Decodes hstore text. NULL commands and repeated types are rejected.
    pub fn from_hstore(text: &str) -> Result<Self, CodecError> {
        let mut map = Self::new();
        for (key, value) in hstore::decode(text)? {
            let Some(command) = value else {
                return Err(CodecError::NullValue { key });
            };
            if map.contains(&key) {
                return Err(CodecError::DuplicateKey { key });
            }
            map.insert(ProcessType::new(key), Command::new(command));
        }
        Ok(map)
    }
}

impl FromIterator<(ProcessType, Command)> for CommandMap {
    fn from_iter<T: IntoIterator<Item = (ProcessType, Command)>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CommandMap {
    type Item = (ProcessType, Command);
    type IntoIter = std::collections::btree_map::IntoIter<ProcessType, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandMap {
    type Item = (&'a ProcessType, &'a Command);
    type IntoIter = std::collections::btree_map::Iter<'a, ProcessType, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl StorageScalar for CommandMap {
    const TARGET: &'static str = "command map";

    fn to_storage_value(&self) -> Bytes {
        Bytes::from(self.to_hstore())
    }

    fn from_storage_value(value: StorageValue<'_>) -> Result<Self, CodecError> {
        match value {
            StorageValue::Text(text) => Self::from_hstore(text),
            StorageValue::Bytes(_) => {
                Self::from_hstore(crate::codec::utf8_bytes(Self::TARGET, value)?)
            }
            other => Err(CodecError::UnexpectedRepresentation {
                target: Self::TARGET,
                found: other.kind(),
            }),
        }
    }
}

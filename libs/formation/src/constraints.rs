//! Resource constraints and the named size presets.
//!
//! Operators describe a process size either by preset name (`1X`, `2X`,
//! `PX`) or literally as `<cpu-share>:<memory>`, e.g. `100:256MB`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bytesize::{self, GB, MB};
use crate::error::ConstraintsError;

/// Relative CPU weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CpuShare(pub u32);

impl fmt::Display for CpuShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Memory limit in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Memory(pub u64);

impl Memory {
    pub const fn bytes(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytesize::format_size(self.0))
    }
}

/// CPU share and memory entitlement of one process instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraints {
    pub cpu_share: CpuShare,
    pub memory: Memory,
}

pub const CONSTRAINTS_1X: Constraints = Constraints::new(256, 512 * MB);
pub const CONSTRAINTS_2X: Constraints = Constraints::new(512, GB);
pub const CONSTRAINTS_PX: Constraints = Constraints::new(1024, 6 * GB);

/// Named presets, in lookup order. Names map to distinct values.
pub const NAMED_CONSTRAINTS: [(&str, Constraints); 3] = [
    ("1X", CONSTRAINTS_1X),
    ("2X", CONSTRAINTS_2X),
    ("PX", CONSTRAINTS_PX),
];

/// Size given to a process type on its first appearance.
pub const DEFAULT_CONSTRAINTS: Constraints = CONSTRAINTS_1X;

impl Constraints {
    pub const fn new(cpu_share: u32, memory_bytes: u64) -> Self {
        Self {
            cpu_share: CpuShare(cpu_share),
            memory: Memory(memory_bytes),
        }
    }

    /// Looks up a preset by exact name.
    pub fn named(name: &str) -> Option<Self> {
        NAMED_CONSTRAINTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
    }

    /// Name of the first preset equal to this value, if any.
    pub fn preset_name(&self) -> Option<&'static str> {
        NAMED_CONSTRAINTS
            .iter()
            .find(|(_, c)| c == self)
            .map(|(n, _)| *n)
    }
}

impl Default for Constraints {
    fn default() -> Self {
        DEFAULT_CONSTRAINTS
    }
}

/// Parses an operator constraint spec.
///
/// An empty spec yields `Ok(None)`: the caller keeps the current value or
/// falls back to [`DEFAULT_CONSTRAINTS`].
pub fn parse_constraints(spec: &str) -> Result<Option<Constraints>, ConstraintsError> {
    if spec.is_empty() {
        return Ok(None);
    }

    if let Some(named) = Constraints::named(spec) {
        return Ok(Some(named));
    }

    let Some((cpu, size)) = spec.split_once(':') else {
        return Err(ConstraintsError::InvalidFormat {
            spec: spec.to_string(),
        });
    };

    if cpu.is_empty() || !cpu.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConstraintsError::InvalidCpuShare {
            spec: spec.to_string(),
            value: cpu.to_string(),
        });
    }

    let cpu_share: u32 = cpu.parse().map_err(|_| ConstraintsError::InvalidCpuShare {
        spec: spec.to_string(),
        value: cpu.to_string(),
    })?;
    let memory = bytesize::parse_size(size)?;

    Ok(Some(Constraints::new(cpu_share, memory)))
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.preset_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}:{}", self.cpu_share, self.memory),
        }
    }
}

impl FromStr for Constraints {
    type Err = ConstraintsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_constraints(s)?.ok_or(ConstraintsError::Empty)
    }
}

impl Serialize for Constraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Constraints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A resize request's size field, where `""` means "leave unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintsOverride(pub Option<Constraints>);

impl ConstraintsOverride {
    pub fn into_inner(self) -> Option<Constraints> {
        self.0
    }
}

impl Serialize for ConstraintsOverride {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(c) => serializer.collect_str(c),
            None => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for ConstraintsOverride {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_constraints(&s)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

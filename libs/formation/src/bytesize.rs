//! Binary byte-size units used by memory constraints.

use crate::error::ConstraintsError;

pub const B: u64 = 1;
pub const KB: u64 = 1 << 10;
pub const MB: u64 = 1 << 20;
pub const GB: u64 = 1 << 30;
pub const TB: u64 = 1 << 40;

/// Units in descending order, used when rendering.
const UNITS: [(&str, u64); 4] = [("TB", TB), ("GB", GB), ("MB", MB), ("KB", KB)];

fn unit_multiplier(suffix: &str) -> Option<u64> {
    match suffix.to_ascii_lowercase().as_str() {
        "" | "b" => Some(B),
        "kb" | "kib" => Some(KB),
        "mb" | "mib" => Some(MB),
        "gb" | "gib" => Some(GB),
        "tb" | "tib" => Some(TB),
        _ => None,
    }
}

/// Parses a size literal such as `256MB`, `1GiB` or `4096`.
///
/// A bare integer is a byte count.
pub fn parse_size(literal: &str) -> Result<u64, ConstraintsError> {
    let invalid = |reason| ConstraintsError::InvalidSize {
        value: literal.to_string(),
        reason,
    };

    let split = literal
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(literal.len());
    let (digits, suffix) = literal.split_at(split);

    if digits.is_empty() {
        return Err(invalid("expected a leading integer"));
    }

    let multiplier = unit_multiplier(suffix).ok_or_else(|| invalid("unknown unit"))?;
    let count: u64 = digits.parse().map_err(|_| invalid("integer out of range"))?;

    count
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("size out of range"))
}

/// Renders a byte count with the largest unit that divides it exactly.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0".to_string();
    }

    UNITS
        .iter()
        .find(|(_, unit)| bytes % unit == 0)
        .map(|(name, unit)| format!("{}{}", bytes / unit, name))
        .unwrap_or_else(|| bytes.to_string())
}

//! # formation-id
//!
//! Typed identifiers for the records the formation core persists.
//!
//! Every ID is a ULID behind a short resource prefix, rendered as
//! `{prefix}_{ulid}`:
//!
//! - `app_01HV4Z3MXNKPQR9HSTZ7WCLD4E`
//! - `rel_01HV4Z4NYPLTRS0JTUA8XDME5F`
//! - `proc_01HV4Z5PZQMVST1KVWB9YENF6G`
//!
//! The prefix keeps a release ID from being handed to a process lookup, and
//! the ULID keeps rows sortable by creation time.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;

/// Splits `{prefix}_{ulid}` and checks the prefix.
///
/// Shared by every type generated with [`define_id!`].
#[doc(hidden)]
pub fn parse_prefixed(expected: &'static str, s: &str) -> Result<Ulid, IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }

    let Some((prefix, ulid_str)) = s.split_once('_') else {
        return Err(IdError::MissingSeparator);
    };

    if prefix != expected {
        return Err(IdError::InvalidPrefix {
            expected,
            actual: prefix.to_string(),
        });
    }

    ulid_str
        .parse::<Ulid>()
        .map_err(|e| IdError::InvalidUlid(e.to_string()))
}

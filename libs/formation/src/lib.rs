//! # formation-core
//!
//! Desired-state model for application processes.
//!
//! For every release the platform decides which process types run, how
//! many instances of each, which command starts them and how much CPU and
//! memory each instance gets. This crate holds:
//!
//! - the typed values ([`ProcessType`], [`Command`], [`Constraints`]) and the
//!   constraint grammar (`1X`, `2X`, `PX` or `<cpu>:<size>`),
//! - the [`CommandMap`] a release declares and its hstore encoding,
//! - [`Formation::reconcile`], which merges the previous formation's scale
//!   with a new release's command set,
//! - the [`ProcessRepository`] capability that storage backends implement.
//!
//! ## Invariants
//!
//! - A reconciled formation has exactly the process types of its command map
//! - Quantity and constraints of surviving types carry over unchanged
//! - Every formation entry is keyed by its own process's type
//! - Preset lookups go through a fixed, ordered table

pub mod bytesize;
pub mod codec;
mod command_map;
mod constraints;
mod error;
mod formation;
pub mod hstore;
mod process;
mod repository;

pub use codec::{StorageScalar, StorageValue};
pub use command_map::CommandMap;
pub use constraints::{
    parse_constraints, Constraints, ConstraintsOverride, CpuShare, Memory, CONSTRAINTS_1X,
    CONSTRAINTS_2X, CONSTRAINTS_PX, DEFAULT_CONSTRAINTS, NAMED_CONSTRAINTS,
};
pub use error::{CodecError, ConstraintsError, FormationError};
pub use formation::Formation;
pub use process::{
    default_quantity, Command, Process, ProcessQuantityMap, ProcessType, DEFAULT_QUANTITIES,
};
pub use repository::{save_formation, MemoryProcessRepository, ProcessRepository};

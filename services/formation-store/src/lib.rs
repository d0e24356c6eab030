//! Postgres persistence for the formation core.
//!
//! Ships the `formation-migrate` binary; the library surface is what the
//! release workflow links against.

pub mod config;
pub mod db;

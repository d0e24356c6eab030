//! ID types for the formation data model.

use crate::define_id;

define_id!(
    /// An application; releases and formations are scoped to one.
    AppId,
    "app"
);

define_id!(
    /// A release: one declared command map and the formation built from it.
    ReleaseId,
    "rel"
);

define_id!(
    /// A single persisted process row.
    ProcessId,
    "proc"
);

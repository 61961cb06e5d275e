//! Everything a run produces: the log, snapshots and their serialization.

pub mod history;
pub mod snapshot;
pub mod json;

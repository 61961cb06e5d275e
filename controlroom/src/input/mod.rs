//! Loading scenarios and controller scripts.

pub mod path;
pub mod topology;
pub mod scenario;
pub mod script;

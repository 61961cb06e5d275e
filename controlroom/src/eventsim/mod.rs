//! Discrete-event simulation kernel.
//!
//! Processes are resumed when one of the events they wait on fires. Events
//! are either timeouts or value changes published through an [`Observable`].

pub mod simulation;
pub mod observable;

pub use self::simulation::*;
pub use self::observable::Observable;

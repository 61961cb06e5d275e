//! JSON and JavaScript writers for the control log.

use super::history::{self, History};
use super::snapshot::Snapshot;
use failure::Error;
use serde_json::json;
use std::io;

pub fn javascript_history<W: io::Write>(history: &History, last: &Snapshot, f: &mut W) -> Result<(), Error> {
    write!(f, "var data = ")?;
    json_history(history, last, f)?;
    write!(f, ";")?;
    Ok(())
}

/// Timed event log followed by the final state.
pub fn json_history<W: io::Write>(history: &History, last: &Snapshot, f: &mut W) -> Result<(), Error> {
    let events: Vec<_> = history::timeline(history)
        .into_iter()
        .map(|(t, ev)| json!({ "time": t, "event": ev }))
        .collect();
    let doc = json!({ "events": events, "final": last });
    serde_json::to_writer_pretty(&mut *f, &doc)?;
    Ok(())
}

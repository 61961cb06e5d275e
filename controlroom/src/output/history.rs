//! The control log recorded while a scenario runs.

use crate::railway::advisor::RecommendationId;
use crate::railway::train::TrainId;
use serde::Serialize;

#[derive(Debug, Default)]
pub struct History {
    pub events: Vec<ControlLogEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ControlLogEvent {
    Wait(f64),
    Departed(TrainId),
    Halted(TrainId),
    StoppedAt(TrainId, String),
    Redeparted(TrainId),
    RedepartureSkipped(TrainId),
    Wrapped(TrainId),
    Published { count: usize, top: Option<RecommendationId> },
    Accepted(RecommendationId),
    Overridden(RecommendationId),
    StaleDecision(RecommendationId),
}

/// Events paired with the time they happened at. `Wait` entries only move
/// the clock and are left out.
pub fn timeline(h: &History) -> Vec<(f64, &ControlLogEvent)> {
    let mut t = 0.0;
    let mut out = Vec::new();
    for ev in &h.events {
        match *ev {
            ControlLogEvent::Wait(dt) => t += dt,
            _ => out.push((t, ev)),
        }
    }
    out
}

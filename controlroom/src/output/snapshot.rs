//! Read-only views of the simulation state for a presentation layer.

use crate::input::path::Point;
use crate::railway::advisor::Recommendation;
use crate::railway::control::AcceptedRecord;
use crate::railway::ControlCenter;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct TrainView {
    pub id: String,
    pub track: String,
    pub position: f64,
    pub speed: f64,
    pub status: String,
    pub color: &'static str,
    /// Drawing coordinates; absent when the track is unknown.
    pub point: Option<Point>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub time: f64,
    pub trains: Vec<TrainView>,
    pub recommendations: Vec<Recommendation>,
    pub accepted: Vec<AcceptedRecord>,
}

pub fn snapshot(world: &ControlCenter, time: f64) -> Snapshot {
    let trains = world
        .trains
        .iter()
        .map(|t| TrainView {
            id: t.id.clone(),
            track: t.track.clone(),
            position: t.position,
            speed: t.speed,
            status: t.status.to_string(),
            color: t.display_color(),
            point: world.topology.track(&t.track).map(|track| track.path.point_at(t.position)),
        })
        .collect();
    Snapshot {
        time,
        trains,
        recommendations: world.recommendations.get().clone(),
        accepted: world.accepted.iter().cloned().collect(),
    }
}

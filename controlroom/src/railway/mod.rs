//! Control center simulation: train motion, advisories and controller
//! decisions, driven by the event simulation kernel.

pub mod train;
pub mod motion;
pub mod advisor;
pub mod decision;
pub mod control;

use crate::eventsim;
use serde::{Deserialize, Serialize};

pub use self::control::ControlCenter;

pub type Sim = eventsim::Simulation<ControlCenter>;

/// Tuning constants of the control center. Times are simulated seconds,
/// speeds km/h, positions percent of track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParams {
    pub frame_interval: f64,
    pub advisory_period: f64,
    pub dwell: f64,
    /// Notional length of the whole corridor, applied to every track.
    pub corridor_length_km: f64,
    pub departure_cap: usize,
    pub station_tolerance: f64,
    pub convergence_tolerance: f64,
    pub history_len: usize,
    pub express_threshold: f64,
}

impl Default for ControlParams {
    fn default() -> ControlParams {
        ControlParams {
            frame_interval: 0.05,
            advisory_period: 5.0,
            dwell: 20.0,
            corridor_length_km: 140.0,
            departure_cap: 3,
            station_tolerance: 1.0,
            convergence_tolerance: 5.0,
            history_len: 3,
            express_threshold: 85.0,
        }
    }
}

//! Position integration.
//!
//! Every track is measured against the same notional corridor length, so a
//! train's progress depends only on its speed and the elapsed time.

use crate::eventsim::{Process, ProcessState};
use crate::output::history::ControlLogEvent;
use crate::railway::train::{TrainId, TrainStore};
use crate::railway::{ControlCenter, Sim};
use log::debug;
use smallvec::smallvec;

/// Percentage points travelled at `speed` km/h during `dt` seconds.
pub fn position_increment(speed: f64, dt: f64, corridor_length_km: f64) -> f64 {
    if !(dt > 0.0) || !(speed > 0.0) || !(corridor_length_km > 0.0) {
        return 0.0;
    }
    let metres = speed * 1000.0 / 3600.0 * dt;
    metres / (corridor_length_km * 1000.0) * 100.0
}

pub struct Integrated {
    pub trains: TrainStore,
    /// Trains that reached the end of their track during this tick.
    pub wrapped: Vec<TrainId>,
}

/// Advance every moving train by `dt` seconds. A zero, negative or NaN
/// delta moves nothing.
pub fn integrate(trains: &TrainStore, dt: f64, corridor_length_km: f64) -> Integrated {
    let mut next = trains.clone();
    let mut wrapped = Vec::new();
    for train in next.iter_mut() {
        if !(train.speed > 0.0) {
            continue;
        }
        let pos = train.position + position_increment(train.speed, dt, corridor_length_km);
        if pos >= 100.0 {
            train.wrap();
            wrapped.push(train.id.clone());
        } else {
            train.position = pos;
        }
    }
    Integrated { trains: next, wrapped }
}

/// Runs the integrator once per frame, measuring the real interval since
/// the previous frame.
pub struct Animator {
    last: Option<f64>,
}

impl Animator {
    pub fn new() -> Animator {
        Animator { last: None }
    }
}

impl Process<ControlCenter> for Animator {
    fn resume(&mut self, sim: &mut Sim) -> ProcessState {
        let now = sim.time();
        let dt = self.last.map(|t| now - t).unwrap_or(0.0);
        self.last = Some(now);

        let world = &mut sim.world;
        let step = integrate(&world.trains, dt, world.params.corridor_length_km);
        world.trains = step.trains;
        for id in step.wrapped {
            debug!("t={:.2} {} reached the end of its track", now, id);
            (world.logger)(ControlLogEvent::Wrapped(id));
        }

        let frame = if sim.world.params.frame_interval > 1e-3 {
            sim.world.params.frame_interval
        } else {
            1e-3
        };
        ProcessState::Wait(smallvec![sim.create_timeout(frame)])
    }
}

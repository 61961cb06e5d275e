//! The control center: world state shared by every process, and the
//! recorder for the published recommendation board.

use crate::eventsim::{Observable, Process, ProcessState, Scheduler};
use crate::input::topology::Topology;
use crate::output::history::ControlLogEvent;
use crate::railway::advisor::{self, Recommendation, RecommendationId};
use crate::railway::train::{Train, TrainStore};
use crate::railway::{ControlParams, Sim};
use log::debug;
use serde::Serialize;
use smallvec::smallvec;
use std::collections::VecDeque;

pub type ControlLogger = Box<dyn Fn(ControlLogEvent)>;

#[derive(Clone, Debug, Serialize)]
pub struct AcceptedRecord {
    pub recommendation: Recommendation,
    pub accepted_at: f64,
}

/// The simulation state: topology, trains, the active advice list and the
/// accepted history. Processes and controller decisions mutate it through
/// the simulation handle.
pub struct ControlCenter {
    pub topology: Topology,
    pub params: ControlParams,
    pub trains: TrainStore,
    pub recommendations: Observable<Vec<Recommendation>>,
    pub accepted: VecDeque<AcceptedRecord>,
    pub logger: ControlLogger,
    next_id: RecommendationId,
}

impl ControlCenter {
    pub fn new(
        scheduler: &mut Scheduler,
        topology: Topology,
        roster: Vec<Train>,
        params: ControlParams,
        logger: ControlLogger,
    ) -> ControlCenter {
        ControlCenter {
            topology,
            params,
            trains: TrainStore::new(roster),
            recommendations: Observable::new(scheduler, Vec::new()),
            accepted: VecDeque::new(),
            logger,
            next_id: 0,
        }
    }

    /// Replace the active list with a freshly generated one.
    pub fn advise(&mut self, scheduler: &mut Scheduler) {
        let recs = advisor::generate(
            &self.trains,
            &self.topology,
            &self.params,
            self.recommendations.get(),
            &mut self.next_id,
        );
        debug!("advisor produced {} recommendations", recs.len());
        self.recommendations.set(scheduler, recs);
    }

    pub fn recommendation(&self, id: RecommendationId) -> Option<&Recommendation> {
        self.recommendations.get().iter().find(|r| r.id == id)
    }

    /// Drop one entry from the active list, returning it.
    pub fn withdraw(&mut self, scheduler: &mut Scheduler, id: RecommendationId) -> Option<Recommendation> {
        let mut taken = None;
        self.recommendations.update(scheduler, |list| {
            taken = list.iter().position(|r| r.id == id).map(|pos| list.remove(pos));
            taken.is_some()
        });
        taken
    }

    pub fn record_accepted(&mut self, recommendation: Recommendation, time: f64) {
        self.accepted.push_front(AcceptedRecord {
            recommendation,
            accepted_at: time,
        });
        self.accepted.truncate(self.params.history_len);
    }
}

/// Follows the published advice list and writes each new version to the log.
pub struct BoardRecorder {
    started: bool,
}

impl BoardRecorder {
    pub fn new() -> BoardRecorder {
        BoardRecorder { started: false }
    }
}

impl Process<ControlCenter> for BoardRecorder {
    fn resume(&mut self, sim: &mut Sim) -> ProcessState {
        let board = &sim.world.recommendations;
        if self.started {
            let list = board.get();
            (sim.world.logger)(ControlLogEvent::Published {
                count: list.len(),
                top: list.first().map(|r| r.id),
            });
        }
        self.started = true;
        ProcessState::Wait(smallvec![board.event()])
    }
}

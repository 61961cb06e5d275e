//! Controller decisions.
//!
//! Accepting applies the advice to the target train and moves the entry to
//! the accepted history. Overriding only drops the entry. A decision on an
//! id that is no longer active does nothing: the list may have been
//! regenerated between display and click.

use crate::eventsim::{Process, ProcessState};
use crate::output::history::ControlLogEvent;
use crate::railway::advisor::{Advice, Recommendation, RecommendationId};
use crate::railway::train::{TrainId, TrainStatus};
use crate::railway::{ControlCenter, Sim};
use log::{debug, info};
use smallvec::smallvec;

pub fn accept(sim: &mut Sim, id: RecommendationId) -> Option<Recommendation> {
    let rec = match sim.world.withdraw(&mut sim.scheduler, id) {
        Some(r) => r,
        None => {
            debug!("accept: recommendation {} is no longer active", id);
            (sim.world.logger)(ControlLogEvent::StaleDecision(id));
            return None;
        }
    };
    info!("t={:.2} accepted {} ({})", sim.time(), rec.id, rec.title);
    (sim.world.logger)(ControlLogEvent::Accepted(rec.id));

    let threshold = sim.world.params.express_threshold;
    let mut redeparture = None;
    match sim.world.trains.get_mut(&rec.train) {
        Some(train) => match rec.advice {
            Advice::Depart => {
                train.depart(threshold);
                (sim.world.logger)(ControlLogEvent::Departed(train.id.clone()));
            }
            Advice::ConvergenceHalt => {
                train.halt();
                (sim.world.logger)(ControlLogEvent::Halted(train.id.clone()));
            }
            Advice::StationStop(ref station) => {
                train.stop_at(station);
                (sim.world.logger)(ControlLogEvent::StoppedAt(train.id.clone(), station.clone()));
                redeparture = Some(Redeparture::new(train.id.clone(), train.transition));
            }
        },
        None => debug!("accept: train {} not found, nothing to apply", rec.train),
    }
    if let Some(p) = redeparture {
        sim.start_process(Box::new(p));
    }

    let now = sim.time();
    sim.world.record_accepted(rec.clone(), now);
    Some(rec)
}

pub fn override_recommendation(sim: &mut Sim, id: RecommendationId) -> Option<Recommendation> {
    match sim.world.withdraw(&mut sim.scheduler, id) {
        Some(rec) => {
            info!("t={:.2} overrode {} ({})", sim.time(), rec.id, rec.title);
            (sim.world.logger)(ControlLogEvent::Overridden(rec.id));
            Some(rec)
        }
        None => {
            debug!("override: recommendation {} is no longer active", id);
            (sim.world.logger)(ControlLogEvent::StaleDecision(id));
            None
        }
    }
}

/// Sends a train on its way again after the dwell. Applies only if the train
/// has not changed state since it was stopped.
pub struct Redeparture {
    train: TrainId,
    token: u64,
    waiting: bool,
}

impl Redeparture {
    pub fn new(train: TrainId, token: u64) -> Redeparture {
        Redeparture {
            train,
            token,
            waiting: false,
        }
    }
}

impl Process<ControlCenter> for Redeparture {
    fn resume(&mut self, sim: &mut Sim) -> ProcessState {
        if !self.waiting {
            self.waiting = true;
            let dwell = sim.world.params.dwell;
            return ProcessState::Wait(smallvec![sim.create_timeout(dwell)]);
        }

        let threshold = sim.world.params.express_threshold;
        let applied = match sim.world.trains.get_mut(&self.train) {
            Some(train) => {
                let stopped = match train.status {
                    TrainStatus::StoppedAtStation(_) => true,
                    _ => false,
                };
                if stopped && train.transition == self.token {
                    train.depart(threshold);
                    true
                } else {
                    false
                }
            }
            None => false,
        };

        if applied {
            debug!("t={:.2} {} leaves after dwell", sim.time(), self.train);
            (sim.world.logger)(ControlLogEvent::Redeparted(self.train.clone()));
        } else {
            debug!("t={:.2} {} changed state during dwell, not re-departing", sim.time(), self.train);
            (sim.world.logger)(ControlLogEvent::RedepartureSkipped(self.train.clone()));
        }
        ProcessState::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventsim::{Scheduler, Simulation};
    use crate::input::topology::{Station, Topology, Track};
    use crate::railway::advisor::AdviceKind;
    use crate::railway::train::{ColorTag, Train};
    use crate::railway::{ControlParams, ControlCenter};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sim(roster: Vec<Train>) -> (Sim, Rc<RefCell<Vec<ControlLogEvent>>>) {
        let topology = Topology::new(
            vec![
                Track::new("a", None, "M 0,0 L 100,0").unwrap(),
                Track::new("b", None, "M 0,10 L 100,10").unwrap(),
            ],
            vec![Station { name: "Mid".into(), track: "a".into(), position: 50.0 }],
            vec![],
        );
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let mut scheduler = Scheduler::new();
        let world = ControlCenter::new(
            &mut scheduler,
            topology,
            roster,
            ControlParams::default(),
            Box::new(move |e| l.borrow_mut().push(e)),
        );
        let mut sim = Simulation::new_with_scheduler(world, scheduler);
        sim.world.advise(&mut sim.scheduler);
        (sim, log)
    }

    fn find(sim: &Sim, kind: AdviceKind, train: &str) -> Option<RecommendationId> {
        sim.world
            .recommendations
            .get()
            .iter()
            .find(|r| r.advice.kind() == kind && r.train == train)
            .map(|r| r.id)
    }

    #[test]
    fn accept_depart_sets_speed_and_color() {
        let (mut sim, _) = sim(vec![Train::new("X", "a", 90.0), Train::new("Y", "b", 60.0)]);
        let id = find(&sim, AdviceKind::Depart, "X").unwrap();
        let rec = accept(&mut sim, id).unwrap();
        assert_eq!(rec.train, "X");
        let x = sim.world.trains.get("X").unwrap();
        assert_eq!(x.status, TrainStatus::EnRoute);
        assert_eq!(x.speed, 90.0);
        assert_eq!(x.color, ColorTag::Express);
        assert!(sim.world.recommendation(id).is_none());
        assert_eq!(sim.world.accepted[0].recommendation.id, id);

        // The next cycle does not propose the departure again.
        sim.world.advise(&mut sim.scheduler);
        assert!(find(&sim, AdviceKind::Depart, "X").is_none());
        assert!(find(&sim, AdviceKind::Depart, "Y").is_some());
    }

    #[test]
    fn override_is_idempotent() {
        let (mut sim, log) = sim(vec![Train::new("X", "a", 90.0)]);
        let id = find(&sim, AdviceKind::Depart, "X").unwrap();
        assert!(override_recommendation(&mut sim, id).is_some());
        let trains_after_first = format!("{:?}", sim.world.trains);
        assert!(override_recommendation(&mut sim, id).is_none());
        assert_eq!(format!("{:?}", sim.world.trains), trains_after_first);
        assert!(sim.world.recommendations.get().is_empty());
        assert!(sim.world.accepted.is_empty());
        assert_eq!(log.borrow().last(), Some(&ControlLogEvent::StaleDecision(id)));
        assert_eq!(sim.world.trains.get("X").unwrap().status, TrainStatus::AtPlatform);
    }

    #[test]
    fn stale_accept_is_a_no_op() {
        let (mut sim, _) = sim(vec![Train::new("X", "a", 90.0)]);
        assert!(accept(&mut sim, 999).is_none());
        assert_eq!(sim.world.trains.get("X").unwrap().status, TrainStatus::AtPlatform);
        assert_eq!(sim.world.recommendations.get().len(), 1);
        assert!(sim.world.accepted.is_empty());
    }

    #[test]
    fn station_stop_redeparts_after_dwell() {
        let (mut sim, log) = sim(vec![Train::new("X", "a", 70.0).en_route(49.8, ColorTag::Standard)]);
        sim.advance_by(3.0);
        let id = find(&sim, AdviceKind::StationStop, "X").unwrap();
        accept(&mut sim, id).unwrap();
        let x = sim.world.trains.get("X").unwrap();
        assert_eq!(x.status, TrainStatus::StoppedAtStation("Mid".into()));
        assert_eq!(x.speed, 0.0);

        sim.advance_by(19.5);
        assert_eq!(sim.world.trains.get("X").unwrap().speed, 0.0);
        sim.advance_by(0.5);
        let x = sim.world.trains.get("X").unwrap();
        assert_eq!(x.status, TrainStatus::EnRoute);
        assert_eq!(x.speed, 70.0);
        assert!(log.borrow().contains(&ControlLogEvent::Redeparted("X".into())));
    }

    #[test]
    fn redeparture_skipped_after_intervening_change() {
        let (mut sim, log) = sim(vec![Train::new("X", "a", 70.0).en_route(50.2, ColorTag::Standard)]);
        let id = find(&sim, AdviceKind::StationStop, "X").unwrap();
        accept(&mut sim, id).unwrap();
        sim.advance_by(5.0);
        sim.world.trains.get_mut("X").unwrap().halt();
        sim.advance_by(30.0);
        let x = sim.world.trains.get("X").unwrap();
        assert_eq!(x.status, TrainStatus::Halted);
        assert_eq!(x.speed, 0.0);
        assert!(log.borrow().contains(&ControlLogEvent::RedepartureSkipped("X".into())));
    }

    #[test]
    fn accepted_history_is_bounded_and_newest_first() {
        let roster = (0..5).map(|i| Train::new(&format!("S{}", i), "a", 60.0 + i as f64)).collect();
        let (mut sim, _) = sim(roster);
        for _ in 0..4 {
            sim.world.advise(&mut sim.scheduler);
            let id = sim.world.recommendations.get()[0].id;
            accept(&mut sim, id).unwrap();
        }
        let trains: Vec<_> = sim.world.accepted.iter().map(|a| a.recommendation.train.as_str()).collect();
        assert_eq!(trains, vec!["S1", "S2", "S3"]);
        for t in sim.world.trains.iter() {
            assert!(t.is_consistent());
        }
    }
}

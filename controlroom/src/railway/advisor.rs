//! Advisory generation.
//!
//! Each detector is a pure function of the train store and the topology and
//! returns candidate actions. `generate` merges the candidates with the
//! previous list, assigns ids and ranks the result.

use crate::eventsim::{Process, ProcessState};
use crate::input::topology::Topology;
use crate::railway::train::{Train, TrainId, TrainStatus, TrainStore};
use crate::railway::{ControlCenter, ControlParams, Sim};
use ordered_float::OrderedFloat;
use serde::Serialize;
use smallvec::smallvec;

pub type RecommendationId = u64;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Advice {
    Depart,
    StationStop(String),
    ConvergenceHalt,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdviceKind {
    Depart,
    StationStop,
    ConvergenceHalt,
}

impl Advice {
    pub fn kind(&self) -> AdviceKind {
        match self {
            Advice::Depart => AdviceKind::Depart,
            Advice::StationStop(_) => AdviceKind::StationStop,
            Advice::ConvergenceHalt => AdviceKind::ConvergenceHalt,
        }
    }

    /// Higher is more urgent.
    pub fn priority(&self) -> u8 {
        match self {
            Advice::StationStop(_) => 1,
            Advice::Depart => 2,
            Advice::ConvergenceHalt => 3,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Advice::Depart => "➡️",
            Advice::StationStop(_) => "🏢",
            Advice::ConvergenceHalt => "🛑",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub advice: Advice,
    pub train: TrainId,
    pub icon: &'static str,
    pub title: String,
    pub description: String,
    pub priority: u8,
    pub sort_value: f64,
}

impl Recommendation {
    fn targets(&self, c: &Candidate) -> bool {
        self.train == c.train && self.advice == c.advice
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub advice: Advice,
    pub train: TrainId,
    pub sort_value: f64,
    pub title: String,
    pub description: String,
}

/// Trains that are out of the topology take no part in any advice.
fn placed<'a>(trains: &'a TrainStore, topology: &'a Topology) -> impl Iterator<Item = &'a Train> + 'a {
    trains.iter().filter(move |t| topology.track(&t.track).is_some())
}

/// Waiting trains, fastest first, at most `departure_cap` of them.
pub fn departures(trains: &TrainStore, topology: &Topology, params: &ControlParams) -> Vec<Candidate> {
    let mut waiting: Vec<&Train> = placed(trains, topology)
        .filter(|t| t.status == TrainStatus::AtPlatform)
        .collect();
    waiting.sort_by_key(|t| std::cmp::Reverse(OrderedFloat(t.base_speed)));
    waiting.truncate(params.departure_cap);

    waiting
        .into_iter()
        .filter_map(|t| {
            let track = topology.track(&t.track)?;
            Some(Candidate {
                advice: Advice::Depart,
                train: t.id.clone(),
                sort_value: t.base_speed,
                title: format!("Depart Train {}", t.id),
                description: format!("Signal is clear for {} to depart from Platform {}.", t.id, track.platform),
            })
        })
        .collect()
}

/// Running trains passing a station on their own track.
pub fn station_stops(trains: &TrainStore, topology: &Topology, params: &ControlParams) -> Vec<Candidate> {
    let mut out = Vec::new();
    for t in placed(trains, topology).filter(|t| t.status == TrainStatus::EnRoute) {
        for station in topology.stations_on(&t.track) {
            if (t.position - station.position).abs() < params.station_tolerance {
                out.push(Candidate {
                    advice: Advice::StationStop(station.name.clone()),
                    train: t.id.clone(),
                    sort_value: t.speed,
                    title: format!("Stop at {}", station.name),
                    description: format!("Recommend a brief stop for Train {} at {}.", t.id, station.name),
                });
            }
        }
    }
    out
}

/// For every convergence point with more than one running train close to
/// it, the slowest of them should give way.
pub fn convergence_halts(trains: &TrainStore, topology: &Topology, params: &ControlParams) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::new();
    for point in &topology.convergence {
        let near: Vec<&Train> = placed(trains, topology)
            .filter(|t| t.status == TrainStatus::EnRoute)
            .filter(|t| point.involves(&t.track))
            .filter(|t| (t.position - point.position).abs() < params.convergence_tolerance)
            .collect();
        if near.len() < 2 {
            continue;
        }
        let slowest = match near.iter().min_by_key(|t| OrderedFloat(t.speed)) {
            Some(t) => t,
            None => continue,
        };
        if out.iter().any(|c| c.train == slowest.id) {
            continue;
        }
        out.push(Candidate {
            advice: Advice::ConvergenceHalt,
            train: slowest.id.clone(),
            sort_value: slowest.speed,
            title: "Halt Train Immediately".to_string(),
            description: format!("Halt {} to avoid congestion at convergence point.", slowest.id),
        });
    }
    out
}

/// Stable sort by priority, then sort value, both descending.
pub fn rank(recs: &mut Vec<Recommendation>) {
    recs.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| OrderedFloat(b.sort_value).cmp(&OrderedFloat(a.sort_value)))
    });
}

/// Compute a fresh recommendation list. A candidate that is already on the
/// previous list keeps its entry (and id) instead of being proposed again.
pub fn generate(
    trains: &TrainStore,
    topology: &Topology,
    params: &ControlParams,
    previous: &[Recommendation],
    next_id: &mut RecommendationId,
) -> Vec<Recommendation> {
    let candidates = departures(trains, topology, params)
        .into_iter()
        .chain(station_stops(trains, topology, params))
        .chain(convergence_halts(trains, topology, params));

    let mut recs: Vec<Recommendation> = Vec::new();
    for c in candidates {
        let rec = match previous.iter().find(|r| r.targets(&c)) {
            Some(existing) => Recommendation {
                sort_value: c.sort_value,
                ..existing.clone()
            },
            None => {
                *next_id += 1;
                Recommendation {
                    id: *next_id,
                    icon: c.advice.icon(),
                    priority: c.advice.priority(),
                    advice: c.advice,
                    train: c.train,
                    title: c.title,
                    description: c.description,
                    sort_value: c.sort_value,
                }
            }
        };
        recs.push(rec);
    }
    rank(&mut recs);
    recs
}

/// Regenerates the advice once at start and then every advisory period.
pub struct Advisor;

impl Process<ControlCenter> for Advisor {
    fn resume(&mut self, sim: &mut Sim) -> ProcessState {
        sim.world.advise(&mut sim.scheduler);
        let period = sim.world.params.advisory_period.max(1e-3);
        ProcessState::Wait(smallvec![sim.create_timeout(period)])
    }
}

//! Train records and the store that owns them.

use crate::input::topology::{NameMap, TrackId};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TrainId = String;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TrainStatus {
    AtPlatform,
    EnRoute,
    Halted,
    StoppedAtStation(String),
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrainStatus::AtPlatform => write!(f, "At Platform"),
            TrainStatus::EnRoute => write!(f, "En Route"),
            TrainStatus::Halted => write!(f, "Halted"),
            TrainStatus::StoppedAtStation(s) => write!(f, "Stopped at {}", s),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorTag {
    Idle,
    Standard,
    Express,
}

impl Default for ColorTag {
    fn default() -> ColorTag {
        ColorTag::Idle
    }
}

impl ColorTag {
    pub fn for_speed(speed: f64, express_threshold: f64) -> ColorTag {
        if speed > express_threshold {
            ColorTag::Express
        } else {
            ColorTag::Standard
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorTag::Idle => "gray",
            ColorTag::Standard => "green",
            ColorTag::Express => "blue",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub track: TrackId,
    /// Percentage along the track, in [0,100].
    pub position: f64,
    /// km/h
    pub speed: f64,
    pub base_speed: f64,
    pub status: TrainStatus,
    #[serde(default)]
    pub color: ColorTag,
    /// Bumped on every status transition. Deferred actions compare against it.
    #[serde(skip)]
    pub transition: u64,
}

impl Train {
    pub fn new(id: &str, track: &str, base_speed: f64) -> Train {
        Train {
            id: id.to_string(),
            track: track.to_string(),
            position: 0.0,
            speed: 0.0,
            base_speed,
            status: TrainStatus::AtPlatform,
            color: ColorTag::Idle,
            transition: 0,
        }
    }

    pub fn en_route(mut self, position: f64, color: ColorTag) -> Train {
        self.position = position;
        self.speed = self.base_speed;
        self.status = TrainStatus::EnRoute;
        self.color = color;
        self
    }

    pub fn is_stationary_status(&self) -> bool {
        match self.status {
            TrainStatus::EnRoute => false,
            _ => true,
        }
    }

    /// Speed is zero whenever the status says the train is standing.
    pub fn is_consistent(&self) -> bool {
        self.position >= 0.0 && self.position <= 100.0 && (!self.is_stationary_status() || self.speed == 0.0)
    }

    fn transit(&mut self, status: TrainStatus, speed: f64) {
        self.status = status;
        self.speed = speed;
        self.transition += 1;
    }

    pub fn depart(&mut self, express_threshold: f64) {
        let v = self.base_speed;
        self.transit(TrainStatus::EnRoute, v);
        self.color = ColorTag::for_speed(v, express_threshold);
    }

    pub fn halt(&mut self) {
        self.transit(TrainStatus::Halted, 0.0);
    }

    pub fn stop_at(&mut self, station: &str) {
        self.transit(TrainStatus::StoppedAtStation(station.to_string()), 0.0);
    }

    /// Reached the end of the corridor: back to the platform.
    pub fn wrap(&mut self) {
        self.position = 0.0;
        self.color = ColorTag::Idle;
        self.transit(TrainStatus::AtPlatform, 0.0);
    }

    /// Display color for the presentation layer. Trains standing away from
    /// the platform are shown red.
    pub fn display_color(&self) -> &'static str {
        if self.speed == 0.0 && self.status != TrainStatus::AtPlatform {
            "red"
        } else {
            self.color.name()
        }
    }
}

/// All trains, in roster order.
#[derive(Clone, Debug, Default)]
pub struct TrainStore {
    trains: Vec<Train>,
    names: NameMap,
}

impl TrainStore {
    pub fn new(roster: Vec<Train>) -> TrainStore {
        let mut store = TrainStore::default();
        for mut train in roster {
            if store.names.contains_key(&train.id) {
                log::warn!("duplicate train id {} in roster, keeping the first", train.id);
                continue;
            }
            if !train.position.is_finite() {
                train.position = 0.0;
            }
            train.position = train.position.max(0.0).min(100.0);
            if train.is_stationary_status() {
                train.speed = 0.0;
            }
            store.names.insert(train.id.clone(), store.trains.len());
            store.trains.push(train);
        }
        store
    }

    pub fn get(&self, id: &str) -> Option<&Train> {
        self.names.get(id).map(|&i| &self.trains[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Train> {
        match self.names.get(id) {
            Some(&i) => Some(&mut self.trains[i]),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Train> {
        self.trains.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Train> {
        self.trains.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.trains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }
}

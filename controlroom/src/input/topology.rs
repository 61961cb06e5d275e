//! Track layout: platform tracks with their path geometry, stations and
//! convergence points.

use crate::input::path::{parse_path, PathError, PathGeometry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TrackId = String;
pub type NameMap = HashMap<String, usize>;

#[derive(Clone, Debug)]
pub struct Track {
    pub id: TrackId,
    /// Platform label shown to the controller, e.g. `3` for `p3_full`.
    pub platform: String,
    pub path: PathGeometry,
    pub total_length: f64,
}

/// Station marker, as a percentage along one track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub track: TrackId,
    pub position: f64,
}

/// Where two tracks merge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvergencePoint {
    pub tracks: [TrackId; 2],
    pub position: f64,
}

impl ConvergencePoint {
    pub fn involves(&self, track: &str) -> bool {
        self.tracks.iter().any(|t| t == track)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Topology {
    tracks: Vec<Track>,
    track_names: NameMap,
    pub stations: Vec<Station>,
    pub convergence: Vec<ConvergencePoint>,
}

/// `p3_full` -> `3`. Ids without the usual shape are used as-is.
pub fn platform_label(track: &str) -> String {
    let core = track.strip_suffix("_full").unwrap_or(track);
    match core.strip_prefix('p') {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => core.to_string(),
    }
}

impl Track {
    pub fn new(id: &str, platform: Option<&str>, path: &str) -> Result<Track, PathError> {
        let path = parse_path(path)?;
        Ok(Track {
            id: id.to_string(),
            platform: platform.map(|p| p.to_string()).unwrap_or_else(|| platform_label(id)),
            total_length: path.total_length(),
            path,
        })
    }
}

impl Topology {
    pub fn new(tracks: Vec<Track>, stations: Vec<Station>, convergence: Vec<ConvergencePoint>) -> Topology {
        let mut topology = Topology {
            tracks: Vec::new(),
            track_names: HashMap::new(),
            stations,
            convergence,
        };
        for track in tracks {
            if topology.track_names.contains_key(&track.id) {
                log::warn!("duplicate track id {}, keeping the first", track.id);
                continue;
            }
            topology.track_names.insert(track.id.clone(), topology.tracks.len());
            topology.tracks.push(track);
        }
        topology
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.track_names.get(id).map(|&i| &self.tracks[i])
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn stations_on<'a>(&'a self, track: &'a str) -> impl Iterator<Item = &'a Station> + 'a {
        self.stations.iter().filter(move |s| s.track == track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_labels() {
        assert_eq!(platform_label("p3_full"), "3");
        assert_eq!(platform_label("p10_full"), "10");
        assert_eq!(platform_label("siding"), "siding");
        assert_eq!(platform_label("p"), "p");
    }

    #[test]
    fn lookup_and_station_filter() {
        let t = vec![
            Track::new("a", None, "M 0,0 L 10,0").unwrap(),
            Track::new("b", Some("B"), "M 0,0 L 0,20").unwrap(),
            Track::new("a", None, "M 0,0 L 99,0").unwrap(),
        ];
        let s = vec![
            Station { name: "X".into(), track: "a".into(), position: 10.0 },
            Station { name: "Y".into(), track: "b".into(), position: 20.0 },
            Station { name: "Z".into(), track: "a".into(), position: 30.0 },
        ];
        let topo = Topology::new(t, s, vec![]);
        assert_eq!(topo.tracks().count(), 2);
        assert_eq!(topo.track("a").unwrap().total_length, 10.0);
        assert_eq!(topo.track("b").unwrap().platform, "B");
        assert!(topo.track("c").is_none());
        let names: Vec<_> = topo.stations_on("a").map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Z"]);
    }
}

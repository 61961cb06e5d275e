//! Scenario configuration: the track table, station and convergence
//! markers, and the starting roster.

use crate::input::topology::{ConvergencePoint, Station, Topology, Track};
use crate::railway::train::{ColorTag, Train};
use crate::railway::ControlParams;
use crate::AppResult;
use serde::Deserialize;

pub struct Scenario {
    pub topology: Topology,
    pub roster: Vec<Train>,
    pub params: ControlParams,
}

#[derive(Deserialize)]
struct TrackEntry {
    id: String,
    #[serde(default)]
    platform: Option<String>,
    path: String,
}

#[derive(Deserialize)]
struct ScenarioFile {
    tracks: Vec<TrackEntry>,
    #[serde(default)]
    stations: Vec<Station>,
    #[serde(default)]
    convergence: Vec<ConvergencePoint>,
    trains: Vec<Train>,
    #[serde(default)]
    params: ControlParams,
}

/// Parses a scenario from JSON. Only the structure is checked; station and
/// convergence entries naming unknown tracks simply never match.
pub fn parse_scenario(input: &str) -> AppResult<Scenario> {
    let file: ScenarioFile = serde_json::from_str(input)?;
    let mut tracks = Vec::new();
    for t in &file.tracks {
        tracks.push(Track::new(&t.id, t.platform.as_deref(), &t.path)?);
    }
    Ok(Scenario {
        topology: Topology::new(tracks, file.stations, file.convergence),
        roster: file.trains,
        params: file.params,
    })
}

const CORRIDOR_TRACKS: &[(&str, &str)] = &[
    ("p1_full", "M 50,50 L 250,50 Q 300,50 350,100 L 400,100 Q 450,100 500,150 L 950,150"),
    ("p2_full", "M 50,90 L 250,90 Q 300,90 350,100 L 400,100 Q 450,100 500,150 L 950,150"),
    ("p3_full", "M 50,130 L 400,130 Q 450,130 500,150 L 950,150"),
    ("p4_full", "M 50,170 L 420,170 Q 470,170 520,160 L 550,160 Q 600,160 650,150 L 950,150"),
    ("p5_full", "M 50,210 L 420,210 Q 470,210 520,160 L 550,160 Q 600,160 650,150 L 950,150"),
    ("p6_full", "M 50,250 L 550,250 Q 600,250 650,150 L 950,150"),
    ("p7_full", "M 50,290 L 600,290 Q 650,290 700,300 L 950,300"),
    ("p8_full", "M 50,330 L 550,330 Q 600,330 650,310 L 680,310 Q 700,310 700,300 L 950,300"),
    ("p9_full", "M 50,370 L 550,370 Q 600,370 650,310 L 680,310 Q 700,310 700,300 L 950,300"),
    ("p10_full", "M 50,410 L 950,410"),
];

const CORRIDOR_STATIONS: &[(&str, &str, f64)] = &[
    ("Kengeri", "p3_full", 38.0),
    ("Hejjala", "p6_full", 48.0),
    ("Bidadi", "p7_full", 60.0),
    ("Ketohalli", "p10_full", 78.0),
    ("Mandya", "p10_full", 88.0),
];

const CORRIDOR_CONVERGENCE: &[(&str, &str, f64)] = &[
    ("p1_full", "p2_full", 35.0),
    ("p4_full", "p5_full", 50.0),
    ("p8_full", "p9_full", 65.0),
];

/// The Bengaluru - Mysuru demonstration corridor.
pub fn corridor() -> AppResult<Scenario> {
    let mut tracks = Vec::new();
    for (id, path) in CORRIDOR_TRACKS {
        tracks.push(Track::new(id, None, path)?);
    }
    let stations = CORRIDOR_STATIONS
        .iter()
        .map(|&(name, track, position)| Station {
            name: name.to_string(),
            track: track.to_string(),
            position,
        })
        .collect();
    let convergence = CORRIDOR_CONVERGENCE
        .iter()
        .map(|&(a, b, position)| ConvergencePoint {
            tracks: [a.to_string(), b.to_string()],
            position,
        })
        .collect();

    let roster = vec![
        Train::new("T123", "p1_full", 80.0),
        Train::new("T456", "p2_full", 85.0),
        Train::new("T789", "p3_full", 70.0),
        Train::new("T101", "p4_full", 80.0),
        Train::new("T212", "p5_full", 90.0).en_route(2.0, ColorTag::Standard),
        Train::new("T313", "p6_full", 80.0).en_route(20.0, ColorTag::Express),
        Train::new("T414", "p7_full", 80.0).en_route(8.0, ColorTag::Standard),
        Train::new("T515", "p8_full", 100.0),
        Train::new("T616", "p9_full", 75.0),
        Train::new("T717", "p10_full", 80.0).en_route(18.0, ColorTag::Standard),
    ];

    Ok(Scenario {
        topology: Topology::new(tracks, stations, convergence),
        roster,
        params: ControlParams::default(),
    })
}

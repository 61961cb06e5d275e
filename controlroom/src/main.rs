//! Command line runner for control room scenarios.

use controlroom::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

/// Controlroom -- railway control center simulation
#[derive(StructOpt, Debug)]
#[structopt(name = "controlroom")]
struct Opt {
    /// Verbose mode (-v, -vv, -vvv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Scenario file (JSON). The built-in corridor is used if omitted.
    #[structopt(short = "s", long = "scenario", parse(from_os_str))]
    scenario: Option<PathBuf>,

    /// Controller script
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Seconds to keep running after the script
    #[structopt(short = "d", long = "duration", default_value = "60")]
    duration: f64,

    /// Animation frame interval in seconds
    #[structopt(short = "f", long = "frame")]
    frame: Option<f64>,

    /// Dwell time at a station stop in seconds
    #[structopt(long = "dwell")]
    dwell: Option<f64>,

    /// Output JSON history file
    #[structopt(short = "j", long = "json", parse(from_os_str))]
    json: Option<PathBuf>,

    /// Output JSON history as JavaScript
    #[structopt(short = "J", long = "javascript", parse(from_os_str))]
    javascript: Option<PathBuf>,
}

fn run(opt: &Opt) -> AppResult<()> {
    let mut scenario = get_scenario(opt.scenario.as_ref().map(|p| p.as_path()))?;
    if let Some(frame) = opt.frame {
        scenario.params.frame_interval = frame;
    }
    if let Some(dwell) = opt.dwell {
        scenario.params.dwell = dwell;
    }
    if opt.verbose >= 2 {
        println!("Tracks:");
        for t in scenario.topology.tracks() {
            println!("  * {} platform {} length {:.1}", t.id, t.platform, t.total_length);
        }
        println!("Roster:");
        for t in &scenario.roster {
            println!("  * {:?}", t);
        }
    }

    let script = match opt.script {
        Some(ref path) => get_script(path)?,
        None => Default::default(),
    };
    if opt.verbose >= 1 {
        println!("Script:");
        for x in &script.actions {
            println!("  - {:?}", x);
        }
        println!();
    }

    let (history, last) = run_script(scenario, &script, opt.duration);

    println!("# Control log:");
    for (t, ev) in output::history::timeline(&history) {
        match ev {
            output::history::ControlLogEvent::Published { .. } if opt.verbose == 0 => {}
            _ => println!("> {:>8.2} {:?}", t, ev),
        }
    }
    println!("# Trains at t={:.2}:", last.time);
    for t in &last.trains {
        println!("  {:<6} {:<9} {:>6.2}% {:>5.1} km/h  {}", t.id, t.track, t.position, t.speed, t.status);
    }
    println!("# Active recommendations:");
    for r in &last.recommendations {
        println!("  #{:<4} [{}] {} -- {}", r.id, r.priority, r.title, r.description);
    }
    println!("# Recently accepted:");
    for a in &last.accepted {
        println!("  {:>8.2} {}", a.accepted_at, a.recommendation.title);
    }

    if let Some(ref json) = opt.json {
        let mut writer = BufWriter::new(File::create(json)?);
        output::json::json_history(&history, &last, &mut writer)?;
    }
    if let Some(ref javascript) = opt.javascript {
        let mut writer = BufWriter::new(File::create(javascript)?);
        output::json::javascript_history(&history, &last, &mut writer)?;
    }
    Ok(())
}

pub fn main() {
    let opt = Opt::from_args();
    let level = match opt.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::debug!("{:?}", opt);

    if let Err(e) = run(&opt) {
        println!("Error:\n{}", e.as_fail());
        std::process::exit(1);
    }
}

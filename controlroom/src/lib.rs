//! Railway traffic control on a simulated corridor. An advisor publishes
//! recommendations that a controller accepts or overrides.

#[macro_use]
extern crate failure_derive;

pub mod eventsim;
pub mod input;
pub mod output;
pub mod railway;


use input::scenario::Scenario;
use input::script::{Script, ScriptAction};
use log::info;
use output::history::{ControlLogEvent, History};
use output::snapshot::Snapshot;
use railway::advisor::Advisor;
use railway::control::BoardRecorder;
use railway::motion::Animator;
use railway::{decision, ControlCenter};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub type AppResult<T> = Result<T, failure::Error>;

/// Build the control center for a scenario with its periodic processes
/// started: the board recorder, the animator and the advisor.
pub fn start(scenario: Scenario, log: Rc<RefCell<Vec<ControlLogEvent>>>) -> railway::Sim {
    let mut scheduler = eventsim::Scheduler::new();
    let world_log = log.clone();
    let world = ControlCenter::new(
        &mut scheduler,
        scenario.topology,
        scenario.roster,
        scenario.params,
        Box::new(move |e| world_log.borrow_mut().push(e)),
    );
    let mut sim = eventsim::Simulation::new_with_scheduler(world, scheduler);
    sim.set_time_log(Box::new(move |dt| {
        let mut log = log.borrow_mut();
        match log.last_mut() {
            Some(ControlLogEvent::Wait(t)) => *t += dt,
            _ => log.push(ControlLogEvent::Wait(dt)),
        }
    }));

    sim.start_process(Box::new(BoardRecorder::new()));
    sim.start_process(Box::new(Animator::new()));
    sim.start_process(Box::new(Advisor));
    sim
}

/// Run a controller script against a scenario, then keep running for
/// `tail` more seconds. Returns the log and the final state.
pub fn run_script(scenario: Scenario, script: &Script, tail: f64) -> (History, Snapshot) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sim = start(scenario, log.clone());

    for action in &script.actions {
        match action {
            ScriptAction::Wait(t) => sim.advance_by(*t),
            ScriptAction::Accept(sel) => match sel.resolve(sim.world.recommendations.get()) {
                Some(id) => {
                    decision::accept(&mut sim, id);
                }
                None => info!("t={:.2} nothing matches {:?}, skipping", sim.time(), sel),
            },
            ScriptAction::Override(sel) => match sel.resolve(sim.world.recommendations.get()) {
                Some(id) => {
                    decision::override_recommendation(&mut sim, id);
                }
                None => info!("t={:.2} nothing matches {:?}, skipping", sim.time(), sel),
            },
        }
    }
    sim.advance_by(tail);

    let snapshot = output::snapshot::snapshot(&sim.world, sim.time());
    let history = History {
        events: log.replace(Vec::new()),
    };
    (history, snapshot)
}

pub fn read_file(f: &Path) -> AppResult<String> {
    Ok(std::fs::read_to_string(f)?)
}

pub fn get_scenario(f: Option<&Path>) -> AppResult<Scenario> {
    match f {
        Some(path) => input::scenario::parse_scenario(&read_file(path)?),
        None => input::scenario::corridor(),
    }
}

pub fn get_script(f: &Path) -> AppResult<Script> {
    let contents = read_file(f)?;
    Ok(input::script::parse_script(&contents)?)
}

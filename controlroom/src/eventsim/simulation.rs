//! Event queue, scheduler and the process driver.

use log::{trace, warn};
use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::mem;

/// Handle to an event slot. Slots are reused once an event has fired, so
/// the handle carries the generation it was issued for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EventId {
    slot: usize,
    generation: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProcessId {
    slot: usize,
    generation: u32,
}

pub enum ProcessState {
    Finished,
    Wait(SmallVec<[EventId; 2]>),
}

pub trait Process<T> {
    fn resume(&mut self, sim: &mut Simulation<T>) -> ProcessState;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventState {
    Ready,
    Firing,
    Done,
}

#[derive(Eq, PartialEq, Debug)]
pub struct QueuedEvent {
    pub time: OrderedFloat<f64>,
    pub seq: usize,
    pub event: EventId,
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &QueuedEvent) -> Ordering {
        // Flipped to turn the max-heap into a min-heap. Equal times
        // fire in the order they were scheduled.
        other.time.cmp(&self.time).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &QueuedEvent) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Event {
    generation: u32,
    state: EventState,
    listeners: Vec<ProcessId>,
}

#[derive(Default)]
pub struct Scheduler {
    pub time: OrderedFloat<f64>,
    events: Vec<Event>,
    free: Vec<usize>,
    queue: BinaryHeap<QueuedEvent>,
    seq: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn new_event(&mut self) -> EventId {
        if let Some(slot) = self.free.pop() {
            let ev = &mut self.events[slot];
            ev.generation = ev.generation.wrapping_add(1);
            ev.state = EventState::Ready;
            ev.listeners.clear();
            return EventId {
                slot,
                generation: ev.generation,
            };
        }
        self.events.push(Event {
            generation: 0,
            state: EventState::Ready,
            listeners: Vec::new(),
        });
        EventId {
            slot: self.events.len() - 1,
            generation: 0,
        }
    }

    /// Queue an event `dt` seconds from now. Returns false if the event
    /// can never fire (infinite, negative or NaN delay).
    pub fn schedule(&mut self, id: EventId, dt: f64) -> bool {
        if !dt.is_finite() {
            return false;
        }
        if dt < 0.0 {
            warn!("refusing to schedule event {:?} in the past (dt={})", id, dt);
            return false;
        }
        self.queue.push(QueuedEvent {
            time: OrderedFloat(*self.time + dt),
            seq: self.seq,
            event: id,
        });
        self.seq += 1;
        true
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_time(&self) -> Option<f64> {
        self.queue.peek().map(|q| *q.time)
    }

    /// Number of event slots ever allocated, live or free.
    pub fn event_slots(&self) -> usize {
        self.events.len()
    }

    pub fn has_fired(&self, id: EventId) -> bool {
        let ev = &self.events[id.slot];
        ev.generation != id.generation || ev.state != EventState::Ready
    }

    /// Start firing an event. `None` if it already fired, which happens
    /// when an event is queued more than once.
    fn fire(&mut self, id: EventId) -> Option<Vec<ProcessId>> {
        if self.has_fired(id) {
            return None;
        }
        let ev = &mut self.events[id.slot];
        ev.state = EventState::Firing;
        Some(mem::replace(&mut ev.listeners, Vec::new()))
    }

    fn finish(&mut self, id: EventId) {
        self.events[id.slot].state = EventState::Done;
        self.free.push(id.slot);
    }
}

struct ProcessSlot<T> {
    generation: u32,
    entry: Option<(EventId, Box<dyn Process<T>>)>,
}

pub struct Simulation<T> {
    pub world: T,
    procs: Vec<ProcessSlot<T>>,
    free_procs: Vec<usize>,
    pub scheduler: Scheduler,
    logger: Option<Box<dyn Fn(f64)>>,
}

impl<T> Simulation<T> {
    pub fn new(world: T) -> Self {
        Simulation::new_with_scheduler(world, Scheduler::new())
    }

    pub fn new_with_scheduler(world: T, scheduler: Scheduler) -> Self {
        Simulation {
            world,
            procs: Vec::new(),
            free_procs: Vec::new(),
            scheduler,
            logger: None,
        }
    }

    /// Called with every forward jump of the clock.
    pub fn set_time_log(&mut self, logger: Box<dyn Fn(f64)>) {
        self.logger = Some(logger);
    }

    pub fn time(&self) -> f64 {
        *self.scheduler.time
    }

    pub fn has_fired(&self, event: EventId) -> bool {
        self.scheduler.has_fired(event)
    }

    /// Number of process slots ever allocated, running or free.
    pub fn process_slots(&self) -> usize {
        self.procs.len()
    }

    pub fn create_timeout(&mut self, dt: f64) -> EventId {
        let id = self.scheduler.new_event();
        self.scheduler.schedule(id, dt);
        id
    }

    /// Start a process and resume it immediately. The returned event fires
    /// when the process finishes.
    pub fn start_process(&mut self, p: Box<dyn Process<T>>) -> EventId {
        let finished = self.scheduler.new_event();
        let process_id = match self.free_procs.pop() {
            Some(slot) => {
                let s = &mut self.procs[slot];
                s.generation = s.generation.wrapping_add(1);
                s.entry = Some((finished, p));
                ProcessId {
                    slot,
                    generation: s.generation,
                }
            }
            None => {
                self.procs.push(ProcessSlot {
                    generation: 0,
                    entry: Some((finished, p)),
                });
                ProcessId {
                    slot: self.procs.len() - 1,
                    generation: 0,
                }
            }
        };
        self.resume(process_id);
        finished
    }

    /// Run until the given event has fired or nothing is left in the queue.
    pub fn advance_to(&mut self, ev: EventId) {
        while !self.has_fired(ev) {
            if !self.step() {
                break;
            }
        }
    }

    /// Run every event up to and including `now + dt`, then set the clock to
    /// exactly `now + dt`.
    pub fn advance_by(&mut self, dt: f64) {
        if !(dt > 0.0) {
            return;
        }
        let target = self.time() + dt;
        self.run_until(target);
    }

    pub fn run_until(&mut self, target: f64) {
        if !(target > self.time()) {
            return;
        }
        while let Some(t) = self.scheduler.next_time() {
            if t > target {
                break;
            }
            self.step();
        }
        self.jump_to(target);
    }

    pub fn step(&mut self) -> bool {
        match self.scheduler.queue.pop() {
            Some(ev) => {
                self.jump_to(*ev.time);
                self.fire(ev.event);
                true
            }
            None => false,
        }
    }

    fn jump_to(&mut self, t: f64) {
        let dt = t - self.time();
        if dt > 0.0 {
            if let Some(ref logger) = self.logger {
                logger(dt);
            }
            self.scheduler.time = OrderedFloat(t);
        }
    }

    fn fire(&mut self, event_id: EventId) {
        let listeners = match self.scheduler.fire(event_id) {
            Some(l) => l,
            None => return,
        };
        trace!("t={:.3} fire event {:?}", self.time(), event_id);
        for process_id in listeners {
            self.resume(process_id);
        }
        self.scheduler.finish(event_id);
    }

    fn resume(&mut self, process_id: ProcessId) {
        // The process is taken out while it runs, so it cannot be resumed
        // again by events it fires itself. A listener left behind by a
        // finished process no longer matches the slot generation.
        let slot = &mut self.procs[process_id.slot];
        if slot.generation != process_id.generation {
            return;
        }
        let (finished, mut process) = match slot.entry.take() {
            Some(p) => p,
            None => return,
        };

        loop {
            match process.resume(self) {
                ProcessState::Finished => {
                    self.scheduler.schedule(finished, 0.0);
                    self.free_procs.push(process_id.slot);
                    return;
                }
                ProcessState::Wait(events) => {
                    let mut waiting = false;
                    for ev in events {
                        if self.has_fired(ev) {
                            continue;
                        }
                        waiting = true;
                        let listeners = &mut self.scheduler.events[ev.slot].listeners;
                        if !listeners.contains(&process_id) {
                            listeners.push(process_id);
                        }
                    }
                    if waiting {
                        self.procs[process_id.slot].entry = Some((finished, process));
                        return;
                    }
                    // Nothing to wait for, resume right away.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn ev(slot: usize) -> EventId {
        EventId { slot, generation: 0 }
    }

    #[test]
    fn queue_pops_earliest_first() {
        let mut p = BinaryHeap::new();
        for (seq, t) in [123.0, 0.0, 122.0].iter().enumerate() {
            p.push(QueuedEvent { time: OrderedFloat(*t), seq, event: ev(0) });
        }
        assert_eq!(*p.pop().unwrap().time, 0.0);
        assert_eq!(*p.pop().unwrap().time, 122.0);
        assert_eq!(*p.pop().unwrap().time, 123.0);
    }

    #[test]
    fn equal_times_fire_in_schedule_order() {
        let mut p = BinaryHeap::new();
        p.push(QueuedEvent { time: OrderedFloat(1.0), seq: 1, event: ev(7) });
        p.push(QueuedEvent { time: OrderedFloat(1.0), seq: 0, event: ev(3) });
        assert_eq!(p.pop().unwrap().event, ev(3));
        assert_eq!(p.pop().unwrap().event, ev(7));
    }

    struct Ticker {
        every: f64,
    }

    impl Process<Vec<f64>> for Ticker {
        fn resume(&mut self, sim: &mut Simulation<Vec<f64>>) -> ProcessState {
            let now = sim.time();
            sim.world.push(now);
            ProcessState::Wait(smallvec![sim.create_timeout(self.every)])
        }
    }

    #[test]
    fn periodic_process_runs_at_start_and_each_period() {
        let mut sim: Simulation<Vec<f64>> = Simulation::new(Vec::new());
        sim.start_process(Box::new(Ticker { every: 5.0 }));
        sim.advance_by(12.0);
        assert_eq!(sim.world, vec![0.0, 5.0, 10.0]);
        assert_eq!(sim.time(), 12.0);
    }

    #[test]
    fn refuses_negative_and_infinite_delays() {
        let mut s = Scheduler::new();
        let ev = s.new_event();
        assert!(!s.schedule(ev, -1.0));
        assert!(!s.schedule(ev, std::f64::INFINITY));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn time_log_sums_to_elapsed_time() {
        use std::cell::Cell;
        use std::rc::Rc;
        let total = Rc::new(Cell::new(0.0));
        let mut sim: Simulation<Vec<f64>> = Simulation::new(Vec::new());
        let t = total.clone();
        sim.set_time_log(Box::new(move |dt| t.set(t.get() + dt)));
        sim.start_process(Box::new(Ticker { every: 0.7 }));
        sim.advance_by(3.0);
        sim.advance_by(-1.0);
        assert!((total.get() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn fired_event_slot_is_reused_under_a_new_generation() {
        let mut s = Scheduler::new();
        let a = s.new_event();
        assert!(s.fire(a).is_some());
        s.finish(a);
        assert!(s.fire(a).is_none());
        let b = s.new_event();
        assert_eq!(b.slot, a.slot);
        assert_ne!(a, b);
        assert!(s.has_fired(a));
        assert!(!s.has_fired(b));
        assert_eq!(s.event_slots(), 1);
    }

    #[test]
    fn event_queued_twice_fires_once() {
        let mut sim: Simulation<Vec<f64>> = Simulation::new(Vec::new());
        let a = sim.scheduler.new_event();
        sim.scheduler.schedule(a, 1.0);
        sim.scheduler.schedule(a, 2.0);
        sim.advance_by(3.0);
        let b = sim.scheduler.new_event();
        let c = sim.scheduler.new_event();
        assert_eq!(b.slot, a.slot);
        assert_ne!(c.slot, a.slot);
    }

    #[test]
    fn long_run_keeps_a_fixed_number_of_slots() {
        let mut sim: Simulation<Vec<f64>> = Simulation::new(Vec::new());
        sim.start_process(Box::new(Ticker { every: 0.05 }));
        sim.advance_by(60.0);
        let after_a_minute = sim.scheduler.event_slots();
        sim.advance_by(3600.0);
        assert_eq!(sim.scheduler.event_slots(), after_a_minute);
        assert_eq!(sim.scheduler.event_slots(), 3);
        assert!(sim.world.len() > 70_000);
    }

    struct Once;

    impl Process<Vec<f64>> for Once {
        fn resume(&mut self, sim: &mut Simulation<Vec<f64>>) -> ProcessState {
            let now = sim.time();
            sim.world.push(now);
            ProcessState::Finished
        }
    }

    #[test]
    fn finished_process_slots_are_reused() {
        let mut sim: Simulation<Vec<f64>> = Simulation::new(Vec::new());
        for _ in 0..100 {
            let done = sim.start_process(Box::new(Once));
            sim.advance_to(done);
            assert!(sim.has_fired(done));
        }
        assert_eq!(sim.world.len(), 100);
        assert_eq!(sim.process_slots(), 1);
        assert!(sim.scheduler.event_slots() <= 2);
    }
}

//! Values that fire an event when they change.

use super::simulation::{EventId, Scheduler};
use std::fmt::Debug;

/// A value whose replacement fires an event. Each `set` fires the current
/// event and allocates a fresh one for the next change.
#[derive(Clone, Debug)]
pub struct Observable<T: Clone + Debug> {
    event_id: EventId,
    value: T,
}

impl<T: Clone + Debug> Observable<T> {
    pub fn new(scheduler: &mut Scheduler, value: T) -> Observable<T> {
        Observable {
            event_id: scheduler.new_event(),
            value,
        }
    }

    pub fn event(&self) -> EventId {
        self.event_id
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, scheduler: &mut Scheduler, x: T) {
        self.value = x;
        self.notify(scheduler);
    }

    /// Modify the value in place. Fires only if `f` reports a change.
    pub fn update<F: FnOnce(&mut T) -> bool>(&mut self, scheduler: &mut Scheduler, f: F) -> bool {
        let changed = f(&mut self.value);
        if changed {
            self.notify(scheduler);
        }
        changed
    }

    fn notify(&mut self, scheduler: &mut Scheduler) {
        scheduler.schedule(self.event_id, 0.0);
        self.event_id = scheduler.new_event();
    }
}

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// Source of the current time for [`Debouncer`].
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// A single-slot timer: scheduling a job replaces whatever was pending, so
/// only the most recent request ever runs.
#[derive(Debug)]
pub struct Debouncer<C, T> {
    clock: C,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    due: Instant,
    job: T,
}

impl<C: Clock, T> Debouncer<C, T> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            pending: None,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Schedules `job` to become due after `delay`. Returns the job it
    /// superseded, if any.
    pub fn schedule(&mut self, delay: Duration, job: T) -> Option<T> {
        let due = self.clock.now() + delay;
        self.pending
            .replace(Pending { due, job })
            .map(|pending| pending.job)
    }

    /// Drops the pending job without running it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.job)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending job is due, saturating at zero.
    pub fn remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.pending
            .as_ref()
            .map(|pending| pending.due.saturating_duration_since(now))
    }

    /// Hands back the pending job once it is due.
    pub fn poll(&mut self) -> Option<T> {
        let now = self.clock.now();
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.due <= now);
        if due {
            self.cancel()
        } else {
            None
        }
    }
}

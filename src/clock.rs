use std::time::Duration;

/// Most periods a clock will hold in its backlog. Anything beyond this is
/// dropped so a stalled frame does not replay a burst of ticks.
const MAX_BACKLOG_PERIODS: u32 = 5;

pub(crate) trait Scheduler {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Fixed-period tick source fed with real elapsed time by the host loop.
///
/// The host calls [`Clock::advance`] once per frame and then drains
/// [`Clock::take_tick`] one period at a time, running the tick handler in
/// between. A handler that stops the clock therefore cancels whatever is
/// left of the backlog.
#[derive(Clone, Debug)]
pub(crate) struct Clock {
    period: Duration,
    accum: Duration,
    running: bool,
}

impl Clock {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            accum: Duration::ZERO,
            running: false,
        }
    }

    pub(crate) fn period(&self) -> Duration {
        self.period
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        if !self.is_running() {
            return;
        }
        let cap = self.period * MAX_BACKLOG_PERIODS;
        self.accum = self.accum.saturating_add(dt).min(cap);
    }

    pub(crate) fn take_tick(&mut self) -> bool {
        if !self.is_running() || self.accum < self.period {
            return false;
        }
        self.accum -= self.period;
        true
    }
}

impl Scheduler for Clock {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.accum = Duration::ZERO;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// One-shot delayed items (animation pulses and the like).
#[derive(Clone, Debug)]
pub(crate) struct Deferred<T> {
    pending: Vec<(Duration, T)>,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> Deferred<T> {
    pub(crate) fn schedule(&mut self, delay: Duration, item: T) {
        self.pending.push((delay, item));
    }

    /// Counts every pending item down by `dt` and returns the ones now due,
    /// earliest first.
    pub(crate) fn advance(&mut self, dt: Duration) -> Vec<T> {
        let mut due = Vec::new();
        let mut keep = Vec::with_capacity(self.pending.len());
        for (left, item) in self.pending.drain(..) {
            if left <= dt {
                due.push((left, item));
            } else {
                keep.push((left - dt, item));
            }
        }
        self.pending = keep;
        due.sort_by_key(|(left, _)| *left);
        due.into_iter().map(|(_, item)| item).collect()
    }

    pub(crate) fn cancel_all(&mut self) {
        self.pending.clear();
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters shared between the drain task and the pacing loop.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    drained: AtomicUsize,
    lag_events: AtomicUsize,
    spoken: AtomicUsize,
    fillers: AtomicUsize,
}

impl Counters {
    pub fn record_drained(&self) {
        self.drained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lag(&self) {
        self.lag_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spoken(&self) {
        self.spoken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filler(&self) {
        self.fillers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            drained: self.drained.load(Ordering::Relaxed),
            lag_events: self.lag_events.load(Ordering::Relaxed),
            spoken: self.spoken.load(Ordering::Relaxed),
            fillers: self.fillers.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of an engine's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Tokens moved from the source into the queue.
    pub drained: usize,
    /// Arrivals whose gap reached the lag threshold.
    pub lag_events: usize,
    /// Real tokens returned to the caller.
    pub spoken: usize,
    /// Filler phrases returned to the caller.
    pub fillers: usize,
}

impl StatsSnapshot {
    /// Tokens drained but not yet spoken.
    pub fn backlog(&self) -> usize {
        self.drained.saturating_sub(self.spoken)
    }
}

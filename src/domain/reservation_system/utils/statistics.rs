use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Terminal outcome of one reservation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RequestOutcome {
    Accepted,
    Rescheduled,
    Denied,
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub accepted: u64,
    pub rescheduled: u64,
    pub denied: u64,
}

impl StatisticsSnapshot {
    pub fn total(&self) -> u64 {
        self.accepted + self.rescheduled + self.denied
    }
}

/// Request counters, guarded by their own lock so that counting never
/// contends with the reservation/capacity domain.
#[derive(Debug, Clone, Default)]
pub struct RequestStatistics {
    counters: Arc<Mutex<StatisticsSnapshot>>,
}

impl RequestStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one completed request.
    pub fn record(&self, outcome: RequestOutcome) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            RequestOutcome::Accepted => counters.accepted += 1,
            RequestOutcome::Rescheduled => counters.rescheduled += 1,
            RequestOutcome::Denied => counters.denied += 1,
        }
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        *self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

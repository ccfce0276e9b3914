use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::reservation_system::config::ScheduleConfig;
use crate::domain::reservation_system::reservation::reservation_store::ReservationStore;
use crate::domain::reservation_system::schedule::slot_capacity_table::SlotCapacityTable;

/// The reservation/capacity consistency domain.
///
/// Both parts are always mutated together (a commit appends a reservation and
/// raises the counters of its window), so they share one lock.
#[derive(Debug)]
pub struct ScheduleState {
    pub reservations: ReservationStore,
    pub capacity: SlotCapacityTable,
}

impl ScheduleState {
    pub fn new(config: &ScheduleConfig) -> Self {
        ScheduleState {
            reservations: ReservationStore::new(),
            capacity: SlotCapacityTable::new(config.min_hour, config.max_hour, config.max_capacity),
        }
    }
}

/// Handle to the [`ScheduleState`] shared by the virtual clock and the scheduling engine.
#[derive(Debug, Clone)]
pub struct SharedSchedule {
    inner: Arc<Mutex<ScheduleState>>,
}

impl SharedSchedule {
    pub fn new(config: &ScheduleConfig) -> Self {
        SharedSchedule { inner: Arc::new(Mutex::new(ScheduleState::new(config))) }
    }

    /// Acquires the domain lock.
    ///
    /// Every mutation completes inside one critical section, so a poisoned lock
    /// still guards consistent data and is recovered.
    pub fn lock(&self) -> MutexGuard<'_, ScheduleState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

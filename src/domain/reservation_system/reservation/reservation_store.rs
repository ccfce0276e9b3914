use slotmap::{SlotMap, new_key_type};

use crate::domain::reservation_system::reservation::reservation::Reservation;

new_key_type! {
    pub struct ReservationId;
}

/// Append-only collection of committed reservations.
///
/// Reservations are never removed, so iteration over the underlying `SlotMap`
/// follows creation order. The store is not synchronised itself; it lives inside
/// [`ScheduleState`](crate::domain::reservation_system::schedule::schedule_state::ScheduleState)
/// together with the capacity table, under one lock.
#[derive(Debug, Default)]
pub struct ReservationStore {
    slots: SlotMap<ReservationId, Reservation>,
}

impl ReservationStore {
    pub fn new() -> Self {
        Self { slots: SlotMap::with_key() }
    }

    /// Adds Reservation to ReservationStore.
    ///
    /// # Returns
    /// Returns the ReservationId (internal Key for ReservationStore).
    pub fn add(&mut self, reservation: Reservation) -> ReservationId {
        self.slots.insert(reservation)
    }

    /// Get a copy of the Reservation with internal Id (ReservationId).
    pub fn get(&self, key: ReservationId) -> Option<Reservation> {
        self.slots.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Copies of all reservations, ordered by creation.
    pub fn snapshot(&self) -> Vec<Reservation> {
        self.slots.values().cloned().collect()
    }

    /// Copies of the reservations matching `predicate`, ordered by creation.
    pub fn filter<P>(&self, predicate: P) -> Vec<Reservation>
    where
        P: Fn(&Reservation) -> bool,
    {
        self.slots.values().filter(|res| predicate(res)).cloned().collect()
    }

    /// Single pass over the store applying the activation rule for `current_hour`.
    ///
    /// # Returns
    /// `(activated, deactivated)` counts.
    pub fn update_activation(&mut self, current_hour: i64) -> (usize, usize) {
        let mut activated = 0;
        let mut deactivated = 0;

        for reservation in self.slots.values_mut() {
            let was_active = reservation.active;
            if reservation.update_activation(current_hour) {
                if was_active {
                    deactivated += 1;
                } else {
                    activated += 1;
                }
            }
        }

        (activated, deactivated)
    }

    /// Number of currently active reservations.
    pub fn active_count(&self) -> usize {
        self.slots.values().filter(|res| res.active).count()
    }
}

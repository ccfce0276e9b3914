use crate::domain::reservation_system::config::RESERVATION_DURATION;
use crate::domain::reservation_system::utils::id::{AgentId, FamilyName};

/// A committed reservation of a family for one fixed-duration window of the day.
///
/// Created exactly once by the scheduling engine, never deleted. Only the
/// virtual clock mutates it afterwards, by toggling `active` when the simulated
/// hour enters and leaves the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub family: FamilyName,
    pub agent_id: AgentId,
    pub start_hour: i64,
    /// Last hour covered by the reservation (inclusive).
    pub end_hour: i64,
    pub party_size: i64,
    pub active: bool,
}

impl Reservation {
    /// Builds an inactive reservation covering `start_hour .. start_hour + RESERVATION_DURATION`.
    pub fn new(family: FamilyName, agent_id: AgentId, start_hour: i64, party_size: i64) -> Self {
        Reservation { family, agent_id, start_hour, end_hour: start_hour + RESERVATION_DURATION - 1, party_size, active: false }
    }

    /// Hours occupied by this reservation.
    pub fn covered_hours(&self) -> std::ops::RangeInclusive<i64> {
        self.start_hour..=self.end_hour
    }

    /// Hour at which the family leaves the park (exclusive end of the window).
    pub fn exit_hour(&self) -> i64 {
        self.end_hour + 1
    }

    /// Applies the activation rule for the given simulated hour.
    ///
    /// # Returns
    /// `true` if the active flag changed.
    pub fn update_activation(&mut self, current_hour: i64) -> bool {
        if !self.active && self.start_hour == current_hour {
            self.active = true;
            return true;
        }

        if self.active && self.end_hour < current_hour {
            self.active = false;
            return true;
        }

        false
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::reservation_system::channel_communication::protocol::ControllerResponse;
use crate::domain::reservation_system::config::ScheduleConfig;
use crate::domain::reservation_system::reservation::reservation::Reservation;
use crate::domain::reservation_system::reservation::reservation_store::ReservationId;
use crate::domain::reservation_system::schedule::schedule_state::{ScheduleState, SharedSchedule};
use crate::domain::reservation_system::scheduler::decision::{Decision, DenialReason, RescheduleReason};
use crate::domain::reservation_system::utils::id::{AgentId, FamilyName};
use crate::domain::reservation_system::utils::statistics::RequestStatistics;
use crate::domain::simulator::virtual_clock::SimulationClock;

pub const ANALYTICS_TARGET: &str = "slot_reservation::analytics";

/// One RESERVE request as received from an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    pub agent_id: AgentId,
    pub response_channel: PathBuf,
    pub family: FamilyName,
    pub requested_hour: i64,
    pub party_size: i64,
}

/// A decided request together with the hour it was decided at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandledRequest {
    pub decision: Decision,
    pub current_hour: i64,
}

impl HandledRequest {
    pub fn into_response(self) -> ControllerResponse {
        self.decision.into_response(self.current_hour)
    }
}

/// Checks whether the window starting at `start_hour` can take `party_size` more persons.
///
/// Every covered hour must lie in the operating window and keep its counter
/// within capacity. How late a window may start is bounded by the callers.
pub fn window_fits(config: &ScheduleConfig, state: &ScheduleState, start_hour: i64, party_size: i64) -> bool {
    (start_hour..start_hour + config.duration).all(|hour| config.is_operating_hour(hour) && state.capacity.has_room(hour, party_size))
}

/// Earliest start hour in `from_hour ..= end_hour - duration + 1` whose window fits.
pub fn find_alternative_from(config: &ScheduleConfig, state: &ScheduleState, from_hour: i64, party_size: i64) -> Option<i64> {
    (from_hour..=config.last_start_hour()).find(|&hour| window_fits(config, state, hour, party_size))
}

/// Decides reservation requests against the shared schedule.
///
/// All availability checks and the commit that follows them run inside one
/// critical section of the schedule lock, so no other commit and no clock
/// activation pass can interleave with a decision.
#[derive(Debug, Clone)]
pub struct SchedulingEngine {
    config: ScheduleConfig,
    schedule: SharedSchedule,
    clock: Arc<dyn SimulationClock>,
    statistics: RequestStatistics,
}

impl SchedulingEngine {
    pub fn new(config: ScheduleConfig, schedule: SharedSchedule, clock: Arc<dyn SimulationClock>, statistics: RequestStatistics) -> Self {
        SchedulingEngine { config, schedule, clock, statistics }
    }

    pub fn statistics(&self) -> &RequestStatistics {
        &self.statistics
    }

    pub fn current_hour(&self) -> i64 {
        self.clock.current_hour()
    }

    /// Decides one request, commits it if accepted in any form and counts the outcome.
    pub fn handle_request(&self, request: &ReservationRequest) -> HandledRequest {
        let (decision, current_hour) = {
            let mut state = self.schedule.lock();
            let current_hour = self.clock.current_hour();
            (self.decide(&mut state, request, current_hour), current_hour)
        };

        self.statistics.record(decision.outcome());

        tracing::info!(
            target: ANALYTICS_TARGET,
            Agent = %request.agent_id,
            Family = %request.family,
            RequestedHour = request.requested_hour,
            PartySize = request.party_size,
            Outcome = ?decision.outcome(),
            AssignedHour = ?decision.assigned_hour(),
            CurrentHour = current_hour,
            "{}",
            decision
        );

        HandledRequest { decision, current_hour }
    }

    fn decide(&self, state: &mut ScheduleState, request: &ReservationRequest, current_hour: i64) -> Decision {
        let config = &self.config;
        let hour = request.requested_hour;
        let party_size = request.party_size;

        if !config.is_operating_hour(hour) {
            return Decision::Denied { reason: DenialReason::OutOfOperatingRange { min_hour: config.min_hour, max_hour: config.max_hour } };
        }

        if party_size <= 0 {
            return Decision::Denied { reason: DenialReason::InvalidPartySize { party_size } };
        }

        if party_size > config.max_capacity {
            return Decision::Denied { reason: DenialReason::ExceedsCapacity { party_size, max_capacity: config.max_capacity } };
        }

        if hour < current_hour {
            log::debug!("Late request of family {} for {}:00 (current hour {}:00).", request.family, hour, current_hour);
            return match find_alternative_from(config, state, current_hour, party_size) {
                Some(alternative) => {
                    self.commit(state, alternative, request);
                    Decision::Rescheduled { hour: alternative, reason: RescheduleReason::LateArrival }
                }
                None => Decision::Denied { reason: DenialReason::LateWithoutAlternative },
            };
        }

        if hour > config.end_hour {
            return Decision::Denied { reason: DenialReason::AfterSimulationDay };
        }

        if window_fits(config, state, hour, party_size) {
            self.commit(state, hour, request);
            return Decision::Approved { hour, party_size };
        }

        log::debug!("No availability for family {} at {}:00, searching from {}:00.", request.family, hour, current_hour);
        match find_alternative_from(config, state, current_hour, party_size) {
            Some(alternative) => {
                self.commit(state, alternative, request);
                Decision::Rescheduled { hour: alternative, reason: RescheduleReason::SlotFull }
            }
            None => Decision::Denied { reason: DenialReason::NoAvailability },
        }
    }

    /// Appends the reservation and raises the counters of its window.
    ///
    /// Callers hold the schedule lock and have checked the window with [`window_fits`].
    fn commit(&self, state: &mut ScheduleState, hour: i64, request: &ReservationRequest) -> ReservationId {
        let reservation = Reservation::new(request.family.clone(), request.agent_id.clone(), hour, request.party_size);

        for covered in reservation.covered_hours() {
            let added = state.capacity.add_load(covered, request.party_size);
            debug_assert!(added, "commit of an unchecked window at {}:00", covered);
        }

        state.reservations.add(reservation)
    }

    /// Earliest valid start hour from the current hour on, without committing anything.
    pub fn find_alternative(&self, party_size: i64) -> Option<i64> {
        let state = self.schedule.lock();
        let current_hour = self.clock.current_hour();
        find_alternative_from(&self.config, &state, current_hour, party_size)
    }

    /// Whether the window starting at `hour` has room for `party_size`, without committing anything.
    pub fn is_available(&self, hour: i64, party_size: i64) -> bool {
        let state = self.schedule.lock();
        window_fits(&self.config, &state, hour, party_size)
    }
}

use std::fmt;

use crate::domain::reservation_system::channel_communication::protocol::ControllerResponse;
use crate::domain::reservation_system::config::RESERVATION_DURATION;
use crate::domain::reservation_system::utils::statistics::RequestOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescheduleReason {
    /// The requested hour had already passed.
    LateArrival,
    /// The requested window did not have room.
    SlotFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    OutOfOperatingRange { min_hour: i64, max_hour: i64 },
    InvalidPartySize { party_size: i64 },
    ExceedsCapacity { party_size: i64, max_capacity: i64 },
    LateWithoutAlternative,
    AfterSimulationDay,
    NoAvailability,
}

/// Result of deciding one reservation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved { hour: i64, party_size: i64 },
    Rescheduled { hour: i64, reason: RescheduleReason },
    Denied { reason: DenialReason },
}

impl Decision {
    pub fn outcome(&self) -> RequestOutcome {
        match self {
            Decision::Approved { .. } => RequestOutcome::Accepted,
            Decision::Rescheduled { .. } => RequestOutcome::Rescheduled,
            Decision::Denied { .. } => RequestOutcome::Denied,
        }
    }

    /// Hour the reservation was committed at, if any.
    pub fn assigned_hour(&self) -> Option<i64> {
        match self {
            Decision::Approved { hour, .. } | Decision::Rescheduled { hour, .. } => Some(*hour),
            Decision::Denied { .. } => None,
        }
    }

    /// Builds the response record sent back to the requesting agent.
    pub fn into_response(self, current_hour: i64) -> ControllerResponse {
        let message = self.to_string();
        match self {
            Decision::Approved { hour, .. } => ControllerResponse::Approved { assigned_hour: hour, current_hour, message },
            Decision::Rescheduled { hour, .. } => ControllerResponse::Rescheduled { assigned_hour: hour, current_hour, message },
            Decision::Denied { .. } => ControllerResponse::Denied { current_hour, message },
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approved { hour, party_size } => {
                write!(f, "Reservation APPROVED - {}:00 - {}:00 for {} people", hour, hour + RESERVATION_DURATION, party_size)
            }
            Decision::Rescheduled { hour, reason } => {
                let why = match reason {
                    RescheduleReason::LateArrival => "requested hour already passed",
                    RescheduleReason::SlotFull => "requested slot is full",
                };
                write!(f, "Reservation RESCHEDULED - {}. New slot: {}:00 - {}:00", why, hour, hour + RESERVATION_DURATION)
            }
            Decision::Denied { reason } => match reason {
                DenialReason::OutOfOperatingRange { min_hour, max_hour } => {
                    write!(f, "Reservation DENIED - requested hour outside operating range ({}-{})", min_hour, max_hour)
                }
                DenialReason::InvalidPartySize { party_size } => {
                    write!(f, "Reservation DENIED - party size ({}) must be positive", party_size)
                }
                DenialReason::ExceedsCapacity { party_size, max_capacity } => write!(
                    f,
                    "Reservation DENIED - party of {} exceeds maximum capacity ({}). Please come back another day.",
                    party_size, max_capacity
                ),
                DenialReason::LateWithoutAlternative => {
                    write!(f, "Reservation DENIED - requested hour already passed and no later slot is available. Please come back another day.")
                }
                DenialReason::AfterSimulationDay => {
                    write!(f, "Reservation DENIED - requested hour is outside the simulated day. Please come back another day.")
                }
                DenialReason::NoAvailability => {
                    write!(f, "Reservation DENIED - no availability for the rest of the day. Please come back another day.")
                }
            },
        }
    }
}

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Largest write the platform guarantees to deliver without interleaving on a pipe.
pub const PIPE_BUF: usize = 4096;

/// Size of one agent → controller record on the wire.
pub const REQUEST_RECORD_SIZE: usize = 1024;
/// Size of one controller → agent record on the wire.
pub const RESPONSE_RECORD_SIZE: usize = 1088;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_TEXT_LEN: usize = 1024;

const _: () = assert!(REQUEST_RECORD_SIZE <= PIPE_BUF && RESPONSE_RECORD_SIZE <= PIPE_BUF);

/// A message type that travels as one fixed-size record.
pub trait WireRecord: Serialize + for<'de> Deserialize<'de> {
    const RECORD_SIZE: usize;

    /// Rejects field values the fixed layout cannot carry.
    fn validate(&self) -> Result<(), String>;
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.len() > max {
        return Err(format!("{} is {} bytes long, at most {} allowed", field, value.len(), max));
    }
    Ok(())
}

/// Records written by agents on the shared inbound channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum AgentMessage {
    Register { agent_id: String, response_channel: PathBuf },
    Reserve { agent_id: String, response_channel: PathBuf, family: String, requested_hour: i64, party_size: i64 },
    Done { agent_id: String },
}

impl AgentMessage {
    pub fn agent_id(&self) -> &str {
        match self {
            AgentMessage::Register { agent_id, .. } | AgentMessage::Reserve { agent_id, .. } | AgentMessage::Done { agent_id } => agent_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AgentMessage::Register { .. } => "REGISTER",
            AgentMessage::Reserve { .. } => "RESERVE",
            AgentMessage::Done { .. } => "DONE",
        }
    }
}

impl WireRecord for AgentMessage {
    const RECORD_SIZE: usize = REQUEST_RECORD_SIZE;

    fn validate(&self) -> Result<(), String> {
        check_len("agent id", self.agent_id(), MAX_NAME_LEN)?;
        match self {
            AgentMessage::Register { response_channel, .. } => {
                check_len("response channel", &response_channel.to_string_lossy(), MAX_NAME_LEN)
            }
            AgentMessage::Reserve { response_channel, family, .. } => {
                check_len("response channel", &response_channel.to_string_lossy(), MAX_NAME_LEN)?;
                check_len("family", family, MAX_NAME_LEN)
            }
            AgentMessage::Done { .. } => Ok(()),
        }
    }
}

/// Records written by the controller on an agent's response channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ControllerResponse {
    CurrentHour { hour: i64 },
    Approved { assigned_hour: i64, current_hour: i64, message: String },
    Rescheduled { assigned_hour: i64, current_hour: i64, message: String },
    Denied { current_hour: i64, message: String },
    DayEnd,
}

impl ControllerResponse {
    pub fn current_hour(&self) -> Option<i64> {
        match self {
            ControllerResponse::CurrentHour { hour } => Some(*hour),
            ControllerResponse::Approved { current_hour, .. }
            | ControllerResponse::Rescheduled { current_hour, .. }
            | ControllerResponse::Denied { current_hour, .. } => Some(*current_hour),
            ControllerResponse::DayEnd => None,
        }
    }
}

impl WireRecord for ControllerResponse {
    const RECORD_SIZE: usize = RESPONSE_RECORD_SIZE;

    fn validate(&self) -> Result<(), String> {
        match self {
            ControllerResponse::Approved { message, .. }
            | ControllerResponse::Rescheduled { message, .. }
            | ControllerResponse::Denied { message, .. } => check_len("message", message, MAX_TEXT_LEN),
            ControllerResponse::CurrentHour { .. } | ControllerResponse::DayEnd => Ok(()),
        }
    }
}

impl fmt::Display for ControllerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerResponse::CurrentHour { hour } => write!(f, "Current simulation hour: {}:00", hour),
            ControllerResponse::Approved { message, .. }
            | ControllerResponse::Rescheduled { message, .. }
            | ControllerResponse::Denied { message, .. } => write!(f, "{}", message),
            ControllerResponse::DayEnd => write!(f, "The simulated day has ended"),
        }
    }
}

use serde::{Deserialize, Serialize};

/// Controller configuration as read from a JSON file (`--config`).
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfigDto {
    pub start_hour: i64,
    pub end_hour: i64,
    pub seconds_per_hour: f64,
    pub max_capacity: i64,
    pub inbound_channel: String,
    #[serde(default)]
    pub registry_capacity: Option<usize>,
    #[serde(default)]
    pub in_flight_grace_ms: Option<u64>,
    #[serde(default)]
    pub listener_grace_ms: Option<u64>,
}

/// One line of an agent's request file: `family,hour,party_size`.
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq, Eq)]
pub struct RequestLineDto {
    pub family: String,
    pub hour: i64,
    pub party_size: i64,
}

use std::path::PathBuf;
use std::time::Duration;

use crate::api::config_dto::ControllerConfigDto;
use crate::error::{Error, Result};

/// First hour of the operating window.
pub const MIN_HOUR: i64 = 7;
/// Last hour of the operating window.
pub const MAX_HOUR: i64 = 19;
/// Number of consecutive hourly slots a reservation occupies.
pub const RESERVATION_DURATION: i64 = 2;

pub const DEFAULT_REGISTRY_CAPACITY: usize = 50;

/// Bounded retry used when opening a channel whose other end may not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        RetryPolicy { attempts: attempts.max(1), backoff }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { attempts: 5, backoff: Duration::from_secs(1) }
    }
}

/// Parameters the scheduling core works with.
///
/// The operating window `[MIN_HOUR, MAX_HOUR]` is fixed; `start_hour` and
/// `end_hour` delimit the simulated day inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub min_hour: i64,
    pub max_hour: i64,
    pub start_hour: i64,
    pub end_hour: i64,
    pub max_capacity: i64,
    pub duration: i64,
}

impl ScheduleConfig {
    pub fn new(start_hour: i64, end_hour: i64, max_capacity: i64) -> Self {
        ScheduleConfig { min_hour: MIN_HOUR, max_hour: MAX_HOUR, start_hour, end_hour, max_capacity, duration: RESERVATION_DURATION }
    }

    pub fn is_operating_hour(&self, hour: i64) -> bool {
        hour >= self.min_hour && hour <= self.max_hour
    }

    /// Latest start hour whose whole window still fits in the simulated day.
    pub fn last_start_hour(&self) -> i64 {
        self.end_hour - self.duration + 1
    }
}

/// Runtime configuration of the controller process.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub start_hour: i64,
    pub end_hour: i64,
    /// Wall-clock duration of one simulated hour.
    pub tick: Duration,
    pub max_capacity: i64,
    pub inbound_channel: PathBuf,
    pub registry_capacity: usize,
    /// Time given to in-flight responses once the day is over.
    pub in_flight_grace: Duration,
    /// Time the listener gets to stop on its own before it is aborted.
    pub listener_grace: Duration,
    /// Retry used when opening an agent's response channel.
    pub response_retry: RetryPolicy,
    /// Upper bound for writing one response record.
    pub response_write_timeout: Duration,
}

impl ControllerConfig {
    pub fn new(start_hour: i64, end_hour: i64, tick: Duration, max_capacity: i64, inbound_channel: impl Into<PathBuf>) -> Self {
        ControllerConfig {
            start_hour,
            end_hour,
            tick,
            max_capacity,
            inbound_channel: inbound_channel.into(),
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            in_flight_grace: Duration::from_secs(2),
            listener_grace: Duration::from_secs(1),
            response_retry: RetryPolicy::new(20, Duration::from_millis(50)),
            response_write_timeout: Duration::from_secs(1),
        }
    }

    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig::new(self.start_hour, self.end_hour, self.max_capacity)
    }

    /// Checks the invariants the scheduling core relies on.
    pub fn validate(&self) -> Result<()> {
        for (name, hour) in [("start hour", self.start_hour), ("end hour", self.end_hour)] {
            if !(MIN_HOUR..=MAX_HOUR).contains(&hour) {
                return Err(Error::InvalidConfiguration(format!("{} {} must be between {} and {}", name, hour, MIN_HOUR, MAX_HOUR)));
            }
        }

        if self.start_hour >= self.end_hour {
            return Err(Error::InvalidConfiguration(format!(
                "start hour ({}) must be lower than end hour ({})",
                self.start_hour, self.end_hour
            )));
        }

        if self.tick.is_zero() {
            return Err(Error::InvalidConfiguration("seconds per hour must be greater than 0".to_string()));
        }

        if self.max_capacity <= 0 {
            return Err(Error::InvalidConfiguration("maximum capacity must be greater than 0".to_string()));
        }

        if self.registry_capacity == 0 {
            return Err(Error::InvalidConfiguration("registry capacity must be greater than 0".to_string()));
        }

        if self.inbound_channel.as_os_str().is_empty() {
            return Err(Error::InvalidConfiguration("inbound channel path must not be empty".to_string()));
        }

        Ok(())
    }
}

impl TryFrom<ControllerConfigDto> for ControllerConfig {
    type Error = Error;

    fn try_from(dto: ControllerConfigDto) -> Result<Self> {
        if !dto.seconds_per_hour.is_finite() || dto.seconds_per_hour <= 0.0 {
            return Err(Error::InvalidConfiguration(format!("secondsPerHour must be positive, got {}", dto.seconds_per_hour)));
        }

        let tick = Duration::try_from_secs_f64(dto.seconds_per_hour)
            .map_err(|e| Error::InvalidConfiguration(format!("secondsPerHour {} is not a valid duration: {}", dto.seconds_per_hour, e)))?;

        let mut config = ControllerConfig::new(dto.start_hour, dto.end_hour, tick, dto.max_capacity, dto.inbound_channel);

        if let Some(capacity) = dto.registry_capacity {
            config.registry_capacity = capacity;
        }
        if let Some(ms) = dto.in_flight_grace_ms {
            config.in_flight_grace = Duration::from_millis(ms);
        }
        if let Some(ms) = dto.listener_grace_ms {
            config.listener_grace = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Runtime configuration of one agent process.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub agent_id: String,
    pub inbound_channel: PathBuf,
    /// Directory the response channel is created in.
    pub response_dir: PathBuf,
    pub connect_retry: RetryPolicy,
    /// Pause between two consecutive requests.
    pub request_interval: Duration,
    pub response_timeout: Duration,
}

impl AgentConfig {
    pub fn new(agent_id: impl Into<String>, inbound_channel: impl Into<PathBuf>) -> Self {
        AgentConfig {
            agent_id: agent_id.into(),
            inbound_channel: inbound_channel.into(),
            response_dir: PathBuf::from("."),
            connect_retry: RetryPolicy::default(),
            request_interval: Duration::from_secs(2),
            response_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ControllerConfig {
        ControllerConfig::new(7, 19, Duration::from_secs(1), 100, "/tmp/inbound")
    }

    #[test]
    fn accepts_valid_configuration() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_hours_outside_operating_window() {
        let mut config = valid();
        config.start_hour = 6;
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration(_))));

        let mut config = valid();
        config.end_hour = 20;
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn rejects_inverted_day_and_empty_parameters() {
        let mut config = valid();
        config.start_hour = 12;
        config.end_hour = 12;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.tick = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.max_capacity = 0;
        assert!(config.validate().is_err());
    }

    fn dto(seconds_per_hour: f64) -> ControllerConfigDto {
        ControllerConfigDto {
            start_hour: 7,
            end_hour: 19,
            seconds_per_hour,
            max_capacity: 100,
            inbound_channel: "/tmp/inbound".to_string(),
            registry_capacity: None,
            in_flight_grace_ms: None,
            listener_grace_ms: None,
        }
    }

    #[test]
    fn dto_converts_fractional_seconds() {
        let config = ControllerConfig::try_from(dto(0.25)).unwrap();
        assert_eq!(config.tick, Duration::from_millis(250));
    }

    #[test]
    fn unrepresentable_seconds_per_hour_is_rejected() {
        assert!(matches!(ControllerConfig::try_from(dto(1e30)), Err(Error::InvalidConfiguration(_))));
        assert!(matches!(ControllerConfig::try_from(dto(f64::INFINITY)), Err(Error::InvalidConfiguration(_))));
        assert!(matches!(ControllerConfig::try_from(dto(-1.0)), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn last_start_hour_keeps_window_inside_day() {
        let schedule = ScheduleConfig::new(7, 19, 100);
        assert_eq!(schedule.last_start_hour(), 18);
        assert!(schedule.is_operating_hour(7));
        assert!(!schedule.is_operating_hour(20));
    }
}

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::domain::reservation_system::config::ScheduleConfig;
use crate::domain::reservation_system::reservation::reservation::Reservation;
use crate::domain::reservation_system::schedule::schedule_state::SharedSchedule;

/// Read access to the simulated hour.
pub trait SimulationClock: std::fmt::Debug + Send + Sync {
    fn current_hour(&self) -> i64;
}

/// Read-only view on the hour published by a [`VirtualClock`].
#[derive(Debug, Clone)]
pub struct ClockHandle {
    hour: watch::Receiver<i64>,
    end_hour: i64,
}

impl ClockHandle {
    /// The day is over once the hour has moved past the configured end hour.
    pub fn is_day_over(&self) -> bool {
        self.current_hour() > self.end_hour
    }
}

impl SimulationClock for ClockHandle {
    fn current_hour(&self) -> i64 {
        *self.hour.borrow()
    }
}

/// Why [`VirtualClock::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStop {
    DayEnded,
    Cancelled,
}

/// What changed when the clock entered a new hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourStatus {
    pub hour: i64,
    /// Reservations whose last hour was the previous one.
    pub leaving: Vec<Reservation>,
    /// Reservations starting at this hour.
    pub entering: Vec<Reservation>,
    /// Persons committed to this hour (0 outside the operating window).
    pub occupancy: i64,
    pub capacity: i64,
    pub activated: usize,
    pub deactivated: usize,
}

/// Drives the simulated day: one hour per `tick` of wall-clock time.
///
/// The clock task exclusively owns the current hour. It publishes every new
/// hour through a watch channel from inside the schedule lock, so the engine
/// always observes an hour together with the activation state that belongs to it.
#[derive(Debug)]
pub struct VirtualClock {
    current_hour: i64,
    start_hour: i64,
    end_hour: i64,
    tick: Duration,
    schedule: SharedSchedule,
    hour_tx: watch::Sender<i64>,
}

impl VirtualClock {
    pub fn new(config: &ScheduleConfig, tick: Duration, schedule: SharedSchedule) -> (Self, ClockHandle) {
        let (hour_tx, hour_rx) = watch::channel(config.start_hour);

        let clock = VirtualClock { current_hour: config.start_hour, start_hour: config.start_hour, end_hour: config.end_hour, tick, schedule, hour_tx };
        let handle = ClockHandle { hour: hour_rx, end_hour: config.end_hour };

        (clock, handle)
    }

    pub fn is_day_over(&self) -> bool {
        self.current_hour > self.end_hour
    }

    /// Waits one tick and advances the hour.
    ///
    /// # Returns
    /// `None` if `cancel` fired before the tick completed; the hour is left untouched.
    pub async fn tick(&mut self, cancel: &CancellationToken) -> Option<HourStatus> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            _ = tokio::time::sleep(self.tick) => Some(self.advance()),
        }
    }

    /// Moves to the next hour and runs the activation pass, atomically with
    /// respect to any commit of the scheduling engine.
    pub fn advance(&mut self) -> HourStatus {
        let mut state = self.schedule.lock();

        self.current_hour += 1;
        let hour = self.current_hour;

        let (activated, deactivated) = state.reservations.update_activation(hour);
        let start_hour = self.start_hour;
        let leaving = state.reservations.filter(|res| res.end_hour == hour - 1 && res.end_hour >= start_hour);
        let entering = state.reservations.filter(|res| res.start_hour == hour);
        let occupancy = state.capacity.load(hour).unwrap_or(0);
        let capacity = state.capacity.capacity();

        self.hour_tx.send_replace(hour);
        drop(state);

        log::debug!("Clock advanced to {}:00 ({} activated, {} deactivated).", hour, activated, deactivated);

        HourStatus { hour, leaving, entering, occupancy, capacity, activated, deactivated }
    }

    /// Ticks until the hour passes the end of the day or `cancel` fires.
    ///
    /// Consumes the clock, so once this returns no further tick can run.
    pub async fn run(mut self, cancel: CancellationToken) -> ClockStop {
        log::info!("Virtual clock started at {}:00, day ends after {}:00, {:?} per hour.", self.current_hour, self.end_hour, self.tick);

        while !self.is_day_over() {
            match self.tick(&cancel).await {
                Some(status) => log::info!("{}", status),
                None => {
                    log::warn!("Virtual clock cancelled at {}:00.", self.current_hour);
                    return ClockStop::Cancelled;
                }
            }
        }

        log::info!("Simulated day finished at {}:00.", self.current_hour);
        ClockStop::DayEnded
    }
}

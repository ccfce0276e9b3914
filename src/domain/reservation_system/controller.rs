use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::reservation_system::agent_registry::agent_registry::AgentRegistry;
use crate::domain::reservation_system::channel_communication::channel::{self, NamedChannel};
use crate::domain::reservation_system::channel_communication::listener::{Listener, ResponseSettings};
use crate::domain::reservation_system::config::ControllerConfig;
use crate::domain::reservation_system::report::DayReport;
use crate::domain::reservation_system::schedule::schedule_state::SharedSchedule;
use crate::domain::reservation_system::scheduler::scheduling_engine::SchedulingEngine;
use crate::domain::reservation_system::utils::os_signals;
use crate::domain::reservation_system::utils::statistics::RequestStatistics;
use crate::domain::simulator::virtual_clock::{ClockStop, VirtualClock};
use crate::error::Result;

/// Runs one simulated day, ending early on SIGINT/SIGTERM.
pub async fn run(config: ControllerConfig) -> Result<DayReport> {
    let cancel = CancellationToken::new();
    let signals = tokio::spawn(os_signals::cancel_on_signal(cancel.clone()));

    let result = run_with_cancellation(config, cancel.clone()).await;

    signals.abort();
    result
}

/// Runs one simulated day until it ends or `cancel` fires.
///
/// Shutdown order once the clock has stopped: a grace period for in-flight
/// responses, then the listener is cancelled and given `listener_grace` to
/// finish before it is aborted, and only then the report is collected.
pub async fn run_with_cancellation(config: ControllerConfig, cancel: CancellationToken) -> Result<DayReport> {
    config.validate()?;
    let schedule_config = config.schedule();

    let inbound = NamedChannel::create(&config.inbound_channel)?;
    let receiver = channel::accept(inbound.path())?;

    let schedule = SharedSchedule::new(&schedule_config);
    let statistics = RequestStatistics::new();
    let registry = AgentRegistry::new(config.registry_capacity);

    let (clock, clock_handle) = VirtualClock::new(&schedule_config, config.tick, schedule.clone());
    let engine = SchedulingEngine::new(schedule_config, schedule.clone(), Arc::new(clock_handle.clone()), statistics.clone());

    let listener = Listener::new(
        inbound.path(),
        receiver,
        engine,
        registry.clone(),
        clock_handle,
        ResponseSettings { retry: config.response_retry, write_timeout: config.response_write_timeout },
    );

    log::info!(
        "Controller started: day {}:00-{}:00, capacity {}, {:?} per hour, inbound channel '{}'.",
        config.start_hour,
        config.end_hour,
        config.max_capacity,
        config.tick,
        inbound.path().display()
    );

    let listener_cancel = cancel.child_token();
    let mut listener_task = tokio::spawn(listener.run(listener_cancel.clone()));
    let mut clock_task = tokio::spawn(clock.run(cancel.clone()));

    let stop = tokio::select! {
        stop = &mut clock_task => stop?,
        result = &mut listener_task => {
            cancel.cancel();
            let stop = clock_task.await?;
            result??;
            log::warn!("Listener stopped before the clock ({:?}).", stop);
            return Ok(DayReport::collect(&schedule_config, &schedule, &statistics, &registry));
        }
    };

    if stop == ClockStop::DayEnded {
        log::info!("Day over, waiting {:?} for in-flight responses.", config.in_flight_grace);
        tokio::select! {
            _ = cancel.cancelled() => {},
            _ = tokio::time::sleep(config.in_flight_grace) => {},
        }
    }

    listener_cancel.cancel();
    match tokio::time::timeout(config.listener_grace, &mut listener_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => log::error!("Listener failed during shutdown: {}", e),
        Ok(Err(e)) => log::error!("Listener task failed: {}", e),
        Err(_) => {
            log::warn!("Listener did not stop within {:?}, aborting it.", config.listener_grace);
            listener_task.abort();
        }
    }

    let report = DayReport::collect(&schedule_config, &schedule, &statistics, &registry);
    log::info!("Day report collected: {} requests, {} reservations.", report.statistics.total(), report.reservations);

    drop(inbound);
    Ok(report)
}

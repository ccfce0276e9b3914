use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::unix::pipe::Receiver;
use tokio_util::sync::CancellationToken;

use crate::domain::reservation_system::agent_registry::agent_registry::{AgentRegistry, RegistrationOutcome};
use crate::domain::reservation_system::channel_communication::channel::{self, ReadOutcome};
use crate::domain::reservation_system::channel_communication::protocol::{AgentMessage, ControllerResponse};
use crate::domain::reservation_system::config::RetryPolicy;
use crate::domain::reservation_system::scheduler::scheduling_engine::{ANALYTICS_TARGET, ReservationRequest, SchedulingEngine};
use crate::domain::reservation_system::utils::id::{AgentId, FamilyName};
use crate::domain::simulator::virtual_clock::{ClockHandle, SimulationClock};
use crate::error::Result;

/// How the listener answers agents.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSettings {
    pub retry: RetryPolicy,
    pub write_timeout: Duration,
}

/// Single reader of the shared inbound channel.
///
/// Every REGISTER and RESERVE record is answered with exactly one response
/// record; DONE records are not answered.
#[derive(Debug)]
pub struct Listener {
    path: PathBuf,
    receiver: Receiver,
    engine: SchedulingEngine,
    registry: AgentRegistry,
    clock: ClockHandle,
    responses: ResponseSettings,
}

impl Listener {
    pub fn new(
        path: &Path,
        receiver: Receiver,
        engine: SchedulingEngine,
        registry: AgentRegistry,
        clock: ClockHandle,
        responses: ResponseSettings,
    ) -> Self {
        Listener { path: path.to_path_buf(), receiver, engine, registry, clock, responses }
    }

    /// Serves the inbound channel until `cancel` fires.
    ///
    /// # Returns
    /// An error if the inbound channel itself fails; malformed records and
    /// failed response deliveries are logged and skipped.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        log::info!("Listener started on '{}'.", self.path.display());

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = channel::read_record::<AgentMessage>(&mut self.receiver) => outcome?,
            };

            match outcome {
                ReadOutcome::Record(message) => self.dispatch(message).await,
                ReadOutcome::EndOfStream => {
                    log::debug!("All writers left '{}', reopening.", self.path.display());
                    channel::reopen(&self.path, &mut self.receiver)?;
                }
                ReadOutcome::Short(n) => {
                    log::warn!("Discarded short record of {} bytes on '{}'.", n, self.path.display());
                }
                ReadOutcome::Malformed(reason) => {
                    log::warn!("Discarded malformed record on '{}': {}", self.path.display(), reason);
                }
            }
        }

        log::info!("Listener stopped.");
        Ok(())
    }

    async fn dispatch(&self, message: AgentMessage) {
        log::debug!("Received {} from agent '{}'.", message.kind(), message.agent_id());

        match message {
            AgentMessage::Register { agent_id, response_channel } => {
                let outcome = self.registry.register(AgentId::new(agent_id.clone()), &response_channel);
                let response = if self.clock.is_day_over() {
                    ControllerResponse::DayEnd
                } else {
                    ControllerResponse::CurrentHour { hour: self.clock.current_hour() }
                };

                match outcome {
                    RegistrationOutcome::Registered => log::info!("Agent '{}' registered.", agent_id),
                    RegistrationOutcome::Refreshed => log::info!("Agent '{}' registered again.", agent_id),
                    RegistrationOutcome::CapacityExceeded => {}
                }
                tracing::info!(target: ANALYTICS_TARGET, Agent = %agent_id, Registration = ?outcome, "agent registration");

                self.deliver(&response_channel, response).await;
            }
            AgentMessage::Reserve { agent_id, response_channel, family, requested_hour, party_size } => {
                let request = ReservationRequest {
                    agent_id: AgentId::new(agent_id),
                    response_channel,
                    family: FamilyName::new(family),
                    requested_hour,
                    party_size,
                };

                let response = self.engine.handle_request(&request).into_response();
                self.deliver(&request.response_channel, response).await;
            }
            AgentMessage::Done { agent_id } => {
                if self.registry.deactivate(&AgentId::new(agent_id.clone())) {
                    log::info!("Agent '{}' finished.", agent_id);
                } else {
                    log::warn!("DONE from unregistered agent '{}'.", agent_id);
                }
            }
        }
    }

    async fn deliver(&self, path: &Path, response: ControllerResponse) {
        if let Err(e) = channel::respond(path, response, self.responses.retry, self.responses.write_timeout).await {
            log::warn!("Response to '{}' not delivered: {}", path.display(), e);
        }
    }
}

use tokio::net::unix::pipe::Sender;

use crate::api::config_dto::RequestLineDto;
use crate::domain::reservation_system::channel_communication::channel::{self, ResponseChannel};
use crate::domain::reservation_system::channel_communication::protocol::{AgentMessage, ControllerResponse};
use crate::domain::reservation_system::config::AgentConfig;
use crate::error::{Error, Result};

/// What an agent learned during its run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    /// Hour reported at registration, `None` if the day had already ended.
    pub registered_hour: Option<i64>,
    /// One response per submitted request, in submission order.
    pub responses: Vec<ControllerResponse>,
}

/// A client process submitting reservation requests to the controller.
#[derive(Debug)]
pub struct Agent {
    config: AgentConfig,
    inbound: Sender,
    responses: ResponseChannel,
}

impl Agent {
    /// Creates the response channel and opens the controller's inbound channel.
    ///
    /// Fails if the controller is not listening after the configured retries.
    pub async fn connect(config: AgentConfig) -> Result<Self> {
        let responses = ResponseChannel::create(&config.response_dir, &config.agent_id)?;
        let inbound = channel::connect_with_retry(&config.inbound_channel, config.connect_retry).await?;

        log::info!("Agent '{}' connected to '{}'.", config.agent_id, config.inbound_channel.display());
        Ok(Agent { config, inbound, responses })
    }

    async fn exchange(&mut self, message: AgentMessage) -> Result<ControllerResponse> {
        let pending = self.responses.listen()?;
        channel::send_record(&mut self.inbound, &self.config.inbound_channel, message).await?;
        pending.receive(self.config.response_timeout).await
    }

    async fn register(&mut self) -> Result<Option<i64>> {
        let message = AgentMessage::Register { agent_id: self.config.agent_id.clone(), response_channel: self.responses.path().to_path_buf() };

        match self.exchange(message).await? {
            ControllerResponse::CurrentHour { hour } => {
                log::info!("Registered with the controller. Current simulation hour: {}:00.", hour);
                Ok(Some(hour))
            }
            ControllerResponse::DayEnd => {
                log::warn!("The simulated day has already ended.");
                Ok(None)
            }
            other => Err(Error::UnexpectedResponse(format!("{:?} in reply to REGISTER", other))),
        }
    }

    async fn reserve(&mut self, request: &RequestLineDto) -> Result<ControllerResponse> {
        let message = AgentMessage::Reserve {
            agent_id: self.config.agent_id.clone(),
            response_channel: self.responses.path().to_path_buf(),
            family: request.family.clone(),
            requested_hour: request.hour,
            party_size: request.party_size,
        };

        let response = self.exchange(message).await?;
        match &response {
            ControllerResponse::Approved { .. } | ControllerResponse::Rescheduled { .. } | ControllerResponse::Denied { .. } => Ok(response),
            other => Err(Error::UnexpectedResponse(format!("{:?} in reply to RESERVE", other))),
        }
    }

    /// Registers, submits `requests` one at a time and says goodbye.
    pub async fn run(mut self, requests: Vec<RequestLineDto>) -> Result<AgentOutcome> {
        let registered_hour = self.register().await?;
        let mut outcome = AgentOutcome { registered_hour, responses: Vec::with_capacity(requests.len()) };

        if let Some(start_hour) = registered_hour {
            let mut current_hour = start_hour;

            for (index, request) in requests.iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(self.config.request_interval).await;
                }

                if request.hour < current_hour {
                    log::warn!("Request of family {} for {}:00 is already late (current hour {}:00).", request.family, request.hour, current_hour);
                }

                log::info!("Requesting {}:00 for family {} ({} people).", request.hour, request.family, request.party_size);
                let response = self.reserve(request).await?;
                log::info!("{}", response);

                if let Some(hour) = response.current_hour() {
                    current_hour = hour;
                }
                outcome.responses.push(response);
            }
        }

        // The outcome is returned even if DONE cannot be delivered.
        let done = AgentMessage::Done { agent_id: self.config.agent_id.clone() };
        if let Err(e) = channel::send_record(&mut self.inbound, &self.config.inbound_channel, done).await {
            log::warn!("Agent '{}' could not send DONE: {}", self.config.agent_id, e);
        }
        log::info!("Agent '{}' finished after {} requests.", self.config.agent_id, outcome.responses.len());

        Ok(outcome)
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use slot_reservation::api::config_dto::RequestLineDto;
use slot_reservation::domain::reservation_system::agent::Agent;
use slot_reservation::domain::reservation_system::channel_communication::protocol::ControllerResponse;
use slot_reservation::domain::reservation_system::config::{AgentConfig, ControllerConfig, RetryPolicy};
use slot_reservation::domain::reservation_system::controller;

fn inbound_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("test_day_{}_{}", name, uuid::Uuid::new_v4().simple()))
}

fn controller_config(path: &Path, start: i64, end: i64, tick: Duration) -> ControllerConfig {
    let mut config = ControllerConfig::new(start, end, tick, 100, path);
    config.in_flight_grace = Duration::from_millis(300);
    config.listener_grace = Duration::from_millis(200);
    config
}

fn agent_config(name: &str, path: &Path) -> AgentConfig {
    let mut config = AgentConfig::new(name, path);
    config.response_dir = std::env::temp_dir();
    config.connect_retry = RetryPolicy::new(100, Duration::from_millis(10));
    config.request_interval = Duration::from_millis(5);
    config.response_timeout = Duration::from_secs(5);
    config
}

fn line(family: &str, hour: i64, party_size: i64) -> RequestLineDto {
    RequestLineDto { family: family.to_string(), hour, party_size }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_day_with_two_agents() {
    let path = inbound_path("two_agents");
    let controller = tokio::spawn(controller::run_with_cancellation(
        controller_config(&path, 7, 10, Duration::from_millis(400)),
        CancellationToken::new(),
    ));

    let first = tokio::spawn({
        let config = agent_config("agent-1", &path);
        async move { Agent::connect(config).await?.run(vec![line("Garcia", 9, 50), line("Lopez", 9, 30)]).await }
    });
    let second = tokio::spawn({
        let config = agent_config("agent-2", &path);
        async move { Agent::connect(config).await?.run(vec![line("Big", 9, 150), line("Early", 3, 5)]).await }
    });

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    let report = controller.await.unwrap().unwrap();

    assert!(first.registered_hour.is_some());
    assert_eq!(first.responses.len(), 2);
    assert!(matches!(first.responses[0], ControllerResponse::Approved { assigned_hour: 9, .. }));
    assert!(matches!(first.responses[1], ControllerResponse::Approved { assigned_hour: 9, .. }));

    assert_eq!(second.responses.len(), 2);
    assert!(second.responses.iter().all(|response| matches!(response, ControllerResponse::Denied { .. })));

    assert_eq!(report.statistics.accepted, 2);
    assert_eq!(report.statistics.denied, 2);
    assert_eq!(report.statistics.total(), 4);
    assert_eq!(report.reservations, 2);
    assert_eq!(report.registered_agents, 2);
    assert_eq!(report.peak_load(), 80);
    assert_eq!(report.occupancy.last().map(|h| h.hour), Some(10));

    assert!(!path.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_agent_arriving_after_day_end_gets_day_end() {
    let path = inbound_path("late_agent");
    let mut config = controller_config(&path, 18, 19, Duration::from_millis(20));
    config.in_flight_grace = Duration::from_secs(2);
    let controller = tokio::spawn(controller::run_with_cancellation(config, CancellationToken::new()));

    tokio::time::sleep(Duration::from_millis(400)).await;

    let outcome = Agent::connect(agent_config("late", &path)).await.unwrap().run(vec![line("Late", 18, 2)]).await.unwrap();
    let report = controller.await.unwrap().unwrap();

    assert_eq!(outcome.registered_hour, None);
    assert!(outcome.responses.is_empty());
    assert_eq!(report.statistics.total(), 0);
}

#[tokio::test]
async fn test_cancellation_ends_day_early_and_removes_channel() {
    let path = inbound_path("cancelled");
    let cancel = CancellationToken::new();
    let controller = tokio::spawn(controller::run_with_cancellation(controller_config(&path, 7, 19, Duration::from_secs(60)), cancel.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(path.exists());
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(5), controller).await.unwrap().unwrap().unwrap();

    assert_eq!(report.statistics.total(), 0);
    assert!(report.peak_hours.is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected_before_channel_creation() {
    let path = inbound_path("invalid");

    let result = controller::run_with_cancellation(controller_config(&path, 12, 9, Duration::from_millis(10)), CancellationToken::new()).await;

    assert!(result.is_err());
    assert!(!path.exists());
}

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use slot_reservation::domain::reservation_system::channel_communication::channel::{self, NamedChannel, ReadOutcome};
use slot_reservation::domain::reservation_system::channel_communication::protocol::AgentMessage;
use slot_reservation::domain::reservation_system::config::RetryPolicy;

fn channel_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("test_{}_{}", name, uuid::Uuid::new_v4().simple()))
}

fn reserve(agent: usize, i: usize) -> AgentMessage {
    AgentMessage::Reserve {
        agent_id: format!("agent-{}", agent),
        response_channel: PathBuf::from(format!("/tmp/pipe_agent-{}", agent)),
        family: format!("family-{}-{}", agent, i),
        requested_hour: 7 + (i as i64 % 13),
        party_size: 1 + i as i64,
    }
}

#[tokio::test]
async fn test_concurrent_writers_deliver_whole_records() {
    let inbound = NamedChannel::create(channel_path("writers")).unwrap();
    let mut receiver = channel::accept(inbound.path()).unwrap();

    let writers: Vec<_> = (0..6)
        .map(|agent| {
            let path = inbound.path().to_path_buf();
            tokio::spawn(async move {
                let mut sender = channel::connect_with_retry(&path, RetryPolicy::default()).await.unwrap();
                for i in 0..25 {
                    channel::send_record(&mut sender, &path, reserve(agent, i)).await.unwrap();
                }
            })
        })
        .collect();

    let mut seen = HashSet::new();
    while seen.len() < 150 {
        match channel::read_record::<AgentMessage>(&mut receiver).await.unwrap() {
            ReadOutcome::Record(AgentMessage::Reserve { family, .. }) => {
                assert!(seen.insert(family));
            }
            ReadOutcome::EndOfStream => channel::reopen(inbound.path(), &mut receiver).unwrap(),
            other => panic!("unexpected read outcome {:?}", other),
        }
    }

    for writer in writers {
        writer.await.unwrap();
    }
}

#[tokio::test]
async fn test_reopen_after_end_of_stream_accepts_new_writers() {
    let inbound = NamedChannel::create(channel_path("reopen")).unwrap();
    let mut receiver = channel::accept(inbound.path()).unwrap();

    let mut first = channel::connect_with_retry(inbound.path(), RetryPolicy::default()).await.unwrap();
    channel::send_record(&mut first, inbound.path(), AgentMessage::Done { agent_id: "first".to_string() }).await.unwrap();
    drop(first);

    assert_eq!(
        channel::read_record::<AgentMessage>(&mut receiver).await.unwrap(),
        ReadOutcome::Record(AgentMessage::Done { agent_id: "first".to_string() })
    );
    assert_eq!(channel::read_record::<AgentMessage>(&mut receiver).await.unwrap(), ReadOutcome::EndOfStream);

    channel::reopen(inbound.path(), &mut receiver).unwrap();

    let mut second = channel::connect_with_retry(inbound.path(), RetryPolicy::new(3, Duration::from_millis(10))).await.unwrap();
    channel::send_record(&mut second, inbound.path(), AgentMessage::Done { agent_id: "second".to_string() }).await.unwrap();

    let next = tokio::time::timeout(Duration::from_secs(5), channel::read_record::<AgentMessage>(&mut receiver)).await.unwrap().unwrap();
    assert_eq!(next, ReadOutcome::Record(AgentMessage::Done { agent_id: "second".to_string() }));
}

#[tokio::test]
async fn test_sender_waits_for_late_reader() {
    let inbound = NamedChannel::create(channel_path("late_reader")).unwrap();
    let path = inbound.path().to_path_buf();

    let connect = tokio::spawn(async move { channel::connect_with_retry(&path, RetryPolicy::new(50, Duration::from_millis(10))).await });

    tokio::time::sleep(Duration::from_millis(60)).await;
    let _receiver = channel::accept(inbound.path()).unwrap();

    assert!(connect.await.unwrap().is_ok());
}

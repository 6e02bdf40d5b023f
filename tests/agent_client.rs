mod common;

use common::{closed_port, start_mock_agent, AgentBehavior};
use failover_keeper::node::{AgentClient, NodeClient, ProbeOutcome};
use failover_keeper::Error;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_probe_classifies_agent_replies() {
    let behavior = AgentBehavior::primary("");
    let addr = start_mock_agent(behavior.clone()).await;
    let client = AgentClient::default();

    assert_eq!(client.probe(&addr.to_string(), Duration::from_secs(2)).await, ProbeOutcome::Alive);

    behavior.fail_health(500);
    assert_eq!(
        client.probe(&format!("http://{}", addr), Duration::from_secs(2)).await,
        ProbeOutcome::QueryFailed
    );

    let dead = closed_port().await;
    assert_eq!(client.probe(&dead.to_string(), Duration::from_secs(2)).await, ProbeOutcome::Unreachable);
}

#[tokio::test]
async fn test_silent_agent_is_cut_off_at_timeout() {
    let behavior = AgentBehavior::primary("");
    behavior.silent.store(true, Ordering::SeqCst);
    let addr = start_mock_agent(behavior).await;
    let client = AgentClient::default();

    let started = Instant::now();
    let outcome = client.probe(&addr.to_string(), Duration::from_millis(300)).await;
    assert_eq!(outcome, ProbeOutcome::QueryFailed);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_promote_and_recovery_status() {
    let behavior = AgentBehavior::replica();
    let addr = start_mock_agent(behavior.clone()).await;
    let client = AgentClient::default();
    let target = addr.to_string();

    assert!(client.is_in_recovery(&target).await.unwrap());
    client.promote(&target).await.unwrap();
    assert!(!client.is_in_recovery(&target).await.unwrap());
    assert_eq!(behavior.promotions(), 1);
}

#[tokio::test]
async fn test_sync_names_setting() {
    let behavior = AgentBehavior::primary("FIRST 1 (nodeB, \"Node C\")");
    let addr = start_mock_agent(behavior).await;
    let client = AgentClient::default();

    let raw = client.synchronous_standby_names(&addr.to_string()).await.unwrap();
    assert_eq!(raw, "FIRST 1 (nodeB, \"Node C\")");
}

#[tokio::test]
async fn test_agent_errors_are_transport_errors() {
    let behavior = AgentBehavior::primary("");
    let addr = start_mock_agent(behavior).await;
    let client = AgentClient::new(Duration::from_secs(1));

    let dead = closed_port().await;
    assert!(matches!(client.promote(&dead.to_string()).await, Err(Error::Transport { .. })));
    assert!(matches!(client.is_in_recovery("http://").await, Err(Error::InvalidTarget(_))));
    assert!(client.synchronous_standby_names(&addr.to_string()).await.is_ok());
}

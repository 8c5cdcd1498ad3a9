//! Contract Test: Failure Isolation
//!
//! Verifies how provider failures propagate.
//!
//! Constraints verified:
//! - A failing action aborts the remaining actions of its zone
//! - Actions applied before the failure stay applied
//! - The failing zone is not committed
//! - Other zones in the same run are still synced
//! - Errors carry the destination provider id

mod common;

use common::*;
use dnssync_core::{Error, SyncEvent};

#[tokio::test]
async fn failing_action_aborts_rest_of_zone() {
    let source = MockProvider::new("src").with_zone(
        "example.com",
        &["a IN A 192.0.2.1", "b IN A 192.0.2.2", "c IN A 192.0.2.3"],
    );
    let destination = MockProvider::new("dst")
        .with_zone("example.com", &[])
        .failing_in("example.com", 1);
    let counters = destination.counters();

    let (mut engine, rx) = engine(source, destination);
    let err = engine
        .sync_zone("example.com")
        .await
        .expect_err("second create fails");
    drop(engine);

    match &err {
        Error::Provider { provider, message } => {
            assert_eq!(provider, "dst");
            assert!(message.starts_with("Create b IN A 192.0.2.2"), "message: {message}");
        }
        other => panic!("expected provider error, got {other:?}"),
    }

    assert_eq!(
        counters.calls(),
        vec![
            "create example.com a IN A 192.0.2.1",
            "create example.com b IN A 192.0.2.2 (failed)",
        ]
    );
    assert_eq!(counters.commit_call_count(), 0);

    let events = drain(rx).await;
    assert!(matches!(
        events.last(),
        Some(SyncEvent::ActionFailed { action, .. }) if action == "Create b IN A 192.0.2.2"
    ));
}

#[tokio::test]
async fn other_zones_continue_after_a_failure() {
    let source = MockProvider::new("src")
        .with_zone("a.com", &["www IN A 192.0.2.1"])
        .with_zone("b.com", &["www IN A 192.0.2.2"])
        .with_zone("c.com", &["www IN A 192.0.2.3"]);
    let destination = MockProvider::new("dst")
        .with_zone("a.com", &[])
        .with_zone("b.com", &[])
        .with_zone("c.com", &[])
        .failing_in("b.com", 0);
    let counters = destination.counters();

    let (mut engine, rx) = engine(source, destination);
    let zones = vec!["c.com".to_string(), "a.com".to_string(), "b.com".to_string()];
    let summary = engine.run(&zones).await.expect("run completes");
    drop(engine);

    assert!(summary.has_failures());
    assert_eq!(
        summary.synced,
        vec![("a.com".to_string(), 1), ("c.com".to_string(), 1)]
    );
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "b.com");

    assert_eq!(
        counters.calls(),
        vec![
            "create a.com www IN A 192.0.2.1",
            "commit a.com",
            "create b.com www IN A 192.0.2.2 (failed)",
            "create c.com www IN A 192.0.2.3",
            "commit c.com",
        ]
    );

    let events = drain(rx).await;
    assert!(events.iter().any(
        |e| matches!(e, SyncEvent::ZoneFailed { zone, .. } if zone == "b.com")
    ));
}

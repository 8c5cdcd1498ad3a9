//! Contract Test: Reconciliation Results
//!
//! Verifies which actions the engine applies for the canonical scenarios.
//!
//! Constraints verified:
//! - Records matching on normalized data never produce create/delete pairs
//! - TTL-only differences produce exactly one update
//! - Missing records are created, surplus records deleted
//! - Types the destination cannot write are never touched
//! - Leftover records pair up in encounter order

mod common;

use common::*;
use dnssync_core::{DnsRecordType, SyncActionKind, ZoneOutcome};

const ZONE: &str = "example.com";

fn kinds(outcome: &ZoneOutcome) -> Vec<SyncActionKind> {
    match outcome {
        ZoneOutcome::Synced { actions } => actions.iter().map(|a| a.kind()).collect(),
        ZoneOutcome::Skipped { reason } => panic!("zone unexpectedly skipped: {reason}"),
    }
}

#[tokio::test]
async fn ttl_only_difference_is_a_single_update() {
    let source = MockProvider::new("src").with_zone(ZONE, &["www 600 IN A 192.0.2.1"]);
    let destination = MockProvider::new("dst").with_zone(ZONE, &["www 300 IN A 192.0.2.1"]);
    let counters = destination.counters();

    let (mut engine, _rx) = engine(source, destination);
    let outcome = engine.sync_zone(ZONE).await.expect("sync succeeds");

    assert_eq!(kinds(&outcome), vec![SyncActionKind::Update]);
    assert_eq!(
        counters.calls(),
        vec![
            "update example.com www 300 IN A 192.0.2.1 -> www 600 IN A 192.0.2.1",
            "commit example.com",
        ]
    );
}

#[tokio::test]
async fn identical_records_produce_no_calls() {
    let lines = ["@ IN MX 10 mail.example.com.", "@ IN TXT \"v=spf1 -all\"", "www IN A 192.0.2.1"];
    let source = MockProvider::new("src").with_zone(ZONE, &lines);
    let destination = MockProvider::new("dst").with_zone(ZONE, &lines);
    let counters = destination.counters();

    let (mut engine, _rx) = engine(source, destination);
    let outcome = engine.sync_zone(ZONE).await.expect("sync succeeds");

    assert!(kinds(&outcome).is_empty());
    assert_eq!(counters.crud_call_count(), 0);
    assert_eq!(counters.commit_call_count(), 0, "nothing to commit");
}

#[tokio::test]
async fn missing_record_is_created() {
    let source = MockProvider::new("src").with_zone(ZONE, &["www IN A 1.2.3.4"]);
    let destination = MockProvider::new("dst").with_zone(ZONE, &[]);
    let counters = destination.counters();

    let (mut engine, _rx) = engine(source, destination);
    let outcome = engine.sync_zone(ZONE).await.expect("sync succeeds");

    assert_eq!(kinds(&outcome), vec![SyncActionKind::Create]);
    assert_eq!(counters.calls()[0], "create example.com www IN A 1.2.3.4");
}

#[tokio::test]
async fn surplus_record_is_deleted() {
    let source = MockProvider::new("src").with_zone(ZONE, &[]);
    let destination = MockProvider::new("dst").with_zone(ZONE, &["old IN TXT \"hello\""]);
    let counters = destination.counters();

    let (mut engine, _rx) = engine(source, destination);
    let outcome = engine.sync_zone(ZONE).await.expect("sync succeeds");

    assert_eq!(kinds(&outcome), vec![SyncActionKind::Delete]);
    assert_eq!(counters.calls()[0], "delete example.com old IN TXT \"hello\"");
}

#[tokio::test]
async fn unwritable_types_are_never_touched() {
    let source = MockProvider::new("src").with_zone(
        ZONE,
        &["@ IN NS ns1.example.com.", "@ IN NS ns2.example.com."],
    );
    let destination = MockProvider::new("dst")
        .with_writable_types(&[DnsRecordType::A, DnsRecordType::Txt])
        .with_zone(ZONE, &["@ IN NS ns1.provider.net."]);
    let counters = destination.counters();

    let (mut engine, _rx) = engine(source, destination);
    let outcome = engine.sync_zone(ZONE).await.expect("sync succeeds");

    assert!(kinds(&outcome).is_empty());
    assert_eq!(counters.crud_call_count(), 0);
}

#[tokio::test]
async fn types_the_source_cannot_read_are_kept() {
    let source = MockProvider::new("src")
        .with_readable_types(&[DnsRecordType::A])
        .with_zone(ZONE, &["www IN A 192.0.2.1"]);
    let destination = MockProvider::new("dst").with_zone(
        ZONE,
        &["www IN A 192.0.2.1", "_dmarc IN TXT \"v=DMARC1; p=none\""],
    );
    let counters = destination.counters();

    let (mut engine, _rx) = engine(source, destination);
    engine.sync_zone(ZONE).await.expect("sync succeeds");

    assert_eq!(counters.crud_call_count(), 0);
}

#[tokio::test]
async fn leftover_records_pair_in_encounter_order() {
    let source = MockProvider::new("src")
        .with_zone(ZONE, &["api IN A 192.0.2.1", "api IN A 192.0.2.2"]);
    let destination = MockProvider::new("dst").with_zone(ZONE, &["api IN A 192.0.2.3"]);
    let counters = destination.counters();

    let (mut engine, _rx) = engine(source, destination);
    let outcome = engine.sync_zone(ZONE).await.expect("sync succeeds");

    assert_eq!(
        kinds(&outcome),
        vec![SyncActionKind::Update, SyncActionKind::Create]
    );
    assert_eq!(
        counters.calls(),
        vec![
            "update example.com api IN A 192.0.2.3 -> api IN A 192.0.2.1",
            "create example.com api IN A 192.0.2.2",
            "commit example.com",
        ]
    );
}

#[tokio::test]
async fn mixed_zone_applies_updates_then_residuals() {
    let source = MockProvider::new("src").with_zone(
        ZONE,
        &[
            "@ 3600 IN MX 10 mx1.example.com.",
            "www IN CNAME example.com.",
            "new IN A 192.0.2.50",
        ],
    );
    let destination = MockProvider::new("dst").with_zone(
        ZONE,
        &[
            "@ 300 IN MX 10 mx1.example.com.",
            "www IN CNAME old.example.com.",
            "gone IN A 192.0.2.99",
        ],
    );
    let counters = destination.counters();

    let (mut engine, _rx) = engine(source, destination);
    engine.sync_zone(ZONE).await.expect("sync succeeds");

    assert_eq!(
        counters.calls(),
        vec![
            "update example.com @ 300 IN MX 10 mx1.example.com. -> @ 3600 IN MX 10 mx1.example.com.",
            "update example.com www IN CNAME old.example.com. -> www IN CNAME example.com.",
            "create example.com new IN A 192.0.2.50",
            "delete example.com gone IN A 192.0.2.99",
            "commit example.com",
        ]
    );
}

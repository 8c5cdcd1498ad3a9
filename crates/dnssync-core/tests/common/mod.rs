//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides a scripted provider that records every call it
//! receives, so tests can assert on exactly what the engine did.

#![allow(dead_code)]

use async_trait::async_trait;
use dnssync_core::error::{Error, Result};
use dnssync_core::{DnsProvider, DnsRecordType, Record, SyncConfig, SyncEngine, SyncEvent, Zone};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A provider serving fixed zones and recording every call
pub struct MockProvider {
    /// Provider id
    pub name: &'static str,
    zones: HashMap<String, Zone>,
    readable: Option<HashSet<DnsRecordType>>,
    writable: Option<HashSet<DnsRecordType>>,
    read_only: bool,
    /// Zone whose CRUD calls fail once `fail_after` calls succeeded
    failing_zone: Option<String>,
    fail_after: usize,
    failing_zone_calls: Arc<AtomicUsize>,
    /// Calls in order, e.g. `create example.com www IN A 192.0.2.1`
    calls: Arc<Mutex<Vec<String>>>,
    crud_call_count: Arc<AtomicUsize>,
    get_zone_call_count: Arc<AtomicUsize>,
    commit_call_count: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            zones: HashMap::new(),
            readable: None,
            writable: None,
            read_only: false,
            failing_zone: None,
            fail_after: 0,
            failing_zone_calls: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            crud_call_count: Arc::new(AtomicUsize::new(0)),
            get_zone_call_count: Arc::new(AtomicUsize::new(0)),
            commit_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve `domain` with records parsed from zone-file lines
    pub fn with_zone(mut self, domain: &str, lines: &[&str]) -> Self {
        let records = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                Record::parse(line)
                    .expect("test record parses")
                    .with_id(format!("{}-{}", self.name, i))
            })
            .collect();
        self.zones
            .insert(domain.to_string(), Zone::new(domain).with_records(records));
        self
    }

    pub fn with_readable_types(mut self, types: &[DnsRecordType]) -> Self {
        self.readable = Some(types.iter().copied().collect());
        self
    }

    pub fn with_writable_types(mut self, types: &[DnsRecordType]) -> Self {
        self.writable = Some(types.iter().copied().collect());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Make CRUD calls on `zone` fail after `succeed` of them went through
    pub fn failing_in(mut self, zone: &str, succeed: usize) -> Self {
        self.failing_zone = Some(zone.to_string());
        self.fail_after = succeed;
        self
    }

    /// Handles on the call records, for use after the provider moved away
    pub fn counters(&self) -> MockCounters {
        MockCounters {
            calls: Arc::clone(&self.calls),
            crud_call_count: Arc::clone(&self.crud_call_count),
            get_zone_call_count: Arc::clone(&self.get_zone_call_count),
            commit_call_count: Arc::clone(&self.commit_call_count),
        }
    }

    fn record_call(&self, zone: &str, call: String) -> Result<()> {
        self.crud_call_count.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_zone.as_deref() == Some(zone)
            && self.failing_zone_calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after;
        self.calls
            .lock()
            .expect("calls lock")
            .push(if failing { format!("{call} (failed)") } else { call });
        if failing {
            return Err(Error::http("HTTP 500: injected failure"));
        }
        Ok(())
    }

    fn zone_mut(&mut self, zone: &str) -> Result<&mut Zone> {
        self.zones
            .get_mut(zone)
            .ok_or_else(|| Error::zone_not_found(zone))
    }
}

/// Handles on a [`MockProvider`]'s call records, usable after the provider
/// moved into an engine
#[derive(Clone)]
pub struct MockCounters {
    calls: Arc<Mutex<Vec<String>>>,
    crud_call_count: Arc<AtomicUsize>,
    get_zone_call_count: Arc<AtomicUsize>,
    commit_call_count: Arc<AtomicUsize>,
}

impl MockCounters {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn crud_call_count(&self) -> usize {
        self.crud_call_count.load(Ordering::SeqCst)
    }

    pub fn get_zone_call_count(&self) -> usize {
        self.get_zone_call_count.load(Ordering::SeqCst)
    }

    pub fn commit_call_count(&self) -> usize {
        self.commit_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsProvider for MockProvider {
    fn id(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Scripted test provider"
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    async fn list_zones(&mut self) -> Result<Vec<String>> {
        Ok(self.zones.keys().cloned().collect())
    }

    async fn get_zone(&mut self, domain: &str) -> Result<Option<Zone>> {
        self.get_zone_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.zones.get(domain).cloned())
    }

    fn can_read_type(&self, record_type: DnsRecordType) -> bool {
        self.readable
            .as_ref()
            .is_none_or(|types| types.contains(&record_type))
    }

    fn can_write_type(&self, record_type: DnsRecordType) -> bool {
        !self.read_only
            && self
                .writable
                .as_ref()
                .is_none_or(|types| types.contains(&record_type))
    }

    async fn create_record(&mut self, zone: &str, record: &Record) -> Result<Record> {
        self.record_call(zone, format!("create {zone} {record}"))?;
        let count = self.crud_call_count.load(Ordering::SeqCst);
        let created = record.clone().with_id(format!("{}-new-{}", self.name, count));
        self.zone_mut(zone)?.push_record(created.clone());
        Ok(created)
    }

    async fn update_record(
        &mut self,
        zone: &str,
        existing: &Record,
        desired: &Record,
    ) -> Result<Record> {
        self.record_call(zone, format!("update {zone} {existing} -> {desired}"))?;
        let record = self
            .zone_mut(zone)?
            .find_record_mut(existing)
            .ok_or_else(|| Error::record_not_found(existing.to_string()))?;
        record.assign_from(desired);
        Ok(record.clone())
    }

    async fn delete_record(&mut self, zone: &str, record: &Record) -> Result<()> {
        self.record_call(zone, format!("delete {zone} {record}"))?;
        self.zone_mut(zone)?
            .remove_record(record)
            .ok_or_else(|| Error::record_not_found(record.to_string()))?;
        Ok(())
    }

    async fn commit_zone(&mut self, zone: &str) -> Result<()> {
        self.commit_call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .expect("calls lock")
            .push(format!("commit {zone}"));
        Ok(())
    }
}

/// Build an engine over two mock providers
pub fn engine(
    source: MockProvider,
    destination: MockProvider,
) -> (SyncEngine, mpsc::Receiver<SyncEvent>) {
    engine_with_config(source, destination, SyncConfig::default())
}

pub fn engine_with_config(
    source: MockProvider,
    destination: MockProvider,
    config: SyncConfig,
) -> (SyncEngine, mpsc::Receiver<SyncEvent>) {
    SyncEngine::new(Box::new(source), Box::new(destination), config)
        .expect("engine construction succeeds")
}

/// Collect every event left in the channel once the engine is gone
pub async fn drain(mut rx: mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

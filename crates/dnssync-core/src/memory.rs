// # Memory Provider
//
// In-memory implementation of DnsProvider.
//
// ## Purpose
//
// Behaves like a hosted provider without the network: a shared "remote"
// record store plus the provider-side zone cache every provider keeps.
// Useful for testing the reconciler and for dry experiments.
//
// ## Behavior
//
// - Zones and records live in a map shared by every clone of the store
//   handle, so tests can inspect the "remote" side after a sync
// - The zone list and each zone's records are cached on first use, like
//   the hosted providers do
// - Created records get sequential ids

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{DnsRecordType, Record, Zone, ZoneCache};
use crate::traits::DnsProvider;

/// Shared record store backing one or more [`MemoryProvider`]s
#[derive(Debug, Clone, Default)]
pub struct MemoryZones {
    inner: Arc<RwLock<BTreeMap<String, Vec<Record>>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryZones {
    /// Create a store holding the given zones
    pub fn new(zones: impl IntoIterator<Item = (String, Vec<Record>)>) -> Self {
        let store = Self::default();
        let zones: BTreeMap<String, Vec<Record>> = zones
            .into_iter()
            .map(|(domain, records)| {
                let records = records.into_iter().map(|r| store.assign_id(r)).collect();
                (domain, records)
            })
            .collect();
        Self {
            inner: Arc::new(RwLock::new(zones)),
            next_id: store.next_id,
        }
    }

    /// Add or replace a zone
    pub async fn insert_zone(&self, domain: impl Into<String>, records: Vec<Record>) {
        let records = records.into_iter().map(|r| self.assign_id(r)).collect();
        self.inner.write().await.insert(domain.into(), records);
    }

    /// Current records of a zone, if it exists
    pub async fn records(&self, domain: &str) -> Option<Vec<Record>> {
        self.inner.read().await.get(domain).cloned()
    }

    /// Domains in sorted order
    pub async fn domains(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    fn assign_id(&self, record: Record) -> Record {
        if record.id().is_some() {
            return record;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        record.with_id(id.to_string())
    }
}

/// In-memory DNS provider
///
/// Reads and writes every record type unless restricted with
/// [`MemoryProvider::with_readable_types`] / [`MemoryProvider::with_writable_types`].
///
/// # Example
///
/// ```rust,no_run
/// use dnssync_core::{DnsProvider, MemoryProvider, MemoryZones, Record};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let zones = MemoryZones::new([(
///         "example.com".to_string(),
///         vec![Record::parse("www IN A 192.0.2.1")?],
///     )]);
///     let mut provider = MemoryProvider::new("memory", zones);
///
///     let zone = provider.get_zone("example.com").await?;
///     assert_eq!(zone.map(|z| z.records().len()), Some(1));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MemoryProvider {
    id: String,
    read_only: bool,
    readable: Option<HashSet<DnsRecordType>>,
    writable: Option<HashSet<DnsRecordType>>,
    zones: MemoryZones,
    cache: ZoneCache,
}

impl MemoryProvider {
    pub fn new(id: impl Into<String>, zones: MemoryZones) -> Self {
        Self {
            id: id.into(),
            read_only: false,
            readable: None,
            writable: None,
            zones,
            cache: ZoneCache::new(),
        }
    }

    /// Only read the given types
    pub fn with_readable_types(mut self, types: impl IntoIterator<Item = DnsRecordType>) -> Self {
        self.readable = Some(types.into_iter().collect());
        self
    }

    /// Only write the given types
    pub fn with_writable_types(mut self, types: impl IntoIterator<Item = DnsRecordType>) -> Self {
        self.writable = Some(types.into_iter().collect());
        self
    }

    /// Refuse all writes
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Handle to the backing store
    pub fn zones(&self) -> &MemoryZones {
        &self.zones
    }

    async fn ensure_zone_list(&mut self) {
        if !self.cache.is_loaded() {
            let domains = self.zones.domains().await;
            debug!(provider = %self.id, count = domains.len(), "Loaded zone list");
            self.cache.load(domains.iter().map(|d| Zone::new(d)).collect());
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::read_only(&self.id));
        }
        Ok(())
    }

    /// Store key of a cached zone
    fn zone_key(&self, zone: &str) -> Result<String> {
        self.cache
            .get(zone)
            .and_then(Zone::domain)
            .map(str::to_string)
            .ok_or_else(|| Error::zone_not_found(zone))
    }

    fn cached_zone(&mut self, zone: &str) -> Result<&mut Zone> {
        self.cache
            .get_mut(zone)
            .ok_or_else(|| Error::zone_not_found(zone))
    }
}

#[async_trait]
impl DnsProvider for MemoryProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "In-memory zones"
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    async fn list_zones(&mut self) -> Result<Vec<String>> {
        self.ensure_zone_list().await;
        Ok(self.cache.domains())
    }

    async fn get_zone(&mut self, domain: &str) -> Result<Option<Zone>> {
        self.ensure_zone_list().await;

        let Some(zone) = self.cache.get_mut(domain) else {
            return Ok(None);
        };

        if !zone.is_loaded() {
            let key = zone.domain().unwrap_or_default().to_string();
            let records = self.zones.records(&key).await.unwrap_or_default();
            debug!(provider = %self.id, zone = %key, count = records.len(), "Loaded zone records");
            zone.load_records(records);
        }

        Ok(Some(zone.clone()))
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
        self.check_writable()?;
        let key = self.zone_key(zone)?;

        let mut created = record.clone();
        created.set_id(None);
        let created = self.zones.assign_id(created);

        self.zones
            .inner
            .write()
            .await
            .entry(key)
            .or_default()
            .push(created.clone());

        self.cached_zone(zone)?.push_record(created.clone());
        Ok(created)
    }

    async fn update_record(
        &mut self,
        zone: &str,
        existing: &Record,
        desired: &Record,
    ) -> Result<Record> {
        self.check_writable()?;
        let key = self.zone_key(zone)?;

        let updated = {
            let mut store = self.zones.inner.write().await;
            let stored = store
                .get_mut(&key)
                .and_then(|records| records.iter_mut().find(|r| r.same_identity(existing)))
                .ok_or_else(|| Error::record_not_found(existing.to_string()))?;
            stored.assign_from(desired);
            stored.clone()
        };

        if let Some(cached) = self.cached_zone(zone)?.find_record_mut(existing) {
            cached.assign_from(desired);
        }
        Ok(updated)
    }

    async fn delete_record(&mut self, zone: &str, record: &Record) -> Result<()> {
        self.check_writable()?;
        let key = self.zone_key(zone)?;

        {
            let mut store = self.zones.inner.write().await;
            let records = store
                .get_mut(&key)
                .ok_or_else(|| Error::zone_not_found(zone))?;
            let index = records
                .iter()
                .position(|r| r.same_identity(record))
                .ok_or_else(|| Error::record_not_found(record.to_string()))?;
            records.remove(index);
        }

        self.cached_zone(zone)?.remove_record(record);
        Ok(())
    }
}

// # DNS Provider Trait
//
// Defines the interface every DNS backend (hosted API or zone file) exposes
// to the reconciler.
//
// ## Implementations
//
// - Cloudflare: `dnssync-provider-cloudflare` crate
// - DigitalOcean, Linode, Name.com, GoDaddy: `dnssync-provider-*` crates
// - Zone files on disk: `dnssync-zonefile` crate
// - In-memory: [`crate::MemoryProvider`]
//
// ## Usage
//
// ```rust,ignore
// use dnssync_core::DnsProvider;
//
// async fn show(provider: &mut dyn DnsProvider) -> dnssync_core::Result<()> {
//     for domain in provider.list_zones().await? {
//         if let Some(zone) = provider.get_zone(&domain).await? {
//             println!("{zone}");
//         }
//     }
//     Ok(())
// }
// ```

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::model::{DnsRecordType, Record, Time, Zone};
use async_trait::async_trait;

/// TTL used when neither record carries one (one hour)
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Trait for DNS provider implementations
///
/// A provider owns a cache of its zones. Zones are listed once, and each
/// zone's records are fetched once, on first use. The CRUD methods keep that
/// cache in step with the backend: a created record is appended, an updated
/// record is changed in place, a deleted record is removed. Callers never
/// hold on to cached records; [`DnsProvider::get_zone`] hands out a snapshot.
///
/// Methods take `&mut self` because they fill and mutate the cache. The
/// reconciler awaits every call before issuing the next one.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Stable identifier, e.g. `"cloudflare"`
    fn id(&self) -> &str;

    /// One-line description for listings
    fn description(&self) -> &str;

    /// Whether the provider can only be used as a sync source
    fn read_only(&self) -> bool {
        false
    }

    /// TTL used for records that do not carry one
    fn default_ttl(&self) -> Time {
        Time::from_seconds(DEFAULT_TTL_SECONDS)
    }

    /// Domains of every zone the provider serves
    async fn list_zones(&mut self) -> Result<Vec<String>>;

    /// Snapshot of a zone with its records loaded
    ///
    /// # Returns
    ///
    /// - `Ok(Some(zone))`: the zone exists
    /// - `Ok(None)`: the provider does not serve `domain`
    /// - `Err(Error)`: listing or fetching failed
    async fn get_zone(&mut self, domain: &str) -> Result<Option<Zone>>;

    /// Whether records of `record_type` are read from this provider
    fn can_read_type(&self, record_type: DnsRecordType) -> bool;

    /// Whether records of `record_type` may be written to this provider
    fn can_write_type(&self, record_type: DnsRecordType) -> bool;

    /// Create `record` in `zone`
    ///
    /// # Returns
    ///
    /// The stored record, carrying the provider-assigned id.
    async fn create_record(&mut self, zone: &str, record: &Record) -> Result<Record>;

    /// Replace `existing` with the contents of `desired`
    ///
    /// The cached copy of `existing` is changed in place.
    ///
    /// # Returns
    ///
    /// The stored record after the update.
    async fn update_record(
        &mut self,
        zone: &str,
        existing: &Record,
        desired: &Record,
    ) -> Result<Record>;

    /// Delete `record` from `zone`
    async fn delete_record(&mut self, zone: &str, record: &Record) -> Result<()>;

    /// Push buffered changes for `zone`
    ///
    /// Called once after all actions for a zone were applied. Providers that
    /// write each change immediately keep the default, which does nothing.
    async fn commit_zone(&mut self, _zone: &str) -> Result<()> {
        Ok(())
    }
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Identifier of the providers this factory builds
    fn id(&self) -> &'static str;

    /// One-line description for listings
    fn description(&self) -> &'static str;

    /// Whether built providers are read-only
    fn read_only(&self) -> bool {
        false
    }

    /// Load this provider's configuration from the environment
    fn load_config(&self) -> Result<ProviderConfig> {
        ProviderConfig::from_env(self.id())
    }

    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>>;
}

/// First non-zero TTL among `candidates`, else `fallback`
///
/// Used when building write payloads: the desired record's TTL wins, then
/// the record being replaced, then the provider's default.
pub fn find_record_ttl<'a>(
    candidates: impl IntoIterator<Item = &'a Record>,
    fallback: Time,
) -> Time {
    candidates
        .into_iter()
        .filter_map(Record::ttl)
        .find(|ttl| ttl.seconds() > 0)
        .unwrap_or(fallback)
}

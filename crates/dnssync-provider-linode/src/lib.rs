// # Linode DNS Provider
//
// This crate provides the Linode implementation of `DnsProvider`.
//
// ## Behavior
//
// - Domains are listed once per provider instance; each domain's records
//   are fetched once, on first use
// - Reads and writes A, AAAA, MX, SRV, CNAME and TXT
// - The apex is sent as an empty name
//
// ## Configuration
//
// - `LINODE_API_TOKEN`: personal access token with Domains read/write
// - `LINODE_API_URL`: base URL override (default `https://api.linode.com/v4/`)

mod api;

pub use api::{record_from_api, record_payload};

use api::{ApiDomain, LinodeApi};
use async_trait::async_trait;
use dnssync_core::config::ProviderConfig;
use dnssync_core::traits::{DEFAULT_TTL_SECONDS, DnsProvider, DnsProviderFactory};
use dnssync_core::{
    DnsRecordType, Error, ProviderRegistry, Record, Result, Time, Zone, ZoneCache,
    find_record_ttl,
};
use dnssync_http::{Auth, RestClient};
use tracing::debug;

/// Linode API base URL
pub const LINODE_API_BASE: &str = "https://api.linode.com/v4/";

const PROVIDER_ID: &str = "linode";

const SUPPORTED_TYPES: [DnsRecordType; 6] = [
    DnsRecordType::A,
    DnsRecordType::Aaaa,
    DnsRecordType::Mx,
    DnsRecordType::Srv,
    DnsRecordType::Cname,
    DnsRecordType::Txt,
];

/// Linode DNS provider
pub struct LinodeProvider {
    api: RestClient,
    cache: ZoneCache,
}

impl std::fmt::Debug for LinodeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinodeProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_url", &self.api.base_url())
            .finish()
    }
}

impl LinodeProvider {
    /// Create a new Linode provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Linode personal access token
    /// - `api_url`: Base URL override; defaults to [`LINODE_API_BASE`]
    pub fn new(api_token: impl Into<String>, api_url: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Linode API token cannot be empty"));
        }

        Ok(Self {
            api: RestClient::new(
                api_url.unwrap_or_else(|| LINODE_API_BASE.to_string()),
                Auth::Bearer(api_token),
                Box::new(LinodeApi),
            )?,
            cache: ZoneCache::new(),
        })
    }

    async fn ensure_zone_list(&mut self) -> Result<()> {
        if self.cache.is_loaded() {
            return Ok(());
        }

        let mut zones = Vec::new();
        for value in self.api.get_all("domains", &[]).await? {
            let domain: ApiDomain = serde_json::from_value(value)?;
            zones.push(Zone::new(&domain.domain).with_id(domain.id.to_string()));
        }

        debug!("[linode] Loaded {} domain(s)", zones.len());
        self.cache.load(zones);
        Ok(())
    }

    /// Domain id of a cached zone, loading its records if needed
    async fn load_zone(&mut self, domain: &str) -> Result<Option<String>> {
        self.ensure_zone_list().await?;

        let Some(zone) = self.cache.get(domain) else {
            return Ok(None);
        };
        let domain_id = zone
            .id()
            .ok_or_else(|| Error::provider(PROVIDER_ID, format!("Domain {domain} has no id")))?
            .to_string();
        if zone.is_loaded() {
            return Ok(Some(domain_id));
        }

        let mut records = Vec::new();
        for value in self
            .api
            .get_all(&format!("domains/{domain_id}/records"), &[])
            .await?
        {
            match record_from_api(&value) {
                Ok(record) => records.push(record),
                Err(e) if e.is_parse() => debug!("[linode] Skipping record: {}", e),
                Err(e) => return Err(e),
            }
        }

        if let Some(zone) = self.cache.get_mut(domain) {
            zone.load_records(records);
        }
        Ok(Some(domain_id))
    }

    async fn require_zone(&mut self, domain: &str) -> Result<String> {
        self.load_zone(domain)
            .await?
            .ok_or_else(|| Error::zone_not_found(domain))
    }

    fn cached_zone(&mut self, domain: &str) -> Result<&mut Zone> {
        self.cache
            .get_mut(domain)
            .ok_or_else(|| Error::zone_not_found(domain))
    }
}

fn record_id(record: &Record) -> Result<&str> {
    record
        .id()
        .ok_or_else(|| Error::invalid_input(format!("Record has no Linode id: {record}")))
}

#[async_trait]
impl DnsProvider for LinodeProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn description(&self) -> &str {
        "Linode DNS"
    }

    async fn list_zones(&mut self) -> Result<Vec<String>> {
        self.ensure_zone_list().await?;
        Ok(self.cache.domains())
    }

    async fn get_zone(&mut self, domain: &str) -> Result<Option<Zone>> {
        if self.load_zone(domain).await?.is_none() {
            return Ok(None);
        }
        Ok(self.cache.get(domain).cloned())
    }

    fn can_read_type(&self, record_type: DnsRecordType) -> bool {
        SUPPORTED_TYPES.contains(&record_type)
    }

    fn can_write_type(&self, record_type: DnsRecordType) -> bool {
        self.can_read_type(record_type)
    }

    async fn create_record(&mut self, zone: &str, record: &Record) -> Result<Record> {
        let domain_id = self.require_zone(zone).await?;

        let ttl = find_record_ttl([record], Time::from(DEFAULT_TTL_SECONDS));
        let response = self
            .api
            .post(
                &format!("domains/{domain_id}/records"),
                &record_payload(record, ttl),
            )
            .await?;
        let created = record_from_api(&response)?;

        self.cached_zone(zone)?.push_record(created.clone());
        Ok(created)
    }

    async fn update_record(
        &mut self,
        zone: &str,
        existing: &Record,
        desired: &Record,
    ) -> Result<Record> {
        let domain_id = self.require_zone(zone).await?;
        let id = record_id(existing)?;

        let ttl = find_record_ttl([desired, existing], Time::from(DEFAULT_TTL_SECONDS));
        let response = self
            .api
            .put(
                &format!("domains/{domain_id}/records/{id}"),
                &record_payload(desired, ttl),
            )
            .await?;
        let updated = record_from_api(&response)?;

        if let Some(cached) = self.cached_zone(zone)?.find_record_mut(existing) {
            *cached = updated.clone();
        }
        Ok(updated)
    }

    async fn delete_record(&mut self, zone: &str, record: &Record) -> Result<()> {
        let domain_id = self.require_zone(zone).await?;
        let id = record_id(record)?;

        self.api
            .delete(&format!("domains/{domain_id}/records/{id}"))
            .await?;

        self.cached_zone(zone)?.remove_record(record);
        Ok(())
    }
}

/// Factory for creating Linode providers
pub struct LinodeFactory;

impl DnsProviderFactory for LinodeFactory {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn description(&self) -> &'static str {
        "Linode DNS"
    }

    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Linode { api_token, api_url } => Ok(Box::new(LinodeProvider::new(
                api_token.clone(),
                api_url.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for Linode provider")),
        }
    }
}

/// Register the Linode provider with a registry
pub fn register(registry: &mut ProviderRegistry) {
    registry.register(Box::new(LinodeFactory));
}

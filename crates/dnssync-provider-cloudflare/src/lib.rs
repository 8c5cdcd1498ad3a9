// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `DnsProvider`.
//
// ## Behavior
//
// - Zones are listed once per provider instance; each zone's records are
//   fetched once, on first use
// - Every create/update/delete is one API call, and the cached zone is
//   updated from the API's answer
// - Writes A, AAAA, MX, SRV, CNAME and TXT; NS is read but left alone
// - TTL 1 means "automatic" on Cloudflare and is read as an absent TTL
// - Proxied records have a Cloudflare-managed TTL that never triggers an
//   update
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - API token is provided via the `CF_API_TOKEN` environment variable
// - Provider fails fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - `CF_API_URL` overrides the base URL (default
//   `https://api.cloudflare.com/client/v4/`)

mod api;

pub use api::{AUTOMATIC_TTL, record_from_api, record_payload};

use api::{ApiZone, CloudflareApi};
use async_trait::async_trait;
use dnssync_core::config::ProviderConfig;
use dnssync_core::traits::{DnsProvider, DnsProviderFactory};
use dnssync_core::{
    DnsRecordType, Error, ProviderRegistry, Record, Result, Time, Zone, ZoneCache,
    find_record_ttl,
};
use dnssync_http::{Auth, RestClient};
use serde_json::json;
use tracing::debug;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4/";

const PROVIDER_ID: &str = "cloudflare";

const WRITABLE_TYPES: [DnsRecordType; 6] = [
    DnsRecordType::A,
    DnsRecordType::Aaaa,
    DnsRecordType::Mx,
    DnsRecordType::Srv,
    DnsRecordType::Cname,
    DnsRecordType::Txt,
];

/// Cloudflare DNS provider
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    api: RestClient,
    cache: ZoneCache,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_url", &self.api.base_url())
            .field("zones_loaded", &self.cache.is_loaded())
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `api_url`: Base URL override; defaults to [`CLOUDFLARE_API_BASE`]
    ///
    /// # Security
    ///
    /// The API token will NEVER be logged or displayed in error messages.
    pub fn new(api_token: impl Into<String>, api_url: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let api = RestClient::new(
            api_url.unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string()),
            Auth::Bearer(api_token),
            Box::new(CloudflareApi),
        )?;

        Ok(Self {
            api,
            cache: ZoneCache::new(),
        })
    }

    async fn ensure_zone_list(&mut self) -> Result<()> {
        if self.cache.is_loaded() {
            return Ok(());
        }

        let mut zones = Vec::new();
        for value in self.api.get_all("zones", &[]).await? {
            let zone: ApiZone = serde_json::from_value(value)?;
            zones.push(Zone::new(&zone.name).with_id(zone.id));
        }

        debug!("[cloudflare] Loaded {} zone(s)", zones.len());
        self.cache.load(zones);
        Ok(())
    }

    /// Zone id of a cached zone, loading its records if needed
    async fn load_zone(&mut self, domain: &str) -> Result<Option<String>> {
        self.ensure_zone_list().await?;

        let Some(zone) = self.cache.get(domain) else {
            return Ok(None);
        };
        let zone_id = zone
            .id()
            .ok_or_else(|| Error::provider(PROVIDER_ID, format!("Zone {domain} has no id")))?
            .to_string();

        if !zone.is_loaded() {
            let mut records = Vec::new();
            for value in self
                .api
                .get_all(&format!("zones/{zone_id}/dns_records"), &[])
                .await?
            {
                match record_from_api(&value) {
                    Ok(record) => records.push(record),
                    Err(e) if e.is_parse() => debug!("[cloudflare] Skipping record: {}", e),
                    Err(e) => return Err(e),
                }
            }

            debug!("[cloudflare] Loaded {} record(s) for {}", records.len(), domain);
            if let Some(zone) = self.cache.get_mut(domain) {
                zone.load_records(records);
            }
        }

        Ok(Some(zone_id))
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
        .ok_or_else(|| Error::invalid_input(format!("Record has no Cloudflare id: {record}")))
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn description(&self) -> &str {
        "Cloudflare DNS"
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
        self.can_write_type(record_type) || record_type == DnsRecordType::Ns
    }

    fn can_write_type(&self, record_type: DnsRecordType) -> bool {
        WRITABLE_TYPES.contains(&record_type)
    }

    async fn create_record(&mut self, zone: &str, record: &Record) -> Result<Record> {
        let zone_id = self.require_zone(zone).await?;

        let ttl = find_record_ttl([record], Time::from(AUTOMATIC_TTL));
        let mut payload = record_payload(record, ttl)?;
        payload["proxied"] = json!(false);

        let response = self
            .api
            .post(&format!("zones/{zone_id}/dns_records"), &payload)
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
        let zone_id = self.require_zone(zone).await?;
        let id = record_id(existing)?;

        let ttl = find_record_ttl([desired, existing], Time::from(AUTOMATIC_TTL));
        let payload = record_payload(desired, ttl)?;

        let response = self
            .api
            .put(&format!("zones/{zone_id}/dns_records/{id}"), &payload)
            .await?;
        let updated = record_from_api(&response)?;

        if let Some(cached) = self.cached_zone(zone)?.find_record_mut(existing) {
            *cached = updated.clone();
        }
        Ok(updated)
    }

    async fn delete_record(&mut self, zone: &str, record: &Record) -> Result<()> {
        let zone_id = self.require_zone(zone).await?;
        let id = record_id(record)?;

        self.api
            .delete(&format!("zones/{zone_id}/dns_records/{id}"))
            .await?;

        self.cached_zone(zone)?.remove_record(record);
        Ok(())
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn description(&self) -> &'static str {
        "Cloudflare DNS"
    }

    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare { api_token, api_url } => Ok(Box::new(
                CloudflareProvider::new(api_token.clone(), api_url.clone())?,
            )),
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use dnssync_core::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::new();
/// dnssync_provider_cloudflare::register(&mut registry);
/// ```
pub fn register(registry: &mut ProviderRegistry) {
    registry.register(Box::new(CloudflareFactory));
}

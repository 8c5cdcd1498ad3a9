// # Name.com DNS Provider
//
// This crate provides the Name.com implementation of `DnsProvider`.
//
// ## Behavior
//
// - Domains are listed once per provider instance; each domain's records
//   are fetched once, on first use
// - Writes A, AAAA, MX, SRV, CNAME and TXT; NS is read but left alone
// - Requests authenticate with HTTP basic auth
//
// ## Configuration
//
// - `NAMECOM_API_USERNAME` / `NAMECOM_API_PASSWORD`: API user and token
// - `NAMECOM_API_URL`: base URL override (default `https://api.name.com/v4/`)

mod api;

pub use api::{record_from_api, record_payload};

use api::{ApiDomain, NameComApi};
use async_trait::async_trait;
use dnssync_core::config::ProviderConfig;
use dnssync_core::traits::{DEFAULT_TTL_SECONDS, DnsProvider, DnsProviderFactory};
use dnssync_core::{
    DnsRecordType, Error, ProviderRegistry, Record, Result, Time, Zone, ZoneCache,
    find_record_ttl,
};
use dnssync_http::{Auth, RestClient};
use tracing::debug;

/// Name.com API base URL
pub const NAMECOM_API_BASE: &str = "https://api.name.com/v4/";

const PROVIDER_ID: &str = "namecom";

const WRITABLE_TYPES: [DnsRecordType; 6] = [
    DnsRecordType::A,
    DnsRecordType::Aaaa,
    DnsRecordType::Mx,
    DnsRecordType::Srv,
    DnsRecordType::Cname,
    DnsRecordType::Txt,
];

/// Name.com DNS provider
pub struct NameComProvider {
    api: RestClient,
    cache: ZoneCache,
}

impl std::fmt::Debug for NameComProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameComProvider")
            .field("credentials", &"<REDACTED>")
            .field("api_url", &self.api.base_url())
            .finish()
    }
}

impl NameComProvider {
    /// Create a new Name.com provider
    ///
    /// # Parameters
    ///
    /// - `username`: Name.com account name
    /// - `password`: API token for that account
    /// - `api_url`: Base URL override; defaults to [`NAMECOM_API_BASE`]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        api_url: Option<String>,
    ) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return Err(Error::config(
                "Name.com username and password cannot be empty",
            ));
        }

        Ok(Self {
            api: RestClient::new(
                api_url.unwrap_or_else(|| NAMECOM_API_BASE.to_string()),
                Auth::Basic { username, password },
                Box::new(NameComApi),
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
            zones.push(Zone::new(&domain.domain_name));
        }

        debug!("[namecom] Loaded {} domain(s)", zones.len());
        self.cache.load(zones);
        Ok(())
    }

    /// Load a domain's records if needed; `false` when the domain is unknown
    async fn load_zone(&mut self, domain: &str) -> Result<bool> {
        self.ensure_zone_list().await?;

        match self.cache.get(domain) {
            None => return Ok(false),
            Some(zone) if zone.is_loaded() => return Ok(true),
            Some(_) => {}
        }

        let mut records = Vec::new();
        for value in self
            .api
            .get_all(&format!("domains/{domain}/records"), &[])
            .await?
        {
            match record_from_api(&value) {
                Ok(record) => records.push(record),
                Err(e) if e.is_parse() => debug!("[namecom] Skipping record: {}", e),
                Err(e) => return Err(e),
            }
        }

        if let Some(zone) = self.cache.get_mut(domain) {
            zone.load_records(records);
        }
        Ok(true)
    }

    async fn require_zone(&mut self, domain: &str) -> Result<&mut Zone> {
        if !self.load_zone(domain).await? {
            return Err(Error::zone_not_found(domain));
        }
        self.cache
            .get_mut(domain)
            .ok_or_else(|| Error::zone_not_found(domain))
    }
}

fn record_id(record: &Record) -> Result<&str> {
    record
        .id()
        .ok_or_else(|| Error::invalid_input(format!("Record has no Name.com id: {record}")))
}

#[async_trait]
impl DnsProvider for NameComProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn description(&self) -> &str {
        "Name.com DNS"
    }

    async fn list_zones(&mut self) -> Result<Vec<String>> {
        self.ensure_zone_list().await?;
        Ok(self.cache.domains())
    }

    async fn get_zone(&mut self, domain: &str) -> Result<Option<Zone>> {
        if !self.load_zone(domain).await? {
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
        self.require_zone(zone).await?;

        let ttl = find_record_ttl([record], Time::from(DEFAULT_TTL_SECONDS));
        let response = self
            .api
            .post(&format!("domains/{zone}/records"), &record_payload(record, ttl))
            .await?;
        let created = record_from_api(&response)?;

        self.require_zone(zone).await?.push_record(created.clone());
        Ok(created)
    }

    async fn update_record(
        &mut self,
        zone: &str,
        existing: &Record,
        desired: &Record,
    ) -> Result<Record> {
        self.require_zone(zone).await?;
        let id = record_id(existing)?;

        let ttl = find_record_ttl([desired, existing], Time::from(DEFAULT_TTL_SECONDS));
        let response = self
            .api
            .put(
                &format!("domains/{zone}/records/{id}"),
                &record_payload(desired, ttl),
            )
            .await?;
        let updated = record_from_api(&response)?;

        if let Some(cached) = self.require_zone(zone).await?.find_record_mut(existing) {
            *cached = updated.clone();
        }
        Ok(updated)
    }

    async fn delete_record(&mut self, zone: &str, record: &Record) -> Result<()> {
        self.require_zone(zone).await?;
        let id = record_id(record)?;

        self.api
            .delete(&format!("domains/{zone}/records/{id}"))
            .await?;

        self.require_zone(zone).await?.remove_record(record);
        Ok(())
    }
}

/// Factory for creating Name.com providers
pub struct NameComFactory;

impl DnsProviderFactory for NameComFactory {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn description(&self) -> &'static str {
        "Name.com DNS"
    }

    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::NameCom {
                username,
                password,
                api_url,
            } => Ok(Box::new(NameComProvider::new(
                username.clone(),
                password.clone(),
                api_url.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for Name.com provider")),
        }
    }
}

/// Register the Name.com provider with a registry
pub fn register(registry: &mut ProviderRegistry) {
    registry.register(Box::new(NameComFactory));
}

// # DigitalOcean DNS Provider
//
// This crate provides the DigitalOcean implementation of `DnsProvider`.
//
// ## Behavior
//
// - Domains are listed once per provider instance; each domain's records
//   are fetched once, on first use
// - Writes A, AAAA, MX, SRV, CNAME and TXT; NS is read but left alone
// - A TTL of 0 in an API answer is read as an absent TTL
//
// ## Configuration
//
// - `DO_API_TOKEN`: personal access token with read/write scope
// - `DO_API_URL`: base URL override (default
//   `https://api.digitalocean.com/v2/`)

mod api;

pub use api::{PAGE_SIZE, record_from_api, record_payload};

use api::{ApiDomain, DigitalOceanApi};
use async_trait::async_trait;
use dnssync_core::config::ProviderConfig;
use dnssync_core::traits::{DEFAULT_TTL_SECONDS, DnsProvider, DnsProviderFactory};
use dnssync_core::{
    DnsRecordType, Error, ProviderRegistry, Record, Result, Time, Zone, ZoneCache,
    find_record_ttl,
};
use dnssync_http::{Auth, RestClient};
use tracing::debug;

/// DigitalOcean API base URL
pub const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com/v2/";

const PROVIDER_ID: &str = "digitalocean";

const WRITABLE_TYPES: [DnsRecordType; 6] = [
    DnsRecordType::A,
    DnsRecordType::Aaaa,
    DnsRecordType::Mx,
    DnsRecordType::Srv,
    DnsRecordType::Cname,
    DnsRecordType::Txt,
];

/// DigitalOcean DNS provider
pub struct DigitalOceanProvider {
    api: RestClient,
    cache: ZoneCache,
}

impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_url", &self.api.base_url())
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a new DigitalOcean provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: DigitalOcean personal access token
    /// - `api_url`: Base URL override; defaults to [`DIGITALOCEAN_API_BASE`]
    pub fn new(api_token: impl Into<String>, api_url: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("DigitalOcean API token cannot be empty"));
        }

        Ok(Self {
            api: RestClient::new(
                api_url.unwrap_or_else(|| DIGITALOCEAN_API_BASE.to_string()),
                Auth::Bearer(api_token),
                Box::new(DigitalOceanApi),
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
            zones.push(Zone::new(&domain.name));
        }

        debug!("[digitalocean] Loaded {} domain(s)", zones.len());
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
                Err(e) if e.is_parse() => debug!("[digitalocean] Skipping record: {}", e),
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
        .ok_or_else(|| Error::invalid_input(format!("Record has no DigitalOcean id: {record}")))
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn description(&self) -> &str {
        "DigitalOcean DNS"
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

/// Factory for creating DigitalOcean providers
pub struct DigitalOceanFactory;

impl DnsProviderFactory for DigitalOceanFactory {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn description(&self) -> &'static str {
        "DigitalOcean DNS"
    }

    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::DigitalOcean { api_token, api_url } => Ok(Box::new(
                DigitalOceanProvider::new(api_token.clone(), api_url.clone())?,
            )),
            _ => Err(Error::config("Invalid config for DigitalOcean provider")),
        }
    }
}

/// Register the DigitalOcean provider with a registry
pub fn register(registry: &mut ProviderRegistry) {
    registry.register(Box::new(DigitalOceanFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnssync_http::testing::{MockResponse, MockServer};
    use serde_json::json;

    async fn server() -> MockServer {
        let server = MockServer::start().await.unwrap();
        server.on(
            "GET",
            "/domains",
            MockResponse::json(200, json!({"domains": [{"name": "example.com", "ttl": 1800}], "links": {}})),
        );
        server.on(
            "GET",
            "/domains/example.com/records?per_page=200&page=2",
            MockResponse::json(
                200,
                json!({"domain_records": [
                    {"id": 12, "type": "MX", "name": "@", "data": "mail.example.com", "priority": 10, "port": null, "weight": null, "ttl": 3600},
                ]}),
            ),
        );
        server.on(
            "GET",
            "/domains/example.com/records",
            MockResponse::json(
                200,
                json!({
                    "domain_records": [
                        {"id": 11, "type": "A", "name": "www", "data": "192.0.2.1", "ttl": 300},
                        {"id": 13, "type": "CAA", "name": "@", "data": "letsencrypt.org", "flags": 0, "tag": "issue", "ttl": 3600},
                    ],
                    "links": {"pages": {"last": "https://api.digitalocean.com/v2/domains/example.com/records?page=2&per_page=200"}},
                }),
            ),
        );
        server
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let config = ProviderConfig::Linode {
            api_token: "t".into(),
            api_url: None,
        };
        assert!(DigitalOceanFactory.create(&config).is_err());
        assert!(DigitalOceanProvider::new("", None).is_err());
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let provider = DigitalOceanProvider::new("dop_v1_secret", None).unwrap();
        assert!(!format!("{provider:?}").contains("dop_v1_secret"));
    }

    #[tokio::test]
    async fn test_get_zone_reads_every_page() {
        let server = server().await;
        let mut provider = DigitalOceanProvider::new("token", Some(server.url())).unwrap();

        assert_eq!(provider.list_zones().await.unwrap(), vec!["example.com"]);

        let zone = provider.get_zone("example.com").await.unwrap().unwrap();
        let lines: Vec<String> = zone.records().iter().map(|r| r.to_string()).collect();
        assert_eq!(
            lines,
            vec!["www 300 IN A 192.0.2.1", "@ 3600 IN MX 10 mail.example.com."]
        );
        assert!(server.requests().iter().all(|r| r.target.contains("per_page=200")));
    }

    #[tokio::test]
    async fn test_update_puts_payload_and_refreshes_cache() {
        let server = server().await;
        server.on(
            "PUT",
            "/domains/example.com/records/11",
            MockResponse::json(
                200,
                json!({"domain_record": {"id": 11, "type": "A", "name": "www", "data": "192.0.2.2", "ttl": 300}}),
            ),
        );
        let mut provider = DigitalOceanProvider::new("token", Some(server.url())).unwrap();

        let zone = provider.get_zone("example.com").await.unwrap().unwrap();
        let existing = zone.records()[0].clone();
        let desired = Record::from_text("www", DnsRecordType::A, "192.0.2.2");

        let updated = provider
            .update_record("example.com", &existing, &desired)
            .await
            .unwrap();
        assert_eq!(updated.data().raw(), "192.0.2.2");

        let put = server.requests().into_iter().find(|r| r.method == "PUT").unwrap();
        assert_eq!(put.json()["ttl"], 300, "existing TTL is kept");
        assert_eq!(put.json()["data"], "192.0.2.2");

        let zone = provider.get_zone("example.com").await.unwrap().unwrap();
        assert_eq!(zone.records()[0].data().raw(), "192.0.2.2");
    }

    #[tokio::test]
    async fn test_unparsed_records_are_never_written() {
        let server = server().await;
        server.on("DELETE", "/domains/example.com/records/11", MockResponse::empty(204));
        server.on("DELETE", "/domains/example.com/records/12", MockResponse::empty(204));
        let mut provider = DigitalOceanProvider::new("token", Some(server.url())).unwrap();

        let zone = provider.get_zone("example.com").await.unwrap().unwrap();
        assert!(zone.records().iter().all(|r| r.id() != Some("13")));
        for record in zone.records() {
            provider.delete_record("example.com", record).await.unwrap();
        }

        let writes: Vec<String> = server
            .requests()
            .iter()
            .filter(|r| r.method != "GET")
            .map(|r| format!("{} {}", r.method, r.path()))
            .collect();
        assert_eq!(
            writes,
            vec![
                "DELETE /domains/example.com/records/11",
                "DELETE /domains/example.com/records/12",
            ]
        );
    }

    #[tokio::test]
    async fn test_create_in_unknown_zone_fails() {
        let server = server().await;
        let mut provider = DigitalOceanProvider::new("token", Some(server.url())).unwrap();

        let record = Record::from_text("www", DnsRecordType::A, "192.0.2.1");
        let err = provider.create_record("missing.org", &record).await.unwrap_err();
        assert!(matches!(err, Error::ZoneNotFound(_)));
    }
}

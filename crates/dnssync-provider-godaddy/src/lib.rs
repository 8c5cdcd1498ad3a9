// # GoDaddy DNS Provider
//
// This crate provides the GoDaddy implementation of `DnsProvider`.
//
// ## Behavior
//
// - Only active domains whose name servers are GoDaddy's
//   (`*.domaincontrol.com`) are listed
// - GoDaddy records have no ids, so create/update/delete only change the
//   cached zone; `commit_zone` then replaces the domain's whole record set
//   with one PUT
// - Writes A, AAAA, MX, SRV, CNAME and TXT; NS is read and written back
//   unchanged
// - Records that cannot be parsed (CAA, ...) are kept as the API returned
//   them and sent back verbatim by `commit_zone`
//
// ## Configuration
//
// - `GD_API_KEY` / `GD_API_SECRET`: production API key pair
// - `GD_SHOPPER_ID`: reseller shopper id, sent as `X-Shopper-Id` (optional)
// - `GD_API_URL`: base URL override (default `https://api.godaddy.com/v1/`)

mod api;

pub use api::{GODADDY_NAMESERVER_SUFFIX, record_from_api, record_payload};

use api::{ApiDomain, GoDaddyApi};
use async_trait::async_trait;
use dnssync_core::config::ProviderConfig;
use dnssync_core::traits::{DEFAULT_TTL_SECONDS, DnsProvider, DnsProviderFactory};
use dnssync_core::{
    DnsRecordType, Error, ProviderRegistry, Record, Result, Time, Zone, ZoneCache,
    find_record_ttl,
};
use dnssync_http::{Auth, RestClient};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// GoDaddy API base URL
pub const GODADDY_API_BASE: &str = "https://api.godaddy.com/v1/";

const PROVIDER_ID: &str = "godaddy";

const WRITABLE_TYPES: [DnsRecordType; 6] = [
    DnsRecordType::A,
    DnsRecordType::Aaaa,
    DnsRecordType::Mx,
    DnsRecordType::Srv,
    DnsRecordType::Cname,
    DnsRecordType::Txt,
];

/// GoDaddy DNS provider
pub struct GoDaddyProvider {
    api: RestClient,
    cache: ZoneCache,
    /// Zones changed since their last commit
    pending: BTreeSet<String>,
    /// API records of each loaded zone that did not parse
    unparsed: BTreeMap<String, Vec<Value>>,
}

impl std::fmt::Debug for GoDaddyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoDaddyProvider")
            .field("api_key", &"<REDACTED>")
            .field("api_url", &self.api.base_url())
            .field("pending", &self.pending)
            .field("unparsed", &self.unparsed.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl GoDaddyProvider {
    /// Create a new GoDaddy provider
    ///
    /// # Parameters
    ///
    /// - `api_key` / `api_secret`: GoDaddy API key pair
    /// - `shopper_id`: Reseller shopper id, if acting for a customer
    /// - `api_url`: Base URL override; defaults to [`GODADDY_API_BASE`]
    pub fn new(
        api_key: &str,
        api_secret: &str,
        shopper_id: Option<String>,
        api_url: Option<String>,
    ) -> Result<Self> {
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(Error::config("GoDaddy API key and secret cannot be empty"));
        }

        let mut api = RestClient::new(
            api_url.unwrap_or_else(|| GODADDY_API_BASE.to_string()),
            Auth::Raw(format!("sso-key {api_key}:{api_secret}")),
            Box::new(GoDaddyApi),
        )?;
        if let Some(shopper_id) = shopper_id {
            api = api.with_header("X-Shopper-Id", shopper_id);
        }

        Ok(Self {
            api,
            cache: ZoneCache::new(),
            pending: BTreeSet::new(),
            unparsed: BTreeMap::new(),
        })
    }

    async fn ensure_zone_list(&mut self) -> Result<()> {
        if self.cache.is_loaded() {
            return Ok(());
        }

        let query = [
            ("statuses".to_string(), "ACTIVE".to_string()),
            ("includes".to_string(), "nameServers".to_string()),
        ];

        let mut zones = Vec::new();
        for value in self.api.get_all("domains", &query).await? {
            let domain: ApiDomain = serde_json::from_value(value)?;
            if domain.uses_godaddy_dns() {
                zones.push(Zone::new(&domain.domain));
            } else {
                debug!("[godaddy] Skipping {}: DNS is hosted elsewhere", domain.domain);
            }
        }

        debug!("[godaddy] Loaded {} domain(s)", zones.len());
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
        let mut unparsed = Vec::new();
        for value in self
            .api
            .get_all(&format!("domains/{domain}/records"), &[])
            .await?
        {
            match record_from_api(&value) {
                Ok(record) => records.push(record),
                Err(e) if e.is_parse() => {
                    debug!("[godaddy] Keeping unparsed record as-is: {}", e);
                    unparsed.push(value);
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(zone) = self.cache.get_mut(domain) {
            zone.load_records(records);
        }
        self.unparsed.insert(domain.to_string(), unparsed);
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

#[async_trait]
impl DnsProvider for GoDaddyProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn description(&self) -> &str {
        "GoDaddy DNS"
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
        self.require_zone(zone).await?.push_record(record.clone());
        self.pending.insert(zone.to_string());
        Ok(record.clone())
    }

    async fn update_record(
        &mut self,
        zone: &str,
        existing: &Record,
        desired: &Record,
    ) -> Result<Record> {
        let cached = self
            .require_zone(zone)
            .await?
            .find_record_mut(existing)
            .ok_or_else(|| Error::record_not_found(format!("{existing} in {zone}")))?;
        cached.assign_from(desired);
        let updated = cached.clone();

        self.pending.insert(zone.to_string());
        Ok(updated)
    }

    async fn delete_record(&mut self, zone: &str, record: &Record) -> Result<()> {
        self.require_zone(zone)
            .await?
            .remove_record(record)
            .ok_or_else(|| Error::record_not_found(format!("{record} in {zone}")))?;
        self.pending.insert(zone.to_string());
        Ok(())
    }

    async fn commit_zone(&mut self, zone: &str) -> Result<()> {
        if !self.pending.contains(zone) {
            return Ok(());
        }

        let records = self.require_zone(zone).await?.records().to_vec();
        let mut payload = records
            .iter()
            .map(|record| {
                record_payload(record, find_record_ttl([record], Time::from(DEFAULT_TTL_SECONDS)))
            })
            .collect::<Result<Vec<_>>>()?;

        // The PUT replaces the whole set; records we never parsed go back untouched
        let kept = self.unparsed.get(zone).cloned().unwrap_or_default();
        let kept_count = kept.len();
        payload.extend(kept);

        self.api
            .put(&format!("domains/{zone}/records"), &Value::Array(payload))
            .await?;

        info!(
            "[godaddy] Replaced {} record(s) in {} ({} kept unparsed)",
            records.len() + kept_count,
            zone,
            kept_count
        );
        self.pending.remove(zone);
        Ok(())
    }
}

/// Factory for creating GoDaddy providers
pub struct GoDaddyFactory;

impl DnsProviderFactory for GoDaddyFactory {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn description(&self) -> &'static str {
        "GoDaddy DNS"
    }

    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::GoDaddy {
                api_key,
                api_secret,
                shopper_id,
                api_url,
            } => Ok(Box::new(GoDaddyProvider::new(
                api_key,
                api_secret,
                shopper_id.clone(),
                api_url.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for GoDaddy provider")),
        }
    }
}

/// Register the GoDaddy provider with a registry
pub fn register(registry: &mut ProviderRegistry) {
    registry.register(Box::new(GoDaddyFactory));
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
            MockResponse::json(
                200,
                json!([
                    {"domain": "example.com", "status": "ACTIVE", "nameServers": ["ns01.domaincontrol.com"]},
                    {"domain": "example.net", "status": "ACTIVE", "nameServers": ["ns1.example.net"]},
                ]),
            ),
        );
        server.on(
            "GET",
            "/domains/example.com/records",
            MockResponse::json(
                200,
                json!([
                    {"type": "A", "name": "www", "data": "192.0.2.1", "ttl": 600},
                    {"type": "NS", "name": "@", "data": "ns01.domaincontrol.com", "ttl": 3600},
                ]),
            ),
        );
        server.on("PUT", "/domains/example.com/records", MockResponse::empty(200));
        server
    }

    fn provider(server: &MockServer) -> GoDaddyProvider {
        GoDaddyProvider::new("key", "secret", Some("12345".into()), Some(server.url())).unwrap()
    }

    #[test]
    fn test_secret_not_exposed_in_debug() {
        let provider = GoDaddyProvider::new("key", "gd-secret", None, None).unwrap();
        assert!(!format!("{provider:?}").contains("gd-secret"));
        assert!(GoDaddyProvider::new("key", "", None, None).is_err());
    }

    #[tokio::test]
    async fn test_only_godaddy_hosted_domains_are_listed() {
        let server = server().await;
        let mut provider = provider(&server);

        assert_eq!(provider.list_zones().await.unwrap(), vec!["example.com"]);

        let request = &server.requests()[0];
        assert_eq!(request.target, "/domains?statuses=ACTIVE&includes=nameServers");
        assert_eq!(request.header("authorization"), Some("sso-key key:secret"));
        assert_eq!(request.header("x-shopper-id"), Some("12345"));
    }

    #[tokio::test]
    async fn test_changes_are_buffered_until_commit() {
        let server = server().await;
        let mut provider = provider(&server);

        let zone = provider.get_zone("example.com").await.unwrap().unwrap();
        let www = zone.records()[0].clone();

        let desired = Record::from_text("www", DnsRecordType::A, "192.0.2.2");
        provider.update_record("example.com", &www, &desired).await.unwrap();
        let mx = Record::from_text("@", DnsRecordType::Mx, "10 mail.example.com.");
        provider.create_record("example.com", &mx).await.unwrap();

        assert!(server.requests().iter().all(|r| r.method == "GET"));

        provider.commit_zone("example.com").await.unwrap();

        let put = server.requests().into_iter().find(|r| r.method == "PUT").unwrap();
        assert_eq!(
            put.json(),
            json!([
                {"type": "A", "name": "www", "ttl": 3600, "data": "192.0.2.2"},
                {"type": "NS", "name": "@", "ttl": 3600, "data": "ns01.domaincontrol.com"},
                {"type": "MX", "name": "@", "ttl": 3600, "data": "mail.example.com.", "priority": 10},
            ])
        );

        provider.commit_zone("example.com").await.unwrap();
        let puts = server.requests().iter().filter(|r| r.method == "PUT").count();
        assert_eq!(puts, 1, "nothing left to commit");
    }

    #[tokio::test]
    async fn test_commit_keeps_records_it_cannot_parse() {
        let server = MockServer::start().await.unwrap();
        server.on(
            "GET",
            "/domains",
            MockResponse::json(
                200,
                json!([{"domain": "example.com", "nameServers": ["ns01.domaincontrol.com"]}]),
            ),
        );
        let caa = json!({"type": "CAA", "name": "@", "data": "0 issue \"letsencrypt.org\"", "ttl": 3600});
        server.on(
            "GET",
            "/domains/example.com/records",
            MockResponse::json(
                200,
                json!([
                    {"type": "A", "name": "www", "data": "192.0.2.1", "ttl": 600},
                    caa.clone(),
                ]),
            ),
        );
        server.on("PUT", "/domains/example.com/records", MockResponse::empty(200));
        let mut provider = provider(&server);

        let zone = provider.get_zone("example.com").await.unwrap().unwrap();
        assert_eq!(zone.records().len(), 1);

        let mx = Record::from_text("@", DnsRecordType::Mx, "10 mail.example.com.");
        provider.create_record("example.com", &mx).await.unwrap();
        provider.commit_zone("example.com").await.unwrap();

        let put = server.requests().into_iter().find(|r| r.method == "PUT").unwrap();
        assert_eq!(
            put.json(),
            json!([
                {"type": "A", "name": "www", "ttl": 600, "data": "192.0.2.1"},
                {"type": "MX", "name": "@", "ttl": 3600, "data": "mail.example.com.", "priority": 10},
                caa,
            ])
        );
    }

    #[tokio::test]
    async fn test_delete_of_unknown_record_fails() {
        let server = server().await;
        let mut provider = provider(&server);

        let ghost = Record::from_text("ghost", DnsRecordType::A, "192.0.2.9");
        let err = provider.delete_record("example.com", &ghost).await.unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(_)));
    }
}

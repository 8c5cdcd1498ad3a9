// # Zone File Provider
//
// Read-only `DnsProvider` over a directory of zone files.
//
// ## Layout
//
// Every `<zone>.db` file in the directory is one zone, named after the
// file. Files are read fresh on every `get_zone` call.
//
// ## Usage
//
// ```rust,no_run
// use dnssync_core::traits::DnsProvider;
// use dnssync_zonefile::ZoneFileProvider;
//
// # async fn run() -> dnssync_core::Result<()> {
// let mut provider = ZoneFileProvider::new("/etc/bind/zones");
// if let Some(zone) = provider.get_zone("example.com").await? {
//     println!("{zone}");
// }
// # Ok(())
// # }
// ```
//
// ## Configuration
//
// - `ZONEFILE_PATH`: the zone directory (default `.`)

mod parser;

pub use parser::{MAX_INCLUDE_DEPTH, parse_zone, read_zone_lines};

use async_trait::async_trait;
use dnssync_core::config::ProviderConfig;
use dnssync_core::model::normalize_domain;
use dnssync_core::traits::{DnsProvider, DnsProviderFactory};
use dnssync_core::{DnsRecordType, Error, ProviderRegistry, Record, Result, Zone};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const PROVIDER_ID: &str = "zonefile";

/// Zone file extension, without the dot
pub const ZONE_FILE_EXTENSION: &str = "db";

const READABLE_TYPES: [DnsRecordType; 8] = [
    DnsRecordType::A,
    DnsRecordType::Aaaa,
    DnsRecordType::Mx,
    DnsRecordType::Srv,
    DnsRecordType::Cname,
    DnsRecordType::Txt,
    DnsRecordType::Spf,
    DnsRecordType::Ns,
];

/// Zone-file directory provider
#[derive(Debug, Clone)]
pub struct ZoneFileProvider {
    path: PathBuf,
}

impl ZoneFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn zone_path(&self, domain: &str) -> Option<PathBuf> {
        let domain = normalize_domain(domain)?;
        Some(self.path.join(format!("{domain}.{ZONE_FILE_EXTENSION}")))
    }
}

#[async_trait]
impl DnsProvider for ZoneFileProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn description(&self) -> &str {
        "Zone files (read-only)"
    }

    fn read_only(&self) -> bool {
        true
    }

    async fn list_zones(&mut self) -> Result<Vec<String>> {
        let mut zones = Vec::new();
        let mut entries = fs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ZONE_FILE_EXTENSION) {
                continue;
            }
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                zones.push(stem.to_string());
            }
        }

        zones.sort();
        debug!("[zonefile] Found {} zone file(s) in {}", zones.len(), self.path.display());
        Ok(zones)
    }

    async fn get_zone(&mut self, domain: &str) -> Result<Option<Zone>> {
        let Some(file) = self.zone_path(domain) else {
            return Ok(None);
        };
        if !fs::metadata(&file).await.map(|m| m.is_file()).unwrap_or(false) {
            return Ok(None);
        }

        let lines = read_zone_lines(&self.path, &file).await?;
        let zone = parse_zone(domain, &lines)?;

        debug!("[zonefile] Read {} record(s) from {}", zone.records().len(), file.display());
        Ok(Some(zone))
    }

    fn can_read_type(&self, record_type: DnsRecordType) -> bool {
        READABLE_TYPES.contains(&record_type)
    }

    fn can_write_type(&self, _record_type: DnsRecordType) -> bool {
        false
    }

    async fn create_record(&mut self, _zone: &str, _record: &Record) -> Result<Record> {
        Err(Error::read_only(PROVIDER_ID))
    }

    async fn update_record(
        &mut self,
        _zone: &str,
        _existing: &Record,
        _desired: &Record,
    ) -> Result<Record> {
        Err(Error::read_only(PROVIDER_ID))
    }

    async fn delete_record(&mut self, _zone: &str, _record: &Record) -> Result<()> {
        Err(Error::read_only(PROVIDER_ID))
    }
}

/// Factory for creating zone-file providers
pub struct ZoneFileFactory;

impl DnsProviderFactory for ZoneFileFactory {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn description(&self) -> &'static str {
        "Zone files (read-only)"
    }

    fn read_only(&self) -> bool {
        true
    }

    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::ZoneFile { path } => Ok(Box::new(ZoneFileProvider::new(path))),
            _ => Err(Error::config("Invalid config for zone file provider")),
        }
    }
}

/// Register the zone-file provider with a registry
pub fn register(registry: &mut ProviderRegistry) {
    registry.register(Box::new(ZoneFileFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn zone_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("example.com.db"),
            "$TTL 3600\n@ IN NS ns1.example.com.\nwww 300 IN A 192.0.2.1\n$INCLUDE mail.inc\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("mail.inc"), "@ IN MX 10 mail.example.com.\n").unwrap();
        std::fs::write(dir.path().join("example.org.db"), "@ IN A 192.0.2.9\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a zone").unwrap();
        std::fs::create_dir(dir.path().join("archive.db")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_list_zones() {
        let dir = zone_dir();
        let mut provider = ZoneFileProvider::new(dir.path());

        assert_eq!(provider.list_zones().await.unwrap(), vec!["example.com", "example.org"]);
    }

    #[tokio::test]
    async fn test_get_zone_exports_like_the_file() {
        let dir = zone_dir();
        let mut provider = ZoneFileProvider::new(dir.path());

        let zone = provider.get_zone("example.com.").await.unwrap().unwrap();
        assert_eq!(zone.domain(), Some("example.com"));
        assert_eq!(
            zone.to_zone_text(),
            "$TTL 3600\n@\t\tIN\tNS\tns1.example.com.\nwww\t300\tIN\tA\t192.0.2.1\n@\t\tIN\tMX\t10 mail.example.com."
        );

        assert!(provider.get_zone("missing.net").await.unwrap().is_none());
        assert!(provider.get_zone("archive").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_writes_are_rejected() {
        let dir = zone_dir();
        let mut provider = ZoneFileProvider::new(dir.path());
        let record = Record::parse("www IN A 192.0.2.2").unwrap();

        assert!(provider.read_only());
        assert!(!provider.can_write_type(DnsRecordType::A));
        assert!(provider.can_read_type(DnsRecordType::Spf));
        assert!(matches!(
            provider.create_record("example.com", &record).await,
            Err(Error::ReadOnly(_))
        ));
        assert!(matches!(
            provider.delete_record("example.com", &record).await,
            Err(Error::ReadOnly(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_record_type_fails_the_zone() {
        let dir = zone_dir();
        std::fs::write(
            dir.path().join("example.net.db"),
            "www IN A 192.0.2.1\n@ IN CAA 0 issue \"letsencrypt.org\"\n",
        )
        .unwrap();
        let mut provider = ZoneFileProvider::new(dir.path());

        let err = provider.get_zone("example.net").await.unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_factory() {
        let config = ProviderConfig::ZoneFile { path: "/srv/zones".into() };
        let provider = ZoneFileFactory.create(&config).unwrap();
        assert_eq!(provider.id(), "zonefile");
        assert!(provider.read_only());
    }
}

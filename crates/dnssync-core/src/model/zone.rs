use crate::model::{Record, Time};
use std::fmt;

const EXPORT_TAB_WIDTH: usize = 8;

/// The records of one domain
///
/// Records are not loaded until a provider calls [`Zone::load_records`].
#[derive(Debug, Clone, Default)]
pub struct Zone {
    domain: Option<String>,
    id: Option<String>,
    records: Option<Vec<Record>>,
    default_ttl: Option<Time>,
}

impl Zone {
    /// Create an unloaded zone; the domain is trimmed and loses its trailing dot
    pub fn new(domain: &str) -> Self {
        Self {
            domain: normalize_domain(domain),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_default_ttl(mut self, ttl: Option<Time>) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = Some(records);
        self
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Provider-side zone identifier
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn default_ttl(&self) -> Option<Time> {
        self.default_ttl
    }

    pub fn is_loaded(&self) -> bool {
        self.records.is_some()
    }

    pub fn load_records(&mut self, records: Vec<Record>) {
        self.records = Some(records);
    }

    /// Loaded records; empty when not loaded
    pub fn records(&self) -> &[Record] {
        self.records.as_deref().unwrap_or_default()
    }

    /// Append a record, marking the zone loaded if it was not
    pub fn push_record(&mut self, record: Record) {
        self.records.get_or_insert_with(Vec::new).push(record);
    }

    /// Remove the first record with the same identity; returns it if found
    pub fn remove_record(&mut self, record: &Record) -> Option<Record> {
        let records = self.records.as_mut()?;
        let index = records.iter().position(|r| r.same_identity(record))?;
        Some(records.remove(index))
    }

    pub fn find_record_mut(&mut self, record: &Record) -> Option<&mut Record> {
        self.records
            .as_mut()?
            .iter_mut()
            .find(|r| r.same_identity(record))
    }

    /// Render as zone-file text with tab-aligned columns
    ///
    /// Host and TTL columns are padded with tabs to the widest entry
    /// (tab width 8). The TTL column is dropped entirely when no record
    /// writes its TTL. A `$TTL` line leads when the zone has a default.
    pub fn to_zone_text(&self) -> String {
        let records = self.records();

        let longest_host = records
            .iter()
            .map(|r| r.host().chars().count())
            .max()
            .unwrap_or(0);
        let longest_ttl = records
            .iter()
            .filter_map(serialized_ttl)
            .map(|ttl| ttl.len())
            .max()
            .unwrap_or(0);

        let host_columns = longest_host / EXPORT_TAB_WIDTH + 1;
        let ttl_columns = longest_ttl / EXPORT_TAB_WIDTH + 1;

        let lines: Vec<String> = records
            .iter()
            .map(|record| {
                let mut line = pad_column(record.host(), host_columns);
                if longest_ttl > 0 {
                    let ttl = serialized_ttl(record).unwrap_or_default();
                    line.push_str(&pad_column(&ttl, ttl_columns));
                }
                line.push_str(&format!("IN\t{}\t{}", record.record_type(), record.data()));
                line
            })
            .collect();

        let body = lines.join("\n");
        match self.default_ttl {
            Some(ttl) if body.is_empty() => format!("$TTL {ttl}"),
            Some(ttl) => format!("$TTL {ttl}\n{body}"),
            None => body,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_zone_text())
    }
}

/// Provider-side list of zones, fetched once
#[derive(Debug, Clone, Default)]
pub struct ZoneCache {
    zones: Option<Vec<Zone>>,
}

impl ZoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.zones.is_some()
    }

    pub fn load(&mut self, zones: Vec<Zone>) {
        self.zones = Some(zones);
    }

    /// Domains of the cached zones, in cache order
    pub fn domains(&self) -> Vec<String> {
        self.zones
            .iter()
            .flatten()
            .filter_map(|z| z.domain().map(str::to_string))
            .collect()
    }

    pub fn get(&self, domain: &str) -> Option<&Zone> {
        let wanted = normalize_domain(domain)?;
        self.zones
            .as_ref()?
            .iter()
            .find(|z| z.domain() == Some(wanted.as_str()))
    }

    pub fn get_mut(&mut self, domain: &str) -> Option<&mut Zone> {
        let wanted = normalize_domain(domain)?;
        self.zones
            .as_mut()?
            .iter_mut()
            .find(|z| z.domain() == Some(wanted.as_str()))
    }
}

/// Trim whitespace and trailing dots; empty becomes `None`
pub fn normalize_domain(domain: &str) -> Option<String> {
    let domain = domain.trim().trim_end_matches('.');
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_string())
    }
}

fn serialized_ttl(record: &Record) -> Option<String> {
    if record.serializes_ttl() {
        record.ttl_seconds().map(|s| s.to_string())
    } else {
        None
    }
}

fn pad_column(value: &str, columns: usize) -> String {
    let used = value.chars().count() / EXPORT_TAB_WIDTH + 1;
    let tabs = columns + 1 - used;
    format!("{value}{}", "\t".repeat(tabs))
}

use crate::error::{Error, Result};
use crate::model::{DnsRecordType, RecordData, RecordDataKind, Time};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static RECORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<host>\S+)\s+((?P<ttl>\S+)\s+)??IN\s+(?P<type>[A-Za-z]+)\s+(?P<data>.*)$")
        .expect("record pattern is valid")
});

/// Host name of the zone apex
pub const APEX: &str = "@";

/// One DNS resource record
///
/// `data` always uses the variant that matches `record_type`, or
/// [`RecordData::Unparsed`] when the text could not be parsed for it.
#[derive(Debug, Clone)]
pub struct Record {
    id: Option<String>,
    host: String,
    ttl: Option<Time>,
    record_type: DnsRecordType,
    data: RecordData,
    ttl_managed: bool,
    ttl_inherited: bool,
}

impl Record {
    /// Create a record, converting `data` to the variant `record_type` uses
    pub fn new(host: impl Into<String>, record_type: DnsRecordType, data: RecordData) -> Self {
        Self {
            id: None,
            host: normalize_host(host.into()),
            ttl: None,
            record_type,
            data: conform_data(record_type, data),
            ttl_managed: false,
            ttl_inherited: false,
        }
    }

    /// Create a record from data text
    ///
    /// Text that does not parse for `record_type` is kept unparsed.
    pub fn from_text(host: impl Into<String>, record_type: DnsRecordType, data: &str) -> Self {
        Self::new(host, record_type, parse_or_unparsed(record_type, data))
    }

    /// Parse a zone-file line: `host [ttl] IN type data`
    pub fn parse(line: &str) -> Result<Self> {
        let caps = RECORD_PATTERN
            .captures(line)
            .ok_or_else(|| Error::parse(format!("Invalid record: {line}")))?;

        let record_type: DnsRecordType = caps["type"].parse()?;
        let ttl = caps.name("ttl").map(|m| Time::parse(m.as_str())).transpose()?;

        Ok(Self::from_text(&caps["host"], record_type, &caps["data"]).with_ttl(ttl))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Option<Time>) -> Self {
        self.ttl = ttl;
        self.ttl_inherited = false;
        self
    }

    /// Mark the TTL as managed by the provider (never compared)
    pub fn with_ttl_managed(mut self, managed: bool) -> Self {
        self.ttl_managed = managed;
        self
    }

    /// Take a zone default TTL that is not written back out
    pub fn with_inherited_ttl(mut self, ttl: Time) -> Self {
        self.ttl = Some(ttl);
        self.ttl_inherited = true;
        self
    }

    /// Return this record retyped, with its data re-parsed for `record_type`
    pub fn with_type(mut self, record_type: DnsRecordType) -> Self {
        self.record_type = record_type;
        self.reparse_data_for_type();
        self
    }

    /// Re-derive `data` from its text for the current record type
    pub fn reparse_data_for_type(&mut self) {
        let data = std::mem::replace(&mut self.data, RecordData::Unparsed(String::new()));
        self.data = conform_data(self.record_type, data);
    }

    /// Provider-assigned identity
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ttl(&self) -> Option<Time> {
        self.ttl
    }

    pub fn record_type(&self) -> DnsRecordType {
        self.record_type
    }

    pub fn data(&self) -> &RecordData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut RecordData {
        &mut self.data
    }

    pub fn is_ttl_managed(&self) -> bool {
        self.ttl_managed
    }

    /// TTL seconds, if any
    pub fn ttl_seconds(&self) -> Option<u64> {
        self.ttl.map(|t| t.seconds())
    }

    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = normalize_host(host.into());
    }

    pub fn set_ttl(&mut self, ttl: Option<Time>) {
        self.ttl = ttl;
        self.ttl_inherited = false;
    }

    pub fn set_data(&mut self, data: RecordData) {
        self.data = conform_data(self.record_type, data);
    }

    /// Whether the TTL is written out when rendering
    pub fn serializes_ttl(&self) -> bool {
        self.ttl.is_some() && !self.ttl_inherited
    }

    /// Whether two records agree on TTL
    ///
    /// Provider-managed TTLs always agree. Otherwise absent equals absent.
    pub fn ttl_matches(&self, other: &Record) -> bool {
        if self.ttl_managed || other.ttl_managed {
            return true;
        }
        self.ttl == other.ttl
    }

    /// Whether `other` denotes the same stored record
    pub fn same_identity(&self, other: &Record) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.host == other.host
                    && self.record_type == other.record_type
                    && self.data == other.data
            }
        }
    }

    /// Overwrite content from `desired`, keeping this record's identity
    pub fn assign_from(&mut self, desired: &Record) {
        self.host = desired.host.clone();
        self.ttl = desired.ttl;
        self.ttl_inherited = desired.ttl_inherited;
        self.record_type = desired.record_type;
        self.data = desired.data.clone();
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ttl {
            Some(ttl) if self.serializes_ttl() => write!(
                f,
                "{} {} IN {} {}",
                self.host, ttl, self.record_type, self.data
            ),
            _ => write!(f, "{} IN {} {}", self.host, self.record_type, self.data),
        }
    }
}

fn normalize_host(host: String) -> String {
    if host.trim().is_empty() {
        APEX.to_string()
    } else {
        host
    }
}

fn parse_or_unparsed(record_type: DnsRecordType, text: &str) -> RecordData {
    RecordData::parse_for(record_type, text)
        .unwrap_or_else(|_| RecordData::Unparsed(text.to_string()))
}

fn conform_data(record_type: DnsRecordType, data: RecordData) -> RecordData {
    if data.kind() == RecordDataKind::for_type(record_type) {
        return data;
    }
    parse_or_unparsed(record_type, &data.raw())
}

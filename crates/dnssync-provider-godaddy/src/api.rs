//! GoDaddy v1 wire format
//!
//! - List Domains: GET `/domains?statuses=ACTIVE&includes=nameServers`
//! - List Records: GET `/domains/:domain/records`
//! - Replace Records: PUT `/domains/:domain/records`
//!
//! Records carry no id; a zone is written by replacing its whole record set.

use dnssync_core::model::APEX;
use dnssync_core::{DnsRecordType, Error, Record, RecordData, RecordDataKind, Result, Time};
use dnssync_http::ApiDialect;
use serde::Deserialize;
use serde_json::{Value, json};

/// Name server suffix of domains whose DNS GoDaddy hosts
pub const GODADDY_NAMESERVER_SUFFIX: &str = ".domaincontrol.com";

pub(crate) struct GoDaddyApi;

impl ApiDialect for GoDaddyApi {
    fn provider(&self) -> &'static str {
        "godaddy"
    }

    fn error_message(&self, body: &Value) -> Option<String> {
        let message = body.get("message")?.as_str()?;
        let code = body.get("code").and_then(Value::as_str).unwrap_or_default();
        Some(format!("{code}: {message}"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiDomain {
    pub domain: String,
    #[serde(default)]
    pub name_servers: Option<Vec<String>>,
}

impl ApiDomain {
    /// Whether GoDaddy serves this domain's DNS
    pub fn uses_godaddy_dns(&self) -> bool {
        self.name_servers
            .iter()
            .flatten()
            .any(|ns| ns.to_ascii_lowercase().ends_with(GODADDY_NAMESERVER_SUFFIX))
    }
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    data: String,
    #[serde(default)]
    ttl: u64,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    weight: Option<u32>,
    #[serde(default)]
    port: Option<u32>,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
}

/// Build a record from an API record
///
/// SRV hosts are rebuilt as `service.protocol[.name]`.
pub fn record_from_api(value: &Value) -> Result<Record> {
    let api: ApiRecord = serde_json::from_value(value.clone())?;
    let record_type: DnsRecordType = api.record_type.parse()?;

    let mut host = api.name;
    if record_type == DnsRecordType::Srv {
        let service = api.service.unwrap_or_default();
        let protocol = api.protocol.unwrap_or_default();
        host = if host == APEX || host.is_empty() {
            format!("{service}.{protocol}")
        } else {
            format!("{service}.{protocol}.{host}")
        };
    }

    let mut data = RecordData::empty(RecordDataKind::for_type(record_type));
    match record_type {
        DnsRecordType::Txt | DnsRecordType::Spf => data.set_normalized(&api.data)?,
        DnsRecordType::Mx | DnsRecordType::Cname | DnsRecordType::Srv => {
            data.set_target(Some(&api.data))
        }
        _ => data.set_raw(&api.data)?,
    }
    data.set_priority(api.priority);
    data.set_weight(api.weight);
    data.set_port(api.port);

    let ttl = (api.ttl > 0).then(|| Time::from(api.ttl));

    Ok(Record::new(host, record_type, data).with_ttl(ttl))
}

/// One entry of the record set sent by a zone replace
pub fn record_payload(record: &Record, ttl: Time) -> Result<Value> {
    let data = record.data();
    let content = match (record.record_type(), data.target()) {
        (DnsRecordType::Txt, _) => data.normalized(),
        (_, Some(target)) => target.to_string(),
        (_, None) => data.raw(),
    };

    let mut payload = json!({
        "type": record.record_type().as_str(),
        "name": record.host(),
        "ttl": ttl.seconds(),
        "data": content,
    });

    if record.record_type() == DnsRecordType::Srv {
        let labels: Vec<&str> = record.host().split('.').collect();
        if labels.len() < 2 {
            return Err(Error::invalid_input(format!(
                "SRV host must start with _service._proto: {}",
                record.host()
            )));
        }
        payload["service"] = json!(labels[0]);
        payload["protocol"] = json!(labels[1]);
        payload["name"] = json!(if labels.len() > 2 {
            labels[2..].join(".")
        } else {
            APEX.to_string()
        });
    }

    if let Some(priority) = data.priority() {
        payload["priority"] = json!(priority);
    }
    if let Some(weight) = data.weight() {
        payload["weight"] = json!(weight);
    }
    if let Some(port) = data.port() {
        payload["port"] = json!(port);
    }

    Ok(payload)
}

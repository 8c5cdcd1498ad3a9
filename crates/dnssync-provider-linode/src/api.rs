//! Linode v4 wire format
//!
//! - List Domains: GET `/domains`
//! - List Records: GET `/domains/:domain_id/records`
//! - Create Record: POST `/domains/:domain_id/records`
//! - Update Record: PUT `/domains/:domain_id/records/:id`
//! - Delete Record: DELETE `/domains/:domain_id/records/:id`
//!
//! Lists come back as `{data, page, pages, results}`.

use dnssync_core::model::APEX;
use dnssync_core::{DnsRecordType, Record, RecordData, RecordDataKind, Result, Time};
use dnssync_http::ApiDialect;
use serde::Deserialize;
use serde_json::{Value, json};

pub(crate) struct LinodeApi;

impl ApiDialect for LinodeApi {
    fn provider(&self) -> &'static str {
        "linode"
    }

    fn select_data(&self, body: Value) -> Value {
        match body.get("data") {
            Some(data) => data.clone(),
            None => body,
        }
    }

    fn total_pages(&self, body: &Value) -> Option<u64> {
        body.get("pages")?.as_u64()
    }

    fn error_message(&self, body: &Value) -> Option<String> {
        let errors = body.get("errors")?.as_array()?;
        if errors.is_empty() {
            return None;
        }
        Some(
            errors
                .iter()
                .map(|e| {
                    let reason = e["reason"].as_str().unwrap_or_default();
                    match e.get("field").and_then(Value::as_str) {
                        Some(field) => format!("{field}: {reason}"),
                        None => reason.to_string(),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiDomain {
    pub id: u64,
    pub domain: String,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    weight: Option<u32>,
    #[serde(default)]
    port: Option<u32>,
    #[serde(default)]
    ttl_sec: u64,
}

/// Build a record from an API domain record
///
/// An empty name is the apex. A TTL of 0 means the domain default and is
/// read as absent.
pub fn record_from_api(value: &Value) -> Result<Record> {
    let api: ApiRecord = serde_json::from_value(value.clone())?;
    let record_type: DnsRecordType = api.record_type.parse()?;

    let mut data = RecordData::empty(RecordDataKind::for_type(record_type));
    match record_type {
        DnsRecordType::Txt | DnsRecordType::Spf => data.set_normalized(&api.target)?,
        DnsRecordType::Mx | DnsRecordType::Srv | DnsRecordType::Cname => {
            data.set_priority(api.priority);
            data.set_weight(api.weight);
            data.set_port(api.port);
            data.set_target(Some(&api.target));
        }
        _ => data.set_raw(&api.target)?,
    }

    let ttl = (api.ttl_sec > 0).then(|| Time::from(api.ttl_sec));

    Ok(Record::new(api.name, record_type, data)
        .with_ttl(ttl)
        .with_id(api.id.to_string()))
}

/// Request body for creating or updating `record`
pub fn record_payload(record: &Record, ttl: Time) -> Value {
    let data = record.data();

    let name = if record.host() == APEX { "" } else { record.host() };
    let target = match (record.record_type(), data.target()) {
        (DnsRecordType::Txt, _) => data.normalized(),
        (_, Some(target)) => bare_target(target).to_string(),
        (_, None) => data.raw(),
    };

    let mut payload = json!({
        "type": record.record_type().as_str(),
        "name": name,
        "ttl_sec": ttl.seconds(),
        "target": target,
        "priority": data.priority().unwrap_or(0),
        "weight": data.weight().unwrap_or(0),
        "port": data.port().unwrap_or(0),
        "service": null,
        "protocol": null,
        "tag": null,
    });

    if record.record_type() == DnsRecordType::Srv {
        let mut labels = name.split('.').map(|label| label.trim_start_matches('_'));
        payload["service"] = json!(labels.next());
        payload["protocol"] = json!(labels.next());
    }

    payload
}

fn bare_target(target: &str) -> &str {
    match target.trim_end_matches('.') {
        "" => ".",
        bare => bare,
    }
}

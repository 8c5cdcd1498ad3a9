//! Cloudflare v4 wire format
//!
//! - List Zones: GET `/zones`
//! - List DNS Records: GET `/zones/:zone_id/dns_records`
//! - Create DNS Record: POST `/zones/:zone_id/dns_records`
//! - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
//! - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`
//!
//! Every response is wrapped in `{success, errors, result, result_info}`.

use dnssync_core::model::{APEX, quote_txt};
use dnssync_core::{DnsRecordType, Error, Record, Result, Time};
use dnssync_http::ApiDialect;
use serde::Deserialize;
use serde_json::{Value, json};

/// TTL value Cloudflare reads as "automatic"
pub const AUTOMATIC_TTL: u64 = 1;

pub(crate) struct CloudflareApi;

impl ApiDialect for CloudflareApi {
    fn provider(&self) -> &'static str {
        "cloudflare"
    }

    fn select_data(&self, body: Value) -> Value {
        match body.get("result") {
            Some(result) if !result.is_null() => result.clone(),
            _ => body,
        }
    }

    fn total_pages(&self, body: &Value) -> Option<u64> {
        body.get("result_info")?.get("total_pages")?.as_u64()
    }

    fn error_message(&self, body: &Value) -> Option<String> {
        let errors = body.get("errors")?.as_array()?;
        if errors.is_empty() {
            return None;
        }
        Some(
            errors
                .iter()
                .map(|e| format!("{}: {}", e["code"], e["message"].as_str().unwrap_or_default()))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiZone {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    ttl: u64,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    proxied: bool,
}

/// Build a record from an API record object
///
/// The host is the record name minus its last two labels (`@` for the
/// apex). TTL 1 ("automatic") becomes an absent TTL; proxied records have
/// a provider-managed TTL.
pub fn record_from_api(value: &Value) -> Result<Record> {
    let api: ApiRecord = serde_json::from_value(value.clone())?;
    let record_type: DnsRecordType = api.record_type.parse()?;

    let labels: Vec<&str> = api.name.split('.').collect();
    let host = labels[..labels.len().saturating_sub(2)].join(".");
    let host = if host.is_empty() { APEX.to_string() } else { host };

    let mut content = api.content;
    if record_type == DnsRecordType::Srv {
        content = content.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    if matches!(record_type, DnsRecordType::Srv | DnsRecordType::Mx) {
        content = format!("{} {}", api.priority.unwrap_or(0), content);
    }
    if matches!(record_type, DnsRecordType::Txt | DnsRecordType::Spf) {
        content = quote_txt(&content);
    }

    let ttl = (api.ttl != AUTOMATIC_TTL).then(|| Time::from(api.ttl));

    Ok(Record::from_text(host, record_type, &content)
        .with_ttl(ttl)
        .with_ttl_managed(api.proxied)
        .with_id(api.id))
}

/// Request body for creating or updating `record`
pub fn record_payload(record: &Record, ttl: Time) -> Result<Value> {
    let data = record.data();

    if record.record_type() == DnsRecordType::Srv {
        let labels: Vec<&str> = record.host().split('.').collect();
        if labels.len() < 2 {
            return Err(Error::invalid_input(format!(
                "SRV host must start with _service._proto: {}",
                record.host()
            )));
        }
        let name = if labels.len() > 2 {
            labels[2..].join(".")
        } else {
            APEX.to_string()
        };

        return Ok(json!({
            "type": "SRV",
            "ttl": ttl.seconds(),
            "data": {
                "service": labels[0],
                "proto": labels[1],
                "name": name,
                "priority": data.priority(),
                "weight": data.weight(),
                "port": data.port(),
                "target": data.target(),
            },
        }));
    }

    let mut payload = json!({
        "name": record.host(),
        "type": record.record_type().as_str(),
        "content": data.normalized(),
        "ttl": ttl.seconds(),
    });

    if record.record_type() == DnsRecordType::Mx {
        payload["content"] = json!(bare_target(data.target().unwrap_or(".")));
        payload["priority"] = json!(data.priority().unwrap_or(0));
    }

    Ok(payload)
}

/// Target without its trailing dot; the root stays "."
fn bare_target(target: &str) -> &str {
    match target.trim_end_matches('.') {
        "" => ".",
        bare => bare,
    }
}

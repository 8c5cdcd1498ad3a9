//! DigitalOcean v2 wire format
//!
//! - List Domains: GET `/domains`
//! - List Records: GET `/domains/:domain/records`
//! - Create Record: POST `/domains/:domain/records`
//! - Update Record: PUT `/domains/:domain/records/:id`
//! - Delete Record: DELETE `/domains/:domain/records/:id`
//!
//! Lists page through `links.pages.last`, a URL whose `page` parameter is
//! the page count.

use dnssync_core::{DnsRecordType, Record, RecordData, RecordDataKind, Result, Time};
use dnssync_http::{ApiDialect, query_param};
use serde::Deserialize;
use serde_json::{Value, json};

/// Largest page size the API accepts
pub const PAGE_SIZE: u32 = 200;

pub(crate) struct DigitalOceanApi;

impl ApiDialect for DigitalOceanApi {
    fn provider(&self) -> &'static str {
        "digitalocean"
    }

    fn select_data(&self, body: Value) -> Value {
        ["domains", "domain_records", "domain_record"]
            .iter()
            .find_map(|key| body.get(key).cloned())
            .unwrap_or(Value::Null)
    }

    fn total_pages(&self, body: &Value) -> Option<u64> {
        let last = body.get("links")?.get("pages")?.get("last")?.as_str()?;
        query_param(last, "page")?.parse().ok()
    }

    fn error_message(&self, body: &Value) -> Option<String> {
        let message = body.get("message")?.as_str()?;
        Some(match body.get("id").and_then(Value::as_str) {
            Some(id) => format!("{id}: {message}"),
            None => message.to_string(),
        })
    }

    fn default_query(&self) -> Vec<(String, String)> {
        vec![("per_page".to_string(), PAGE_SIZE.to_string())]
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiDomain {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: u64,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    data: String,
    #[serde(default)]
    ttl: Option<u64>,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    weight: Option<u32>,
    #[serde(default)]
    port: Option<u32>,
}

/// Build a record from an API domain record
///
/// MX, SRV and CNAME content comes from the separate priority, weight,
/// port and target fields. A TTL of 0 is read as absent.
pub fn record_from_api(value: &Value) -> Result<Record> {
    let api: ApiRecord = serde_json::from_value(value.clone())?;
    let record_type: DnsRecordType = api.record_type.parse()?;

    let mut data = RecordData::empty(RecordDataKind::for_type(record_type));
    match record_type {
        DnsRecordType::Txt | DnsRecordType::Spf => data.set_normalized(&api.data)?,
        DnsRecordType::Mx | DnsRecordType::Srv | DnsRecordType::Cname => {
            data.set_priority(api.priority);
            data.set_weight(api.weight);
            data.set_port(api.port);
            data.set_target(Some(&api.data));
        }
        _ => data.set_raw(&api.data)?,
    }

    let ttl = api.ttl.filter(|ttl| *ttl > 0).map(Time::from);

    Ok(Record::new(api.name, record_type, data)
        .with_ttl(ttl)
        .with_id(api.id.to_string()))
}

/// Request body for creating or updating `record`
pub fn record_payload(record: &Record, ttl: Time) -> Value {
    let data = record.data();
    let content = match record.record_type() {
        DnsRecordType::Txt => data.normalized(),
        _ => data
            .target()
            .map(str::to_string)
            .unwrap_or_else(|| data.raw()),
    };

    json!({
        "type": record.record_type().as_str(),
        "name": record.host(),
        "ttl": ttl.seconds(),
        "data": content,
        "priority": data.priority(),
        "weight": data.weight(),
        "port": data.port(),
        "tag": null,
    })
}

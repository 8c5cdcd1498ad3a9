//! Name.com v4 wire format
//!
//! - List Domains: GET `/domains`
//! - List Records: GET `/domains/:domain/records`
//! - Create Record: POST `/domains/:domain/records`
//! - Update Record: PUT `/domains/:domain/records/:id`
//! - Delete Record: DELETE `/domains/:domain/records/:id`

use dnssync_core::model::APEX;
use dnssync_core::{DnsRecordType, Record, RecordData, RecordDataKind, Result, Time};
use dnssync_http::ApiDialect;
use serde::Deserialize;
use serde_json::{Value, json};

pub(crate) struct NameComApi;

impl ApiDialect for NameComApi {
    fn provider(&self) -> &'static str {
        "namecom"
    }

    fn select_data(&self, body: Value) -> Value {
        ["records", "domains"]
            .iter()
            .find_map(|key| body.get(key).cloned())
            .unwrap_or(body)
    }

    fn total_pages(&self, body: &Value) -> Option<u64> {
        body.get("lastPage")?.as_u64()
    }

    fn error_message(&self, body: &Value) -> Option<String> {
        let message = body.get("message")?.as_str()?;
        Some(match body.get("details").and_then(Value::as_str) {
            Some(details) => format!("{message}: {details}"),
            None => message.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiDomain {
    pub domain_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: u64,
    #[serde(default)]
    host: Option<String>,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    ttl: u64,
    #[serde(default)]
    priority: Option<u32>,
}

/// Build a record from an API record
///
/// A missing host is the apex. MX and SRV answers lack the priority, which
/// the API reports separately.
pub fn record_from_api(value: &Value) -> Result<Record> {
    let api: ApiRecord = serde_json::from_value(value.clone())?;
    let record_type: DnsRecordType = api.record_type.parse()?;

    let mut data = RecordData::empty(RecordDataKind::for_type(record_type));
    match record_type {
        DnsRecordType::Mx | DnsRecordType::Srv => {
            data.set_raw(&format!("{} {}", api.priority.unwrap_or(0), api.answer))?
        }
        DnsRecordType::Txt | DnsRecordType::Spf => data.set_normalized(&api.answer)?,
        _ => data.set_raw(&api.answer)?,
    }

    let ttl = (api.ttl > 0).then(|| Time::from(api.ttl));
    let host = api.host.unwrap_or_else(|| APEX.to_string());

    Ok(Record::new(host, record_type, data)
        .with_ttl(ttl)
        .with_id(api.id.to_string()))
}

/// Request body for creating or updating `record`
pub fn record_payload(record: &Record, ttl: Time) -> Value {
    let data = record.data();
    let target = data.target().unwrap_or(".");

    let (priority, answer) = match record.record_type() {
        DnsRecordType::Srv => (
            data.priority(),
            format!(
                "{} {} {}",
                data.weight().unwrap_or(0),
                data.port().unwrap_or(0),
                target
            ),
        ),
        DnsRecordType::Mx => (data.priority(), target.to_string()),
        DnsRecordType::Txt | DnsRecordType::Spf => (None, data.normalized()),
        _ => (None, data.raw()),
    };

    let host = if record.host() == APEX { "" } else { record.host() };

    json!({
        "type": record.record_type().as_str(),
        "host": host,
        "ttl": ttl.seconds(),
        "priority": priority,
        "answer": answer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_api() {
        let mx = record_from_api(&json!({
            "id": 12345,
            "domainName": "example.org",
            "fqdn": "example.org.",
            "type": "MX",
            "answer": "mx.example.org",
            "ttl": 300,
            "priority": 10,
        }))
        .unwrap();
        assert_eq!(mx.to_string(), "@ 300 IN MX 10 mx.example.org.");

        let srv = record_from_api(&json!({
            "id": 12346,
            "host": "_sip._tcp",
            "type": "SRV",
            "answer": "5 5060 sip.example.org",
            "ttl": 0,
            "priority": 20,
        }))
        .unwrap();
        assert_eq!(srv.host(), "_sip._tcp");
        assert_eq!(srv.ttl(), None);
        assert_eq!(srv.data().raw(), "20 5 5060 sip.example.org.");
    }

    #[test]
    fn test_payloads() {
        let srv = Record::new(
            "_sip._tcp",
            DnsRecordType::Srv,
            RecordData::srv(20, 5, 5060, "sip.example.org."),
        );
        assert_eq!(
            record_payload(&srv, Time::from(300)),
            json!({
                "type": "SRV",
                "host": "_sip._tcp",
                "ttl": 300,
                "priority": 20,
                "answer": "5 5060 sip.example.org.",
            })
        );

        let txt = Record::from_text("@", DnsRecordType::Txt, r#""v=spf1 -all""#);
        let payload = record_payload(&txt, Time::from(300));
        assert_eq!(payload["host"], "");
        assert_eq!(payload["priority"], Value::Null);
        assert_eq!(payload["answer"], "v=spf1 -all");
    }

    #[test]
    fn test_error_message() {
        let body = json!({"message": "Invalid Argument", "details": "Parameter Value Error - Invalid Type"});
        assert_eq!(
            NameComApi.error_message(&body).unwrap(),
            "Invalid Argument: Parameter Value Error - Invalid Type"
        );
    }
}

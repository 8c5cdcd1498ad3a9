//! Zone data model: durations, record types, record content, records, zones

mod record;
mod record_data;
mod record_type;
mod time;
mod zone;

pub use record::{APEX, Record};
pub use record_data::{RecordData, RecordDataKind, quote_txt, unquote_txt};
pub use record_type::DnsRecordType;
pub use time::Time;
pub use zone::{Zone, ZoneCache, normalize_domain};

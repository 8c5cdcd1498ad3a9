//! Type-specific record content
//!
//! Every record carries a [`RecordData`] whose variant is picked from its
//! [`DnsRecordType`]. Each variant knows how to parse its zone-file text,
//! render it back (`raw`), and render a comparison form (`normalized`). The
//! two forms only differ for TXT, where `raw` is the quoted wire text and
//! `normalized` is the unescaped content.

use crate::error::{Error, Result};
use crate::model::DnsRecordType;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

static MX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<priority>[0-9]+)\s+(?P<target>\S+)$").expect("MX pattern is valid")
});

static SRV_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<priority>[0-9]+)\s+(?P<weight>[0-9]+)\s+(?P<port>[0-9]+)\s+(?P<target>\S+)$")
        .expect("SRV pattern is valid")
});

const QUOTE: char = '"';
const ESCAPE: char = '\\';
const ESCAPED_CHARS: [char; 3] = ['\\', '"', ';'];

/// Which [`RecordData`] variant a record type uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordDataKind {
    Ip,
    Mx,
    Srv,
    Cname,
    Txt,
    Unparsed,
}

impl RecordDataKind {
    /// Map a record type to its data variant; unmapped types stay unparsed
    pub fn for_type(record_type: DnsRecordType) -> Self {
        match record_type {
            DnsRecordType::A | DnsRecordType::Aaaa => Self::Ip,
            DnsRecordType::Mx => Self::Mx,
            DnsRecordType::Srv => Self::Srv,
            DnsRecordType::Cname => Self::Cname,
            DnsRecordType::Txt | DnsRecordType::Spf => Self::Txt,
            DnsRecordType::Ns | DnsRecordType::Ptr | DnsRecordType::Soa => Self::Unparsed,
        }
    }
}

/// Parsed record content
#[derive(Debug, Clone)]
pub enum RecordData {
    /// A / AAAA. `None` until an address is set.
    Ip(Option<IpAddr>),
    Mx {
        priority: u32,
        target: String,
    },
    Srv {
        priority: u32,
        weight: u32,
        port: u32,
        target: String,
    },
    Cname {
        target: String,
    },
    /// TXT / SPF, holding the unescaped text
    Txt(String),
    /// Text kept verbatim
    Unparsed(String),
}

impl RecordData {
    /// Default value of a variant
    pub fn empty(kind: RecordDataKind) -> Self {
        match kind {
            RecordDataKind::Ip => Self::Ip(None),
            RecordDataKind::Mx => Self::Mx {
                priority: 0,
                target: normalize_target(None),
            },
            RecordDataKind::Srv => Self::Srv {
                priority: 0,
                weight: 0,
                port: 0,
                target: normalize_target(None),
            },
            RecordDataKind::Cname => Self::Cname {
                target: normalize_target(None),
            },
            RecordDataKind::Txt => Self::Txt(String::new()),
            RecordDataKind::Unparsed => Self::Unparsed(String::new()),
        }
    }

    /// Parse zone-file text into the given variant
    ///
    /// Empty text yields the variant's default value.
    pub fn parse(kind: RecordDataKind, text: &str) -> Result<Self> {
        let mut data = Self::empty(kind);
        data.set_raw(text)?;
        Ok(data)
    }

    /// Parse text using the variant that matches `record_type`
    pub fn parse_for(record_type: DnsRecordType, text: &str) -> Result<Self> {
        Self::parse(RecordDataKind::for_type(record_type), text)
    }

    /// MX content from its parts
    pub fn mx(priority: u32, target: &str) -> Self {
        Self::Mx {
            priority,
            target: normalize_target(Some(target)),
        }
    }

    /// SRV content from its parts
    pub fn srv(priority: u32, weight: u32, port: u32, target: &str) -> Self {
        Self::Srv {
            priority,
            weight,
            port,
            target: normalize_target(Some(target)),
        }
    }

    /// TXT content from unescaped text
    pub fn txt(text: impl Into<String>) -> Self {
        Self::Txt(text.into())
    }

    pub fn kind(&self) -> RecordDataKind {
        match self {
            Self::Ip(_) => RecordDataKind::Ip,
            Self::Mx { .. } => RecordDataKind::Mx,
            Self::Srv { .. } => RecordDataKind::Srv,
            Self::Cname { .. } => RecordDataKind::Cname,
            Self::Txt(_) => RecordDataKind::Txt,
            Self::Unparsed(_) => RecordDataKind::Unparsed,
        }
    }

    /// Canonical zone-file text
    pub fn raw(&self) -> String {
        match self {
            Self::Ip(Some(ip)) => ip.to_string(),
            Self::Ip(None) => String::new(),
            Self::Mx { priority, target } => format!("{priority} {target}"),
            Self::Srv {
                priority,
                weight,
                port,
                target,
            } => format!("{priority} {weight} {port} {target}"),
            Self::Cname { target } => target.clone(),
            Self::Txt(text) => quote_txt(text),
            Self::Unparsed(text) => text.clone(),
        }
    }

    /// Comparison form; the unescaped text for TXT, `raw` otherwise
    pub fn normalized(&self) -> String {
        match self {
            Self::Txt(text) => text.clone(),
            _ => self.raw(),
        }
    }

    /// Replace the content by parsing zone-file text
    ///
    /// On error the current value is left untouched.
    pub fn set_raw(&mut self, text: &str) -> Result<()> {
        *self = match self.kind() {
            RecordDataKind::Ip => Self::Ip(parse_ip(text)?),
            RecordDataKind::Mx => parse_mx(text)?,
            RecordDataKind::Srv => parse_srv(text)?,
            RecordDataKind::Cname => Self::Cname {
                target: parse_cname(text)?,
            },
            RecordDataKind::Txt => Self::Txt(unquote_txt(text)?),
            RecordDataKind::Unparsed => Self::Unparsed(text.to_string()),
        };
        Ok(())
    }

    /// Replace the content from its comparison form
    pub fn set_normalized(&mut self, text: &str) -> Result<()> {
        match self {
            Self::Txt(current) => {
                *current = text.to_string();
                Ok(())
            }
            _ => self.set_raw(text),
        }
    }

    pub fn priority(&self) -> Option<u32> {
        match self {
            Self::Mx { priority, .. } | Self::Srv { priority, .. } => Some(*priority),
            _ => None,
        }
    }

    pub fn weight(&self) -> Option<u32> {
        match self {
            Self::Srv { weight, .. } => Some(*weight),
            _ => None,
        }
    }

    pub fn port(&self) -> Option<u32> {
        match self {
            Self::Srv { port, .. } => Some(*port),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Mx { target, .. } | Self::Srv { target, .. } | Self::Cname { target } => {
                Some(target)
            }
            _ => None,
        }
    }

    pub fn ip_address(&self) -> Option<IpAddr> {
        match self {
            Self::Ip(ip) => *ip,
            _ => None,
        }
    }

    /// `None` stores 0. No-op on variants without a priority.
    pub fn set_priority(&mut self, value: Option<u32>) {
        if let Self::Mx { priority, .. } | Self::Srv { priority, .. } = self {
            *priority = value.unwrap_or(0);
        }
    }

    /// `None` stores 0. No-op on variants without a weight.
    pub fn set_weight(&mut self, value: Option<u32>) {
        if let Self::Srv { weight, .. } = self {
            *weight = value.unwrap_or(0);
        }
    }

    /// `None` stores 0. No-op on variants without a port.
    pub fn set_port(&mut self, value: Option<u32>) {
        if let Self::Srv { port, .. } = self {
            *port = value.unwrap_or(0);
        }
    }

    /// `None` stores the root ("."); a trailing dot is always added
    pub fn set_target(&mut self, value: Option<&str>) {
        if let Self::Mx { target, .. } | Self::Srv { target, .. } | Self::Cname { target } = self
        {
            *target = normalize_target(value);
        }
    }

    pub fn set_ip_address(&mut self, value: Option<IpAddr>) {
        if let Self::Ip(ip) = self {
            *ip = value;
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw())
    }
}

impl PartialEq for RecordData {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl Eq for RecordData {}

impl PartialOrd for RecordData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordData {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw().cmp(&other.raw())
    }
}

/// Wrap text in double quotes, escaping `\`, `"` and `;`
pub fn quote_txt(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(QUOTE);
    for c in text.chars() {
        if ESCAPED_CHARS.contains(&c) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out.push(QUOTE);
    out
}

/// Undo [`quote_txt`]
///
/// Several quoted strings are concatenated (`"a" "b"` is `ab`). Whitespace
/// between strings is skipped; any other character outside quotes, or a
/// string left open, is a parse error.
pub fn unquote_txt(text: &str) -> Result<String> {
    let mut result = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_quotes {
            if c.is_whitespace() {
                continue;
            }
            if c == QUOTE {
                in_quotes = true;
                continue;
            }
            return Err(Error::parse(format!(
                "Invalid character found outside of TXT value: {c}"
            )));
        }

        if escaped {
            result.push(c);
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == QUOTE {
            in_quotes = false;
        } else {
            result.push(c);
        }
    }

    if in_quotes {
        return Err(Error::parse(format!("Unterminated TXT value: {text}")));
    }

    Ok(result)
}

fn normalize_target(target: Option<&str>) -> String {
    let mut target = match target.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => ".".to_string(),
    };
    if !target.ends_with('.') {
        target.push('.');
    }
    target
}

fn parse_ip(text: &str) -> Result<Option<IpAddr>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<IpAddr>()
        .map(Some)
        .map_err(|_| Error::parse(format!("{text} is an invalid IP address")))
}

fn parse_number(text: &str, field: &str) -> Result<u32> {
    text.parse::<u32>()
        .map_err(|e| Error::parse(format!("Invalid {field} {text}: {e}")))
}

fn parse_mx(text: &str) -> Result<RecordData> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(RecordData::empty(RecordDataKind::Mx));
    }

    let caps = MX_PATTERN
        .captures(text)
        .ok_or_else(|| Error::parse(format!("Invalid MX record data: {text}")))?;

    Ok(RecordData::Mx {
        priority: parse_number(&caps["priority"], "MX priority")?,
        target: normalize_target(Some(&caps["target"])),
    })
}

fn parse_srv(text: &str) -> Result<RecordData> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(RecordData::empty(RecordDataKind::Srv));
    }

    let caps = SRV_PATTERN
        .captures(text)
        .ok_or_else(|| Error::parse(format!("Invalid SRV record data: {text}")))?;

    Ok(RecordData::Srv {
        priority: parse_number(&caps["priority"], "SRV priority")?,
        weight: parse_number(&caps["weight"], "SRV weight")?,
        port: parse_number(&caps["port"], "SRV port")?,
        target: normalize_target(Some(&caps["target"])),
    })
}

fn parse_cname(text: &str) -> Result<String> {
    let text = text.trim();
    if text.chars().any(char::is_whitespace) {
        return Err(Error::parse(
            "CNAME data field should not contain whitespace",
        ));
    }
    Ok(normalize_target(Some(text)))
}

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS resource record types understood by dnssync
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Ptr,
    Soa,
    Spf,
    Srv,
    Txt,
}

impl DnsRecordType {
    /// Every supported type
    pub const ALL: [DnsRecordType; 10] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Mx,
        Self::Ns,
        Self::Ptr,
        Self::Soa,
        Self::Spf,
        Self::Srv,
        Self::Txt,
    ];

    /// Upper-case mnemonic, as written in zone files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Ptr => "PTR",
            Self::Soa => "SOA",
            Self::Spf => "SPF",
            Self::Srv => "SRV",
            Self::Txt => "TXT",
        }
    }

    /// Wire type code (RFC 1035 and successors)
    pub fn code(&self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Cname => 5,
            Self::Soa => 6,
            Self::Ptr => 12,
            Self::Mx => 15,
            Self::Txt => 16,
            Self::Aaaa => 28,
            Self::Srv => 33,
            Self::Spf => 99,
        }
    }
}

impl FromStr for DnsRecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::parse(format!("{s} is not a valid record type")))
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("aaaa".parse::<DnsRecordType>().unwrap(), DnsRecordType::Aaaa);
        assert_eq!("Mx".parse::<DnsRecordType>().unwrap(), DnsRecordType::Mx);
        assert_eq!(" TXT ".parse::<DnsRecordType>().unwrap(), DnsRecordType::Txt);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "CAA".parse::<DnsRecordType>().unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_display_and_code() {
        assert_eq!(DnsRecordType::Cname.to_string(), "CNAME");
        assert_eq!(DnsRecordType::Aaaa.code(), 28);
        assert_eq!(DnsRecordType::Spf.code(), 99);
    }

    #[test]
    fn test_serde_uses_mnemonic() {
        let json = serde_json::to_string(&DnsRecordType::Aaaa).unwrap();
        assert_eq!(json, "\"AAAA\"");
    }
}

//! Durations as written in zone files ("3600", "1h", "1w2d")

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

const MINUTE: u64 = 60;
const HOUR: u64 = MINUTE * 60;
const DAY: u64 = HOUR * 24;
const WEEK: u64 = DAY * 7;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("number pattern is valid"));

static UNIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?P<weeks>[0-9]+)[wW])?((?P<days>[0-9]+)[dD])?((?P<hours>[0-9]+)[hH])?((?P<minutes>[0-9]+)[mM])?((?P<seconds>[0-9]+)[sS])?$",
    )
    .expect("unit pattern is valid")
});

/// A duration in whole seconds
///
/// Remembers whether it was written with unit suffixes so that it renders
/// back the way it was read. Equality and ordering only look at `seconds`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    seconds: u64,
    formatted: bool,
}

impl Time {
    /// Create a time from plain seconds (renders as a bare number)
    pub const fn from_seconds(seconds: u64) -> Self {
        Self {
            seconds,
            formatted: false,
        }
    }

    /// Parse `"3600"`, `"1h"`, `"1w2d3h4m5s"` and friends
    ///
    /// Empty text is zero seconds. Anything else fails with a parse error.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();

        if text.is_empty() {
            return Ok(Self::default());
        }

        if NUMBER_PATTERN.is_match(text) {
            let seconds = text
                .parse::<u64>()
                .map_err(|e| Error::parse(format!("Invalid time value {text}: {e}")))?;
            return Ok(Self::from_seconds(seconds));
        }

        let caps = UNIT_PATTERN
            .captures(text)
            .ok_or_else(|| Error::parse(format!("Invalid time value: {text}")))?;

        let mut seconds: u64 = 0;
        for (group, unit) in [
            ("weeks", WEEK),
            ("days", DAY),
            ("hours", HOUR),
            ("minutes", MINUTE),
            ("seconds", 1),
        ] {
            if let Some(m) = caps.name(group) {
                let count = m
                    .as_str()
                    .parse::<u64>()
                    .map_err(|e| Error::parse(format!("Invalid time value {text}: {e}")))?;
                seconds = count
                    .checked_mul(unit)
                    .and_then(|part| seconds.checked_add(part))
                    .ok_or_else(|| Error::parse(format!("Time value out of range: {text}")))?;
            }
        }

        Ok(Self {
            seconds,
            formatted: true,
        })
    }

    /// Total seconds
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Whether the value was written with unit suffixes
    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    /// Render the value the way it was written
    ///
    /// Bare numbers stay bare. Suffixed values are rebuilt greedily from
    /// weeks down to seconds, skipping zero parts.
    pub fn format(&self) -> String {
        if !self.formatted {
            return self.seconds.to_string();
        }

        let mut remaining = self.seconds;
        let mut out = String::new();
        for (suffix, unit) in [('w', WEEK), ('d', DAY), ('h', HOUR), ('m', MINUTE), ('s', 1)] {
            let count = remaining / unit;
            if count > 0 {
                remaining %= unit;
                out.push_str(&count.to_string());
                out.push(suffix);
            }
        }

        if out.is_empty() {
            out.push_str("0s");
        }

        out
    }
}

impl From<u64> for Time {
    fn from(seconds: u64) -> Self {
        Self::from_seconds(seconds)
    }
}

impl FromStr for Time {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.seconds == other.seconds
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seconds.cmp(&other.seconds)
    }
}

impl PartialEq<u64> for Time {
    fn eq(&self, other: &u64) -> bool {
        self.seconds == *other
    }
}

impl PartialOrd<u64> for Time {
    fn partial_cmp(&self, other: &u64) -> Option<Ordering> {
        Some(self.seconds.cmp(other))
    }
}

impl Serialize for Time {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Seconds(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Seconds(seconds) => Ok(Self::from_seconds(seconds)),
            Repr::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}

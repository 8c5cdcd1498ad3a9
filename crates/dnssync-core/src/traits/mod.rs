//! Core traits for dnssync
//!
//! This module defines the abstract interfaces that all providers must follow.
//!
//! - [`DnsProvider`]: List zones, read them, and write records
//! - [`DnsProviderFactory`]: Build providers from configuration

pub mod dns_provider;

pub use dns_provider::{DEFAULT_TTL_SECONDS, DnsProvider, DnsProviderFactory, find_record_ttl};

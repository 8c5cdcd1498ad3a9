//! Configuration types for dnssync
//!
//! This module defines all configuration structures used throughout the
//! workspace. Provider credentials are read from the environment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variables read by [`ProviderConfig::from_env`]
pub mod env {
    pub const CF_API_TOKEN: &str = "CF_API_TOKEN";
    pub const CF_API_URL: &str = "CF_API_URL";
    pub const DO_API_TOKEN: &str = "DO_API_TOKEN";
    pub const DO_API_URL: &str = "DO_API_URL";
    pub const LINODE_API_TOKEN: &str = "LINODE_API_TOKEN";
    pub const LINODE_API_URL: &str = "LINODE_API_URL";
    pub const NAMECOM_API_USERNAME: &str = "NAMECOM_API_USERNAME";
    pub const NAMECOM_API_PASSWORD: &str = "NAMECOM_API_PASSWORD";
    pub const NAMECOM_API_URL: &str = "NAMECOM_API_URL";
    pub const GD_API_KEY: &str = "GD_API_KEY";
    pub const GD_API_SECRET: &str = "GD_API_SECRET";
    pub const GD_SHOPPER_ID: &str = "GD_SHOPPER_ID";
    pub const GD_API_URL: &str = "GD_API_URL";
    pub const ZONEFILE_PATH: &str = "ZONEFILE_PATH";
}

/// DNS provider configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// API base URL override
        api_url: Option<String>,
    },

    /// DigitalOcean provider
    #[serde(rename = "digitalocean")]
    DigitalOcean {
        api_token: String,
        api_url: Option<String>,
    },

    /// Linode provider
    Linode {
        api_token: String,
        api_url: Option<String>,
    },

    /// Name.com provider (HTTP basic auth)
    #[serde(rename = "namecom")]
    NameCom {
        username: String,
        password: String,
        api_url: Option<String>,
    },

    /// GoDaddy provider
    #[serde(rename = "godaddy")]
    GoDaddy {
        api_key: String,
        api_secret: String,
        /// Reseller shopper id, sent as `X-Shopper-Id`
        shopper_id: Option<String>,
        api_url: Option<String>,
    },

    /// Directory of `<zone>.db` files
    #[serde(rename = "zonefile")]
    ZoneFile {
        path: String,
    },
}

impl ProviderConfig {
    /// Load the configuration of provider `id` from the environment
    pub fn from_env(id: &str) -> Result<Self, crate::Error> {
        Self::from_lookup(id, |name| std::env::var(name).ok())
    }

    /// Load the configuration of provider `id` through `lookup`
    ///
    /// Empty values count as unset. The result is validated.
    pub fn from_lookup<F>(id: &str, lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| {
                crate::Error::config(format!("{name} environment variable must be set"))
            })
        };

        let config = match id {
            "cloudflare" => ProviderConfig::Cloudflare {
                api_token: require(env::CF_API_TOKEN)?,
                api_url: get(env::CF_API_URL),
            },
            "digitalocean" => ProviderConfig::DigitalOcean {
                api_token: require(env::DO_API_TOKEN)?,
                api_url: get(env::DO_API_URL),
            },
            "linode" => ProviderConfig::Linode {
                api_token: require(env::LINODE_API_TOKEN)?,
                api_url: get(env::LINODE_API_URL),
            },
            "namecom" => ProviderConfig::NameCom {
                username: require(env::NAMECOM_API_USERNAME)?,
                password: require(env::NAMECOM_API_PASSWORD)?,
                api_url: get(env::NAMECOM_API_URL),
            },
            "godaddy" => ProviderConfig::GoDaddy {
                api_key: require(env::GD_API_KEY)?,
                api_secret: require(env::GD_API_SECRET)?,
                shopper_id: get(env::GD_SHOPPER_ID),
                api_url: get(env::GD_API_URL),
            },
            "zonefile" => ProviderConfig::ZoneFile {
                path: get(env::ZONEFILE_PATH).unwrap_or_else(|| ".".to_string()),
            },
            other => {
                return Err(crate::Error::config(format!("Unknown provider: {other}")));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. }
            | ProviderConfig::DigitalOcean { api_token, .. }
            | ProviderConfig::Linode { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config(format!(
                        "{} API token cannot be empty",
                        self.type_name()
                    )));
                }
                Ok(())
            }
            ProviderConfig::NameCom {
                username, password, ..
            } => {
                if username.is_empty() || password.is_empty() {
                    return Err(crate::Error::config(
                        "Name.com username and password cannot be empty",
                    ));
                }
                Ok(())
            }
            ProviderConfig::GoDaddy {
                api_key,
                api_secret,
                ..
            } => {
                if api_key.is_empty() || api_secret.is_empty() {
                    return Err(crate::Error::config(
                        "GoDaddy API key and secret cannot be empty",
                    ));
                }
                Ok(())
            }
            ProviderConfig::ZoneFile { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Zone file path cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::DigitalOcean { .. } => "digitalocean",
            ProviderConfig::Linode { .. } => "linode",
            ProviderConfig::NameCom { .. } => "namecom",
            ProviderConfig::GoDaddy { .. } => "godaddy",
            ProviderConfig::ZoneFile { .. } => "zonefile",
        }
    }
}

// Credentials stay out of logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::ZoneFile { path } => {
                f.debug_struct("ZoneFile").field("path", path).finish()
            }
            other => f
                .debug_struct("ProviderConfig")
                .field("type", &other.type_name())
                .field("credentials", &"<redacted>")
                .finish(),
        }
    }
}

/// Sync engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Compute and report actions without applying them
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the event channel
    ///
    /// The engine waits for room when the channel is full.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_cloudflare_from_env() {
        let config = ProviderConfig::from_lookup(
            "cloudflare",
            lookup(&[("CF_API_TOKEN", "secret"), ("CF_API_URL", "http://localhost:8080/")]),
        )
        .unwrap();
        assert_eq!(
            config,
            ProviderConfig::Cloudflare {
                api_token: "secret".into(),
                api_url: Some("http://localhost:8080/".into()),
            }
        );
    }

    #[test]
    fn test_missing_credentials() {
        let err = ProviderConfig::from_lookup("godaddy", lookup(&[("GD_API_KEY", "k")])).unwrap_err();
        assert!(err.to_string().contains("GD_API_SECRET"));

        let err = ProviderConfig::from_lookup("linode", lookup(&[("LINODE_API_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_zonefile_defaults_to_current_dir() {
        let config = ProviderConfig::from_lookup("zonefile", lookup(&[])).unwrap();
        assert_eq!(config, ProviderConfig::ZoneFile { path: ".".into() });
    }

    #[test]
    fn test_unknown_provider() {
        assert!(ProviderConfig::from_lookup("route53", lookup(&[])).is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = ProviderConfig::NameCom {
            username: "user".into(),
            password: "hunter2".into(),
            api_url: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("namecom"));
    }

    #[test]
    fn test_serde_tag() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"type":"digitalocean","api_token":"t","api_url":null}"#).unwrap();
        assert_eq!(config.type_name(), "digitalocean");
    }

    #[test]
    fn test_sync_config_defaults() {
        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert!(!config.dry_run);
        assert_eq!(config.event_channel_capacity, 1000);
        assert!(config.validate().is_ok());
    }
}

//! Deployment-wide settings read once at bootstrap.

use std::time::Duration;

use thiserror::Error;

pub const SECRET_ID_VAR: &str = "SECRET_ID";
pub const SECRET_VERSION_STAGE_VAR: &str = "SECRET_VERSION_STAGE";
pub const SECRET_CACHE_TTL_VAR: &str = "SECRET_CACHE_TTL_SECONDS";
pub const TRUST_SERVER_CERTIFICATE_VAR: &str = "DB_TRUST_SERVER_CERTIFICATE";

pub const DEFAULT_SECRET_VERSION_STAGE: &str = "AWSCURRENT";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Used when an event carries no `SecretId` property.
    pub default_secret_id: Option<String>,
    pub secret_version_stage: String,
    /// Enables the caching secret store when set.
    pub secret_cache_ttl: Option<Duration>,
    pub trust_server_certificate: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            default_secret_id: None,
            secret_version_stage: DEFAULT_SECRET_VERSION_STAGE.to_string(),
            secret_cache_ttl: None,
            trust_server_certificate: false,
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let secret_cache_ttl = match non_empty(SECRET_CACHE_TTL_VAR) {
            None => None,
            Some(raw) => {
                let seconds = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    key: SECRET_CACHE_TTL_VAR,
                    expected: "a whole number of seconds",
                    value: raw.clone(),
                })?;
                (seconds > 0).then(|| Duration::from_secs(seconds))
            }
        };

        let trust_server_certificate = match non_empty(TRUST_SERVER_CERTIFICATE_VAR) {
            None => false,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: TRUST_SERVER_CERTIFICATE_VAR,
                        expected: "true or false",
                        value: raw.clone(),
                    })
                }
            },
        };

        Ok(Self {
            default_secret_id: non_empty(SECRET_ID_VAR),
            secret_version_stage: non_empty(SECRET_VERSION_STAGE_VAR)
                .unwrap_or_else(|| DEFAULT_SECRET_VERSION_STAGE.to_string()),
            secret_cache_ttl,
            trust_server_certificate,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = HandlerConfig::from_lookup(lookup(&[])).expect("config should load");
        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn reads_all_settings() {
        let config = HandlerConfig::from_lookup(lookup(&[
            (SECRET_ID_VAR, "prod/sql"),
            (SECRET_VERSION_STAGE_VAR, "AWSPENDING"),
            (SECRET_CACHE_TTL_VAR, "300"),
            (TRUST_SERVER_CERTIFICATE_VAR, "TRUE"),
        ]))
        .expect("config should load");

        assert_eq!(config.default_secret_id.as_deref(), Some("prod/sql"));
        assert_eq!(config.secret_version_stage, "AWSPENDING");
        assert_eq!(config.secret_cache_ttl, Some(Duration::from_secs(300)));
        assert!(config.trust_server_certificate);
    }

    #[test]
    fn blank_secret_id_is_unset_and_zero_ttl_disables_cache() {
        let config = HandlerConfig::from_lookup(lookup(&[
            (SECRET_ID_VAR, "  "),
            (SECRET_CACHE_TTL_VAR, "0"),
        ]))
        .expect("config should load");

        assert!(config.default_secret_id.is_none());
        assert!(config.secret_cache_ttl.is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        let error = HandlerConfig::from_lookup(lookup(&[(SECRET_CACHE_TTL_VAR, "five")]))
            .expect_err("ttl should fail");
        assert!(error.to_string().contains(SECRET_CACHE_TTL_VAR));

        let error = HandlerConfig::from_lookup(lookup(&[(TRUST_SERVER_CERTIFICATE_VAR, "maybe")]))
            .expect_err("flag should fail");
        assert_eq!(
            error,
            ConfigError::Invalid {
                key: TRUST_SERVER_CERTIFICATE_VAR,
                expected: "true or false",
                value: "maybe".to_string(),
            }
        );
    }
}

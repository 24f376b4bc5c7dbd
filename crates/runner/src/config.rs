//! Target configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "targets": [
//!     { "name": "Tradier", "rate_limit": { "requests": 2, "interval_ms": 1000 },
//!       "credential_env": ["TRADIER_ACCESS_TOKEN"] }
//!   ],
//!   "engine": { "batch_timeout_ms": 30000 }
//! }
//! ```
//!
//! Without a file the built-in brokerage table is used. A target has
//! credentials when every variable in `credential_env` is set and non-empty.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use shotgun_core::{RateLimit, Target};
use shotgun_dispatch::EngineConfig;
use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigError;

/// Root configuration for the runner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotgunConfig {
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    #[serde(default)]
    pub engine: EngineConfig,
}

/// One configured target (DTO for JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub rate_limit: RateLimit,

    /// Environment variables that must all be set for the target to log in
    #[serde(default)]
    pub credential_env: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl TargetConfig {
    pub fn new(name: &str, requests_per_second: u32, credential_env: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            rate_limit: RateLimit::per_second(requests_per_second),
            credential_env: credential_env.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Credentials are present when every listed variable is non-empty
    pub fn credentials_present(&self, lookup: &impl Fn(&str) -> Option<String>) -> bool {
        self.credential_env
            .iter()
            .all(|var| lookup(var).is_some_and(|value| !value.trim().is_empty()))
    }
}

impl ShotgunConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in brokerage table with each broker's published call rate
    pub fn builtin() -> Self {
        let targets = vec![
            TargetConfig::new("Robinhood", 5, &["ROBINHOOD_USER", "ROBINHOOD_PASS"]),
            TargetConfig::new("Tradier", 2, &["TRADIER_ACCESS_TOKEN"]),
            TargetConfig::new("TastyTrade", 10, &["TASTY_CLIENT_SECRET", "TASTY_REFRESH_TOKEN"]),
            TargetConfig::new("Public", 20, &["PUBLIC_API_SECRET"]),
            TargetConfig::new("Firstrade", 5, &["FIRSTRADE_USER", "FIRSTRADE_PASS"]),
            TargetConfig::new("Fennel", 10, &["FENNEL_ACCESS_TOKEN"]),
            TargetConfig::new("Schwab", 5, &["SCHWAB_API_KEY", "SCHWAB_API_SECRET"]),
            TargetConfig::new("BBAE", 5, &["BBAE_USER", "BBAE_PASS"]),
            TargetConfig::new("DSPAC", 5, &["DSPAC_USER", "DSPAC_PASS"]),
            TargetConfig::new("SoFi", 5, &["SOFI_USER", "SOFI_PASS"]),
            TargetConfig::new("Webull", 5, &["WEBULL_USER", "WEBULL_PASS"]),
            TargetConfig::new("WellsFargo", 5, &["WELLSFARGO_USER", "WELLSFARGO_PASS"]),
        ];

        Self {
            targets,
            engine: EngineConfig::default(),
        }
    }

    /// Load `path` if given, otherwise the built-in table
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Self::from_file(path)
            }
            None => {
                info!("Using built-in brokerage table");
                Ok(Self::builtin())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                return Err(ConfigError::InvalidTarget("target name is empty".into()));
            }
            if !target.rate_limit.is_valid() {
                return Err(ConfigError::InvalidTarget(format!(
                    "{}: rate limit {} must be positive",
                    target.name, target.rate_limit
                )));
            }
            if !seen.insert(target.name.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateTarget(target.name.clone()));
            }
        }
        Ok(())
    }

    /// Resolve targets against the process environment
    pub fn resolve_targets(&self) -> Result<Vec<Target>, ConfigError> {
        self.resolve_targets_with(|var| std::env::var(var).ok())
    }

    /// Resolve targets, reading credential variables through `lookup`
    pub fn resolve_targets_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<Target>, ConfigError> {
        self.targets
            .iter()
            .map(|config| {
                let credentials = config.credentials_present(&lookup);
                debug!(
                    "{}: enabled={} credentials={} limit={}",
                    config.name, config.enabled, credentials, config.rate_limit
                );
                let target = Target::new(config.name.clone(), config.rate_limit, credentials)
                    .map_err(|e| ConfigError::InvalidTarget(e.to_string()))?;
                Ok(if config.enabled {
                    target
                } else {
                    target.disabled()
                })
            })
            .collect()
    }
}

/// Narrow `targets` to the names picked on the command line.
///
/// An empty selection keeps every target as configured. Named targets are
/// attempted even if disabled in configuration; the rest are disabled.
/// Returns the first name that matches nothing.
pub fn select_targets(targets: Vec<Target>, names: &[String]) -> Result<Vec<Target>, String> {
    if names.is_empty() {
        return Ok(targets);
    }

    if let Some(unknown) = names
        .iter()
        .find(|name| !targets.iter().any(|t| t.name.eq_ignore_ascii_case(name)))
    {
        return Err(unknown.clone());
    }

    Ok(targets
        .into_iter()
        .map(|mut target| {
            target.enabled = names.iter().any(|n| target.name.eq_ignore_ascii_case(n));
            target
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_builtin_table() {
        let config = ShotgunConfig::builtin();
        assert_eq!(config.targets.len(), 12);
        assert!(config.validate().is_ok());

        let rate = |name: &str| {
            config
                .targets
                .iter()
                .find(|t| t.name == name)
                .map(|t| t.rate_limit)
                .unwrap()
        };
        assert_eq!(rate("Tradier"), RateLimit::per_second(2));
        assert_eq!(rate("Public"), RateLimit::per_second(20));
        assert_eq!(rate("TastyTrade"), RateLimit::per_second(10));
    }

    #[test]
    fn test_from_json_with_defaults() {
        let config = ShotgunConfig::from_json(
            r#"{
                "targets": [
                    { "name": "Tradier", "rate_limit": { "requests": 2, "interval_ms": 1000 },
                      "credential_env": ["TRADIER_ACCESS_TOKEN"] },
                    { "name": "Paper", "enabled": false }
                ],
                "engine": { "batch_timeout_ms": 5000 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.targets.len(), 2);
        assert!(!config.targets[1].enabled);
        assert_eq!(config.targets[1].rate_limit, RateLimit::default());
        assert_eq!(config.engine.batch_timeout_ms, 5000);
        assert_eq!(config.engine.retry.max_attempts, 3);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            ShotgunConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ShotgunConfig::from_json(
                r#"{"targets": [{"name": "A", "rate_limit": {"requests": 0, "interval_ms": 1000}}]}"#
            ),
            Err(ConfigError::InvalidTarget(_))
        ));
        assert_eq!(
            ShotgunConfig::from_json(r#"{"targets": [{"name": "A"}, {"name": "a"}]}"#),
            Err(ConfigError::DuplicateTarget("a".into()))
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ShotgunConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_credentials_require_every_variable() {
        let config = ShotgunConfig::builtin();
        let targets = config
            .resolve_targets_with(env(&[
                ("TRADIER_ACCESS_TOKEN", "abc"),
                ("ROBINHOOD_USER", "me"),
                ("ROBINHOOD_PASS", "  "),
            ]))
            .unwrap();

        let has_creds = |name: &str| targets.iter().find(|t| t.name == name).unwrap().credentials_present;
        assert!(has_creds("Tradier"));
        assert!(!has_creds("Robinhood"));
        assert!(!has_creds("Schwab"));
        assert!(targets.iter().all(|t| t.enabled));
    }

    #[test]
    fn test_target_without_credential_env_is_ready() {
        let config = ShotgunConfig::from_json(r#"{"targets": [{"name": "Paper"}]}"#).unwrap();
        let targets = config.resolve_targets_with(env(&[])).unwrap();
        assert!(targets[0].credentials_present);
    }

    #[test]
    fn test_select_targets() {
        let targets = ShotgunConfig::builtin()
            .resolve_targets_with(env(&[]))
            .unwrap();

        let selected = select_targets(targets.clone(), &["tradier".into(), "Public".into()]).unwrap();
        let enabled: Vec<&str> = selected
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(enabled, vec!["Tradier", "Public"]);

        assert_eq!(
            select_targets(targets.clone(), &["Chase".into()]),
            Err("Chase".to_string())
        );
        assert_eq!(select_targets(targets.clone(), &[]).unwrap(), targets);
    }
}

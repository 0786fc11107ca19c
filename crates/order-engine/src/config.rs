//! # Engine Configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file) is a
//! working configuration. Durations are human-readable:
//!
//! ```toml
//! [store]
//! name = "Harbor Grill"
//!
//! [staleness]
//! late_threshold = "15m"
//! tick_interval = "1m"
//!
//! [ticket]
//! tax_rate = 0.08
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub store: StoreSection,
    pub staleness: StalenessSection,
    pub dispatch: DispatchSection,
    pub projection: ProjectionSection,
    pub lifecycle: LifecycleSection,
    pub ticket: TicketSection,
    pub feed: FeedSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Printed at the top of every kitchen ticket.
    pub name: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            name: "Kitchen".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalenessSection {
    #[serde(with = "humantime_serde")]
    pub late_threshold: Duration,
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
}

impl Default for StalenessSection {
    fn default() -> Self {
        Self {
            late_threshold: Duration::from_secs(15 * 60),
            tick_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSection {
    #[serde(with = "humantime_serde")]
    pub seen_ttl: Duration,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            seen_ttl: Duration::from_secs(12 * 3600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSection {
    #[serde(with = "humantime_serde")]
    pub closed_retention: Duration,
}

impl Default for ProjectionSection {
    fn default() -> Self {
        Self {
            closed_retention: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleSection {
    #[serde(with = "humantime_serde")]
    pub transition_timeout: Duration,
}

impl Default for LifecycleSection {
    fn default() -> Self {
        Self {
            transition_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketSection {
    /// Tax included in order totals, e.g. `0.08`. Zero prints no tax line split.
    pub tax_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    #[serde(with = "humantime_serde")]
    pub reconnect_delay: Duration,
    pub channel_capacity: usize,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(2),
            channel_capacity: 256,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("staleness.late_threshold", self.staleness.late_threshold),
            ("staleness.tick_interval", self.staleness.tick_interval),
            ("dispatch.seen_ttl", self.dispatch.seen_ttl),
            ("lifecycle.transition_timeout", self.lifecycle.transition_timeout),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
            }
        }

        let rate = self.ticket.tax_rate;
        if !(0.0..1.0).contains(&rate) {
            return Err(ConfigError::Invalid(format!(
                "ticket.tax_rate must be in [0, 1), got {rate}"
            )));
        }
        if self.feed.channel_capacity == 0 {
            return Err(ConfigError::Invalid("feed.channel_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.staleness.late_threshold, Duration::from_secs(900));
        assert_eq!(config.lifecycle.transition_timeout, Duration::from_secs(5));
        assert_eq!(config.ticket.tax_rate, 0.0);
    }

    #[test]
    fn test_partial_config_with_humantime_durations() {
        let config = EngineConfig::from_toml_str(
            r#"
            [store]
            name = "Harbor Grill"

            [staleness]
            late_threshold = "10m 30s"

            [ticket]
            tax_rate = 0.08
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Harbor Grill");
        assert_eq!(config.staleness.late_threshold, Duration::from_secs(630));
        assert_eq!(config.staleness.tick_interval, Duration::from_secs(60));
        assert_eq!(config.ticket.tax_rate, 0.08);
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero = EngineConfig::from_toml_str("[lifecycle]\ntransition_timeout = \"0s\"");
        assert!(matches!(zero, Err(ConfigError::Invalid(_))));

        let rate = EngineConfig::from_toml_str("[ticket]\ntax_rate = 1.5");
        assert!(matches!(rate, Err(ConfigError::Invalid(_))));

        let unknown = EngineConfig::from_toml_str("[printer]\nhost = \"x\"");
        assert!(matches!(unknown, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

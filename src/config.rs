//! Index configuration.
//!
//! Serializable settings for the pixelization resolution and the point
//! store, loadable from JSON while keeping complexity minimal.

use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Default subdivision depth, matching the Q3C PostgreSQL plugin
/// (nside = 2^30).
pub const DEFAULT_BIN_LEVEL: u32 = 30;

/// Rows inserted between forced commits during bulk loads.
pub const DEFAULT_COMMIT_INTERVAL: usize = 50_000;

/// Configuration for a [`SkyIndex`](crate::SkyIndex).
///
/// # Example
///
/// ```rust
/// use cubesky::Config;
///
/// let config = Config::default().with_bin_level(12);
///
/// let json = r#"{ "bin_level": 8, "commit_interval": 10000 }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.bin_level, 8);
/// assert_eq!(config.ra_key, "ra");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of times each cube face is subdivided by four; must be in
    /// [0,30].
    #[serde(default = "Config::default_bin_level")]
    pub bin_level: u32,

    /// Rows inserted between commits during bulk loads. Bounds transaction
    /// growth; does not change the final visible content.
    #[serde(default = "Config::default_commit_interval")]
    pub commit_interval: usize,

    /// Name of the right-ascension column in columnar sources.
    #[serde(default = "Config::default_ra_key")]
    pub ra_key: String,

    /// Name of the declination column in columnar sources.
    #[serde(default = "Config::default_dec_key")]
    pub dec_key: String,
}

impl Config {
    const fn default_bin_level() -> u32 {
        DEFAULT_BIN_LEVEL
    }

    const fn default_commit_interval() -> usize {
        DEFAULT_COMMIT_INTERVAL
    }

    fn default_ra_key() -> String {
        "ra".to_string()
    }

    fn default_dec_key() -> String {
        "dec".to_string()
    }

    pub fn with_bin_level(mut self, bin_level: u32) -> Self {
        self.bin_level = bin_level;
        self
    }

    pub fn with_commit_interval(mut self, interval: usize) -> Self {
        assert!(interval > 0, "Commit interval must be greater than zero");
        self.commit_interval = interval;
        self
    }

    /// Override the column names looked up in columnar sources.
    pub fn with_columns(mut self, ra_key: impl Into<String>, dec_key: impl Into<String>) -> Self {
        self.ra_key = ra_key.into();
        self.dec_key = dec_key.into();
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.bin_level > 30 {
            return Err(format!(
                "bin_level must be an integer on [0,30]; was given '{}'",
                self.bin_level
            ));
        }

        if self.commit_interval == 0 {
            return Err("commit_interval must be greater than zero".to_string());
        }

        if self.ra_key.is_empty() || self.dec_key.is_empty() {
            return Err("column names must be non-empty".to_string());
        }

        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bin_level: Self::default_bin_level(),
            commit_interval: Self::default_commit_interval(),
            ra_key: Self::default_ra_key(),
            dec_key: Self::default_dec_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.bin_level, 30);
        assert_eq!(config.commit_interval, 50_000);
        assert_eq!(config.ra_key, "ra");
        assert_eq!(config.dec_key, "dec");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.bin_level = 31;
        assert!(config.validate().is_err());

        config.bin_level = 0;
        assert!(config.validate().is_ok());

        config.commit_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default()
            .with_bin_level(12)
            .with_commit_interval(1000)
            .with_columns("alpha", "delta");

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_config_from_json_rejects_invalid() {
        let json = r#"{ "bin_level": 31 }"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    #[should_panic(expected = "Commit interval must be greater than zero")]
    fn test_config_zero_interval_panics() {
        Config::default().with_commit_interval(0);
    }
}

//! # Configuration System
//!
//! YAML configuration for the FEC chain and its BER sweep:
//!
//! - Code parameters (K, generators, traceback length, metric ceiling)
//! - Sweep settings (flip probabilities, trials, payload length, seed, CSV path)
//! - Logging
//! - Named code profiles
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `TLM_CONFIG` environment variable
//! 2. `./tlm.yaml` (current directory)
//! 3. `~/.config/tlm/config.yaml` (user config)
//! 4. `/etc/tlm/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! code:
//!   constraint_length: 3
//!   generators: [7, 5]
//!   tb_len: 12
//!
//! sweep:
//!   p_flips: [0.0, 0.02, 0.05, 0.10]
//!   trials: 20
//!   payload_len: 200
//!   seed: 42
//!
//! logging:
//!   level: info
//!   format: compact
//! ```
//!
//! Generators are YAML integers; spell them `0o171` to keep the usual octal
//! notation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::observe::LogConfig;
use crate::params::{CodeParams, MAX_TOTAL_BITS};
use crate::types::FecError;

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),
    #[error("failed to read config: {0}")]
    Read(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Validation(String),
    #[error("invalid code parameters: {0}")]
    Code(#[from] FecError),
}

/// BER sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    /// Per-coded-bit flip probabilities, one sweep point each
    pub p_flips: Vec<f64>,
    /// Random payloads per point
    pub trials: usize,
    /// Payload bits per trial (the tracker's target)
    pub payload_len: u64,
    /// Base seed; per-trial seeds are derived from it
    pub seed: u64,
    /// CSV results log
    pub csv_path: PathBuf,
    /// Pick the pin mapping with a noiseless trial before sweeping
    pub calibrate: bool,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            p_flips: vec![0.0, 0.02, 0.05, 0.10],
            trials: 20,
            payload_len: 200,
            seed: 42,
            csv_path: PathBuf::from("docs/data/ber_hw_bitflip.csv"),
            calibrate: true,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlmConfig {
    /// Configuration version
    pub version: String,
    pub code: CodeParams,
    pub sweep: SweepSettings,
    pub logging: LogConfig,
    /// Named code parameter sets (name -> params)
    pub profiles: HashMap<String, CodeParams>,
}

impl Default for TlmConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            code: CodeParams::default(),
            sweep: SweepSettings::default(),
            logging: LogConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

impl TlmConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("TLM_CONFIG") {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
            tracing::warn!(path = %path, "TLM_CONFIG points at a missing file; searching defaults");
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), code = %config.code, "loaded config");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))
    }

    /// Replace the code parameters with a named profile.
    pub fn with_profile(&self, name: &str) -> Result<Self, ConfigError> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(format!("profile '{}' not found", name)))?;

        let mut config = self.clone();
        config.code = profile.clone();
        Ok(config)
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./tlm.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "tlm") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/tlm/config.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.code.validate()?;

        if let Some(p) = self.sweep.p_flips.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(FecError::InvalidProbability(*p).into());
        }
        if self.sweep.trials == 0 {
            return Err(ConfigError::Validation("trials must be > 0".to_string()));
        }
        if self.sweep.payload_len == 0 || self.sweep.payload_len > MAX_TOTAL_BITS {
            return Err(FecError::InvalidPayloadLength(self.sweep.payload_len).into());
        }
        for (name, profile) in &self.profiles {
            profile
                .validate()
                .map_err(|e| ConfigError::Validation(format!("profile '{}': {}", name, e)))?;
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            profiles: {
                let mut profiles = HashMap::new();
                profiles.insert("gsm_k5".to_string(), CodeParams::gsm_k5_rate_half());
                profiles.insert("nasa_k7".to_string(), CodeParams::nasa_k7_rate_half());
                profiles
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::LogLevel;

    #[test]
    fn test_default_config() {
        let config = TlmConfig::default();
        assert_eq!(config.code, CodeParams::default());
        assert_eq!(config.sweep.trials, 20);
        assert_eq!(config.sweep.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
code:
  constraint_length: 3
  generators: [7, 5]
  tb_len: 15
  metric_ceiling: 63

sweep:
  p_flips: [0.0, 0.01]
  trials: 4
  payload_len: 64
  seed: 7

logging:
  level: debug
"#;

        let config = TlmConfig::parse(yaml).unwrap();
        assert_eq!(config.code.tb_len, 15);
        assert_eq!(config.code.metric_ceiling, 63);
        assert_eq!(config.sweep.p_flips, vec![0.0, 0.01]);
        assert_eq!(config.sweep.trials, 4);
        assert_eq!(config.sweep.payload_len, 64);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
code:
  tb_len: 20
"#;

        let config = TlmConfig::parse(yaml).unwrap();
        assert_eq!(config.code.tb_len, 20);
        // Defaults should be applied
        assert_eq!(config.code.generators, [0o7, 0o5]);
        assert_eq!(config.sweep.payload_len, 200);
    }

    #[test]
    fn test_parse_error() {
        let err = TlmConfig::parse("code: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_profiles() {
        let yaml = r#"
profiles:
  deep:
    tb_len: 40
"#;

        let config = TlmConfig::parse(yaml).unwrap();
        let deep = config.with_profile("deep").unwrap();
        assert_eq!(deep.code.tb_len, 40);
        assert!(matches!(
            config.with_profile("missing"),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = TlmConfig::default();
        config.code.tb_len = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Code(FecError::InvalidTracebackLength(0)))
        );

        let mut config = TlmConfig::default();
        config.sweep.p_flips.push(1.5);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Code(FecError::InvalidProbability(1.5)))
        );

        let mut config = TlmConfig::default();
        config.sweep.trials = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = TlmConfig::default();
        config.profiles.insert(
            "bad".into(),
            CodeParams {
                metric_ceiling: 0,
                ..CodeParams::default()
            },
        );
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_example_yaml() {
        let yaml = TlmConfig::example_yaml();
        assert!(yaml.contains("code:"));
        assert!(yaml.contains("sweep:"));
        let parsed = TlmConfig::parse(&yaml).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.profiles.len(), 2);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("tlm-config-{}.yaml", std::process::id()));
        let mut config = TlmConfig::default();
        config.code.tb_len = 18;
        config.save(&path).unwrap();

        let loaded = TlmConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = TlmConfig::load_from(Path::new("/nonexistent/tlm.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_config_search_paths() {
        let paths = TlmConfig::config_search_paths();
        assert!(paths[0].ends_with("tlm.yaml"));
        assert!(paths.last().unwrap().starts_with("/etc/tlm"));
    }
}

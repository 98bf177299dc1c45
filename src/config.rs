// Pipeline configuration
//
// Every knob of the compare/segment pipeline lives here so a project can pin
// its values in a TOML file. Command line flags override file values.

use crate::log_graph::{AnalyzerConfig, CLASSPATH_ENV};
use crate::mining::MinSupport;
use crate::windowing::window_duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Knobs for windowing, mining and comparison
///
/// # Example
/// ```
/// use loggraph::config::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.window_ms, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Look-back window per event, in milliseconds
    pub window_ms: u64,
    /// Shorter windows are dropped
    pub min_sequence_length: usize,
    /// Longer windows are truncated to their first events
    pub max_sequence_length: usize,
    /// Cap on windows taken from each log file
    pub max_dataset_size: Option<usize>,
    pub min_support: MinSupport,
    /// Source paths need a pattern path scoring strictly above this
    pub similarity_threshold: f64,
    /// Beam search budget
    pub max_divergence: usize,
    pub analyzer: AnalyzerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_ms: 5,
            min_sequence_length: 2,
            max_sequence_length: 16,
            max_dataset_size: None,
            min_support: MinSupport::default(),
            similarity_threshold: 0.8,
            max_divergence: 2,
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file; missing keys keep their defaults
    ///
    /// A set `LOGGRAPH_CLASSPATH` wins over the file's analyzer classpath.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Ok(classpath) = std::env::var(CLASSPATH_ENV) {
            config.analyzer.classpath = classpath;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_ms == 0 {
            return Err(ConfigError::Invalid(
                "window_ms must be positive".to_string(),
            ));
        }

        if window_duration(self.window_ms).is_none() {
            return Err(ConfigError::Invalid(format!(
                "window_ms is out of range: {}",
                self.window_ms
            )));
        }

        if self.min_sequence_length == 0 {
            return Err(ConfigError::Invalid(
                "min_sequence_length must be >= 1".to_string(),
            ));
        }

        if self.min_sequence_length > self.max_sequence_length {
            return Err(ConfigError::Invalid(format!(
                "min_sequence_length ({}) exceeds max_sequence_length ({})",
                self.min_sequence_length, self.max_sequence_length
            )));
        }

        if let MinSupport::Ratio(ratio) = self.min_support {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::Invalid(format!(
                    "min_support ratio must be in [0, 1], got {}",
                    ratio
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be in [0, 1], got {}",
                self.similarity_threshold
            )));
        }

        Ok(())
    }
}

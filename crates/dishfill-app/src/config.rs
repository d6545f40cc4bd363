//! Configuration management for dishfill
//!
//! Config stored at: ~/.config/dishfill/config.json

use dishfill_advisory::ai::backend_impl::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use dishfill_advisory::ai::prompts::{FILL_MAX_TOKENS, SUGGESTION_MAX_TOKENS};
use dishfill_domain::model::capacity::{DEFAULT_CAPACITY, DEFAULT_WEIGHTS};
use dishfill_domain::model::classification::{
    DEFAULT_LARGE_LABELS, DEFAULT_MEDIUM_LABELS, DEFAULT_SMALL_LABELS,
};
use dishfill_domain::{CapacityTable, ClassificationTable, CompartmentWeights, EstimationTables};
use dishfill_types::{ConfigError, EstimationMode, OutputFormat, PerCompartment, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Language model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorySettings {
    /// Chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Deadline for one model call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_suggestion_max_tokens")]
    pub suggestion_max_tokens: u32,

    #[serde(default = "default_fill_max_tokens")]
    pub fill_max_tokens: u32,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    12
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_suggestion_max_tokens() -> u32 {
    SUGGESTION_MAX_TOKENS
}

fn default_fill_max_tokens() -> u32 {
    FILL_MAX_TOKENS
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            suggestion_max_tokens: default_suggestion_max_tokens(),
            fill_max_tokens: default_fill_max_tokens(),
        }
    }
}

impl AdvisorySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> std::result::Result<String, ConfigError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey(self.api_key_env.clone())),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Slot count per compartment
    #[serde(default = "default_capacity")]
    pub capacity: PerCompartment<u32>,

    /// Contribution of each compartment to the overall percentage
    #[serde(default = "default_weights")]
    pub weights: PerCompartment<f64>,

    /// Detector labels per compartment
    #[serde(default = "default_labels")]
    pub labels: PerCompartment<Vec<String>>,

    /// Estimation path to start on (deterministic, advisory)
    #[serde(default)]
    pub mode: EstimationMode,

    /// Ask the model for a loading suggestion
    #[serde(default = "default_true")]
    pub suggestion_enabled: bool,

    /// Use the deterministic value when the advisory path fails
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,

    /// Drop detections below this confidence (off when unset)
    #[serde(default)]
    pub min_confidence: Option<f64>,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde(default)]
    pub advisory: AdvisorySettings,
}

fn default_capacity() -> PerCompartment<u32> {
    DEFAULT_CAPACITY
}

fn default_weights() -> PerCompartment<f64> {
    DEFAULT_WEIGHTS
}

fn default_labels() -> PerCompartment<Vec<String>> {
    let owned = |set: &[&str]| set.iter().map(|s| s.to_string()).collect();
    PerCompartment::new(
        owned(DEFAULT_LARGE_LABELS),
        owned(DEFAULT_MEDIUM_LABELS),
        owned(DEFAULT_SMALL_LABELS),
    )
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            weights: default_weights(),
            labels: default_labels(),
            mode: EstimationMode::default(),
            suggestion_enabled: true,
            fallback_enabled: true,
            min_confidence: None,
            output_format: OutputFormat::default(),
            advisory: AdvisorySettings::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("dishfill");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location, or defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate and build the immutable tables. Called once at startup.
    pub fn build_tables(&self) -> std::result::Result<EstimationTables, ConfigError> {
        self.check_settings()?;

        let capacity = CapacityTable::new(self.capacity)?;
        let classification = ClassificationTable::new(&self.labels)?;
        let weights = CompartmentWeights::new(self.weights)?;
        Ok(EstimationTables::new(capacity, classification, weights))
    }

    fn check_settings(&self) -> std::result::Result<(), ConfigError> {
        if let Some(min) = self.min_confidence {
            if !(0.0..=1.0).contains(&min) {
                return Err(ConfigError::InvalidSetting(format!(
                    "min_confidence must be within [0, 1], got {}",
                    min
                )));
            }
        }
        if self.advisory.timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting(
                "advisory.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.advisory.fill_max_tokens == 0 || self.advisory.suggestion_max_tokens == 0 {
            return Err(ConfigError::InvalidSetting(
                "advisory token budgets must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dishfill Configuration")?;
        writeln!(f, "======================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Capacity:       large {} / medium {} / small {}",
            self.capacity.large, self.capacity.medium, self.capacity.small
        )?;
        writeln!(
            f,
            "Weights:        large {} / medium {} / small {}",
            self.weights.large, self.weights.medium, self.weights.small
        )?;
        for (compartment, labels) in self.labels.iter() {
            writeln!(f, "Labels {:<8} {}", format!("{}:", compartment), labels.join(", "))?;
        }
        writeln!(f, "Mode:           {}", self.mode)?;
        writeln!(f, "Suggestions:    {}", self.suggestion_enabled)?;
        writeln!(f, "Fallback:       {}", self.fallback_enabled)?;
        writeln!(
            f,
            "Min confidence: {}",
            self.min_confidence
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "(off)".to_string())
        )?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(f, "Model:          {}", self.advisory.model)?;
        writeln!(f, "Endpoint:       {}", self.advisory.endpoint)?;
        writeln!(f, "API key env:    {}", self.advisory.api_key_env)?;
        writeln!(f, "Timeout:        {}s", self.advisory.timeout_secs)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}

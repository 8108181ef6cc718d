use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub recognizer: RecognizerConfig,

    #[serde(default)]
    pub session: SessionTimingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_device_name")]
    pub input_device: String,

    #[serde(default = "default_device_name")]
    pub output_device: String,

    #[serde(default)]
    pub muted: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: default_device_name(),
            output_device: default_device_name(),
            muted: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecognizerConfig {
    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default)]
    pub whisper: Option<WhisperConfig>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            whisper: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WhisperConfig {
    pub model_path: String,

    #[serde(default = "default_language")]
    pub language: String,
}

/// Timer parameters for the capture session state machine.
#[derive(Debug, Deserialize, Clone)]
pub struct SessionTimingConfig {
    /// Delay before auto-restarting the recognizer after an unexpected end.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// Settle delay between stopping a live recognizer and starting it again.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Base delay for the network-error backoff schedule.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Consecutive network errors tolerated before surfacing a fatal error.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for SessionTimingConfig {
    fn default() -> Self {
        Self {
            restart_delay_ms: default_restart_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            retry_base_ms: default_retry_base_ms(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_buffer_size() -> u32 {
    1024
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_device_name() -> String {
    "default".to_string()
}

fn default_engine() -> String {
    "null".to_string()
}

fn default_restart_delay_ms() -> u64 {
    100
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_retry_base_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    3
}

fn default_language() -> String {
    "en".to_string()
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                errors.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = errors.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env_vars(&content)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (for testing).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }
}

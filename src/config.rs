use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const TRAINING_KEY_VAR: &str = "AZURE_CUSTOM_VISION_TRAINING_KEY";
pub const PREDICTION_KEY_VAR: &str = "AZURE_CUSTOM_VISION_PREDICTION_KEY";
pub const ENDPOINT_VAR: &str = "CUSTOM_VISION_ENDPOINT";

/// Secrets and endpoint, read only from their fixed environment names.
#[derive(Clone)]
pub struct Credentials {
    pub training_key: String,
    pub prediction_key: String,
    pub endpoint: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("training_key", &"<redacted>")
            .field("prediction_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve credentials through `lookup`. Variables are checked in a fixed
    /// order and the first missing (unset or empty) one is reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVariable(name))
        };

        let training_key = require(TRAINING_KEY_VAR)?;
        let prediction_key = require(PREDICTION_KEY_VAR)?;
        let endpoint = require(ENDPOINT_VAR)?.trim().to_string();
        validate_endpoint(&endpoint)?;

        Ok(Credentials {
            training_key,
            prediction_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

fn validate_endpoint(value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        variable: ENDPOINT_VAR,
        value: value.to_string(),
        reason,
    };
    let url = reqwest::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme `{}`", other))),
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            other => Err(format!(
                "{} is not a supported minimum log level. Use `debug`, `info` or `warn`.",
                other
            )),
        }
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

/// Non-secret settings for one run.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    pub project_name: String,
    pub data_root: PathBuf,
    #[serde(default)]
    pub test_image: Option<PathBuf>,
    #[serde(default)]
    pub regions_file: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub upload_concurrency: usize,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
}

pub const DEFAULT_PROJECT_NAME: &str = "Sample Obj Detection Project";
pub const DEFAULT_DATA_ROOT: &str = "Samples/customvision/images";

impl Default for WorkflowConfig {
    fn default() -> Self {
        WorkflowConfig {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            test_image: None,
            regions_file: None,
            poll_interval_ms: 1000,
            max_poll_attempts: 900,
            upload_concurrency: 8,
            log_level: LogLevel::Warn,
        }
    }
}

impl WorkflowConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Directory holding the training images for `tag`.
    pub fn tag_dir(&self, tag: &str) -> PathBuf {
        self.data_root.join(tag)
    }

    pub fn test_image_path(&self) -> PathBuf {
        self.test_image
            .clone()
            .unwrap_or_else(|| self.data_root.join("Test").join("test_od_image.jpg"))
    }
}

/// Default location of the optional settings file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("customvision-cli").join("config.yaml"))
}

/// Layer defaults, an optional YAML file and `CV_*` environment variables.
/// An explicitly given `path` must exist; the default location is optional.
pub fn load_workflow_config(path: Option<&Path>) -> Result<WorkflowConfig, ConfigError> {
    let defaults = WorkflowConfig::default();

    let mut builder = config::Config::builder()
        .set_default("project_name", defaults.project_name)?
        .set_default("data_root", DEFAULT_DATA_ROOT)?
        .set_default("poll_interval_ms", defaults.poll_interval_ms as i64)?
        .set_default("max_poll_attempts", defaults.max_poll_attempts as i64)?
        .set_default("upload_concurrency", defaults.upload_concurrency as i64)?
        .set_default("log_level", defaults.log_level.as_str())?;

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("CV")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<WorkflowConfig>()?)
}

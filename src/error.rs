// Error types shared by the library. Each stage of the run has its own enum
// so callers (and tests) can match on what went wrong; the binary collapses
// everything into `anyhow::Error` at the edge.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while assembling credentials and settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("please set/export the following environment variable: {0}")]
    MissingVariable(&'static str),
    #[error("{variable} is not a valid endpoint URL ({value}): {reason}")]
    InvalidEndpoint {
        variable: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors raised while loading or querying the filename -> box table.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("no region entry for {file} under tag {tag}")]
    MissingRegion { tag: String, file: String },
    #[error("tag {0} is not present in the region table")]
    UnknownTag(String),
    #[error("region for {file} is outside the unit square: {values:?}")]
    OutOfRange { file: String, values: [f64; 4] },
    #[error("failed to parse region table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read region table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors coming back from the remote training/prediction service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} failed: {status} - {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("{operation} returned an unreadable response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{header} contains characters not allowed in an HTTP header")]
    InvalidHeader { header: &'static str },
}

/// One file that could not be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFailure {
    pub file: String,
    pub reason: String,
}

/// Crate-level error for a workflow run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Regions(#[from] RegionError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no domain of type {0} is offered by the service")]
    DomainNotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} of {total} uploads failed: {}", .failed.len(), summarize(.failed))]
    UploadFailed {
        failed: Vec<UploadFailure>,
        total: usize,
    },
    #[error("training still running after {attempts} status checks")]
    TrainingTimeout { attempts: u32 },
    #[error("training of iteration {iteration_id} failed")]
    TrainingFailed { iteration_id: String },
    #[error("training of iteration {iteration_id} ended with unexpected status {status}")]
    UnexpectedStatus {
        iteration_id: String,
        status: String,
    },
}

fn summarize(failed: &[UploadFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("{} ({})", f.file, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;

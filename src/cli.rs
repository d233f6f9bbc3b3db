use std::path::PathBuf;

use clap::Parser;

use crate::config::{LogLevel, WorkflowConfig};

/// Train an object detection model on the Fork/Scissors sample images and
/// run one prediction against it.
///
/// Requires AZURE_CUSTOM_VISION_TRAINING_KEY, AZURE_CUSTOM_VISION_PREDICTION_KEY
/// and CUSTOM_VISION_ENDPOINT in the environment.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML settings file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root holding the Fork/, Scissors/ and Test/ image directories
    #[arg(long)]
    pub data_root: Option<PathBuf>,

    /// Image to predict once training is done
    #[arg(long)]
    pub test_image: Option<PathBuf>,

    /// JSON region table to use instead of the built-in one
    #[arg(long)]
    pub regions: Option<PathBuf>,

    /// Name of the project to create
    #[arg(long)]
    pub project_name: Option<String>,

    /// Delay between training status checks, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Status checks before giving up on training
    #[arg(long)]
    pub max_poll_attempts: Option<u32>,

    /// Uploads in flight at once
    #[arg(long)]
    pub upload_concurrency: Option<usize>,

    /// Do not ask before creating the project
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,

    /// Debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Flags win over the file and environment settings.
    pub fn apply(&self, config: &mut WorkflowConfig) {
        if let Some(root) = &self.data_root {
            config.data_root = root.clone();
        }
        if let Some(image) = &self.test_image {
            config.test_image = Some(image.clone());
        }
        if let Some(regions) = &self.regions {
            config.regions_file = Some(regions.clone());
        }
        if let Some(name) = &self.project_name {
            config.project_name = name.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(attempts) = self.max_poll_attempts {
            config.max_poll_attempts = attempts;
        }
        if let Some(n) = self.upload_concurrency {
            config.upload_concurrency = n;
        }
        if self.verbose {
            config.log_level = LogLevel::Debug;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "customvision-cli",
            "--data-root",
            "/data",
            "--poll-interval-ms",
            "50",
            "--upload-concurrency",
            "2",
            "-v",
        ]);
        let mut config = WorkflowConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.data_root, PathBuf::from("/data"));
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.upload_concurrency, 2);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.project_name, "Sample Obj Detection Project");
    }

    #[test]
    fn no_flags_leave_settings_alone() {
        let mut config = WorkflowConfig::default();
        Cli::default().apply(&mut config);
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(config.regions_file.is_none());
    }
}

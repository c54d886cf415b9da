//! Dashboard Configuration
//! Data source locations and display limits, loaded from JSON.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "marketing_dashboard")]
#[command(version, about = "Marketing Intelligence Dashboard", long_about = None)]
pub struct CliArgs {
    /// JSON config file (default: ./dashboard.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the business and platform CSV files
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
}

/// One marketing platform and the CSV file holding its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSource {
    pub name: String,
    pub file: String,
}

impl PlatformSource {
    pub fn new(name: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 900.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub business_file: String,
    pub platforms: Vec<PlatformSource>,
    /// Campaigns shown in the "top campaigns" chart
    pub top_campaigns: usize,
    /// Tactics shown in the "top tactics by CTR" chart
    pub top_tactics: usize,
    pub window: WindowConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Marketing Intelligence Dashboard"),
            business_file: "business.csv".to_string(),
            platforms: vec![
                PlatformSource::new("Facebook", "Facebook.csv"),
                PlatformSource::new("Google", "Google.csv"),
                PlatformSource::new("TikTok", "TikTok.csv"),
            ],
            top_campaigns: 10,
            top_tactics: 8,
            window: WindowConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the config from parsed command line arguments.
    ///
    /// `--config <file>` selects a config file, otherwise `dashboard.json` in
    /// the working directory is used if it exists. `--data-dir <dir>` overrides
    /// the data directory in either case.
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.business_file.trim().is_empty() {
            return Err(ConfigError::Invalid("business_file is empty".into()));
        }
        if self.platforms.is_empty() {
            return Err(ConfigError::Invalid("at least one platform is required".into()));
        }

        let mut seen = HashSet::new();
        for platform in &self.platforms {
            if platform.name.trim().is_empty() || platform.file.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "platform name and file must not be empty".into(),
                ));
            }
            if !seen.insert(platform.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate platform '{}'",
                    platform.name
                )));
            }
        }

        if self.top_campaigns == 0 || self.top_tactics == 0 {
            return Err(ConfigError::Invalid("top_* limits must be at least 1".into()));
        }

        Ok(())
    }

    pub fn business_path(&self) -> PathBuf {
        self.data_dir.join(&self.business_file)
    }

    pub fn platform_path(&self, platform: &PlatformSource) -> PathBuf {
        self.data_dir.join(&platform.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_four_source_files() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.business_path(),
            PathBuf::from("Marketing Intelligence Dashboard/business.csv")
        );
        let names: Vec<&str> = config.platforms.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Facebook", "Google", "TikTok"]);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "data_dir": "/data/mkt", "top_campaigns": 5 }"#).unwrap();

        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/mkt"));
        assert_eq!(config.top_campaigns, 5);
        assert_eq!(config.top_tactics, 8);
        assert_eq!(config.platforms.len(), 3);
    }

    #[test]
    fn data_dir_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "data_dir": "/from/file" }"#).unwrap();

        let args = CliArgs::try_parse_from([
            "marketing_dashboard",
            "--config",
            path.to_str().unwrap(),
            "--data-dir",
            "/from/flag",
        ])
        .unwrap();
        let config = DashboardConfig::from_cli(&args).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/flag"));
    }

    #[test]
    fn equals_form_is_accepted() {
        let args = CliArgs::try_parse_from(["marketing_dashboard", "--config=custom.json"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("custom.json")));
        assert_eq!(args.data_dir, None);
    }

    #[test]
    fn unknown_or_incomplete_flags_are_rejected() {
        assert!(CliArgs::try_parse_from(["marketing_dashboard", "--datadir", "x"]).is_err());
        assert!(CliArgs::try_parse_from(["marketing_dashboard", "--data-dir"]).is_err());

        let help = CliArgs::try_parse_from(["marketing_dashboard", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn duplicate_platforms_are_rejected() {
        let mut config = DashboardConfig::default();
        config.platforms.push(PlatformSource::new("Google", "Google2.csv"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            DashboardConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}

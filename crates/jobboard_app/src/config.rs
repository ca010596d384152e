//! Optional RON configuration for the `jobboard` binary.
//!
//! Looked up at `$JOBBOARD_CONFIG`, then `./jobboard.ron`. Every field has a
//! default, so a missing file means "all defaults".

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use jobboard_core::DEFAULT_PAGE_SIZE;
use jobboard_engine::{FeedSettings, DEFAULT_FEED_URL};
use jobboard_logging::LogDestination;
use log::LevelFilter;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "jobboard.ron";
pub const CONFIG_ENV: &str = "JOBBOARD_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub feed_url: String,
    pub page_size: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub data_dir: PathBuf,
    pub log_destination: LogDestination,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let feed = FeedSettings::default();
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout_secs: feed.connect_timeout.as_secs(),
            request_timeout_secs: feed.request_timeout.as_secs(),
            data_dir: PathBuf::from("jobboard_data"),
            log_destination: LogDestination::Terminal,
            verbose: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(explicit.as_deref(), Path::new(CONFIG_FILE))
    }

    /// An explicit path must exist; the fallback path is optional.
    pub fn load_from(explicit: Option<&Path>, fallback: &Path) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None if fallback.is_file() => Self::read(fallback),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = ron::from_str(text).context("invalid configuration")?;
        if config.page_size == 0 {
            anyhow::bail!("page_size must be at least 1");
        }
        Ok(config)
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            base_url: self.feed_url.clone(),
            page_size: self.page_size,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FeedSettings::default()
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_from(None, &temp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::parse(
            r#"(
                page_size: 50,
                data_dir: "/var/lib/jobboard",
                log_destination: Both,
            )"#,
        )
        .unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/jobboard"));
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.ron");
        assert!(AppConfig::load_from(Some(&missing), Path::new(CONFIG_FILE)).is_err());
    }

    #[test]
    fn fallback_file_is_read_when_present() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "(verbose: true, request_timeout_secs: 5)").unwrap();

        let config = AppConfig::load_from(None, &path).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert_eq!(config.feed_settings().request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_unknown_fields_and_zero_page_size() {
        assert!(AppConfig::parse("(pagesize: 5)").is_err());
        assert!(AppConfig::parse("(page_size: 0)").is_err());
    }
}

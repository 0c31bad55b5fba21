use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::consts::{
    APP_DIR, DEFAULT_BASE_URL, MIN_SPINNER, RECONNECT_DELAY, REQUEST_TIMEOUT, TOAST_TIMEOUT,
};
use crate::error::AppError;

/// How a stream batch or backlog fetch is folded into the existing lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum MergeStrategy {
    /// Incoming list replaces the target list wholesale (last write wins)
    #[default]
    Replace,
    /// Incoming list replaces the target, but ids already known read stay read
    ById,
}

/// When read-marking touches local state relative to the server call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ReadSync {
    /// Mark-one applies on any HTTP response, mark-all only after success
    #[default]
    Optimistic,
    /// Every mark operation applies immediately and is undone on failure
    Rollback,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) base_url: String,
    pub(crate) reconnect_delay_secs: u64,
    pub(crate) toast_timeout_secs: u64,
    pub(crate) min_spinner_ms: u64,
    pub(crate) request_timeout_secs: u64,
    pub(crate) desktop: bool,
    pub(crate) merge: MergeStrategy,
    pub(crate) read_sync: ReadSync,
    pub(crate) debug: bool,
    pub(crate) no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            reconnect_delay_secs: RECONNECT_DELAY.as_secs(),
            toast_timeout_secs: TOAST_TIMEOUT.as_secs(),
            min_spinner_ms: MIN_SPINNER.as_millis() as u64,
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
            desktop: true,
            merge: MergeStrategy::default(),
            read_sync: ReadSync::default(),
            debug: false,
            no_color: false,
        }
    }
}

impl Config {
    /// First config file found, or defaults. A file that fails to load is
    /// skipped and handed back so it can be reported once logging is up.
    pub(crate) fn load() -> (Self, Option<AppError>) {
        let mut problem = None;
        for path in Self::get_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => return (config, problem),
                Err(e) => {
                    problem.get_or_insert(e);
                }
            }
        }
        (Self::default(), problem)
    }

    /// Parse a single config file
    pub(crate) fn load_from(path: &Path) -> Result<Self, AppError> {
        let invalid = |message: String| AppError::ConfigInvalid {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let config = toml::from_str::<Config>(&content).map_err(|e| invalid(e.to_string()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub(crate) fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub(crate) fn toast_timeout(&self) -> Duration {
        Duration::from_secs(self.toast_timeout_secs)
    }

    pub(crate) fn min_spinner(&self) -> Duration {
        Duration::from_millis(self.min_spinner_ms)
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/pdam-notify/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join(APP_DIR).join("config.toml"));
        }

        // 2. Platform config dir (macOS Application Support, Windows AppData)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join(APP_DIR).join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.pdam-notify.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{APP_DIR}.toml")));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let paths = Config::get_config_paths();
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|p| p.to_string_lossy().contains(APP_DIR)));
    }

    #[test]
    fn defaults_match_dashboard_timings() {
        let config = Config::default();
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.toast_timeout(), Duration::from_secs(4));
        assert_eq!(config.min_spinner(), Duration::from_millis(500));
        assert_eq!(config.merge, MergeStrategy::Replace);
        assert_eq!(config.read_sync, ReadSync::Optimistic);
        assert!(config.desktop);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "base_url = \"http://pdam.local\"\nmerge = \"by-id\"\nread_sync = \"rollback\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://pdam.local");
        assert_eq!(config.merge, MergeStrategy::ById);
        assert_eq!(config.read_sync, ReadSync::Rollback);
        assert_eq!(config.reconnect_delay_secs, 5);
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "merge = \"sideways\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}

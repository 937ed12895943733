//! Detection engine configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default process scan interval.
pub const DEFAULT_PROCESS_SCAN_INTERVAL_MS: u64 = 1000;

/// Default command-line (handle) scan interval.
pub const DEFAULT_HANDLE_SCAN_INTERVAL_MS: u64 = 2000;

/// Default recent-items scan interval.
pub const DEFAULT_RECENT_SCAN_INTERVAL_MS: u64 = 3000;

/// Default dedup-cache cleanup interval.
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 30_000;

/// Default time a process identity stays in the dedup cache.
pub const DEFAULT_DEDUP_MAX_AGE_SECS: u64 = 300;

/// Default wait between a filesystem event and the window-title lookup.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Default age under which a recent-items entry counts as just accessed.
pub const DEFAULT_RECENT_WINDOW_SECS: u64 = 5;

/// Accepted range for the recent window.
pub const RECENT_WINDOW_RANGE_SECS: std::ops::RangeInclusive<u64> = 5..=10;

/// Default upper bound for any single source call.
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`crate::DetectionEngine`].
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Process + window title scan period.
    pub process_scan_interval_ms: u64,

    /// Command-line scan period.
    pub handle_scan_interval_ms: u64,

    /// Recent-items folder scan period.
    pub recent_scan_interval_ms: u64,

    /// Dedup-cache purge period.
    pub cleanup_interval_ms: u64,

    /// Age after which a dedup entry is purged.
    pub dedup_max_age_secs: u64,

    /// Delay before confirming a filesystem change against open windows.
    pub settle_delay_ms: u64,

    /// Recent-items entries older than this are ignored. Clamped to 5-10 s.
    pub recent_window_secs: u64,

    /// Timeout applied to each source call.
    pub source_timeout_secs: u64,

    /// Directories to watch. `None` uses [`default_watch_directories`].
    pub watch_directories: Option<Vec<PathBuf>>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            process_scan_interval_ms: DEFAULT_PROCESS_SCAN_INTERVAL_MS,
            handle_scan_interval_ms: DEFAULT_HANDLE_SCAN_INTERVAL_MS,
            recent_scan_interval_ms: DEFAULT_RECENT_SCAN_INTERVAL_MS,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
            dedup_max_age_secs: DEFAULT_DEDUP_MAX_AGE_SECS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            recent_window_secs: DEFAULT_RECENT_WINDOW_SECS,
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            watch_directories: None,
        }
    }
}

// Timer periods must be non-zero for tokio intervals.
fn period(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

impl DetectConfig {
    pub fn process_scan_interval(&self) -> Duration {
        period(self.process_scan_interval_ms)
    }

    pub fn handle_scan_interval(&self) -> Duration {
        period(self.handle_scan_interval_ms)
    }

    pub fn recent_scan_interval(&self) -> Duration {
        period(self.recent_scan_interval_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        period(self.cleanup_interval_ms)
    }

    pub fn dedup_max_age(&self) -> Duration {
        Duration::from_secs(self.dedup_max_age_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn recent_window(&self) -> Duration {
        let secs = self
            .recent_window_secs
            .clamp(*RECENT_WINDOW_RANGE_SECS.start(), *RECENT_WINDOW_RANGE_SECS.end());
        Duration::from_secs(secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs.max(1))
    }

    /// Directories to watch, explicit or platform defaults.
    pub fn watch_directories(&self) -> Vec<PathBuf> {
        self.watch_directories
            .clone()
            .unwrap_or_else(default_watch_directories)
    }

    /// Location of the user config file (`<config_dir>/docwatch/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docwatch").join("config.json"))
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let config = Self::load(path)?;
        tracing::info!(path = %path.display(), "Loaded detection config");
        Ok(config)
    }
}

/// Home Documents, Desktop and Downloads, plus the shared public documents
/// folder on Windows. Directories that don't exist are still listed; the
/// engine skips them at start.
pub fn default_watch_directories() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    candidates.extend(dirs::document_dir());
    candidates.extend(dirs::desktop_dir());
    candidates.extend(dirs::download_dir());

    if let Some(public) = std::env::var_os("PUBLIC") {
        candidates.push(PathBuf::from(public).join("Documents"));
    } else if cfg!(windows) {
        candidates.push(PathBuf::from(r"C:\Users\Public\Documents"));
    }

    let mut unique: Vec<PathBuf> = Vec::with_capacity(candidates.len());
    for dir in candidates {
        if !unique.contains(&dir) {
            unique.push(dir);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DetectConfig::default();
        assert_eq!(config.process_scan_interval(), Duration::from_millis(1000));
        assert_eq!(config.handle_scan_interval(), Duration::from_millis(2000));
        assert_eq!(config.recent_scan_interval(), Duration::from_millis(3000));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(30));
        assert_eq!(config.dedup_max_age(), Duration::from_secs(300));
        assert_eq!(config.settle_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = DetectConfig {
            process_scan_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.process_scan_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_recent_window_is_clamped() {
        let config = |secs| DetectConfig {
            recent_window_secs: secs,
            ..Default::default()
        };
        assert_eq!(config(1).recent_window(), Duration::from_secs(5));
        assert_eq!(config(8).recent_window(), Duration::from_secs(8));
        assert_eq!(config(60).recent_window(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"process_scan_interval_ms": 250, "watch_directories": ["/tmp/docs"]}}"#
        )
        .unwrap();

        let config = DetectConfig::load(file.path()).unwrap();
        assert_eq!(config.process_scan_interval_ms, 250);
        assert_eq!(config.handle_scan_interval_ms, DEFAULT_HANDLE_SCAN_INTERVAL_MS);
        assert_eq!(config.watch_directories(), vec![PathBuf::from("/tmp/docs")]);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = DetectConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetectConfig::load_or_default(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, DetectConfig::default());
    }

    #[test]
    fn test_default_watch_directories_are_unique() {
        let dirs = default_watch_directories();
        let mut sorted = dirs.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), dirs.len());
    }
}

//! On-disk configuration at `~/.config/recap.json`.

use std::env;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::ad_network::AdNetwork;
use crate::admission::{
    AdmissionController, AdmissionPolicy, DEFAULT_AD_UNIT_ID, MAX_ADS_PER_WINDOW, WINDOW_MS,
};

/// Overrides `ads.unit_id` from the config file.
pub const AD_UNIT_ENV: &str = "RECAP_AD_UNIT_ID";

#[derive(Debug)]
pub enum ConfigError {
    NoHomeDir,
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoHomeDir => {
                write!(f, "could not locate a home directory for ~/.config/recap.json")
            }
            ConfigError::Io { path, source } => {
                write!(f, "failed to access config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::NoHomeDir => None,
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecapConfig {
    #[serde(default)]
    pub ads: AdSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSettings {
    /// When false, [`AdSettings::controller`] never loads an ad.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_unit_id")]
    pub unit_id: String,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_max_per_window")]
    pub max_per_window: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_unit_id() -> String {
    DEFAULT_AD_UNIT_ID.to_string()
}

fn default_window_ms() -> u64 {
    WINDOW_MS
}

fn default_max_per_window() -> usize {
    MAX_ADS_PER_WINDOW
}

impl Default for AdSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            unit_id: default_unit_id(),
            window_ms: default_window_ms(),
            max_per_window: default_max_per_window(),
        }
    }
}

impl AdSettings {
    /// Resolve the ad unit: env var, then config file, then default.
    pub fn resolved_unit_id(&self) -> String {
        env::var(AD_UNIT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.unit_id.clone())
    }

    pub fn policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            unit_id: self.resolved_unit_id(),
            window_ms: self.window_ms,
            max_per_window: self.max_per_window,
        }
    }

    /// Controller for these settings. With ads disabled `network` is dropped
    /// and every presentation falls straight through to the continuation.
    pub fn controller<N: AdNetwork>(&self, network: N) -> AdmissionController<Option<N>> {
        if !self.enabled {
            info!("ads disabled by config, using no-op ad network");
        }
        AdmissionController::new(self.enabled.then_some(network), self.policy())
    }
}

impl RecapConfig {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        path.push(".config");
        path.push("recap.json");
        Ok(path)
    }

    /// Loads from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// A missing file gives the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let payload = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, payload).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad_network::{LoadCallback, ShowCallback, ShowEvent};
    use crate::admission::{PresentOutcome, SlotState};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Network that fills every request immediately.
    struct AlwaysFill;

    impl AdNetwork for AlwaysFill {
        type Ad = ();

        fn load(&self, _unit_id: &str, on_loaded: LoadCallback<()>) {
            on_loaded(Ok(()));
        }

        fn show(&self, _ad: (), on_event: ShowCallback) {
            on_event(ShowEvent::Dismissed);
        }
    }

    #[test]
    fn enabled_settings_use_the_given_network() {
        let controller = AdSettings::default().controller(AlwaysFill);
        controller.request_load();
        assert!(controller.is_ready());
        assert_eq!(controller.present(|| {}), PresentOutcome::Presenting);
    }

    #[test]
    fn disabled_settings_never_show_ads() {
        let settings = AdSettings {
            enabled: false,
            ..AdSettings::default()
        };
        let controller = settings.controller(AlwaysFill);
        controller.request_load();
        assert_eq!(controller.slot_state(), SlotState::Empty);
        assert!(!controller.is_ready());

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let outcome = controller.present(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(outcome, PresentOutcome::NotLoaded);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(controller.presentations_in_window(), 0);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecapConfig::load_from(&dir.path().join("recap.json")).unwrap();
        assert_eq!(config, RecapConfig::default());
        assert!(config.ads.enabled);
        assert_eq!(config.ads.window_ms, 60_000);
        assert_eq!(config.ads.max_per_window, 2);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recap.json");
        fs::write(&path, r#"{"ads":{"enabled":false,"max_per_window":1}}"#).unwrap();
        let config = RecapConfig::load_from(&path).unwrap();
        assert!(!config.ads.enabled);
        assert_eq!(config.ads.max_per_window, 1);
        assert_eq!(config.ads.unit_id, DEFAULT_AD_UNIT_ID);
    }

    #[test]
    fn malformed_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recap.json");
        fs::write(&path, "{ads:").unwrap();
        let err = RecapConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("recap.json"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recap.json");
        let mut config = RecapConfig::default();
        config.ads.unit_id = "test-unit".into();
        config.ads.window_ms = 30_000;
        config.save_to(&path).unwrap();
        assert_eq!(RecapConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn policy_carries_window_settings() {
        let settings = AdSettings {
            window_ms: 5_000,
            max_per_window: 3,
            ..AdSettings::default()
        };
        let policy = settings.policy();
        assert_eq!(policy.window_ms, 5_000);
        assert_eq!(policy.max_per_window, 3);
    }
}

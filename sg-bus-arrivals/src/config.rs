//! Host configuration: credentials, scan interval and tracked services.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Lowest accepted scan interval, in seconds.
pub const MIN_SCAN_INTERVAL_SECS: u64 = 20;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "scan interval of {secs}s is below the minimum of {min}s",
        min = MIN_SCAN_INTERVAL_SECS
    )]
    ScanIntervalTooShort { secs: u64 },

    #[error("service {service_number} at bus stop {stop_code} is already tracked")]
    DuplicateEntry {
        stop_code: String,
        service_number: String,
    },

    #[error("API key is empty")]
    MissingApiKey,

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid configuration: {message}")]
    Parse { message: String },
}

/// Polling interval, never below [`MIN_SCAN_INTERVAL_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ScanInterval(u64);

impl ScanInterval {
    /// The shortest accepted interval.
    pub const DEFAULT: ScanInterval = ScanInterval(MIN_SCAN_INTERVAL_SECS);

    pub fn new(secs: u64) -> Result<Self, ConfigError> {
        if secs < MIN_SCAN_INTERVAL_SECS {
            return Err(ConfigError::ScanIntervalTooShort { secs });
        }
        Ok(Self(secs))
    }

    pub fn secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for ScanInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u64> for ScanInterval {
    type Error = ConfigError;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        Self::new(secs)
    }
}

impl From<ScanInterval> for u64 {
    fn from(interval: ScanInterval) -> Self {
        interval.0
    }
}

/// A bus service the user has chosen to follow at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntry {
    pub stop_code: String,
    pub service_number: String,
    /// Stop description, for display.
    #[serde(default)]
    pub description: String,
}

impl TrackedEntry {
    pub fn new(
        stop_code: impl Into<String>,
        service_number: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            stop_code: stop_code.into(),
            service_number: service_number.into(),
            description: description.into(),
        }
    }

    fn same_pair(&self, other: &TrackedEntry) -> bool {
        self.stop_code == other.stop_code && self.service_number == other.service_number
    }
}

/// Settings loaded at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_key: String,
    #[serde(default)]
    pub scan_interval: ScanInterval,
    #[serde(default)]
    pub tracked: Vec<TrackedEntry>,
    /// Whether to poll train service alerts.
    #[serde(default)]
    pub train_service_alerts: bool,
}

impl Settings {
    /// Parse and validate settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Replace the API key, e.g. from the environment.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        self.api_key = api_key.into();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        check_unique(&self.tracked)
    }
}

fn check_unique(entries: &[TrackedEntry]) -> Result<(), ConfigError> {
    for (i, entry) in entries.iter().enumerate() {
        if entries[..i].iter().any(|earlier| earlier.same_pair(entry)) {
            return Err(ConfigError::DuplicateEntry {
                stop_code: entry.stop_code.clone(),
                service_number: entry.service_number.clone(),
            });
        }
    }
    Ok(())
}

/// Live list of tracked services, shared with the coordinators.
///
/// (stop code, service number) pairs are unique.
#[derive(Debug, Clone, Default)]
pub struct TrackedServices {
    inner: Arc<RwLock<Vec<TrackedEntry>>>,
}

impl TrackedServices {
    pub fn new(entries: Vec<TrackedEntry>) -> Result<Self, ConfigError> {
        check_unique(&entries)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(entries)),
        })
    }

    /// All entries, in insertion order.
    pub async fn entries(&self) -> Vec<TrackedEntry> {
        self.inner.read().await.clone()
    }

    /// Distinct stop codes across all entries.
    pub async fn stop_codes(&self) -> BTreeSet<String> {
        let guard = self.inner.read().await;
        guard.iter().map(|e| e.stop_code.clone()).collect()
    }

    /// Service numbers already tracked at a stop.
    pub async fn services_at(&self, stop_code: &str) -> BTreeSet<String> {
        let guard = self.inner.read().await;
        guard
            .iter()
            .filter(|e| e.stop_code == stop_code)
            .map(|e| e.service_number.clone())
            .collect()
    }

    /// Track a new service. Fails if the pair is already tracked.
    pub async fn add(&self, entry: TrackedEntry) -> Result<(), ConfigError> {
        let mut guard = self.inner.write().await;
        if guard.iter().any(|e| e.same_pair(&entry)) {
            return Err(ConfigError::DuplicateEntry {
                stop_code: entry.stop_code,
                service_number: entry.service_number,
            });
        }
        guard.push(entry);
        Ok(())
    }

    /// Track several services at once. Nothing is added if any pair is
    /// already tracked or repeated within `entries`.
    pub async fn add_all(&self, entries: Vec<TrackedEntry>) -> Result<(), ConfigError> {
        let mut guard = self.inner.write().await;
        for (i, entry) in entries.iter().enumerate() {
            let repeated = entries[..i].iter().any(|earlier| earlier.same_pair(entry));
            if repeated || guard.iter().any(|e| e.same_pair(entry)) {
                return Err(ConfigError::DuplicateEntry {
                    stop_code: entry.stop_code.clone(),
                    service_number: entry.service_number.clone(),
                });
            }
        }
        guard.extend(entries);
        Ok(())
    }

    /// Stop tracking a service. Returns false if it was not tracked.
    pub async fn remove(&self, stop_code: &str, service_number: &str) -> bool {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|e| !(e.stop_code == stop_code && e.service_number == service_number));
        guard.len() != before
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

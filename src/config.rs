//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `LEAKWATCH_*` environment variables (`__` separates sections, as
//! in `LEAKWATCH_STORE__ENDPOINT`). Command-line flags are applied on top
//! by the binary.
//!
//! ```toml
//! [policy]
//! moderate_after = "5m"
//! critical_after = "10m"
//! severe_after = "15m"
//!
//! [store]
//! kind = "rest"
//! endpoint = "https://docs.example.com"
//! collection = "leaks"
//!
//! [monitor]
//! poll_interval = "1s"
//!
//! [log]
//! level = "info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use leakwatch_sdk::{
    LeakSynchronizer, SeverityPolicy, ANNUAL_COST_PER_LPM, DEFAULT_COLLECTION, HOURS_PER_YEAR,
};
use leakwatch_store::rest::RestStore;
use leakwatch_store::{DocumentStore, MemoryStore};
use serde::Deserialize;

use crate::data::duration;
use crate::logging::LogFormat;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "LEAKWATCH";

/// All runtime settings.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub policy: PolicySettings,
    pub store: StoreSettings,
    pub monitor: MonitorSettings,
    pub log: LogSettings,
}

/// Severity thresholds and cost model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    #[serde(deserialize_with = "duration::deserialize")]
    pub moderate_after: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub critical_after: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub severe_after: Duration,
    pub annual_cost_per_lpm: f64,
    pub hours_per_year: f64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        let policy = SeverityPolicy::default();
        Self {
            moderate_after: policy.moderate_after,
            critical_after: policy.critical_after,
            severe_after: policy.severe_after,
            annual_cost_per_lpm: ANNUAL_COST_PER_LPM,
            hours_per_year: HOURS_PER_YEAR,
        }
    }
}

impl PolicySettings {
    pub fn to_policy(&self) -> SeverityPolicy {
        SeverityPolicy {
            moderate_after: self.moderate_after,
            critical_after: self.critical_after,
            severe_after: self.severe_after,
            annual_cost_per_lpm: self.annual_cost_per_lpm,
            hours_per_year: self.hours_per_year,
        }
    }
}

/// Which document store backs the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-process store; records are lost on exit.
    #[default]
    Memory,
    /// Hosted document API over HTTP.
    Rest,
}

impl std::str::FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "rest" => Ok(StoreKind::Rest),
            other => anyhow::bail!("Unknown store kind: {} (expected memory or rest)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub endpoint: String,
    pub token: Option<String>,
    pub collection: String,
    #[serde(deserialize_with = "duration::deserialize")]
    pub timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::Memory,
            endpoint: "http://localhost:8080".to_string(),
            token: None,
            collection: DEFAULT_COLLECTION.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl StoreSettings {
    /// Build the configured store.
    pub fn build(&self) -> Result<Arc<dyn DocumentStore>> {
        match self.kind {
            StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreKind::Rest => {
                let mut builder = RestStore::builder()
                    .endpoint(self.endpoint.as_str())
                    .timeout(self.timeout);
                if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
                    builder = builder.token(token);
                }
                Ok(Arc::new(builder.build()?))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// How often the reading source is polled.
    #[serde(deserialize_with = "duration::deserialize")]
    pub poll_interval: Duration,
    /// JSON-lines file that receives lifecycle events.
    pub events: Option<PathBuf>,
}

impl MonitorSettings {
    /// Reject settings the poll loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("monitor.poll_interval must be greater than zero");
        }
        Ok(())
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            events: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Human,
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    /// Load settings from an optional file and the given environment source.
    pub fn load_with(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(env)
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.monitor.validate()?;
        Ok(settings)
    }

    /// Build a synchronizer from the policy and store settings.
    pub fn synchronizer(&self) -> Result<LeakSynchronizer> {
        let store = self.store.build()?;
        let sync = LeakSynchronizer::builder(store)
            .policy(self.policy.to_policy())
            .collection(self.store.collection.as_str())
            .build()?;
        Ok(sync)
    }
}

/// The `LEAKWATCH_*` environment source.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

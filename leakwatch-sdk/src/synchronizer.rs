//! The leak event synchronizer.
//!
//! Turns periodic leak observations into exactly one persisted record per
//! leak occurrence. See [`LeakSynchronizer::sync_leak_event`].

use std::sync::Arc;

use leakwatch_store::{
    to_fields, Clock, CreateOutcome, DocumentStore, Filter, StoreError, SystemClock,
};
use leakwatch_types::{
    whole_minutes, EpochMillis, LeakObservation, LeakRecord, LeakResolution, LeakStatus,
    LeakUpdate, Severity,
};
use tracing::{debug, info, warn};

use crate::policy::{PolicyError, SeverityPolicy};

/// Collection holding leak records unless configured otherwise.
pub const DEFAULT_COLLECTION: &str = "leaks";

/// Document field names the synchronizer filters on.
pub mod field {
    pub const ASSET_ID: &str = "assetId";
    pub const NETWORK_ID: &str = "networkId";
    pub const STATUS: &str = "status";
}

/// What a call to [`LeakSynchronizer::sync_leak_event`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// Below the reporting threshold; nothing was read or written.
    None,
    /// A new record was written.
    Created,
    /// An existing record was refreshed, or found already open.
    Updated,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::None => "none",
            SyncAction::Created => "created",
            SyncAction::Updated => "updated",
        }
    }
}

/// Result of synchronizing one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The record the observation belongs to; `None` when nothing was persisted.
    pub record_id: Option<String>,
    pub action: SyncAction,
    pub severity: Severity,
}

impl SyncOutcome {
    /// The outcome of a debounced observation.
    pub fn none() -> Self {
        Self {
            record_id: None,
            action: SyncAction::None,
            severity: Severity::Normal,
        }
    }

    fn with(record_id: String, action: SyncAction, severity: Severity) -> Self {
        Self {
            record_id: Some(record_id),
            action,
            severity,
        }
    }
}

/// A leak record together with its store identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLeak {
    pub id: String,
    pub record: LeakRecord,
}

/// Keeps one leak record per active leak in a [`DocumentStore`].
///
/// The synchronizer holds no mutable state: every call reads what it
/// needs from the observation and the store. Callers own the polling loop
/// and decide when a leak is over.
///
/// # Example
///
/// ```rust
/// use leakwatch_sdk::{LeakSynchronizer, SyncAction};
/// use leakwatch_store::{ManualClock, MemoryStore};
/// use leakwatch_types::{EpochMillis, LeakObservation, Severity};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
/// let store = Arc::new(MemoryStore::with_clock(clock.clone()));
/// let sync = LeakSynchronizer::builder(store)
///     .clock(clock.clone())
///     .build()
///     .unwrap();
///
/// let started = EpochMillis::from_millis(1_700_000_000_000).saturating_sub(Duration::from_secs(360));
/// let obs = LeakObservation::builder("A1").flow_lpm(20.0).started_at(started).build();
///
/// let outcome = sync.sync_leak_event(&obs).await.unwrap();
/// assert_eq!(outcome.action, SyncAction::Created);
/// assert_eq!(outcome.severity, Severity::Moderate);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct LeakSynchronizer {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    policy: SeverityPolicy,
    collection: String,
}

impl LeakSynchronizer {
    /// Create a synchronizer with the default policy and the system clock.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            policy: SeverityPolicy::default(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    /// Create a builder for configuring the synchronizer.
    pub fn builder(store: Arc<dyn DocumentStore>) -> LeakSynchronizerBuilder {
        LeakSynchronizerBuilder::new(store)
    }

    pub fn policy(&self) -> &SeverityPolicy {
        &self.policy
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Current time according to the synchronizer's clock.
    pub fn now(&self) -> EpochMillis {
        self.clock.now()
    }

    /// Classify an observation and create or refresh its record.
    ///
    /// - Below the reporting threshold nothing is touched and the outcome
    ///   is `{None, none, normal}`.
    /// - Without a known record id, an open record for the asset is looked
    ///   up first and reused if found (action `updated`, no write);
    ///   otherwise a new record is created (action `created`).
    /// - With a known record id, that record's duration, pressure,
    ///   severity, flow and cost are rewritten (action `updated`).
    ///
    /// Store failures are returned unchanged and never retried here; the
    /// next observation is the retry.
    pub async fn sync_leak_event(
        &self,
        observation: &LeakObservation,
    ) -> Result<SyncOutcome, StoreError> {
        let elapsed = observation.start_time.elapsed_until(self.clock.now());
        let severity = self.policy.classify(elapsed);

        if !severity.is_reportable() {
            debug!(
                "Leak on {} below reporting threshold ({}s)",
                observation.asset_id,
                elapsed.as_secs()
            );
            return Ok(SyncOutcome::none());
        }

        let cost_per_hour = self.policy.hourly_cost(observation.current_lpm);
        let duration_minutes = whole_minutes(elapsed);

        match observation.known_record_id() {
            None => {
                let stamp = self.store.now();
                let record = LeakRecord {
                    asset_id: observation.asset_id.clone(),
                    asset_name: observation.asset_name.clone(),
                    network_id: observation.network_id.clone(),
                    start_time: observation.start_time,
                    current_lpm: observation.flow_lpm(),
                    current_pressure: observation.pressure(),
                    cost_per_hour,
                    duration_minutes,
                    status: LeakStatus::Active,
                    severity,
                    created_at: stamp,
                    last_update: stamp,
                    end_time: None,
                };
                let guard = active_guard(&observation.asset_id);

                match self
                    .store
                    .create_unique(&self.collection, &guard, to_fields(&record)?)
                    .await?
                {
                    CreateOutcome::Created(id) => {
                        info!(
                            "Leak record {} created for {} [{}] {:.2}/h",
                            id,
                            observation.asset_id,
                            severity.symbol(),
                            cost_per_hour
                        );
                        Ok(SyncOutcome::with(id, SyncAction::Created, severity))
                    }
                    CreateOutcome::Existing(id) => {
                        debug!(
                            "Active leak record {} already exists for {}",
                            id, observation.asset_id
                        );
                        Ok(SyncOutcome::with(id, SyncAction::Updated, severity))
                    }
                }
            }
            Some(id) => {
                let update = LeakUpdate {
                    duration_minutes,
                    current_pressure: observation.pressure(),
                    severity,
                    current_lpm: observation.flow_lpm(),
                    cost_per_hour,
                    last_update: self.store.now(),
                };
                self.store
                    .update_record(&self.collection, id, to_fields(&update)?)
                    .await?;
                debug!(
                    "Leak record {} updated for {} [{}] {}min",
                    id,
                    observation.asset_id,
                    severity.symbol(),
                    duration_minutes
                );
                Ok(SyncOutcome::with(id.to_string(), SyncAction::Updated, severity))
            }
        }
    }

    /// Mark a record resolved and stamp its end time.
    ///
    /// A missing or empty id is a no-op. Failures are logged and
    /// swallowed: resolving is best-effort cleanup.
    pub async fn resolve_leak(&self, record_id: Option<&str>) {
        let Some(id) = record_id.filter(|id| !id.is_empty()) else {
            return;
        };

        let resolution = LeakResolution::at(self.store.now());
        let result = match to_fields(&resolution) {
            Ok(fields) => self.store.update_record(&self.collection, id, fields).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!("Leak record {} resolved", id),
            Err(e) => warn!("Failed to resolve leak record {}: {}", id, e),
        }
    }

    /// Whether a record is closed in the store.
    ///
    /// A record that no longer exists counts as closed. Callers use this to
    /// confirm a [`resolve_leak`](Self::resolve_leak), which never reports
    /// failure itself.
    pub async fn is_resolved(&self, record_id: &str) -> Result<bool, StoreError> {
        let doc = self.store.get_record(&self.collection, record_id).await?;
        Ok(doc.map_or(true, |doc| {
            doc.fields.get(field::STATUS).and_then(|s| s.as_str())
                != Some(LeakStatus::Active.as_str())
        }))
    }

    /// Open leak records, optionally limited to one network.
    pub async fn active_leaks(&self, network_id: Option<&str>) -> Result<Vec<StoredLeak>, StoreError> {
        let mut filters = vec![Filter::equals(field::STATUS, LeakStatus::Active.as_str())];
        if let Some(network) = network_id {
            filters.push(Filter::equals(field::NETWORK_ID, network));
        }
        self.load(&filters).await
    }

    /// Every record ever written for an asset, oldest first.
    pub async fn leak_history(&self, asset_id: &str) -> Result<Vec<StoredLeak>, StoreError> {
        self.load(&[Filter::equals(field::ASSET_ID, asset_id)]).await
    }

    /// Every leak record in the collection, oldest first.
    pub async fn all_leaks(&self) -> Result<Vec<StoredLeak>, StoreError> {
        self.load(&[]).await
    }

    async fn load(&self, filters: &[Filter]) -> Result<Vec<StoredLeak>, StoreError> {
        let docs = self.store.query_records(&self.collection, filters).await?;
        let mut leaks = docs
            .into_iter()
            .map(|doc| {
                let record = doc.decode::<LeakRecord>()?;
                Ok(StoredLeak { id: doc.id, record })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        leaks.sort_by(|a, b| {
            a.record
                .start_time
                .cmp(&b.record.start_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(leaks)
    }
}

fn active_guard(asset_id: &str) -> [Filter; 2] {
    [
        Filter::equals(field::ASSET_ID, asset_id),
        Filter::equals(field::STATUS, LeakStatus::Active.as_str()),
    ]
}

/// Builder for configuring a LeakSynchronizer.
#[derive(Debug)]
pub struct LeakSynchronizerBuilder {
    store: Arc<dyn DocumentStore>,
    clock: Option<Arc<dyn Clock>>,
    policy: Option<SeverityPolicy>,
    collection: Option<String>,
}

impl LeakSynchronizerBuilder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: None,
            policy: None,
            collection: None,
        }
    }

    /// Clock used to measure elapsed leak time. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Severity thresholds and cost model.
    pub fn policy(mut self, policy: SeverityPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Collection holding leak records. Defaults to `leaks`.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Build the synchronizer, rejecting an inconsistent policy.
    pub fn build(self) -> Result<LeakSynchronizer, PolicyError> {
        let policy = self.policy.unwrap_or_default();
        policy.validate()?;

        Ok(LeakSynchronizer {
            store: self.store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            policy,
            collection: self
                .collection
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        })
    }
}

//! Per-asset leak tracking.

use leakwatch_types::{
    AssetReading, EpochMillis, LeakEvent, LeakEventKind, LeakState, Severity, TransitionError,
};
use tracing::{debug, warn};

use crate::synchronizer::{LeakSynchronizer, SyncAction};

/// Follows one asset across readings and drives the synchronizer.
///
/// The tracker remembers when the current leak started and which record
/// it belongs to. That is all the synchronizer needs from one call to the
/// next.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetTracker {
    asset_id: String,
    state: LeakState,
    leak_started: Option<EpochMillis>,
    last_severity: Severity,
}

impl AssetTracker {
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            state: LeakState::NotReported,
            leak_started: None,
            last_severity: Severity::Normal,
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn state(&self) -> &LeakState {
        &self.state
    }

    /// Start of the leak currently being tracked.
    pub fn leak_started(&self) -> Option<EpochMillis> {
        self.leak_started
    }

    /// Severity reported by the last successful sync.
    pub fn last_severity(&self) -> Severity {
        self.last_severity
    }

    /// Process one reading for this asset.
    ///
    /// Returns the lifecycle event the reading produced, if any. Store
    /// failures leave the tracker untouched so the next reading retries.
    pub async fn observe(
        &mut self,
        sync: &LeakSynchronizer,
        reading: &AssetReading,
    ) -> Option<LeakEvent> {
        let now = sync.now();

        if reading.leak_detected {
            self.on_leaking(sync, reading, now).await
        } else {
            self.on_clear(sync, now).await
        }
    }

    async fn on_leaking(
        &mut self,
        sync: &LeakSynchronizer,
        reading: &AssetReading,
        now: EpochMillis,
    ) -> Option<LeakEvent> {
        if matches!(self.state, LeakState::Resolved { .. }) {
            if let Err(e) = self.transition(LeakState::restart) {
                return Some(self.failed(now, e.to_string()));
            }
            self.leak_started = None;
            self.last_severity = Severity::Normal;
            debug!("New leak occurrence on {}", self.asset_id);
        }

        let start = *self
            .leak_started
            .get_or_insert(reading.leak_since.or(reading.observed_at).unwrap_or(now));
        let observation = reading.to_observation(start, self.state.active_record());

        let outcome = match sync.sync_leak_event(&observation).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Leak sync failed for {}, will retry: {}", self.asset_id, e);
                return Some(self.failed(now, e.to_string()));
            }
        };

        let kind = match outcome.action {
            SyncAction::None => return None,
            SyncAction::Created => LeakEventKind::Created,
            SyncAction::Updated => LeakEventKind::Updated,
        };
        let Some(record_id) = outcome.record_id else {
            return None;
        };

        if let Err(e) = self.transition(|state| state.activate(record_id.as_str())) {
            warn!("Tracker for {} rejected record {}: {}", self.asset_id, record_id, e);
            return Some(self.failed(now, e.to_string()));
        }
        self.last_severity = outcome.severity;

        Some(LeakEvent::new(
            self.asset_id.clone(),
            kind,
            Some(record_id),
            outcome.severity,
            now,
        ))
    }

    async fn on_clear(&mut self, sync: &LeakSynchronizer, now: EpochMillis) -> Option<LeakEvent> {
        match &self.state {
            LeakState::Active { record_id } => {
                let record_id = record_id.clone();
                sync.resolve_leak(Some(record_id.as_str())).await;

                // Stay active until the store confirms the record is closed
                match sync.is_resolved(&record_id).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(
                            "Leak record {} still open for {}, will retry",
                            record_id, self.asset_id
                        );
                        let message = format!("Leak record {} is still active", record_id);
                        return Some(self.failed(now, message));
                    }
                    Err(e) => {
                        warn!(
                            "Could not confirm resolve of {} for {}: {}",
                            record_id, self.asset_id, e
                        );
                        return Some(self.failed(now, e.to_string()));
                    }
                }

                if let Err(e) = self.transition(LeakState::resolve) {
                    return Some(self.failed(now, e.to_string()));
                }
                self.leak_started = None;

                Some(LeakEvent::new(
                    self.asset_id.clone(),
                    LeakEventKind::Resolved,
                    Some(record_id),
                    self.last_severity,
                    now,
                ))
            }
            LeakState::NotReported if self.leak_started.is_some() => {
                self.leak_started = None;
                debug!("Transient leak on {} cleared before reporting", self.asset_id);

                Some(LeakEvent::new(
                    self.asset_id.clone(),
                    LeakEventKind::Discarded,
                    None,
                    Severity::Normal,
                    now,
                ))
            }
            _ => None,
        }
    }

    fn transition(
        &mut self,
        step: impl FnOnce(LeakState) -> Result<LeakState, TransitionError>,
    ) -> Result<(), TransitionError> {
        let next = step(self.state.clone())?;
        self.state = next;
        Ok(())
    }

    fn failed(&self, now: EpochMillis, message: String) -> LeakEvent {
        LeakEvent::new(
            self.asset_id.clone(),
            LeakEventKind::Failed,
            self.state.active_record().map(String::from),
            self.last_severity,
            now,
        )
        .with_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leakwatch_store::{DocumentStore, ManualClock, MemoryStore, Operation};
    use leakwatch_types::LeakStatus;
    use std::sync::Arc;
    use std::time::Duration;

    const NOW: u64 = 1_700_000_000_000;

    fn setup() -> (Arc<ManualClock>, Arc<MemoryStore>, LeakSynchronizer) {
        let clock = Arc::new(ManualClock::at_millis(NOW));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let sync = LeakSynchronizer::builder(store.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        (clock, store, sync)
    }

    fn leaking() -> AssetReading {
        AssetReading::new("A1").leaking(20.0).located("Compressor", "net-1")
    }

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    #[tokio::test]
    async fn short_leak_is_discarded() {
        let (clock, store, sync) = setup();
        let mut tracker = AssetTracker::new("A1");

        assert!(tracker.observe(&sync, &leaking()).await.is_none());
        assert_eq!(tracker.leak_started(), Some(EpochMillis::from_millis(NOW)));

        clock.advance(minutes(2));
        assert!(tracker.observe(&sync, &leaking()).await.is_none());

        let event = tracker
            .observe(&sync, &AssetReading::new("A1"))
            .await
            .unwrap();
        assert_eq!(event.kind, LeakEventKind::Discarded);
        assert!(tracker.leak_started().is_none());
        assert_eq!(store.counts().total(), 0);
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let (clock, store, sync) = setup();
        let mut tracker = AssetTracker::new("A1");

        tracker.observe(&sync, &leaking()).await;
        clock.advance(minutes(5));

        let created = tracker.observe(&sync, &leaking()).await.unwrap();
        assert_eq!(created.kind, LeakEventKind::Created);
        assert_eq!(created.severity, Severity::Moderate);
        let record_id = created.record_id.clone().unwrap();
        assert_eq!(tracker.state().active_record(), Some(record_id.as_str()));

        clock.advance(minutes(10));
        let updated = tracker.observe(&sync, &leaking()).await.unwrap();
        assert_eq!(updated.kind, LeakEventKind::Updated);
        assert_eq!(updated.severity, Severity::Severe);
        assert_eq!(store.counts().creates, 1);

        clock.advance(minutes(1));
        let resolved = tracker
            .observe(&sync, &AssetReading::new("A1"))
            .await
            .unwrap();
        assert_eq!(resolved.kind, LeakEventKind::Resolved);
        assert_eq!(resolved.severity, Severity::Severe);
        assert!(matches!(tracker.state(), LeakState::Resolved { .. }));

        let doc = store.get_record("leaks", &record_id).await.unwrap().unwrap();
        assert_eq!(doc.fields["status"], LeakStatus::Resolved.as_str());
        assert_eq!(doc.fields["endTime"], NOW + minutes(16).as_millis() as u64);
    }

    #[tokio::test]
    async fn device_start_time_wins() {
        let (_clock, _store, sync) = setup();
        let mut tracker = AssetTracker::new("A1");
        let since = EpochMillis::from_millis(NOW).saturating_sub(minutes(12));

        let event = tracker
            .observe(&sync, &leaking().since(since))
            .await
            .unwrap();
        assert_eq!(event.kind, LeakEventKind::Created);
        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(tracker.leak_started(), Some(since));
    }

    #[tokio::test]
    async fn failure_keeps_state_and_retries() {
        let (_clock, store, sync) = setup();
        let mut tracker = AssetTracker::new("A1");
        let since = EpochMillis::from_millis(NOW).saturating_sub(minutes(6));

        store.fail(Operation::Create);
        let failed = tracker
            .observe(&sync, &leaking().since(since))
            .await
            .unwrap();
        assert_eq!(failed.kind, LeakEventKind::Failed);
        assert!(failed.message.is_some());
        assert_eq!(tracker.state(), &LeakState::NotReported);

        store.heal(Operation::Create);
        let created = tracker
            .observe(&sync, &leaking().since(since))
            .await
            .unwrap();
        assert_eq!(created.kind, LeakEventKind::Created);
    }

    #[tokio::test]
    async fn leak_after_resolve_opens_new_record() {
        let (clock, store, sync) = setup();
        let mut tracker = AssetTracker::new("A1");
        let since = EpochMillis::from_millis(NOW).saturating_sub(minutes(6));

        let first = tracker.observe(&sync, &leaking().since(since)).await.unwrap();
        tracker.observe(&sync, &AssetReading::new("A1")).await;

        clock.advance(minutes(1));
        let restart = EpochMillis::from_millis(NOW).saturating_sub(minutes(7));
        let second = tracker
            .observe(&sync, &leaking().since(restart))
            .await
            .unwrap();

        assert_eq!(second.kind, LeakEventKind::Created);
        assert_ne!(first.record_id, second.record_id);
        assert_eq!(store.len("leaks"), 2);
    }

    #[tokio::test]
    async fn failed_resolve_stays_active_until_confirmed() {
        let (clock, store, sync) = setup();
        let mut tracker = AssetTracker::new("A1");
        let since = EpochMillis::from_millis(NOW).saturating_sub(minutes(6));

        let first = tracker.observe(&sync, &leaking().since(since)).await.unwrap();
        let first_id = first.record_id.clone().unwrap();

        store.fail(Operation::Update);
        let failed = tracker
            .observe(&sync, &AssetReading::new("A1"))
            .await
            .unwrap();
        assert_eq!(failed.kind, LeakEventKind::Failed);
        assert_eq!(failed.record_id.as_deref(), Some(first_id.as_str()));
        assert_eq!(tracker.state().active_record(), Some(first_id.as_str()));
        assert!(!sync.is_resolved(&first_id).await.unwrap());

        store.heal(Operation::Update);
        let resolved = tracker
            .observe(&sync, &AssetReading::new("A1"))
            .await
            .unwrap();
        assert_eq!(resolved.kind, LeakEventKind::Resolved);
        assert!(sync.is_resolved(&first_id).await.unwrap());

        clock.advance(minutes(1));
        let restart = EpochMillis::from_millis(NOW).saturating_sub(minutes(7));
        let second = tracker
            .observe(&sync, &leaking().since(restart))
            .await
            .unwrap();
        assert_eq!(second.kind, LeakEventKind::Created);
        assert_ne!(second.record_id.as_deref(), Some(first_id.as_str()));
        assert_eq!(store.len("leaks"), 2);

        let doc = store
            .get_record("leaks", second.record_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.fields["startTime"], restart.as_millis());
    }

    #[tokio::test]
    async fn unconfirmed_resolve_is_reported() {
        let (_clock, store, sync) = setup();
        let mut tracker = AssetTracker::new("A1");
        let since = EpochMillis::from_millis(NOW).saturating_sub(minutes(6));
        tracker.observe(&sync, &leaking().since(since)).await;

        store.fail(Operation::Get);
        let failed = tracker
            .observe(&sync, &AssetReading::new("A1"))
            .await
            .unwrap();
        assert_eq!(failed.kind, LeakEventKind::Failed);
        assert!(tracker.state().is_active());
    }

    #[tokio::test]
    async fn idle_asset_emits_nothing() {
        let (_clock, _store, sync) = setup();
        let mut tracker = AssetTracker::new("A1");
        assert!(tracker.observe(&sync, &AssetReading::new("A1")).await.is_none());
    }
}

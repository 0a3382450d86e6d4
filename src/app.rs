//! Application state: one reading source feeding one leak monitor.

use leakwatch_sdk::{LeakMonitor, LeakSynchronizer};
use leakwatch_types::{LeakEvent, LeakEventKind};
use tracing::{debug, warn};

use crate::data::LeakReport;
use crate::source::DataSource;

/// Counters over the lifetime of the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub ticks: u64,
    pub readings: u64,
    pub created: u64,
    pub resolved: u64,
    pub failed: u64,
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    source: Box<dyn DataSource>,
    monitor: LeakMonitor,
    pub totals: Totals,
    pub load_error: Option<String>,
}

impl App {
    /// Create a new App reading from `source`.
    pub fn new(source: Box<dyn DataSource>, monitor: LeakMonitor) -> Self {
        Self {
            source,
            monitor,
            totals: Totals::default(),
            load_error: None,
        }
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn monitor(&self) -> &LeakMonitor {
        &self.monitor
    }

    pub fn synchronizer(&self) -> &LeakSynchronizer {
        self.monitor.synchronizer()
    }

    /// Poll the source once and push any new readings through the monitor.
    pub async fn tick(&mut self) -> Vec<LeakEvent> {
        self.totals.ticks += 1;

        let readings = match self.source.poll() {
            Some(readings) => readings,
            None => {
                let error = self.source.error().map(String::from);
                if error.is_some() && error != self.load_error {
                    warn!(
                        "{}: {}",
                        self.source.description(),
                        error.as_deref().unwrap_or_default()
                    );
                }
                self.load_error = error;
                return Vec::new();
            }
        };

        self.load_error = None;
        self.totals.readings += readings.len() as u64;
        debug!("Processing {} readings", readings.len());

        let events = self.monitor.process_batch(&readings).await;
        for event in &events {
            match event.kind {
                LeakEventKind::Created => self.totals.created += 1,
                LeakEventKind::Resolved => self.totals.resolved += 1,
                LeakEventKind::Failed => self.totals.failed += 1,
                LeakEventKind::Updated | LeakEventKind::Discarded => {}
            }
        }
        events
    }

    /// Read every record back from the store and summarize it.
    pub async fn report(&self) -> anyhow::Result<LeakReport> {
        let sync = self.synchronizer();
        let leaks = sync.all_leaks().await?;
        Ok(LeakReport::build(leaks, sync.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leakwatch_store::{ManualClock, MemoryStore, Operation};
    use leakwatch_types::{AssetReading, EpochMillis};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    const NOW: u64 = 1_700_000_000_000;

    /// Replays canned batches, one per poll.
    #[derive(Debug, Default)]
    struct ScriptedSource {
        batches: VecDeque<Vec<AssetReading>>,
    }

    impl DataSource for ScriptedSource {
        fn poll(&mut self) -> Option<Vec<AssetReading>> {
            self.batches.pop_front()
        }

        fn description(&self) -> &str {
            "scripted"
        }

        fn error(&self) -> Option<&str> {
            None
        }
    }

    fn app(store: Arc<MemoryStore>, clock: Arc<ManualClock>, batches: Vec<Vec<AssetReading>>) -> App {
        let sync = LeakSynchronizer::builder(store)
            .clock(clock)
            .build()
            .unwrap();
        let source = ScriptedSource {
            batches: batches.into(),
        };
        App::new(Box::new(source), LeakMonitor::new(Arc::new(sync)))
    }

    fn since(minutes: u64) -> EpochMillis {
        EpochMillis::from_millis(NOW).saturating_sub(Duration::from_secs(minutes * 60))
    }

    #[tokio::test]
    async fn tick_counts_lifecycle() {
        let clock = Arc::new(ManualClock::at_millis(NOW));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let mut app = app(
            store,
            clock,
            vec![
                vec![
                    AssetReading::new("A1").leaking(20.0).since(since(6)),
                    AssetReading::new("A2").leaking(4.0).since(since(1)),
                ],
                vec![AssetReading::new("A1"), AssetReading::new("A2")],
            ],
        );

        let first = app.tick().await;
        assert_eq!(first.len(), 1);
        let second = app.tick().await;
        assert_eq!(second.len(), 2);
        assert!(app.tick().await.is_empty());

        assert_eq!(
            app.totals,
            Totals {
                ticks: 3,
                readings: 4,
                created: 1,
                resolved: 1,
                failed: 0,
            }
        );
        assert_eq!(app.source_description(), "scripted");
    }

    #[tokio::test]
    async fn failures_are_counted() {
        let clock = Arc::new(ManualClock::at_millis(NOW));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        store.fail(Operation::Create);
        let mut app = app(
            store,
            clock,
            vec![vec![AssetReading::new("A1").leaking(20.0).since(since(6))]],
        );

        app.tick().await;
        assert_eq!(app.totals.failed, 1);
        assert_eq!(app.monitor().active_count(), 0);
    }

    #[tokio::test]
    async fn report_reads_back_records() {
        let clock = Arc::new(ManualClock::at_millis(NOW));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let mut app = app(
            store,
            clock,
            vec![vec![
                AssetReading::new("A1").leaking(20.0).since(since(6)),
                AssetReading::new("A2").leaking(10.0).since(since(12)),
            ]],
        );
        app.tick().await;

        let report = app.report().await.unwrap();
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.active, 2);
        assert_eq!(report.summary.by_severity["critical"], 1);
        assert_eq!(report.summary.active_cost_per_hour, 1.2);
    }
}

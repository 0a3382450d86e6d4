//! The monitor: one tracker per asset, events fanned out to outputs.

use std::collections::HashMap;
use std::sync::Arc;

use leakwatch_types::{AssetReading, LeakEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::output::Output;
use crate::synchronizer::LeakSynchronizer;
use crate::tracker::AssetTracker;

/// Routes readings to per-asset trackers and emits their events.
///
/// # Example
///
/// ```rust
/// use leakwatch_sdk::{LeakMonitor, LeakSynchronizer, Output};
/// use leakwatch_store::MemoryStore;
/// use leakwatch_types::AssetReading;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let sync = Arc::new(LeakSynchronizer::new(Arc::new(MemoryStore::new())));
/// let (output, _events) = Output::channel(64);
/// let mut monitor = LeakMonitor::builder(sync).output(output).build();
///
/// monitor.process(&AssetReading::new("A1").leaking(12.0)).await;
/// assert_eq!(monitor.tracked(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct LeakMonitor {
    sync: Arc<LeakSynchronizer>,
    trackers: HashMap<String, AssetTracker>,
    outputs: Vec<Output>,
}

impl LeakMonitor {
    /// Create a monitor with no outputs.
    pub fn new(sync: Arc<LeakSynchronizer>) -> Self {
        Self {
            sync,
            trackers: HashMap::new(),
            outputs: Vec::new(),
        }
    }

    /// Create a builder for configuring the monitor.
    pub fn builder(sync: Arc<LeakSynchronizer>) -> LeakMonitorBuilder {
        LeakMonitorBuilder::new(sync)
    }

    pub fn synchronizer(&self) -> &LeakSynchronizer {
        &self.sync
    }

    /// Process a single reading and emit the resulting event, if any.
    pub async fn process(&mut self, reading: &AssetReading) -> Option<LeakEvent> {
        let tracker = self
            .trackers
            .entry(reading.asset_id.clone())
            .or_insert_with(|| AssetTracker::new(reading.asset_id.clone()));

        let event = tracker.observe(&self.sync, reading).await?;
        self.emit(&event).await;
        Some(event)
    }

    /// Process readings in order and collect every event produced.
    pub async fn process_batch(&mut self, readings: &[AssetReading]) -> Vec<LeakEvent> {
        let mut events = Vec::new();
        for reading in readings {
            if let Some(event) = self.process(reading).await {
                events.push(event);
            }
        }
        events
    }

    /// Tracker for `asset_id`, if the asset has been seen.
    pub fn tracker(&self, asset_id: &str) -> Option<&AssetTracker> {
        self.trackers.get(asset_id)
    }

    pub fn trackers(&self) -> impl Iterator<Item = &AssetTracker> {
        self.trackers.values()
    }

    /// Number of assets seen so far.
    pub fn tracked(&self) -> usize {
        self.trackers.len()
    }

    /// Number of assets with an open record.
    pub fn active_count(&self) -> usize {
        self.trackers
            .values()
            .filter(|t| t.state().is_active())
            .count()
    }

    async fn emit(&self, event: &LeakEvent) {
        for output in &self.outputs {
            if let Err(e) = output.emit(event).await {
                debug!("Failed to emit event for {}: {}", event.asset_id, e);
            }
        }
    }

    /// Run the monitor as a background task fed by `readings`.
    ///
    /// The task ends when the sender side closes or the returned handle
    /// is stopped. Either way the monitor is handed back on join.
    pub fn spawn(mut self, mut readings: mpsc::Receiver<AssetReading>) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    reading = readings.recv() => {
                        match reading {
                            Some(reading) => {
                                self.process(&reading).await;
                            }
                            None => break,
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            self
        });

        MonitorHandle { stop_tx, task }
    }
}

/// Builder for configuring a LeakMonitor.
#[derive(Debug)]
pub struct LeakMonitorBuilder {
    sync: Arc<LeakSynchronizer>,
    outputs: Vec<Output>,
}

impl LeakMonitorBuilder {
    pub fn new(sync: Arc<LeakSynchronizer>) -> Self {
        Self {
            sync,
            outputs: Vec::new(),
        }
    }

    /// Add an output destination.
    ///
    /// Multiple outputs can be added; events are emitted to all of them.
    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn build(self) -> LeakMonitor {
        LeakMonitor {
            sync: self.sync,
            trackers: HashMap::new(),
            outputs: self.outputs,
        }
    }
}

/// Handle for a monitor running in the background.
#[derive(Debug)]
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<LeakMonitor>,
}

impl MonitorHandle {
    /// Stop the task and take the monitor back.
    ///
    /// Readings still queued in the channel are not processed.
    pub async fn stop(self) -> Option<LeakMonitor> {
        let _ = self.stop_tx.send(true);
        self.task.await.ok()
    }

    /// Wait for the task to drain its channel and exit.
    pub async fn join(self) -> Option<LeakMonitor> {
        let MonitorHandle { stop_tx, task } = self;
        let monitor = task.await.ok();
        drop(stop_tx);
        monitor
    }
}

//! # leakwatch-sdk
//!
//! Leak event synchronization for compressed-air monitoring.
//!
//! Sensor gateways report leaks every few seconds. This crate turns that
//! stream into exactly one persisted record per leak occurrence: leaks are
//! debounced, classified by how long they have been running, priced, and
//! written to a [`DocumentStore`](leakwatch_store::DocumentStore).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use leakwatch_sdk::{LeakMonitor, LeakSynchronizer, Output};
//! use leakwatch_store::MemoryStore;
//! use leakwatch_types::AssetReading;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sync = LeakSynchronizer::builder(Arc::new(MemoryStore::new()))
//!         .collection("leaks")
//!         .build()
//!         .expect("default policy is valid");
//!
//!     let monitor = LeakMonitor::builder(Arc::new(sync))
//!         .output(Output::file("events.jsonl"))
//!         .build();
//!
//!     // Feed readings from your gateway into the channel
//!     let (tx, rx) = tokio::sync::mpsc::channel(256);
//!     let handle = monitor.spawn(rx);
//!
//!     tx.send(AssetReading::new("compressor-1").leaking(18.0)).await.unwrap();
//!
//!     // ... your application runs ...
//!     handle.stop().await;
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`LeakSynchronizer`]: stateless create-or-update of leak records
//! - [`SeverityPolicy`]: duration bands and the hourly cost model
//! - [`AssetTracker`]: lifecycle of one asset across readings
//! - [`LeakMonitor`]: all trackers, plus event [`Output`]s

mod monitor;
mod output;
mod policy;
mod synchronizer;
mod tracker;

pub use monitor::{LeakMonitor, LeakMonitorBuilder, MonitorHandle};
pub use output::{Output, TCP_SEND_TIMEOUT};
pub use policy::{round_cents, PolicyError, SeverityPolicy, ANNUAL_COST_PER_LPM, HOURS_PER_YEAR};
pub use synchronizer::{
    field, LeakSynchronizer, LeakSynchronizerBuilder, StoredLeak, SyncAction, SyncOutcome,
    DEFAULT_COLLECTION,
};
pub use tracker::AssetTracker;

// Re-export types for convenience
pub use leakwatch_types::{
    AssetReading, EpochMillis, LeakEvent, LeakEventKind, LeakObservation, LeakRecord, LeakState,
    LeakStatus, Severity,
};

//! # leakwatch
//!
//! A command-line leak watcher for compressed-air networks, and the
//! library behind it.
//!
//! Gateways report flow, pressure and a leak flag for every asset on a
//! network. leakwatch polls those readings, tracks each asset's leak
//! lifecycle, and keeps exactly one leak record per occurrence in a
//! document store via [`leakwatch_sdk::LeakSynchronizer`].
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   readings   ┌─────────────┐  observations  ┌──────────────────┐
//! │  source    │─────────────▶│ LeakMonitor │───────────────▶│ LeakSynchronizer │
//! │ file | tcp │              │ (trackers)  │                │                  │
//! └────────────┘              └──────┬──────┘                └────────┬─────────┘
//!                                    │ events                         │ records
//!                                    ▼                                ▼
//!                              Output (jsonl, tcp)             DocumentStore
//! ```
//!
//! - **[`source`]**: the [`DataSource`] trait with file polling and TCP stream sources
//! - **[`app`]**: ties one source to one monitor and drives it tick by tick
//! - **[`config`]**: layered settings (defaults, TOML file, `LEAKWATCH_*` environment)
//! - **[`data`]**: duration parsing and the JSON export report
//! - **[`logging`]**: `tracing` subscriber setup
//!
//! ## Usage
//!
//! ```bash
//! # Poll a readings file written by a gateway exporter
//! leakwatch --file readings.json --events events.jsonl
//!
//! # Read newline-delimited readings from a gateway over TCP
//! leakwatch --connect gateway.local:7070 --store rest --endpoint https://docs.example.com
//!
//! # One pass, then write a report
//! leakwatch --file readings.json --once --export report.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use leakwatch::{App, FileSource};
//! use leakwatch_sdk::{LeakMonitor, LeakSynchronizer};
//! use leakwatch_store::MemoryStore;
//!
//! let sync = LeakSynchronizer::new(Arc::new(MemoryStore::new()));
//! let app = App::new(
//!     Box::new(FileSource::new("readings.json")),
//!     LeakMonitor::new(Arc::new(sync)),
//! );
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod logging;
pub mod source;

pub use app::{App, Totals};
pub use config::{Settings, StoreKind};
pub use data::LeakReport;
pub use logging::LogFormat;
pub use source::{DataSource, FileSource, StreamSource};

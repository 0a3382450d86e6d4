//! # leakwatch-types
//!
//! Core types for compressed-air leak tracking. This crate defines the
//! data shared by the synchronizer, the document store adapters and the
//! CLI: device readings, leak observations, persisted leak records, the
//! severity bands and the lifecycle state machine.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature to read and write
//!   the camelCase document format used by the hosted store
//! - **Explicit lifecycle**: [`LeakState`] replaces nullable-id-plus-status bookkeeping
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: Serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use leakwatch_types::{LeakState, Severity};
//!
//! let state = LeakState::NotReported.activate("rec-1").unwrap();
//! assert_eq!(state.active_record(), Some("rec-1"));
//!
//! let state = state.resolve().unwrap();
//! assert!(!state.is_active());
//! assert!(Severity::Critical > Severity::Moderate);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod event;
#[cfg(feature = "serde")]
mod measure;
mod observation;
mod record;
mod severity;
mod state;
mod timestamp;

pub use event::*;
pub use observation::*;
pub use record::*;
pub use severity::*;
pub use state::*;
pub use timestamp::*;

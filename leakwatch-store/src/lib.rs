//! # leakwatch-store
//!
//! The persistence port used by the leak synchronizer, plus adapters.
//!
//! The synchronizer never talks to a database client directly. It is
//! handed a [`DocumentStore`]: a small create/query/get/update contract over
//! named collections of JSON documents, with a server-side notion of "now".
//!
//! ## Adapters
//!
//! - [`MemoryStore`] - in-process store with an atomic uniqueness guard,
//!   operation counters and fault injection. Used by tests and the CLI's
//!   `memory` mode.
//! - **REST** (`rest` feature) - [`rest::RestStore`] speaks JSON over HTTP
//!   to a hosted document API.
//!
//! ## Quick Start
//!
//! ```rust
//! use leakwatch_store::{DocumentStore, Filter, MemoryStore};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//!
//! let fields = json!({"assetId": "A1", "status": "active"});
//! let id = store
//!     .create_record("leaks", fields.as_object().cloned().unwrap())
//!     .await?;
//!
//! let found = store
//!     .query_records("leaks", &[Filter::equals("assetId", "A1")])
//!     .await?;
//! assert_eq!(found[0].id, id);
//! # Ok::<(), leakwatch_store::StoreError>(())
//! # }).unwrap();
//! ```

mod clock;
mod document;
pub mod error;
pub mod memory;

#[cfg(feature = "rest")]
pub mod rest;

use async_trait::async_trait;
use leakwatch_types::EpochMillis;

pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{matches_all, to_fields, CreateOutcome, Document, Fields, Filter};
pub use error::StoreError;
pub use memory::{MemoryStore, Operation, OperationCounts};

/// A collection-oriented document database.
///
/// Every method maps to a single round trip against the backing store.
/// Failures are returned as-is; retry policy belongs to the caller.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Insert a document and return its generated identifier.
    async fn create_record(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// All documents in `collection` matching every filter.
    async fn query_records(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError>;

    /// A single document by identifier.
    async fn get_record(&self, collection: &str, id: &str)
        -> Result<Option<Document>, StoreError>;

    /// Merge `fields` into an existing document.
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    /// The store's notion of the current time, used for `createdAt`,
    /// `lastUpdate` and `endTime` stamps.
    fn now(&self) -> EpochMillis;

    /// Create a document unless one matching `guard` already exists.
    ///
    /// The default implementation queries and then creates. That is best
    /// effort only: two concurrent callers can both see no match and both
    /// create. Stores that can enforce uniqueness (a unique index or a
    /// conditional write) should override this.
    async fn create_unique(
        &self,
        collection: &str,
        guard: &[Filter],
        fields: Fields,
    ) -> Result<CreateOutcome, StoreError> {
        let existing = self.query_records(collection, guard).await?;
        if let Some(doc) = existing.into_iter().next() {
            return Ok(CreateOutcome::Existing(doc.id));
        }
        let id = self.create_record(collection, fields).await?;
        Ok(CreateOutcome::Created(id))
    }
}

//! In-memory document store.
//!
//! This module provides [`MemoryStore`], an in-process implementation of
//! [`DocumentStore`] suitable for tests, local runs and demos.
//!
//! ## Limitations
//!
//! - **No persistence**: Everything is lost when the process exits
//! - **Single-process only**: State is not shared across process boundaries

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use leakwatch_types::EpochMillis;
use parking_lot::RwLock;

use crate::{
    matches_all, Clock, CreateOutcome, Document, DocumentStore, Fields, Filter, StoreError,
    SystemClock,
};

/// A store operation, for fault injection and accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Create,
    Query,
    Get,
    Update,
}

/// How many times each operation has been called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub creates: u64,
    pub queries: u64,
    pub gets: u64,
    pub updates: u64,
}

impl OperationCounts {
    pub fn reads(&self) -> u64 {
        self.queries + self.gets
    }

    pub fn writes(&self) -> u64 {
        self.creates + self.updates
    }

    pub fn total(&self) -> u64 {
        self.reads() + self.writes()
    }
}

#[derive(Debug, Default)]
struct Counters {
    creates: AtomicU64,
    queries: AtomicU64,
    gets: AtomicU64,
    updates: AtomicU64,
}

impl Counters {
    fn bump(&self, op: Operation) {
        let counter = match op {
            Operation::Create => &self.creates,
            Operation::Query => &self.queries,
            Operation::Get => &self.gets,
            Operation::Update => &self.updates,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> OperationCounts {
        OperationCounts {
            creates: self.creates.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
        }
    }
}

type Collection = BTreeMap<String, Fields>;

/// Thread-safe in-memory document store.
///
/// `create_unique` runs its check and insert under a single write lock,
/// so the guard is a real uniqueness constraint here rather than the best
/// effort query-then-create of the default implementation.
///
/// # Example
///
/// ```rust
/// use leakwatch_store::{ManualClock, MemoryStore, Operation};
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::at_millis(0));
/// let store = MemoryStore::with_clock(clock);
///
/// // Make every update fail until healed
/// store.fail(Operation::Update);
/// store.heal(Operation::Update);
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Collection>>,
    clock: Arc<dyn Clock>,
    failing: RwLock<BTreeSet<Operation>>,
    counters: Counters,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            clock,
            failing: RwLock::new(BTreeSet::new()),
            counters: Counters::default(),
        }
    }

    /// Make every subsequent call of `op` fail with [`StoreError::Unavailable`].
    pub fn fail(&self, op: Operation) {
        self.failing.write().insert(op);
    }

    /// Stop failing `op`.
    pub fn heal(&self, op: Operation) {
        self.failing.write().remove(&op);
    }

    /// Calls made so far, including failed ones.
    pub fn counts(&self) -> OperationCounts {
        self.counters.snapshot()
    }

    /// Every document in `collection`, ordered by identifier.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn enter(&self, op: Operation) -> Result<(), StoreError> {
        self.counters.bump(op);
        if self.failing.read().contains(&op) {
            return Err(StoreError::Unavailable(format!("{:?} disabled", op)));
        }
        Ok(())
    }

    fn next_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn matching(collection: Option<&Collection>, filters: &[Filter]) -> Vec<Document> {
        collection
            .into_iter()
            .flat_map(|docs| docs.iter())
            .filter(|(_, fields)| matches_all(filters, fields))
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_record(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.enter(Operation::Create)?;
        let id = Self::next_id();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn query_records(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        self.enter(Operation::Query)?;
        let collections = self.collections.read();
        Ok(Self::matching(collections.get(collection), filters))
    }

    async fn get_record(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.enter(Operation::Get)?;
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.enter(Operation::Update)?;
        let mut collections = self.collections.write();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.extend(fields);
        Ok(())
    }

    fn now(&self) -> EpochMillis {
        self.clock.now()
    }

    async fn create_unique(
        &self,
        collection: &str,
        guard: &[Filter],
        fields: Fields,
    ) -> Result<CreateOutcome, StoreError> {
        self.enter(Operation::Query)?;
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some((id, _)) = docs.iter().find(|(_, f)| matches_all(guard, f)) {
            return Ok(CreateOutcome::Existing(id.clone()));
        }

        self.enter(Operation::Create)?;
        let id = Self::next_id();
        docs.insert(id.clone(), fields);
        Ok(CreateOutcome::Created(id))
    }
}

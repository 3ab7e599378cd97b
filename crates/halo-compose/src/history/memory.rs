//! In-memory storage engine.
//!
//! Behaves like a browser object store for a single page session: a
//! key generator that never reuses ids, transactions that apply
//! atomically on commit, and at most one read-write transaction at a
//! time. Clones share the same underlying data, so a test can keep a
//! handle and inspect or sabotage the engine while a store owns it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use super::engine::{Database, EngineError, Schema, StorageEngine, Transaction, TxMode};
use super::{HistoryRecord, RecordId, StoredRecord};

#[derive(Debug, Default, Clone)]
struct Collection {
    next_id: u64,
    records: BTreeMap<RecordId, StoredRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    collection: Option<Collection>,
    open_count: usize,
    schema_creations: usize,
    writer_active: bool,
    open_error: Option<String>,
    commit_error: Option<String>,
    open_delay: usize,
}

/// An engine keeping records in memory for the lifetime of the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine(Rc<RefCell<Inner>>);

impl MemoryEngine {
    /// Create an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make [`open`](StorageEngine::open) yield to the executor `polls`
    /// times before completing, as a real engine would while waiting on
    /// disk.
    #[must_use]
    pub fn with_open_delay(self, polls: usize) -> Self {
        self.0.borrow_mut().open_delay = polls;
        self
    }

    /// Make every subsequent open fail with `reason`.
    pub fn fail_open(&self, reason: impl Into<String>) {
        self.0.borrow_mut().open_error = Some(reason.into());
    }

    /// Make every subsequent commit fail with `reason`.
    pub fn fail_commits(&self, reason: impl Into<String>) {
        self.0.borrow_mut().commit_error = Some(reason.into());
    }

    /// Clear any injected failures.
    pub fn heal(&self) {
        let mut inner = self.0.borrow_mut();
        inner.open_error = None;
        inner.commit_error = None;
    }

    /// Number of successful opens.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.0.borrow().open_count
    }

    /// Number of times the record collection was created.
    #[must_use]
    pub fn schema_creations(&self) -> usize {
        self.0.borrow().schema_creations
    }

    /// Number of committed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0
            .borrow()
            .collection
            .as_ref()
            .map_or(0, |c| c.records.len())
    }

    /// Whether there are no committed records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageEngine for MemoryEngine {
    type Database = MemoryDatabase;

    async fn open(&self, schema: &Schema) -> Result<MemoryDatabase, EngineError> {
        let delay = self.0.borrow().open_delay;
        for _ in 0..delay {
            YieldNow(false).await;
        }

        let mut inner = self.0.borrow_mut();
        if let Some(reason) = &inner.open_error {
            return Err(EngineError::new(reason.clone()));
        }
        if inner.collection.is_none() {
            tracing::debug!(collection = schema.collection, "creating record collection");
            inner.collection = Some(Collection {
                next_id: 1,
                records: BTreeMap::new(),
            });
            inner.schema_creations += 1;
        }
        inner.open_count += 1;
        Ok(MemoryDatabase(Rc::clone(&self.0)))
    }
}

/// An open [`MemoryEngine`] database.
#[derive(Debug)]
pub struct MemoryDatabase(Rc<RefCell<Inner>>);

impl Database for MemoryDatabase {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn transaction(&self, mode: TxMode) -> Result<MemoryTransaction<'_>, EngineError> {
        let mut inner = self.0.borrow_mut();
        let Some(collection) = inner.collection.clone() else {
            return Err(EngineError::new("record collection does not exist"));
        };
        if mode == TxMode::ReadWrite {
            if inner.writer_active {
                return Err(EngineError::new("another read-write transaction is active"));
            }
            inner.writer_active = true;
        }
        Ok(MemoryTransaction {
            db: self,
            mode,
            working: collection,
            finished: false,
        })
    }
}

/// A transaction over a private copy of the collection, published on
/// commit.
#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    db: &'a MemoryDatabase,
    mode: TxMode,
    working: Collection,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn writable(&self) -> Result<(), EngineError> {
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(EngineError::new("transaction is read-only")),
        }
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            if self.mode == TxMode::ReadWrite {
                self.db.0.borrow_mut().writer_active = false;
            }
        }
    }
}

impl Transaction for MemoryTransaction<'_> {
    async fn add(&mut self, record: StoredRecord) -> Result<RecordId, EngineError> {
        self.writable()?;
        let id = RecordId(self.working.next_id);
        self.working.next_id += 1;
        self.working.records.insert(id, record);
        Ok(id)
    }

    async fn keys(&mut self) -> Result<Vec<RecordId>, EngineError> {
        Ok(self.working.records.keys().copied().collect())
    }

    async fn records(&mut self) -> Result<Vec<HistoryRecord>, EngineError> {
        Ok(self
            .working
            .records
            .iter()
            .map(|(id, r)| r.clone().with_id(*id))
            .collect())
    }

    async fn get(&mut self, id: RecordId) -> Result<Option<HistoryRecord>, EngineError> {
        Ok(self.working.records.get(&id).map(|r| r.clone().with_id(id)))
    }

    async fn delete(&mut self, id: RecordId) -> Result<(), EngineError> {
        self.writable()?;
        self.working.records.remove(&id);
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), EngineError> {
        self.writable()?;
        self.working.records.clear();
        Ok(())
    }

    async fn commit(mut self) -> Result<(), EngineError> {
        let result = {
            let mut inner = self.db.0.borrow_mut();
            if let Some(reason) = &inner.commit_error {
                Err(EngineError::new(reason.clone()))
            } else {
                if self.mode == TxMode::ReadWrite {
                    inner.collection = Some(std::mem::take(&mut self.working));
                }
                Ok(())
            }
        };
        self.finish();
        result
    }
}

impl Drop for MemoryTransaction<'_> {
    // Dropping without commit aborts: the working copy is discarded.
    fn drop(&mut self) {
        self.finish();
    }
}

/// Returns `Pending` once (after scheduling a wake-up), then `Ready`.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::types::EncodedImage;

    fn stored(ts: u64) -> StoredRecord {
        StoredRecord {
            thumbnail: EncodedImage::new(vec![1]),
            full: EncodedImage::new(vec![2]),
            timestamp: ts,
        }
    }

    #[test]
    fn reopening_keeps_records_and_schema() {
        let engine = MemoryEngine::new();
        let db = block_on(engine.open(&Schema::HISTORY)).unwrap();
        let mut tx = db.transaction(TxMode::ReadWrite).unwrap();
        block_on(tx.add(stored(1))).unwrap();
        block_on(tx.commit()).unwrap();

        let db2 = block_on(engine.open(&Schema::HISTORY)).unwrap();
        let mut tx = db2.transaction(TxMode::ReadOnly).unwrap();
        assert_eq!(block_on(tx.keys()).unwrap(), vec![RecordId(1)]);
        assert_eq!(engine.schema_creations(), 1);
        assert_eq!(engine.open_count(), 2);
    }

    #[test]
    fn dropped_transaction_is_aborted() {
        let engine = MemoryEngine::new();
        let db = block_on(engine.open(&Schema::HISTORY)).unwrap();
        {
            let mut tx = db.transaction(TxMode::ReadWrite).unwrap();
            block_on(tx.add(stored(1))).unwrap();
        }
        assert!(engine.is_empty());

        // The aborted insert did not consume an id either.
        let mut tx = db.transaction(TxMode::ReadWrite).unwrap();
        assert_eq!(block_on(tx.add(stored(2))).unwrap(), RecordId(1));
    }

    #[test]
    fn uncommitted_writes_are_invisible_to_readers() {
        let engine = MemoryEngine::new();
        let db = block_on(engine.open(&Schema::HISTORY)).unwrap();
        let mut writer = db.transaction(TxMode::ReadWrite).unwrap();
        block_on(writer.add(stored(1))).unwrap();

        let mut reader = db.transaction(TxMode::ReadOnly).unwrap();
        assert!(block_on(reader.records()).unwrap().is_empty());

        block_on(writer.commit()).unwrap();
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn only_one_writer_at_a_time() {
        let engine = MemoryEngine::new();
        let db = block_on(engine.open(&Schema::HISTORY)).unwrap();
        let first = db.transaction(TxMode::ReadWrite).unwrap();
        assert!(db.transaction(TxMode::ReadWrite).is_err());
        drop(first);
        assert!(db.transaction(TxMode::ReadWrite).is_ok());
    }

    #[test]
    fn read_only_rejects_writes() {
        let engine = MemoryEngine::new();
        let db = block_on(engine.open(&Schema::HISTORY)).unwrap();
        let mut tx = db.transaction(TxMode::ReadOnly).unwrap();
        assert!(block_on(tx.add(stored(1))).is_err());
        assert!(block_on(tx.delete(RecordId(1))).is_err());
    }

    #[test]
    fn open_delay_still_completes() {
        let engine = MemoryEngine::new().with_open_delay(5);
        assert!(block_on(engine.open(&Schema::HISTORY)).is_ok());
    }
}

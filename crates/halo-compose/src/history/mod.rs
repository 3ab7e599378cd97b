//! Capacity-bounded history of saved composites.
//!
//! [`HistoryStore`] sits on top of a [`StorageEngine`] and adds the
//! policy: lazy initialization shared by concurrent callers, timestamping,
//! and eviction of the oldest record once the store holds more than its
//! capacity.
//!
//! # Lifecycle
//!
//! The store starts [`StorePhase::Uninitialized`]. The first operation
//! opens the engine ([`StorePhase::Initializing`]); operations issued
//! meanwhile wait for that same open rather than starting their own.
//! A successful open moves the store to [`StorePhase::Ready`]. A failed
//! open is final for the lifetime of the store: every later operation
//! returns [`StoreError::StorageUnavailable`] without retrying.

mod clock;
pub mod engine;
mod memory;

use std::fmt;
use std::rc::Rc;

use futures::lock::Mutex;
use serde::{Deserialize, Serialize};

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Database, EngineError, Schema, StorageEngine, Transaction, TxMode};
pub use memory::MemoryEngine;

use crate::config::MAX_HISTORY_ITEMS;
use crate::types::EncodedImage;

/// Store-assigned record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A composite to be saved; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Gallery thumbnail.
    pub thumbnail: EncodedImage,
    /// Full-resolution composite.
    pub full: EncodedImage,
}

/// A record as handed to the engine for insertion: everything but the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Gallery thumbnail.
    pub thumbnail: EncodedImage,
    /// Full-resolution composite.
    pub full: EncodedImage,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
}

impl StoredRecord {
    /// Attach the id the engine assigned.
    #[must_use]
    pub fn with_id(self, id: RecordId) -> HistoryRecord {
        HistoryRecord {
            id,
            thumbnail: self.thumbnail,
            full: self.full,
            timestamp: self.timestamp,
        }
    }
}

/// A persisted composite. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unique key.
    pub id: RecordId,
    /// Gallery thumbnail.
    pub thumbnail: EncodedImage,
    /// Full-resolution composite.
    pub full: EncodedImage,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
}

/// What a successful [`HistoryStore::save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Saved {
    /// Id of the new record.
    pub id: RecordId,
    /// Timestamp assigned to the new record.
    pub timestamp: u64,
    /// Id of the record evicted to stay within capacity, if any.
    pub evicted: Option<RecordId>,
}

/// Errors surfaced by the history store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The storage engine could not be opened. History is unavailable
    /// for the rest of the session.
    #[error("history storage is unavailable: {0}")]
    StorageUnavailable(String),

    /// A read or write failed after the store was opened. Nothing from
    /// the failed transaction was persisted.
    #[error("history transaction failed: {0}")]
    Transaction(String),
}

impl From<EngineError> for StoreError {
    fn from(err: EngineError) -> Self {
        Self::Transaction(err.0)
    }
}

/// Observable lifecycle state of a [`HistoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorePhase {
    /// No operation has touched the engine yet.
    Uninitialized,
    /// The engine is being opened.
    Initializing,
    /// The engine is open.
    Ready,
    /// Opening failed; the reason is kept for the session.
    Failed(String),
}

enum State<D> {
    Uninitialized,
    Ready(Rc<D>),
    Failed(String),
}

/// Async, capacity-bounded store of [`HistoryRecord`]s.
///
/// Saves are expected to be issued one at a time by the caller; the
/// store does not queue them.
pub struct HistoryStore<E: StorageEngine, C = SystemClock> {
    engine: E,
    clock: C,
    schema: Schema,
    capacity: usize,
    // Held for the whole open, so concurrent callers queue behind it.
    state: Mutex<State<E::Database>>,
}

impl<E: StorageEngine> HistoryStore<E> {
    /// A store over `engine` with the default schema, capacity
    /// ([`MAX_HISTORY_ITEMS`]) and wall clock.
    pub fn new(engine: E) -> Self {
        Self::with_clock(engine, SystemClock)
    }
}

impl<E: StorageEngine, C: Clock> HistoryStore<E, C> {
    /// A store using `clock` for record timestamps.
    pub fn with_clock(engine: E, clock: C) -> Self {
        Self {
            engine,
            clock,
            schema: Schema::HISTORY,
            capacity: MAX_HISTORY_ITEMS,
            state: Mutex::new(State::Uninitialized),
        }
    }

    /// Override the record cap. A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Override the schema (database name, version, collection).
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Maximum number of records kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The underlying engine.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> StorePhase {
        let Some(state) = self.state.try_lock() else {
            return StorePhase::Initializing;
        };
        match &*state {
            State::Uninitialized => StorePhase::Uninitialized,
            State::Ready(_) => StorePhase::Ready,
            State::Failed(reason) => StorePhase::Failed(reason.clone()),
        }
    }

    /// Open the engine if that has not happened yet.
    ///
    /// Called implicitly by every operation; calling it up front lets
    /// the app surface [`StoreError::StorageUnavailable`] at startup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the engine cannot
    /// be opened, now or on an earlier attempt.
    #[allow(clippy::future_not_send)] // single-threaded; engine handles are !Send
    pub async fn init(&self) -> Result<(), StoreError> {
        self.database().await.map(drop)
    }

    #[allow(clippy::future_not_send)]
    async fn database(&self) -> Result<Rc<E::Database>, StoreError> {
        let mut state = self.state.lock().await;
        match &*state {
            State::Ready(db) => return Ok(Rc::clone(db)),
            State::Failed(reason) => return Err(StoreError::StorageUnavailable(reason.clone())),
            State::Uninitialized => {}
        }

        tracing::debug!(
            name = self.schema.name,
            version = self.schema.version,
            "opening history storage"
        );
        match self.engine.open(&self.schema).await {
            Ok(db) => {
                let db = Rc::new(db);
                *state = State::Ready(Rc::clone(&db));
                tracing::info!(name = self.schema.name, "history storage ready");
                Ok(db)
            }
            Err(err) => {
                tracing::warn!(error = %err, "history storage unavailable");
                *state = State::Failed(err.0.clone());
                Err(StoreError::StorageUnavailable(err.0))
            }
        }
    }

    /// Persist a composite.
    ///
    /// The insert and any eviction happen in one read-write transaction;
    /// the returned future resolves only after it commits. If the store
    /// now holds more than [`capacity`](Self::capacity) records, exactly
    /// one is removed: the one with the smallest timestamp (smallest id
    /// on ties).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the engine cannot be
    /// opened, or [`StoreError::Transaction`] if any request or the
    /// commit fails, in which case nothing was persisted.
    #[allow(clippy::future_not_send)]
    pub async fn save(&self, record: NewRecord) -> Result<Saved, StoreError> {
        let db = self.database().await?;
        let mut tx = db.transaction(TxMode::ReadWrite)?;

        let timestamp = self.clock.now_millis();
        let id = tx
            .add(StoredRecord {
                thumbnail: record.thumbnail,
                full: record.full,
                timestamp,
            })
            .await?;

        let keys = tx.keys().await?;
        let mut evicted = None;
        if keys.len() > self.capacity {
            let records = tx.records().await?;
            if let Some(oldest) = oldest(&records) {
                tx.delete(oldest).await?;
                evicted = Some(oldest);
            }
        }

        tx.commit().await?;

        match evicted {
            Some(old) => tracing::info!(%id, evicted = %old, "saved composite, evicted oldest"),
            None => tracing::info!(%id, count = keys.len(), "saved composite"),
        }
        Ok(Saved {
            id,
            timestamp,
            evicted,
        })
    }

    /// All records, most recent first (timestamp descending, id
    /// descending on ties). Never modifies the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the engine cannot be
    /// opened, or [`StoreError::Transaction`] if the read fails.
    #[allow(clippy::future_not_send)]
    pub async fn list(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let db = self.database().await?;
        let mut tx = db.transaction(TxMode::ReadOnly)?;
        let mut records = tx.records().await?;
        tx.commit().await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Look up one record.
    ///
    /// # Errors
    ///
    /// As for [`list`](Self::list).
    #[allow(clippy::future_not_send)]
    pub async fn get(&self, id: RecordId) -> Result<Option<HistoryRecord>, StoreError> {
        let db = self.database().await?;
        let mut tx = db.transaction(TxMode::ReadOnly)?;
        let record = tx.get(id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// As for [`list`](Self::list).
    #[allow(clippy::future_not_send)]
    pub async fn count(&self) -> Result<usize, StoreError> {
        let db = self.database().await?;
        let mut tx = db.transaction(TxMode::ReadOnly)?;
        let keys = tx.keys().await?;
        tx.commit().await?;
        Ok(keys.len())
    }

    /// Delete every record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the engine cannot be
    /// opened, or [`StoreError::Transaction`] if the clear fails.
    #[allow(clippy::future_not_send)]
    pub async fn clear(&self) -> Result<(), StoreError> {
        let db = self.database().await?;
        let mut tx = db.transaction(TxMode::ReadWrite)?;
        tx.clear().await?;
        tx.commit().await?;
        tracing::info!("history cleared");
        Ok(())
    }
}

/// Id of the record to evict: smallest timestamp, smallest id on ties.
fn oldest(records: &[HistoryRecord]) -> Option<RecordId> {
    records
        .iter()
        .min_by_key(|r| (r.timestamp, r.id))
        .map(|r| r.id)
}

fn sort_newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    fn record(tag: u8) -> NewRecord {
        NewRecord {
            thumbnail: EncodedImage::new(vec![tag, 0, 1]),
            full: EncodedImage::new(vec![tag; 64]),
        }
    }

    fn store(clock: &ManualClock) -> HistoryStore<MemoryEngine, &ManualClock> {
        HistoryStore::with_clock(MemoryEngine::new(), clock)
    }

    #[test]
    fn starts_uninitialized_and_opens_lazily() {
        let clock = ManualClock::starting_at(1);
        let store = store(&clock);
        assert_eq!(store.phase(), StorePhase::Uninitialized);
        assert_eq!(store.engine().open_count(), 0);

        let listed = block_on(store.list()).unwrap();
        assert!(listed.is_empty());
        assert_eq!(store.phase(), StorePhase::Ready);
        assert_eq!(store.engine().open_count(), 1);
    }

    #[test]
    fn empty_store_lists_nothing() {
        let clock = ManualClock::starting_at(1);
        let store = store(&clock);
        assert_eq!(block_on(store.list()).unwrap(), Vec::new());
        assert_eq!(block_on(store.count()).unwrap(), 0);
    }

    #[test]
    fn capacity_law_holds_for_every_prefix() {
        for n in 0..=20_u8 {
            let clock = ManualClock::starting_at(1_000);
            let store = store(&clock);
            for i in 0..n {
                block_on(store.save(record(i))).unwrap();
                clock.advance(1);
            }
            let listed = block_on(store.list()).unwrap();
            assert_eq!(listed.len(), usize::from(n).min(MAX_HISTORY_ITEMS), "n = {n}");

            // Retained are the most recent ones.
            let expected: Vec<u8> = (0..n).rev().take(MAX_HISTORY_ITEMS).collect();
            let actual: Vec<u8> = listed.iter().map(|r| r.thumbnail.as_bytes()[0]).collect();
            assert_eq!(actual, expected, "n = {n}");
        }
    }

    #[test]
    fn thirteenth_save_evicts_the_first() {
        let clock = ManualClock::starting_at(5_000);
        let store = store(&clock);
        let mut ids = Vec::new();
        for i in 1..=13 {
            let saved = block_on(store.save(record(i))).unwrap();
            ids.push(saved.id);
            if i < 13 {
                assert_eq!(saved.evicted, None);
            } else {
                assert_eq!(saved.evicted, Some(ids[0]));
            }
            clock.advance(10);
        }

        let listed = block_on(store.list()).unwrap();
        let tags: Vec<u8> = listed.iter().map(|r| r.thumbnail.as_bytes()[0]).collect();
        assert_eq!(tags, (2..=13).rev().collect::<Vec<u8>>());
    }

    #[test]
    fn eviction_goes_by_timestamp_not_id() {
        let clock = ManualClock::starting_at(100);
        let store = store(&clock).with_capacity(2);

        let first = block_on(store.save(record(1))).unwrap();
        clock.set(50); // clock moved backwards: record 2 is "older"
        let second = block_on(store.save(record(2))).unwrap();
        clock.set(200);
        let third = block_on(store.save(record(3))).unwrap();

        assert_eq!(third.evicted, Some(second.id));
        let ids: Vec<_> = block_on(store.list()).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
    }

    #[test]
    fn timestamp_ties_evict_smallest_id() {
        let clock = ManualClock::starting_at(7);
        let store = store(&clock).with_capacity(2);
        let a = block_on(store.save(record(1))).unwrap();
        let b = block_on(store.save(record(2))).unwrap();
        let c = block_on(store.save(record(3))).unwrap();
        assert_eq!(c.evicted, Some(a.id));

        // Ties list the newest id first.
        let ids: Vec<_> = block_on(store.list()).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, b.id]);
    }

    #[test]
    fn list_is_sorted_descending_and_idempotent() {
        let clock = ManualClock::starting_at(0);
        let store = store(&clock);
        for (i, t) in [30_u64, 10, 20, 40].into_iter().enumerate() {
            clock.set(t);
            block_on(store.save(record(u8::try_from(i).unwrap()))).unwrap();
        }
        let first = block_on(store.list()).unwrap();
        let stamps: Vec<u64> = first.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![40, 30, 20, 10]);

        let second = block_on(store.list()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn saved_bytes_round_trip_unchanged() {
        let clock = ManualClock::starting_at(9);
        let store = store(&clock);
        let original = NewRecord {
            thumbnail: EncodedImage::new((0..=255).collect()),
            full: EncodedImage::new((0..4096_u32).map(|v| (v % 251) as u8).collect()),
        };
        let saved = block_on(store.save(original.clone())).unwrap();

        let listed = block_on(store.list()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, saved.id);
        assert_eq!(listed[0].thumbnail, original.thumbnail);
        assert_eq!(listed[0].full, original.full);
        assert_eq!(listed[0].timestamp, 9);

        let fetched = block_on(store.get(saved.id)).unwrap().unwrap();
        assert_eq!(fetched, listed[0]);
        assert_eq!(block_on(store.get(RecordId(999))).unwrap(), None);
    }

    #[test]
    fn open_failure_is_sticky() {
        let clock = ManualClock::starting_at(0);
        let engine = MemoryEngine::new();
        engine.fail_open("quota exceeded");
        let store = HistoryStore::with_clock(engine.clone(), &clock);

        let err = block_on(store.save(record(1))).unwrap_err();
        assert_eq!(err, StoreError::StorageUnavailable("quota exceeded".into()));
        assert_eq!(
            store.phase(),
            StorePhase::Failed("quota exceeded".to_owned())
        );

        // Healing the engine does not bring the session back.
        engine.heal();
        assert!(matches!(
            block_on(store.list()),
            Err(StoreError::StorageUnavailable(_))
        ));
        assert_eq!(engine.open_count(), 0);
    }

    #[test]
    fn failed_commit_persists_nothing() {
        let clock = ManualClock::starting_at(0);
        let engine = MemoryEngine::new();
        let store = HistoryStore::with_clock(engine.clone(), &clock).with_capacity(1);
        let kept = block_on(store.save(record(1))).unwrap();

        engine.fail_commits("disk full");
        clock.advance(1);
        let err = block_on(store.save(record(2))).unwrap_err();
        assert_eq!(err, StoreError::Transaction("disk full".into()));

        engine.heal();
        let listed = block_on(store.list()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
    }

    #[test]
    fn concurrent_callers_share_one_open() {
        let clock = ManualClock::starting_at(0);
        let engine = MemoryEngine::new().with_open_delay(3);
        let store = HistoryStore::with_clock(engine, &clock);

        let (a, b, c) = block_on(async {
            futures::join!(store.list(), store.count(), store.init())
        });
        assert!(a.unwrap().is_empty());
        assert_eq!(b.unwrap(), 0);
        c.unwrap();
        assert_eq!(store.engine().open_count(), 1);
        assert_eq!(store.engine().schema_creations(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let clock = ManualClock::starting_at(0);
        let store = store(&clock);
        for i in 0..3 {
            block_on(store.save(record(i))).unwrap();
        }
        block_on(store.clear()).unwrap();
        assert_eq!(block_on(store.count()).unwrap(), 0);
    }

    #[test]
    fn ids_are_not_reused_after_eviction() {
        let clock = ManualClock::starting_at(0);
        let store = store(&clock).with_capacity(1);
        let mut last = None;
        for i in 0..5 {
            clock.advance(1);
            let saved = block_on(store.save(record(i))).unwrap();
            if let Some(prev) = last {
                assert!(saved.id > prev);
            }
            last = Some(saved.id);
        }
    }
}

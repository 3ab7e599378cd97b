//! Storage engine seam for the history store.
//!
//! The traits model an object-store database with a single record
//! collection keyed by an auto-incrementing id: open a database, begin a
//! transaction, issue requests, commit. Engines wrap whatever callback or
//! blocking API they sit on into these futures while preserving its
//! commit and error semantics:
//!
//! - Nothing a transaction does is visible to other transactions until
//!   [`Transaction::commit`] resolves.
//! - Dropping a transaction without committing aborts it.
//! - Ids handed out by [`Transaction::add`] are unique and increasing,
//!   and never reused after a delete.
//!
//! Everything here is single-threaded: futures are not `Send`, which
//! matches the browser main thread the primary engine runs on.

use crate::config::{DB_NAME, DB_VERSION, STORE_NAME};

use super::{HistoryRecord, RecordId, StoredRecord};

/// Identifies the database and its record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Database name.
    pub name: &'static str,
    /// Schema version; bumping it triggers an upgrade on open.
    pub version: u32,
    /// Name of the record collection.
    pub collection: &'static str,
}

impl Schema {
    /// The schema used by the avatar history.
    pub const HISTORY: Self = Self {
        name: DB_NAME,
        version: DB_VERSION,
        collection: STORE_NAME,
    };
}

/// Whether a transaction may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Reads only.
    ReadOnly,
    /// Reads and writes.
    ReadWrite,
}

/// An error reported by a storage engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    /// Build an error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Opens databases, creating the record collection when it is missing.
#[allow(async_fn_in_trait)] // single-threaded engines; `Send` bounds are not wanted
pub trait StorageEngine {
    /// The open database handle.
    type Database: Database;

    /// Open (or create) the database described by `schema`.
    ///
    /// Must be idempotent: opening an existing database leaves its
    /// collection and records untouched.
    async fn open(&self, schema: &Schema) -> Result<Self::Database, EngineError>;
}

/// An open database.
pub trait Database {
    /// A transaction borrowing this database.
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    /// Begin a transaction over the record collection.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine refuses to start one
    /// (for example because the connection was closed).
    fn transaction(&self, mode: TxMode) -> Result<Self::Transaction<'_>, EngineError>;
}

/// A unit of work against the record collection.
#[allow(async_fn_in_trait)] // single-threaded engines; `Send` bounds are not wanted
pub trait Transaction {
    /// Insert a record, returning its newly assigned id.
    async fn add(&mut self, record: StoredRecord) -> Result<RecordId, EngineError>;

    /// All keys currently in the collection, ascending.
    async fn keys(&mut self) -> Result<Vec<RecordId>, EngineError>;

    /// All records currently in the collection, in key order.
    async fn records(&mut self) -> Result<Vec<HistoryRecord>, EngineError>;

    /// A single record by id.
    async fn get(&mut self, id: RecordId) -> Result<Option<HistoryRecord>, EngineError>;

    /// Delete a record by id. Deleting a missing id is not an error.
    async fn delete(&mut self, id: RecordId) -> Result<(), EngineError>;

    /// Delete every record.
    async fn clear(&mut self) -> Result<(), EngineError>;

    /// Resolve once every request in this transaction is durable.
    async fn commit(self) -> Result<(), EngineError>;
}

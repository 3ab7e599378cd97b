//! Directory-backed storage engine for the history store.
//!
//! Layout under the history directory:
//!
//! ```text
//! index.json        { "version": 1, "next_id": 4, "records": [{ "id": 3, "timestamp": ... }] }
//! 3.png             full-resolution composite
//! 3.thumb.png       gallery thumbnail
//! ```
//!
//! A transaction works on a copy of the index read when it begins.
//! Commit writes the new images first, then replaces `index.json`
//! atomically (write to a temporary file and rename), and only then
//! removes the files of deleted records. A crash at any point therefore
//! leaves an index that refers only to complete files; at worst some
//! orphaned PNGs remain.
//!
//! One process at a time: there is no cross-process locking.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use halo_compose::EncodedImage;
use halo_compose::history::{
    Database, EngineError, HistoryRecord, RecordId, Schema, StorageEngine, StoredRecord,
    Transaction, TxMode,
};
use serde::{Deserialize, Serialize};

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Index {
    version: u32,
    next_id: u64,
    records: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct IndexEntry {
    id: RecordId,
    timestamp: u64,
}

/// Keeps history records as PNG files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryEngine {
    root: PathBuf,
}

impl DirectoryEngine {
    /// An engine rooted at `root`. Nothing touches the disk until the
    /// store opens it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The history directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StorageEngine for DirectoryEngine {
    type Database = DirectoryDb;

    async fn open(&self, schema: &Schema) -> Result<DirectoryDb, EngineError> {
        fs::create_dir_all(&self.root).map_err(|e| io_error("create", &self.root, &e))?;
        let db = DirectoryDb {
            root: self.root.clone(),
        };
        match db.read_index()? {
            Some(index) if index.version > schema.version => {
                return Err(EngineError::new(format!(
                    "{} was written by a newer version (schema {} > {})",
                    db.index_path().display(),
                    index.version,
                    schema.version
                )));
            }
            Some(_) => {}
            None => {
                tracing::debug!(root = %self.root.display(), "creating history index");
                db.write_index(&Index {
                    version: schema.version,
                    next_id: 1,
                    records: Vec::new(),
                })?;
            }
        }
        Ok(db)
    }
}

/// An opened history directory.
#[derive(Debug)]
pub struct DirectoryDb {
    root: PathBuf,
}

impl DirectoryDb {
    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn full_path(&self, id: RecordId) -> PathBuf {
        self.root.join(format!("{id}.png"))
    }

    fn thumbnail_path(&self, id: RecordId) -> PathBuf {
        self.root.join(format!("{id}.thumb.png"))
    }

    fn read_index(&self) -> Result<Option<Index>, EngineError> {
        let path = self.index_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read", &path, &e)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| EngineError::new(format!("corrupt {}: {e}", path.display())))
    }

    fn write_index(&self, index: &Index) -> Result<(), EngineError> {
        let path = self.index_path();
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(index)
            .map_err(|e| EngineError::new(format!("cannot serialize index: {e}")))?;
        fs::write(&tmp, text).map_err(|e| io_error("write", &tmp, &e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error("replace", &path, &e))
    }

    fn read_record(&self, entry: IndexEntry) -> Result<HistoryRecord, EngineError> {
        let read = |path: PathBuf| {
            fs::read(&path)
                .map(EncodedImage::new)
                .map_err(|e| io_error("read", &path, &e))
        };
        Ok(HistoryRecord {
            id: entry.id,
            thumbnail: read(self.thumbnail_path(entry.id))?,
            full: read(self.full_path(entry.id))?,
            timestamp: entry.timestamp,
        })
    }
}

impl Database for DirectoryDb {
    type Transaction<'a> = DirectoryTx<'a>;

    fn transaction(&self, mode: TxMode) -> Result<DirectoryTx<'_>, EngineError> {
        let index = self
            .read_index()?
            .ok_or_else(|| EngineError::new(format!("{} is missing", self.index_path().display())))?;
        Ok(DirectoryTx {
            db: self,
            mode,
            index,
            added: BTreeMap::new(),
            deleted: Vec::new(),
        })
    }
}

/// A pending change set against a history directory.
#[derive(Debug)]
pub struct DirectoryTx<'a> {
    db: &'a DirectoryDb,
    mode: TxMode,
    index: Index,
    added: BTreeMap<RecordId, StoredRecord>,
    deleted: Vec<RecordId>,
}

impl DirectoryTx<'_> {
    fn writable(&self) -> Result<(), EngineError> {
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(EngineError::new("transaction is read-only")),
        }
    }

    fn remove_from_index(&mut self, id: RecordId) {
        self.index.records.retain(|e| e.id != id);
        if self.added.remove(&id).is_none() {
            self.deleted.push(id);
        }
    }

    fn load(&self, entry: IndexEntry) -> Result<HistoryRecord, EngineError> {
        match self.added.get(&entry.id) {
            Some(record) => Ok(record.clone().with_id(entry.id)),
            None => self.db.read_record(entry),
        }
    }
}

impl Transaction for DirectoryTx<'_> {
    async fn add(&mut self, record: StoredRecord) -> Result<RecordId, EngineError> {
        self.writable()?;
        let id = RecordId(self.index.next_id);
        self.index.next_id += 1;
        self.index.records.push(IndexEntry {
            id,
            timestamp: record.timestamp,
        });
        self.added.insert(id, record);
        Ok(id)
    }

    async fn keys(&mut self) -> Result<Vec<RecordId>, EngineError> {
        let mut keys: Vec<_> = self.index.records.iter().map(|e| e.id).collect();
        keys.sort_unstable();
        Ok(keys)
    }

    async fn records(&mut self) -> Result<Vec<HistoryRecord>, EngineError> {
        let mut entries = self.index.records.clone();
        entries.sort_unstable_by_key(|e| e.id);
        entries.into_iter().map(|e| self.load(e)).collect()
    }

    async fn get(&mut self, id: RecordId) -> Result<Option<HistoryRecord>, EngineError> {
        self.index
            .records
            .iter()
            .find(|e| e.id == id)
            .copied()
            .map(|e| self.load(e))
            .transpose()
    }

    async fn delete(&mut self, id: RecordId) -> Result<(), EngineError> {
        self.writable()?;
        self.remove_from_index(id);
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), EngineError> {
        self.writable()?;
        let ids: Vec<_> = self.index.records.iter().map(|e| e.id).collect();
        for id in ids {
            self.remove_from_index(id);
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), EngineError> {
        if self.mode == TxMode::ReadOnly {
            return Ok(());
        }
        let db = self.db;
        for (id, record) in &self.added {
            let full = db.full_path(*id);
            fs::write(&full, record.full.as_bytes()).map_err(|e| io_error("write", &full, &e))?;
            let thumb = db.thumbnail_path(*id);
            fs::write(&thumb, record.thumbnail.as_bytes())
                .map_err(|e| io_error("write", &thumb, &e))?;
        }
        db.write_index(&self.index)?;

        for id in &self.deleted {
            for path in [db.full_path(*id), db.thumbnail_path(*id)] {
                if let Err(e) = fs::remove_file(&path)
                    && e.kind() != io::ErrorKind::NotFound
                {
                    // The index no longer refers to it; an orphan is harmless.
                    tracing::warn!(path = %path.display(), error = %e, "could not remove file");
                }
            }
        }
        Ok(())
    }
}

fn io_error(action: &str, path: &Path, err: &io::Error) -> EngineError {
    EngineError::new(format!("cannot {action} {}: {err}", path.display()))
}

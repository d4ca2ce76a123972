//! Persistence boundary
//!
//! The game core never talks to storage itself. Records are read as whole
//! JSON documents through [`SnapshotReader`] and written back through
//! [`RecordWriter`], whose merge replaces the top-level fields it is given and
//! leaves all others alone. [`MemoryStore`] implements both over a map and
//! keeps a log of every merge it served.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::game_id::GameId;

/// A stored game record: a JSON object keyed by top-level field
pub type Document = Map<String, Value>;

/// Errors that can occur when talking to a store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The store could not serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Reads the latest snapshot of a record
pub trait SnapshotReader {
    /// Fetches the record stored under `game_id`
    ///
    /// # Errors
    ///
    /// Returns `Error::Unavailable` if the store cannot be reached.
    fn read(&self, game_id: &GameId) -> Result<Option<Document>, Error>;
}

/// Writes fields into a record
pub trait RecordWriter {
    /// Merges `document` into the record stored under `game_id`
    ///
    /// Every field present in `document` replaces the stored one. Fields it
    /// does not mention keep their stored value. A missing record is created.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unavailable` if the store cannot be reached.
    fn merge(&self, game_id: &GameId, document: Document) -> Result<(), Error>;
}

/// A write served by a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    /// The record written to
    pub game_id: GameId,
    /// Record contents before the merge
    pub before: Option<Document>,
    /// Record contents after the merge
    pub after: Document,
}

/// An in-process store backed by a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<GameId, Document>>,
    writes: Mutex<Vec<Write>>,
}

// a panic while holding a lock leaves the maps intact, so poisoning is ignored
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` under `game_id`, replacing the whole record
    ///
    /// This does not count as a merge and is not logged.
    ///
    /// # Returns
    ///
    /// The record previously stored, if any
    pub fn insert(&self, game_id: GameId, document: Document) -> Option<Document> {
        lock(&self.records).insert(game_id, document)
    }

    /// Removes the record stored under `game_id`
    pub fn delete(&self, game_id: &GameId) -> Option<Document> {
        lock(&self.records).remove(game_id)
    }

    /// The record stored under `game_id`, if any
    pub fn get(&self, game_id: &GameId) -> Option<Document> {
        lock(&self.records).get(game_id).cloned()
    }

    /// Number of merges served so far
    pub fn write_count(&self) -> usize {
        lock(&self.writes).len()
    }

    /// Drains the log of merges served since the last call
    pub fn take_writes(&self) -> Vec<Write> {
        std::mem::take(&mut *lock(&self.writes))
    }
}

impl SnapshotReader for MemoryStore {
    fn read(&self, game_id: &GameId) -> Result<Option<Document>, Error> {
        Ok(self.get(game_id))
    }
}

impl RecordWriter for MemoryStore {
    fn merge(&self, game_id: &GameId, document: Document) -> Result<(), Error> {
        let mut records = lock(&self.records);
        let before = records.get(game_id).cloned();

        let record = records.entry(game_id.clone()).or_default();
        record.extend(document);
        let after = record.clone();
        drop(records);

        lock(&self.writes).push(Write {
            game_id: game_id.clone(),
            before,
            after,
        });
        Ok(())
    }
}

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::session::SessionRecord;
use crate::storage::BlobStore;

/// Storage key the whole history is written under
pub const STORAGE_KEY: &str = "workSessions";

/// Completed sessions, newest first, mirrored to a [`BlobStore`] on every
/// mutation.
///
/// The in-memory list is authoritative for the running process: a failed
/// write is reported to the caller but never rolls back the change.
#[derive(Debug)]
pub struct HistoryStore<S: BlobStore> {
    records: Vec<SessionRecord>,
    storage: S,
}

impl<S: BlobStore> HistoryStore<S> {
    /// Load the persisted history. Missing or unreadable storage yields an
    /// empty history.
    pub fn load(storage: S) -> Self {
        let records = load_records(&storage);
        info!(records = records.len(), "loaded session history");
        Self { records, storage }
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&SessionRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_seconds(&self) -> u64 {
        self.records.iter().map(|record| record.duration_seconds).sum()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Insert `record` at the head. An existing record with the same id is
    /// replaced so ids stay unique.
    pub fn append(&mut self, record: SessionRecord) -> Result<(), PersistenceError> {
        self.records.retain(|existing| existing.id != record.id);
        debug!(id = %record.id, task = %record.task_name, "appending session record");
        self.records.insert(0, record);
        self.persist()
    }

    /// Rename the record with `id`. Returns `Ok(false)` without writing when
    /// no such record exists.
    pub fn rename(&mut self, id: &str, new_task_name: &str) -> Result<bool, PersistenceError> {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            debug!(id, "rename ignored, no such record");
            return Ok(false);
        };

        record.task_name = new_task_name.to_string();
        info!(id, task = new_task_name, "renamed session record");
        self.persist()?;
        Ok(true)
    }

    /// Delete the record with `id`. Returns `Ok(false)` without writing when
    /// no such record exists.
    pub fn delete(&mut self, id: &str) -> Result<bool, PersistenceError> {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        if self.records.len() == before {
            debug!(id, "delete ignored, no such record");
            return Ok(false);
        }

        info!(id, "deleted session record");
        self.persist()?;
        Ok(true)
    }

    /// Write the full in-memory history to storage
    pub fn persist(&self) -> Result<(), PersistenceError> {
        let blob = serde_json::to_string(&self.records)?;
        if let Err(err) = self.storage.write(STORAGE_KEY, &blob) {
            warn!(error = %err, "failed to persist session history");
            return Err(err);
        }
        debug!(records = self.records.len(), "persisted session history");
        Ok(())
    }
}

/// Decode the persisted history, treating absence and corruption as empty
pub fn load_records<S: BlobStore + ?Sized>(storage: &S) -> Vec<SessionRecord> {
    let blob = match storage.read(STORAGE_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(error = %err, "could not read session history, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<SessionRecord>>(&blob) {
        // first occurrence is the newest one
        Ok(records) => records
            .into_iter()
            .unique_by(|record| record.id.clone())
            .collect(),
        Err(err) => {
            warn!(error = %err, "session history is corrupt, starting empty");
            Vec::new()
        }
    }
}

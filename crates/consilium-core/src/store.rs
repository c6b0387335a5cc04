//! Consultation persistence using append-only JSONL files.

use crate::types::ConsultationRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by the consultation store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persistent store abstraction for consultation records.
///
/// Insert-only: nothing in the gateway updates or deletes a record. `find`
/// returns raw stored documents because historical records predate the
/// current schema; normalization is the reader's responsibility.
#[async_trait]
pub trait ConsultationStore: Send + Sync {
    /// Append a consultation record.
    async fn insert(&self, record: &ConsultationRecord) -> Result<(), StoreError>;

    /// Fetch up to `limit` raw documents for a session, oldest first.
    async fn find(&self, session_id: &str, limit: usize) -> Result<Vec<Value>, StoreError>;

    /// Reachability probe for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// JSONL-backed store keeping one append-only file per session.
pub struct JsonlConsultationStore {
    /// Root directory for session files.
    root: PathBuf,
    /// Serialize write access to session files.
    write_lock: Mutex<()>,
}

impl JsonlConsultationStore {
    /// Create a new JSONL store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized consultation store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Build the file path for a session.
    ///
    /// Session ids are charset-validated at the request boundary, so the id
    /// is usable as a file stem directly.
    fn session_path(&self, session_id: &str) -> PathBuf {
        self.root.join(format!("{session_id}.jsonl"))
    }
}

#[async_trait]
impl ConsultationStore for JsonlConsultationStore {
    /// Append a record to the session file.
    async fn insert(&self, record: &ConsultationRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(record)?;
        let _guard = self.write_lock.lock();
        let path = self.session_path(&record.session_id);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        debug!(
            "stored consultation (session_id={}, record_id={})",
            record.session_id, record.id
        );
        Ok(())
    }

    /// Read raw documents for a session, oldest first, up to `limit`.
    async fn find(&self, session_id: &str, limit: usize) -> Result<Vec<Value>, StoreError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(&path)?;
        let reader = BufReader::new(file);
        let mut documents = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(document) => documents.push(document),
                Err(err) => {
                    warn!(
                        "skipping unreadable stored line (session_id={}, error={})",
                        session_id, err
                    );
                }
            }
        }
        sort_by_timestamp(&mut documents);
        documents.truncate(limit);
        Ok(documents)
    }

    /// Check that the store root is still present.
    async fn ping(&self) -> Result<(), StoreError> {
        fs::metadata(&self.root)?;
        Ok(())
    }
}

/// Sort documents by their creation timestamp ascending.
///
/// Documents without a parseable timestamp keep their file position, sorting
/// as oldest; the stable sort preserves append order for ties.
pub fn sort_by_timestamp(documents: &mut [Value]) {
    documents.sort_by_key(|document| parse_timestamp(document).unwrap_or(DateTime::UNIX_EPOCH));
}

/// Parse the `timestamp` field of a stored document.
fn parse_timestamp(document: &Value) -> Option<DateTime<Utc>> {
    document
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

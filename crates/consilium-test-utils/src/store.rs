//! Consultation store doubles.

use async_trait::async_trait;
use consilium_core::store::{ConsultationStore, StoreError, sort_by_timestamp};
use consilium_core::types::ConsultationRecord;
use parking_lot::Mutex;
use serde_json::Value;

/// In-memory store that accepts raw documents, for seeding legacy shapes.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw stored document, bypassing the record schema.
    pub fn push_raw(&self, document: Value) {
        self.documents.lock().push(document);
    }
}

#[async_trait]
impl ConsultationStore for MemoryStore {
    async fn insert(&self, record: &ConsultationRecord) -> Result<(), StoreError> {
        let document = serde_json::to_value(record)?;
        self.documents.lock().push(document);
        Ok(())
    }

    async fn find(&self, session_id: &str, limit: usize) -> Result<Vec<Value>, StoreError> {
        let mut documents: Vec<Value> = self
            .documents
            .lock()
            .iter()
            .filter(|document| {
                document.get("session_id").and_then(Value::as_str) == Some(session_id)
            })
            .cloned()
            .collect();
        sort_by_timestamp(&mut documents);
        documents.truncate(limit);
        Ok(documents)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store whose writes always fail; reads delegate to an inner memory store.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsultationStore for FailingStore {
    async fn insert(&self, _record: &ConsultationRecord) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other(
            "injected store failure",
        )))
    }

    async fn find(&self, session_id: &str, limit: usize) -> Result<Vec<Value>, StoreError> {
        self.inner.find(session_id, limit).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other(
            "injected store failure",
        )))
    }
}

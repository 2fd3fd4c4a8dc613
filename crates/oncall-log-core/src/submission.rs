//! Submission of finished drafts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::access::Author;
use crate::models::{CallLog, DraftLogEntry, RecordError, SubmissionReceipt};

/// Submission errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error("Submission service unavailable: {0}")]
    Unavailable(String),

    #[error("Log rejected: {0}")]
    Rejected(#[from] RecordError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Submission was cancelled before the log store answered")]
    Cancelled,
}

impl From<serde_json::Error> for SubmissionError {
    fn from(e: serde_json::Error) -> Self {
        SubmissionError::Serialization(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for SubmissionError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        SubmissionError::Unavailable(format!("Lock poisoned: {}", e))
    }
}

pub type SubmissionResult<T> = Result<T, SubmissionError>;

/// Where finished drafts are sent.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Store a finished draft on behalf of `author`.
    async fn submit(
        &self,
        author: &Author,
        draft: &DraftLogEntry,
    ) -> SubmissionResult<SubmissionReceipt>;
}

/// Sink that keeps submitted logs in memory.
#[derive(Debug)]
pub struct InMemorySubmissionSink {
    logs: Mutex<Vec<CallLog>>,
    online: AtomicBool,
    latency: Option<Duration>,
}

impl Default for InMemorySubmissionSink {
    fn default() -> Self {
        Self {
            logs: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
            latency: None,
        }
    }
}

impl InMemorySubmissionSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every submission by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate the store going offline or coming back.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Snapshot of stored logs, oldest first.
    pub fn logs(&self) -> SubmissionResult<Vec<CallLog>> {
        Ok(self.logs.lock()?.clone())
    }
}

#[async_trait]
impl SubmissionSink for InMemorySubmissionSink {
    async fn submit(
        &self,
        author: &Author,
        draft: &DraftLogEntry,
    ) -> SubmissionResult<SubmissionReceipt> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(SubmissionError::Unavailable("log store is offline".into()));
        }

        let log = CallLog::from_draft(uuid::Uuid::new_v4().to_string(), &author.name, draft)?;
        let digest = hash_record(&log)?;

        let receipt = SubmissionReceipt {
            log_id: log.id.clone(),
            digest,
            submitted_at: chrono::Utc::now(),
        };

        self.logs.lock()?.push(log);
        tracing::info!(log_id = %receipt.log_id, "stored on-call log");
        Ok(receipt)
    }
}

/// SHA-256 hex digest of a log's canonical JSON.
pub fn hash_record(log: &CallLog) -> SubmissionResult<String> {
    let json = log.to_canonical_json()?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

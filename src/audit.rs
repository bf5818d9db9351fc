//! Append-only audit log
//!
//! One record per completed chat turn, handed to a background writer task so
//! a slow or failing disk never delays a response. Write failures are logged
//! and dropped; the log is best-effort by contract.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// Failure to hand a record to the audit sink. Callers swallow this.
#[derive(Debug, Error)]
#[error("audit channel closed")]
pub struct AuditError;

/// One completed turn, timestamped at completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Local>,
    pub user_text: String,
    pub bot_reply: String,
}

impl AuditRecord {
    pub fn new(timestamp: DateTime<Local>, user_text: &str, bot_reply: &str) -> Self {
        Self {
            timestamp,
            user_text: user_text.to_string(),
            bot_reply: bot_reply.to_string(),
        }
    }

    pub fn now(user_text: &str, bot_reply: &str) -> Self {
        Self::new(Local::now(), user_text, bot_reply)
    }

    /// Human-readable record format; both lines share the turn's timestamp.
    pub fn to_lines(&self) -> String {
        let ts = self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        format!(
            "[{ts}] USER: {user}\n[{ts}] BOT: {bot}\n\n",
            user = self.user_text,
            bot = self.bot_reply
        )
    }
}

/// Sink for audit records
pub trait AuditSink: Send + Sync {
    /// Hand off one record. Must not block on I/O.
    fn record(&self, record: AuditRecord) -> Result<(), AuditError>;
}

/// File-backed audit sink with a background writer
pub struct FileAuditLog {
    tx: mpsc::UnboundedSender<AuditRecord>,
    #[allow(dead_code)] // held so tests can drain the writer
    writer: tokio::task::JoinHandle<()>,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_records(path.into(), rx));
        Self { tx, writer }
    }

    /// Drain pending records and stop the writer.
    #[allow(dead_code)] // Useful for tests
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.writer.await;
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.tx.send(record).map_err(|_| AuditError)
    }
}

async fn write_records(path: PathBuf, mut rx: mpsc::UnboundedReceiver<AuditRecord>) {
    while let Some(record) = rx.recv().await {
        if let Err(e) = append_record(&path, &record).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to append audit record");
        }
    }
}

async fn append_record(path: &Path, record: &AuditRecord) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(record.to_lines().as_bytes()).await?;
    Ok(())
}

//! Mock collaborators for conversation tests

use crate::audit::{AuditError, AuditRecord, AuditSink};
use crate::llm::{CompletionGateway, GatewayError, Turn};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted gateway that records every transcript it is asked to complete
pub struct MockGateway {
    reply: String,
    fail: bool,
    delay: Duration,
    seen: Mutex<Vec<Vec<Turn>>>,
}

impl MockGateway {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            fail: true,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Slow the gateway down to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Transcripts received, in call order.
    pub fn transcripts_seen(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for MockGateway {
    async fn complete(&self, transcript: &[Turn]) -> Result<String, GatewayError> {
        self.seen.lock().unwrap().push(transcript.to_vec());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            Err(GatewayError::network("mock gateway down"))
        } else {
            Ok(self.reply.clone())
        }
    }
}

/// In-memory audit sink
pub struct MemoryAudit {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

/// Audit sink that always fails, for swallow-on-error tests
pub struct FailingAudit;

impl AuditSink for FailingAudit {
    fn record(&self, _record: AuditRecord) -> Result<(), AuditError> {
        Err(AuditError)
    }
}

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::{ChatMessage, ModelReply, ResultRecord, TaskKind};
use crate::error::{InferenceError, Result};

/// A remote (or fake) language model.
///
/// Implementations apply per-kind request settings such as token limits and
/// logit bias. Failures are returned, never panicked, so the caller can
/// record them against the task.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn respond(
        &self,
        messages: &[ChatMessage],
        kind: TaskKind,
    ) -> std::result::Result<ModelReply, InferenceError>;
}

/// Persistence for result records.
pub trait ResultSink: Send + Sync {
    /// Write a cumulative interim snapshot after `scored` tasks.
    fn write_checkpoint(&self, records: &[ResultRecord], scored: usize) -> Result<PathBuf>;

    /// Write the final tables, one per task kind, named after `prefix`.
    fn write_results(&self, records: &[ResultRecord], prefix: &str) -> Result<Vec<PathBuf>>;
}

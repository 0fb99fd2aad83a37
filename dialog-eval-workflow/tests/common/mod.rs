#![allow(dead_code)]

use async_trait::async_trait;
use dialog_eval_core::*;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Model client answering from a script; falls back to `Final Answer: 1`.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<std::result::Result<String, InferenceError>>>,
    calls: Mutex<Vec<(String, TaskKind)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: Vec<std::result::Result<&str, InferenceError>>) -> Self {
        let client = Self::default();
        *client.replies.lock().unwrap() = replies
            .into_iter()
            .map(|reply| reply.map(str::to_string))
            .collect();
        client
    }

    pub fn calls(&self) -> Vec<(String, TaskKind)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(prompt, _)| prompt).collect()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn respond(
        &self,
        messages: &[ChatMessage],
        kind: TaskKind,
    ) -> std::result::Result<ModelReply, InferenceError> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.calls.lock().unwrap().push((prompt, kind));

        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Final Answer: 1".to_string()));

        next.map(|content| ModelReply {
            content,
            elapsed: Duration::from_millis(250),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 10,
                total_tokens: 110,
            },
        })
    }
}

/// Model client that answers the first `answered` calls and never completes
/// any later one.
pub struct StallingClient {
    answered: usize,
    calls: Mutex<usize>,
}

impl StallingClient {
    pub fn new(answered: usize) -> Self {
        Self {
            answered,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ModelClient for StallingClient {
    async fn respond(
        &self,
        _messages: &[ChatMessage],
        _kind: TaskKind,
    ) -> std::result::Result<ModelReply, InferenceError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if call > self.answered {
            std::future::pending::<()>().await;
        }
        Ok(ModelReply {
            content: format!("Final Answer: {}", call),
            elapsed: Duration::from_millis(10),
            usage: TokenUsage::default(),
        })
    }
}

/// Sink that remembers every checkpoint as `(scored, records.len())`.
#[derive(Default)]
pub struct RecordingSink {
    pub fail: bool,
    checkpoints: Mutex<Vec<(usize, usize)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn checkpoints(&self) -> Vec<(usize, usize)> {
        self.checkpoints.lock().unwrap().clone()
    }
}

impl ResultSink for RecordingSink {
    fn write_checkpoint(&self, records: &[ResultRecord], scored: usize) -> Result<PathBuf> {
        self.checkpoints.lock().unwrap().push((scored, records.len()));
        if self.fail {
            return Err(EvalError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only output directory",
            )));
        }
        Ok(PathBuf::from(format!("interim_results_{}.csv", scored)))
    }

    fn write_results(&self, _records: &[ResultRecord], prefix: &str) -> Result<Vec<PathBuf>> {
        Ok(vec![PathBuf::from(prefix)])
    }
}

pub fn mcq(question: &str, answer: &str, correct_index: i64) -> Value {
    json!({
        "question": question,
        "answer": answer,
        "explict_answer": format!("explicit {}", answer),
        "option": ["first", "second", "third", "fourth"],
        "answer_index": correct_index
    })
}

pub fn qa(question: &str, answer: &str) -> Value {
    json!({"question": question, "answer": answer})
}

pub fn dialogue(id: i64, turns: Vec<Value>, questions: Vec<Value>) -> Dialogue {
    Dialogue {
        id: DialogueId::Number(id),
        turns,
        questions,
    }
}

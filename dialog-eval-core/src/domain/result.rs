use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::dataset::{DialogueId, TaskKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Successful answer from a model client.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub content: String,
    pub elapsed: Duration,
    pub usage: TokenUsage,
}

/// What was sent to the model for one task and what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelExchange {
    pub prompt: String,
    pub prompt_style: String,
    /// Empty when the call failed.
    pub response: String,
    pub elapsed_secs: f64,
    pub usage: TokenUsage,
    pub error: Option<String>,
}

impl ModelExchange {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// The response text, if the call succeeded and produced any.
    pub fn response_text(&self) -> Option<&str> {
        if self.error.is_some() || self.response.is_empty() {
            None
        } else {
            Some(&self.response)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqOutcome {
    pub turn_index: usize,
    pub agent_answer: String,
    pub options: Vec<String>,
    pub correct_index: Option<usize>,
    pub explicit_answer: Option<String>,
    /// 1-based choice as parsed from the response.
    pub predicted_choice: Option<u8>,
    pub predicted_index: Option<usize>,
    pub is_correct: bool,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaOutcome {
    pub question_index: usize,
    pub reference_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task_type")]
pub enum ResultDetail {
    #[serde(rename = "MCQ")]
    Mcq(McqOutcome),
    #[serde(rename = "QA")]
    Qa(QaOutcome),
}

/// One processed task. The kind-specific detail is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub dialogue_id: DialogueId,
    /// 0-based position in the global task order.
    pub position: usize,
    pub question: String,
    pub exchange: ModelExchange,
    detail: ResultDetail,
}

impl ResultRecord {
    pub fn mcq(
        dialogue_id: DialogueId,
        position: usize,
        question: String,
        exchange: ModelExchange,
        outcome: McqOutcome,
    ) -> Self {
        Self {
            dialogue_id,
            position,
            question,
            exchange,
            detail: ResultDetail::Mcq(outcome),
        }
    }

    pub fn qa(
        dialogue_id: DialogueId,
        position: usize,
        question: String,
        exchange: ModelExchange,
        outcome: QaOutcome,
    ) -> Self {
        Self {
            dialogue_id,
            position,
            question,
            exchange,
            detail: ResultDetail::Qa(outcome),
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self.detail {
            ResultDetail::Mcq(_) => TaskKind::Mcq,
            ResultDetail::Qa(_) => TaskKind::Qa,
        }
    }

    pub fn detail(&self) -> &ResultDetail {
        &self.detail
    }

    pub fn as_mcq(&self) -> Option<&McqOutcome> {
        match &self.detail {
            ResultDetail::Mcq(outcome) => Some(outcome),
            ResultDetail::Qa(_) => None,
        }
    }

    pub fn as_qa(&self) -> Option<&QaOutcome> {
        match &self.detail {
            ResultDetail::Qa(outcome) => Some(outcome),
            ResultDetail::Mcq(_) => None,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prompting strategy for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PromptStyle {
    #[default]
    ChainOfThought,
    ZeroShot,
    /// A configured name we do not know; prompts fall back to chain-of-thought.
    Unrecognized(String),
}

impl PromptStyle {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "cot" => PromptStyle::ChainOfThought,
            "zero-shot" => PromptStyle::ZeroShot,
            other => PromptStyle::Unrecognized(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PromptStyle::ChainOfThought => "cot",
            PromptStyle::ZeroShot => "zero-shot",
            PromptStyle::Unrecognized(name) => name,
        }
    }

    /// True when MCQ prompts are rendered with the reasoning template.
    pub fn uses_reasoning_template(&self) -> bool {
        !matches!(self, PromptStyle::ZeroShot)
    }
}

impl From<String> for PromptStyle {
    fn from(raw: String) -> Self {
        PromptStyle::parse(&raw)
    }
}

impl From<PromptStyle> for String {
    fn from(style: PromptStyle) -> Self {
        style.label().to_string()
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

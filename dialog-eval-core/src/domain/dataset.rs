use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{EvalError, Result};

pub const MISSING_QUESTION: &str = "[missing question]";
pub const MISSING_ANSWER: &str = "[missing answer]";
pub const MISSING_REFERENCE_ANSWER: &str = "[missing reference answer]";

// The published dataset spells these `option`, `answer_index` and `explict_answer`.
const OPTION_KEYS: &[&str] = &["option", "options"];
const CORRECT_INDEX_KEYS: &[&str] = &["answer_index", "correct_index"];
const EXPLICIT_ANSWER_KEYS: &[&str] = &["explict_answer", "explicit_answer"];

// ===== Task classification =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "QA")]
    Qa,
    Unknown,
}

impl TaskKind {
    /// Structural classification of a raw task record. Total: anything
    /// unrecognised, including non-objects, is `Unknown`.
    pub fn classify(record: &Value) -> Self {
        let Some(fields) = record.as_object() else {
            return TaskKind::Unknown;
        };

        let has_options = has_any(fields, OPTION_KEYS);
        if has_options && has_any(fields, CORRECT_INDEX_KEYS) {
            TaskKind::Mcq
        } else if !has_options && fields.contains_key("question") && fields.contains_key("answer") {
            TaskKind::Qa
        } else {
            TaskKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Mcq => "MCQ",
            TaskKind::Qa => "QA",
            TaskKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn has_any(fields: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|key| fields.contains_key(*key))
}

fn first_field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| record.get(*key))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_field(record: &Value, key: &str, fallback: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => fallback.to_string(),
        Some(value) => value_text(value),
    }
}

// ===== Typed tasks =====

/// A multiple-choice implicature turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqTurn {
    pub question: String,
    pub answer: String,
    pub options: Vec<String>,
    /// 0-based; `None` when the record carries the `-1` sentinel or no usable index.
    pub correct_index: Option<usize>,
    pub explicit_answer: Option<String>,
}

impl McqTurn {
    fn from_record(record: &Value) -> Self {
        let options = first_field(record, OPTION_KEYS)
            .and_then(Value::as_array)
            .map(|values| values.iter().map(value_text).collect())
            .unwrap_or_default();

        let correct_index = first_field(record, CORRECT_INDEX_KEYS)
            .and_then(Value::as_i64)
            .and_then(|index| usize::try_from(index).ok());

        let explicit_answer = first_field(record, EXPLICIT_ANSWER_KEYS)
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            question: text_field(record, "question", MISSING_QUESTION),
            answer: text_field(record, "answer", MISSING_ANSWER),
            options,
            correct_index,
            explicit_answer,
        }
    }

    /// The text this turn contributes to the running dialogue context.
    pub fn context_entry(&self) -> String {
        format!("Question: {}\nAnswer: {}\n\n", self.question, self.answer)
    }
}

/// A free-form follow-up question about the dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaItem {
    pub question: String,
    pub reference_answer: String,
}

impl QaItem {
    fn from_record(record: &Value) -> Self {
        Self {
            question: text_field(record, "question", MISSING_QUESTION),
            reference_answer: text_field(record, "answer", MISSING_REFERENCE_ANSWER),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Mcq(McqTurn),
    Qa(QaItem),
    Unknown,
}

impl Task {
    pub fn from_record(record: &Value) -> Self {
        match TaskKind::classify(record) {
            TaskKind::Mcq => Task::Mcq(McqTurn::from_record(record)),
            TaskKind::Qa => Task::Qa(QaItem::from_record(record)),
            TaskKind::Unknown => Task::Unknown,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Mcq(_) => TaskKind::Mcq,
            Task::Qa(_) => TaskKind::Qa,
            Task::Unknown => TaskKind::Unknown,
        }
    }
}

// ===== Dataset =====

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialogueId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DialogueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogueId::Number(n) => write!(f, "{}", n),
            DialogueId::Text(s) => f.write_str(s),
        }
    }
}

/// One scripted dialogue. Task records stay raw until the pipeline classifies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialogue {
    #[serde(rename = "dialog_id")]
    pub id: DialogueId,
    #[serde(rename = "dialog", default)]
    pub turns: Vec<Value>,
    #[serde(rename = "question", default)]
    pub questions: Vec<Value>,
}

impl Dialogue {
    pub fn task_count(&self) -> usize {
        self.turns.len() + self.questions.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dialogues: Vec<Dialogue>,
}

impl Dataset {
    pub fn new(dialogues: Vec<Dialogue>) -> Self {
        Self { dialogues }
    }

    /// Parse the `{"data": {"dialogs": [...]}}` envelope.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(raw)?;
        let dialogs = document
            .get("data")
            .and_then(|data| data.get("dialogs"))
            .cloned()
            .ok_or_else(|| {
                EvalError::Dataset("JSON structure is missing 'data' or 'data.dialogs' key".to_string())
            })?;

        let dialogues: Vec<Dialogue> = serde_json::from_value(dialogs)
            .map_err(|e| EvalError::Dataset(format!("invalid dialog entry: {}", e)))?;

        Ok(Self { dialogues })
    }

    /// Number of task slots (MCQ turns plus QA items) across all dialogues.
    pub fn total_tasks(&self) -> usize {
        self.dialogues.iter().map(Dialogue::task_count).sum()
    }

    pub fn len(&self) -> usize {
        self.dialogues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mcq_turn_sentinel_index() {
        let record = json!({
            "question": "Are you coming?",
            "answer": "I have to work.",
            "option": ["yes", "no"],
            "answer_index": -1
        });

        match Task::from_record(&record) {
            Task::Mcq(turn) => {
                assert_eq!(turn.correct_index, None);
                assert_eq!(turn.options, vec!["yes".to_string(), "no".to_string()]);
                assert_eq!(turn.explicit_answer, None);
            }
            other => panic!("Expected MCQ task, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_text_placeholders() {
        let record = json!({"option": [], "answer_index": 0});
        match Task::from_record(&record) {
            Task::Mcq(turn) => {
                assert_eq!(turn.question, MISSING_QUESTION);
                assert_eq!(turn.answer, MISSING_ANSWER);
            }
            other => panic!("Expected MCQ task, got {:?}", other),
        }
    }

    #[test]
    fn test_context_entry_format() {
        let turn = McqTurn {
            question: "Q".to_string(),
            answer: "A".to_string(),
            options: vec![],
            correct_index: None,
            explicit_answer: None,
        };
        assert_eq!(turn.context_entry(), "Question: Q\nAnswer: A\n\n");
    }

    #[test]
    fn test_dialogue_id_display() {
        assert_eq!(DialogueId::Number(7).to_string(), "7");
        assert_eq!(DialogueId::Text("d-7".to_string()).to_string(), "d-7");
    }
}

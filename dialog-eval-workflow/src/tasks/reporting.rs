use dialog_eval_core::{
    EvalError, McqOutcome, PromptStyle, QaOutcome, Result, ResultDetail, ResultRecord, ResultSink,
    TaskKind,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const UNKNOWN_TYPE_CODE: &str = "unknown_type";

static TYPE_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)impl_dial_v0\.1_([a-z]{2})\.json$").expect("type code pattern is valid")
});

/// Two-letter implicature type code from a dataset file named
/// `impl_dial_v0.1_<xx>.json`.
pub fn extract_type_code(data_path: &Path) -> Option<String> {
    let file_name = data_path.file_name()?.to_str()?;
    TYPE_CODE_RE
        .captures(file_name)
        .map(|caps| caps[1].to_lowercase())
}

/// Filename prefix for the final tables: `<type>_<style>`.
pub fn output_prefix(data_path: &Path, style: &PromptStyle) -> String {
    let type_code = extract_type_code(data_path).unwrap_or_else(|| {
        tracing::warn!(
            "Could not extract type code from filename '{}'. Using '{}'.",
            data_path.display(),
            UNKNOWN_TYPE_CODE
        );
        UNKNOWN_TYPE_CODE.to_string()
    });
    format!("{}_{}", type_code, style.label())
}

/// Writes result records as CSV tables in one directory.
#[derive(Debug, Clone)]
pub struct CsvResultSink {
    directory: PathBuf,
}

impl CsvResultSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Create the output directory if needed.
    pub fn create(directory: impl Into<PathBuf>) -> Result<Self> {
        let sink = Self::new(directory);
        std::fs::create_dir_all(&sink.directory)?;
        Ok(sink)
    }

    pub fn checkpoint_path(&self, scored: usize) -> PathBuf {
        self.directory.join(format!("interim_results_{}.csv", scored))
    }

    pub fn results_path(&self, prefix: &str, kind: TaskKind) -> PathBuf {
        let suffix = match kind {
            TaskKind::Mcq => "mcq",
            TaskKind::Qa => "qa",
            TaskKind::Unknown => "unknown",
        };
        self.directory.join(format!("{}_{}_results.csv", prefix, suffix))
    }
}

impl ResultSink for CsvResultSink {
    fn write_checkpoint(&self, records: &[ResultRecord], scored: usize) -> Result<PathBuf> {
        let path = self.checkpoint_path(scored);
        write_rows(&path, records.iter().map(CheckpointRow::from))?;
        tracing::info!(
            "Interim results saved to {} ({} tasks processed)",
            path.display(),
            scored
        );
        Ok(path)
    }

    fn write_results(&self, records: &[ResultRecord], prefix: &str) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let mcq: Vec<McqRow> = records
            .iter()
            .filter_map(|record| record.as_mcq().map(|outcome| McqRow::new(record, outcome)))
            .collect();
        if mcq.is_empty() {
            tracing::info!("No MCQ results generated to save");
        } else {
            let path = self.results_path(prefix, TaskKind::Mcq);
            write_rows(&path, mcq)?;
            tracing::info!("MCQ results saved to {}", path.display());
            written.push(path);
        }

        let qa: Vec<QaRow> = records
            .iter()
            .filter_map(|record| record.as_qa().map(|outcome| QaRow::new(record, outcome)))
            .collect();
        if qa.is_empty() {
            tracing::info!("No QA results generated to save");
        } else {
            let path = self.results_path(prefix, TaskKind::Qa);
            write_rows(&path, qa)?;
            tracing::info!("QA results saved to {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_error(err: csv::Error) -> EvalError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => EvalError::Io(io),
        other => EvalError::Serialization(format!("{:?}", other)),
    }
}

fn options_cell(options: &[String]) -> String {
    serde_json::to_string(options).unwrap_or_default()
}

// ===== Table rows =====

#[derive(Serialize)]
struct McqRow<'a> {
    dialog_id: String,
    turn_index: usize,
    task_position: usize,
    task_type: &'static str,
    question: &'a str,
    agent_answer_raw: &'a str,
    explicit_answer: Option<&'a str>,
    options: String,
    correct_index: Option<usize>,
    predicted_index: Option<usize>,
    predicted_choice: Option<u8>,
    is_correct: bool,
    model_response_full: &'a str,
    model_reasoning: &'a str,
    response_time: f64,
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
    error_type: Option<&'a str>,
    prompt_style: &'a str,
    full_prompt: &'a str,
}

impl<'a> McqRow<'a> {
    fn new(record: &'a ResultRecord, outcome: &'a McqOutcome) -> Self {
        let exchange = &record.exchange;
        Self {
            dialog_id: record.dialogue_id.to_string(),
            turn_index: outcome.turn_index,
            task_position: record.position,
            task_type: TaskKind::Mcq.as_str(),
            question: &record.question,
            agent_answer_raw: &outcome.agent_answer,
            explicit_answer: outcome.explicit_answer.as_deref(),
            options: options_cell(&outcome.options),
            correct_index: outcome.correct_index,
            predicted_index: outcome.predicted_index,
            predicted_choice: outcome.predicted_choice,
            is_correct: outcome.is_correct,
            model_response_full: &exchange.response,
            model_reasoning: &outcome.reasoning,
            response_time: exchange.elapsed_secs,
            prompt_tokens: exchange.usage.prompt_tokens,
            completion_tokens: exchange.usage.completion_tokens,
            total_tokens: exchange.usage.total_tokens,
            error_type: exchange.error.as_deref(),
            prompt_style: &exchange.prompt_style,
            full_prompt: &exchange.prompt,
        }
    }
}

#[derive(Serialize)]
struct QaRow<'a> {
    dialog_id: String,
    qa_question_index: usize,
    task_position: usize,
    task_type: &'static str,
    question: &'a str,
    ground_truth_answer: &'a str,
    model_response_full: &'a str,
    response_time: f64,
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
    error_type: Option<&'a str>,
    prompt_style: &'a str,
    qa_full_prompt: &'a str,
}

impl<'a> QaRow<'a> {
    fn new(record: &'a ResultRecord, outcome: &'a QaOutcome) -> Self {
        let exchange = &record.exchange;
        Self {
            dialog_id: record.dialogue_id.to_string(),
            qa_question_index: outcome.question_index,
            task_position: record.position,
            task_type: TaskKind::Qa.as_str(),
            question: &record.question,
            ground_truth_answer: &outcome.reference_answer,
            model_response_full: &exchange.response,
            response_time: exchange.elapsed_secs,
            prompt_tokens: exchange.usage.prompt_tokens,
            completion_tokens: exchange.usage.completion_tokens,
            total_tokens: exchange.usage.total_tokens,
            error_type: exchange.error.as_deref(),
            prompt_style: &exchange.prompt_style,
            qa_full_prompt: &exchange.prompt,
        }
    }
}

/// Mixed-kind row; kind-specific columns stay empty where they do not apply.
#[derive(Serialize)]
struct CheckpointRow<'a> {
    dialog_id: String,
    turn_index: Option<usize>,
    qa_question_index: Option<usize>,
    task_position: usize,
    task_type: &'static str,
    question: &'a str,
    agent_answer_raw: Option<&'a str>,
    options: Option<String>,
    correct_index: Option<usize>,
    predicted_index: Option<usize>,
    predicted_choice: Option<u8>,
    is_correct: Option<bool>,
    model_response_full: &'a str,
    model_reasoning: Option<&'a str>,
    response_time: f64,
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
    error_type: Option<&'a str>,
    ground_truth_answer: Option<&'a str>,
    prompt_style: &'a str,
    full_prompt: &'a str,
}

impl<'a> From<&'a ResultRecord> for CheckpointRow<'a> {
    fn from(record: &'a ResultRecord) -> Self {
        let exchange = &record.exchange;
        let mut row = Self {
            dialog_id: record.dialogue_id.to_string(),
            turn_index: None,
            qa_question_index: None,
            task_position: record.position,
            task_type: record.kind().as_str(),
            question: &record.question,
            agent_answer_raw: None,
            options: None,
            correct_index: None,
            predicted_index: None,
            predicted_choice: None,
            is_correct: None,
            model_response_full: &exchange.response,
            model_reasoning: None,
            response_time: exchange.elapsed_secs,
            prompt_tokens: exchange.usage.prompt_tokens,
            completion_tokens: exchange.usage.completion_tokens,
            total_tokens: exchange.usage.total_tokens,
            error_type: exchange.error.as_deref(),
            ground_truth_answer: None,
            prompt_style: &exchange.prompt_style,
            full_prompt: &exchange.prompt,
        };

        match record.detail() {
            ResultDetail::Mcq(outcome) => {
                row.turn_index = Some(outcome.turn_index);
                row.agent_answer_raw = Some(&outcome.agent_answer);
                row.options = Some(options_cell(&outcome.options));
                row.correct_index = outcome.correct_index;
                row.predicted_index = outcome.predicted_index;
                row.predicted_choice = outcome.predicted_choice;
                row.is_correct = Some(outcome.is_correct);
                row.model_reasoning = Some(&outcome.reasoning);
            }
            ResultDetail::Qa(outcome) => {
                row.qa_question_index = Some(outcome.question_index);
                row.ground_truth_answer = Some(&outcome.reference_answer);
            }
        }

        row
    }
}

//! Sequential dialogue processing: context accumulation, resumption,
//! model dispatch, scoring and checkpointing.

use dialog_eval_core::{
    ChatMessage, ContextScope, Dataset, DialogueId, EvalConfig, EvalError, McqOutcome, McqTurn,
    ModelClient, ModelExchange, PromptStyle, QaItem, QaOutcome, Result, ResultRecord, ResultSink,
    Task, TaskKind,
};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::tasks::evaluation::judge_mcq;
use crate::tasks::prompting::PromptBuilder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub prompt_style: PromptStyle,
    pub max_iterations: Option<usize>,
    pub save_interval: usize,
    pub context_scope: ContextScope,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            prompt_style: PromptStyle::default(),
            max_iterations: None,
            save_interval: 100,
            context_scope: ContextScope::default(),
        }
    }
}

impl From<&EvalConfig> for PipelineOptions {
    fn from(config: &EvalConfig) -> Self {
        Self {
            prompt_style: config.model.prompt_style.clone(),
            max_iterations: config.max_iterations,
            save_interval: config.save_interval,
            context_scope: config.context_scope,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Initializing,
    IteratingMcq,
    IteratingQa,
    Checkpointing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Tasks counted against the budget, including those skipped by resume.
    pub tasks_counted: usize,
    /// Tasks sent to the model and recorded.
    pub tasks_scored: usize,
    pub budget: usize,
    pub checkpoints: usize,
    pub failed_calls: usize,
}

/// Walks a dataset once, in order, producing one [`ResultRecord`] per task at
/// or after the resume position.
///
/// The running context and the global task counter belong to the pipeline
/// instance and only move forward. Records accumulate in memory and stay
/// available through [`results`](Self::results) even if [`run`](Self::run)
/// is dropped midway.
pub struct DialoguePipeline {
    client: Arc<dyn ModelClient>,
    sink: Arc<dyn ResultSink>,
    options: PipelineOptions,
    builder: PromptBuilder,
    progress: ProgressBar,
    state: PipelineState,
    counter: usize,
    context: String,
    results: Vec<ResultRecord>,
    checkpoints: usize,
    failed_calls: usize,
}

impl DialoguePipeline {
    pub fn new(
        client: Arc<dyn ModelClient>,
        sink: Arc<dyn ResultSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            client,
            sink,
            builder: PromptBuilder::new(options.prompt_style.clone()),
            options,
            progress: ProgressBar::hidden(),
            state: PipelineState::Initializing,
            counter: 0,
            context: String::new(),
            results: Vec::new(),
            checkpoints: 0,
            failed_calls: 0,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Global task counter.
    pub fn tasks_counted(&self) -> usize {
        self.counter
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ResultRecord> {
        self.results
    }

    /// Task budget for a dataset: the configured limit capped by its size.
    pub fn budget_for(&self, dataset: &Dataset) -> usize {
        let total = dataset.total_tasks();
        self.options
            .max_iterations
            .map_or(total, |limit| limit.min(total))
    }

    /// Process `dataset`, starting model calls at the 1-based task number
    /// `resume_from`. Earlier tasks are only walked to rebuild the context.
    pub async fn run(&mut self, dataset: &Dataset, resume_from: usize) -> Result<RunSummary> {
        if resume_from < 1 {
            return Err(EvalError::Validation(
                "start iteration must be 1 or greater".to_string(),
            ));
        }
        if self.state != PipelineState::Initializing {
            return Err(EvalError::InvalidState(format!(
                "pipeline already ran (state {:?})",
                self.state
            )));
        }

        let threshold = resume_from - 1;
        let budget = self.budget_for(dataset);
        self.progress.set_length(budget as u64);
        self.progress
            .set_message(format!("Processing tasks ({})", self.builder.style()));

        tracing::info!(
            resume_from,
            start_index = threshold,
            budget,
            prompt_style = %self.builder.style(),
            "Starting dialogue processing"
        );

        'dialogues: for dialogue in &dataset.dialogues {
            if self.counter >= budget {
                break;
            }
            if self.options.context_scope == ContextScope::Dialogue {
                self.context.clear();
            }

            self.state = PipelineState::IteratingMcq;
            for (turn_index, record) in dialogue.turns.iter().enumerate() {
                if self.counter >= budget {
                    break 'dialogues;
                }
                let turn = match Task::from_record(record) {
                    Task::Mcq(turn) => turn,
                    other => {
                        tracing::warn!(
                            dialog_id = %dialogue.id,
                            turn_index,
                            "Expected MCQ task, found {}. Skipping.",
                            other.kind()
                        );
                        continue;
                    }
                };

                let position = self.advance();
                if position < threshold {
                    self.progress
                        .set_message(format!("Skipping task {}/{}", self.counter, budget));
                    self.context.push_str(&turn.context_entry());
                    continue;
                }

                self.progress.set_message(format!(
                    "Dialog {}, MCQ turn {} (task {})",
                    dialogue.id, turn_index, self.counter
                ));
                let record = self.score_turn(&dialogue.id, turn_index, position, &turn).await;
                self.context.push_str(&turn.context_entry());
                self.push_result(record);
            }

            self.state = PipelineState::IteratingQa;
            for (question_index, record) in dialogue.questions.iter().enumerate() {
                if self.counter >= budget {
                    break 'dialogues;
                }
                let item = match Task::from_record(record) {
                    Task::Qa(item) => item,
                    other => {
                        tracing::warn!(
                            dialog_id = %dialogue.id,
                            question_index,
                            "Expected QA task, found {}. Skipping.",
                            other.kind()
                        );
                        continue;
                    }
                };

                let position = self.advance();
                if position < threshold {
                    self.progress
                        .set_message(format!("Skipping task {}/{}", self.counter, budget));
                    continue;
                }

                self.progress.set_message(format!(
                    "Dialog {}, QA task {} (task {})",
                    dialogue.id, question_index, self.counter
                ));
                let record = self
                    .answer_question(&dialogue.id, question_index, position, &item)
                    .await;
                self.push_result(record);
            }
        }

        self.state = PipelineState::Completed;
        self.progress.finish_and_clear();

        let summary = RunSummary {
            tasks_counted: self.counter,
            tasks_scored: self.results.len(),
            budget,
            checkpoints: self.checkpoints,
            failed_calls: self.failed_calls,
        };

        if self.counter < budget {
            tracing::warn!(
                "Processing stopped after {} of {} tasks; some records were not recognised",
                self.counter,
                budget
            );
        }
        if self.results.is_empty() {
            tracing::warn!("No tasks were processed. Check the data file and max_iterations setting.");
        }
        tracing::info!(
            counted = summary.tasks_counted,
            scored = summary.tasks_scored,
            failed_calls = summary.failed_calls,
            "Dialogue processing complete"
        );

        Ok(summary)
    }

    /// Count one task and return its 0-based global position.
    fn advance(&mut self) -> usize {
        self.counter += 1;
        self.progress.inc(1);
        self.counter - 1
    }

    async fn score_turn(
        &mut self,
        dialogue_id: &DialogueId,
        turn_index: usize,
        position: usize,
        turn: &McqTurn,
    ) -> ResultRecord {
        let prompt = self.builder.mcq(&self.context, turn);
        let exchange = self.exchange(prompt, TaskKind::Mcq).await;
        let verdict = judge_mcq(exchange.response_text(), turn.correct_index, self.builder.style());

        tracing::debug!(
            dialog_id = %dialogue_id,
            turn_index,
            predicted = ?verdict.predicted_choice,
            correct = verdict.is_correct,
            "Scored MCQ turn"
        );

        ResultRecord::mcq(
            dialogue_id.clone(),
            position,
            turn.question.clone(),
            exchange,
            McqOutcome {
                turn_index,
                agent_answer: turn.answer.clone(),
                options: turn.options.clone(),
                correct_index: turn.correct_index,
                explicit_answer: turn.explicit_answer.clone(),
                predicted_choice: verdict.predicted_choice,
                predicted_index: verdict.predicted_index,
                is_correct: verdict.is_correct,
                reasoning: verdict.reasoning,
            },
        )
    }

    async fn answer_question(
        &mut self,
        dialogue_id: &DialogueId,
        question_index: usize,
        position: usize,
        item: &QaItem,
    ) -> ResultRecord {
        let prompt = self.builder.qa(&self.context, item);
        let exchange = self.exchange(prompt, TaskKind::Qa).await;

        ResultRecord::qa(
            dialogue_id.clone(),
            position,
            item.question.clone(),
            exchange,
            QaOutcome {
                question_index,
                reference_answer: item.reference_answer.clone(),
            },
        )
    }

    async fn exchange(&mut self, prompt: String, kind: TaskKind) -> ModelExchange {
        let messages = [ChatMessage::user(prompt)];
        let outcome = self.client.respond(&messages, kind).await;
        let [message] = messages;
        let prompt_style = self.builder.style().label().to_string();

        match outcome {
            Ok(reply) => ModelExchange {
                prompt: message.content,
                prompt_style,
                response: reply.content,
                elapsed_secs: reply.elapsed.as_secs_f64(),
                usage: reply.usage,
                error: None,
            },
            Err(err) => {
                self.failed_calls += 1;
                tracing::warn!(error = %err, task_kind = %kind, "Model call failed");
                ModelExchange {
                    prompt: message.content,
                    prompt_style,
                    response: String::new(),
                    elapsed_secs: 0.0,
                    usage: Default::default(),
                    error: Some(format!("API Error: {}", err)),
                }
            }
        }
    }

    fn push_result(&mut self, record: ResultRecord) {
        self.results.push(record);

        let scored = self.results.len();
        if scored % self.options.save_interval.max(1) != 0 {
            return;
        }

        let resume_state = self.state;
        self.state = PipelineState::Checkpointing;
        self.checkpoints += 1;
        if let Err(err) = self.sink.write_checkpoint(&self.results, scored) {
            tracing::warn!(
                error = %err,
                "Could not save interim results after {} tasks",
                scored
            );
        }
        self.state = resume_state;
    }
}

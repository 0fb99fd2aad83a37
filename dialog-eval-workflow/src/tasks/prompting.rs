//! Prompt templates for implicature and follow-up question tasks.
//!
//! The template text is part of the contract with the response parser: the
//! chain-of-thought template asks for the `Final Answer:` marker that
//! [`parse_choice`](super::evaluation::parse_choice) looks for first. Change
//! both together.

use dialog_eval_core::{McqTurn, PromptStyle, QaItem};

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";
pub const REASONING_MARKER: &str = "Reasoning:";

/// Renders prompts for a single, fixed prompting style.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    style: PromptStyle,
}

impl PromptBuilder {
    pub fn new(style: PromptStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &PromptStyle {
        &self.style
    }

    /// Prompt for an implicature question about the last turn of `context`.
    pub fn mcq(&self, context: &str, turn: &McqTurn) -> String {
        match &self.style {
            PromptStyle::ZeroShot => zero_shot_mcq(context, turn),
            PromptStyle::ChainOfThought => chain_of_thought_mcq(context, turn),
            PromptStyle::Unrecognized(name) => {
                tracing::warn!(
                    prompt_style = %name,
                    "Unknown prompt style, defaulting to chain-of-thought"
                );
                chain_of_thought_mcq(context, turn)
            }
        }
    }

    /// Prompt for a free-form question about the dialogue so far.
    pub fn qa(&self, context: &str, item: &QaItem) -> String {
        match &self.style {
            PromptStyle::ZeroShot => format!(
                "Based on the conversation history provided below, answer the question about the conversation.\n\n\
                 Conversation History:\n\
                 {context}\n\
                 Question: {question}\n\n\
                 Answer:",
                context = context,
                question = item.question,
            ),
            _ => format!(
                "Based on the conversation history provided below and the question: first provide step-by-step reasoning \
                 to determine the answer to the question about the conversation, then write down your answer.\n\n\
                 Conversation History:\n\
                 {context}\n\
                 Question: {question}\n\n\
                 Answer:",
                context = context,
                question = item.question,
            ),
        }
    }
}

/// Options numbered from 1, one per line.
pub fn format_options(options: &[String]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}) {}", i + 1, option))
        .collect::<Vec<_>>()
        .join("\n")
}

fn current_turn(turn: &McqTurn) -> String {
    format!("Last Question: {}\nLast Answer: {}", turn.question, turn.answer)
}

fn chain_of_thought_mcq(context: &str, turn: &McqTurn) -> String {
    format!(
        "Consider the dialogue context below, paying close attention to the final Question-Answer pair.\n\n\
         Dialogue Context:\n\
         {context}\n\
         {current}\n\n\
         Task: What is the most likely implied meaning (implicature) of the *last Answer* (\"{answer}\") in response to \
         the *last Question* (\"{question}\"), given the preceding dialogue? First, reason step by step based on the \
         Dialogue Context to determine the implied meaning of the last Answer, then choose the best option (1-4) \
         representing this implied meaning.\n\n\
         Options:\n\
         {options}\n\n\
         Start your response with \"{reasoning}\" followed by your step-by-step reasoning. End it with a final line of \
         the form \"{marker} <n>\", where <n> is the number of the chosen option.",
        context = context,
        current = current_turn(turn),
        answer = turn.answer,
        question = turn.question,
        options = format_options(&turn.options),
        reasoning = REASONING_MARKER,
        marker = FINAL_ANSWER_MARKER,
    )
}

fn zero_shot_mcq(context: &str, turn: &McqTurn) -> String {
    format!(
        "Consider the dialogue context below, paying close attention to the final Question-Answer pair.\n\n\
         Conversation History:\n\
         {context}\n\
         {current}\n\n\
         Task: What is the most likely implied meaning (implicature) of the *last Answer* (\"{answer}\") in response to \
         the *last Question* (\"{question}\"), given the preceding dialogue? Choose the best option representing this \
         implied meaning.\n\n\
         Options:\n\
         {options}\n\n\
         Choice (1-4):",
        context = context,
        current = current_turn(turn),
        answer = turn.answer,
        question = turn.question,
        options = format_options(&turn.options),
    )
}

use dialog_eval_core::PromptStyle;
use once_cell::sync::Lazy;
use regex::Regex;

use super::prompting::{FINAL_ANSWER_MARKER, REASONING_MARKER};

/// Choices the prompts offer, 1-based.
pub const CHOICE_RANGE: std::ops::RangeInclusive<u8> = 1..=4;

static FINAL_ANSWER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{}\s*([1-4])", regex::escape(FINAL_ANSWER_MARKER)))
        .expect("final answer pattern is valid")
});

// A choice digit ending the text, not preceded by another choice digit.
static TRAILING_CHOICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^1-4]([1-4])$").expect("trailing choice pattern is valid"));

static REASONING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is){}(.*?){}",
        regex::escape(REASONING_MARKER),
        regex::escape(FINAL_ANSWER_MARKER)
    ))
    .expect("reasoning pattern is valid")
});

/// Extract the chosen option (1-4) from free model output.
///
/// Rules, first match wins: an explicit `Final Answer: n` marker, then a
/// lone trailing choice digit, then a response consisting of the digit alone.
/// `None` means no answer was found.
pub fn parse_choice(response: Option<&str>) -> Option<u8> {
    let text = response?;

    if let Some(caps) = FINAL_ANSWER_RE.captures(text) {
        return digit(&caps[1]);
    }

    if let Some(caps) = TRAILING_CHOICE_RE.captures(text) {
        return digit(&caps[1]);
    }

    if text.len() == 1 {
        return digit(text).filter(|choice| CHOICE_RANGE.contains(choice));
    }

    None
}

fn digit(text: &str) -> Option<u8> {
    text.parse().ok()
}

/// Text between `Reasoning:` and `Final Answer:`, trimmed.
pub fn extract_reasoning(response: &str) -> Option<String> {
    REASONING_RE
        .captures(response)
        .map(|caps| caps[1].trim().to_string())
}

/// Scored interpretation of one MCQ response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct McqVerdict {
    pub predicted_choice: Option<u8>,
    pub predicted_index: Option<usize>,
    pub is_correct: bool,
    pub reasoning: String,
}

/// Parse and score an MCQ response against the known correct index.
///
/// A missing response (failed call or empty text) yields an empty verdict.
/// An unknown correct index never counts as correct.
pub fn judge_mcq(response: Option<&str>, correct_index: Option<usize>, style: &PromptStyle) -> McqVerdict {
    let Some(text) = response else {
        return McqVerdict::default();
    };

    let predicted_choice = parse_choice(Some(text));
    let predicted_index = predicted_choice.map(|choice| usize::from(choice) - 1);
    let is_correct = matches!(
        (predicted_index, correct_index),
        (Some(predicted), Some(correct)) if predicted == correct
    );

    let reasoning = if style.uses_reasoning_template() {
        match extract_reasoning(text) {
            Some(reasoning) => reasoning,
            None if predicted_choice.is_none() => {
                format!("[Parse Error or No Final Answer] Full Response: {}", text)
            }
            None => String::new(),
        }
    } else if predicted_choice.is_none() {
        format!("[Parse Error] Full Response: {}", text)
    } else {
        String::new()
    };

    McqVerdict {
        predicted_choice,
        predicted_index,
        is_correct,
        reasoning,
    }
}

use dialog_eval_core::{McqTurn, PromptStyle, QaItem};
use dialog_eval_workflow::*;
use pretty_assertions::assert_eq;

const CONTEXT: &str = "Question: Did you see the game?\nAnswer: I was at work all night.\n\n";

fn turn() -> McqTurn {
    McqTurn {
        question: "Are you coming to the party?".to_string(),
        answer: "I have a deadline tomorrow.".to_string(),
        options: vec![
            "Yes, definitely.".to_string(),
            "Probably not.".to_string(),
            "They love parties.".to_string(),
            "The deadline moved.".to_string(),
        ],
        correct_index: Some(1),
        explicit_answer: Some("No.".to_string()),
    }
}

fn item() -> QaItem {
    QaItem {
        question: "Why might B skip the party?".to_string(),
        reference_answer: "B has a deadline.".to_string(),
    }
}

#[test]
fn test_zero_shot_mcq_template() {
    let prompt = PromptBuilder::new(PromptStyle::ZeroShot).mcq(CONTEXT, &turn());

    assert_eq!(
        prompt,
        "Consider the dialogue context below, paying close attention to the final Question-Answer pair.\n\n\
         Conversation History:\n\
         Question: Did you see the game?\nAnswer: I was at work all night.\n\n\n\
         Last Question: Are you coming to the party?\n\
         Last Answer: I have a deadline tomorrow.\n\n\
         Task: What is the most likely implied meaning (implicature) of the *last Answer* (\"I have a deadline tomorrow.\") \
         in response to the *last Question* (\"Are you coming to the party?\"), given the preceding dialogue? \
         Choose the best option representing this implied meaning.\n\n\
         Options:\n\
         1) Yes, definitely.\n\
         2) Probably not.\n\
         3) They love parties.\n\
         4) The deadline moved.\n\n\
         Choice (1-4):"
    );
    assert!(!prompt.contains(FINAL_ANSWER_MARKER));
}

#[test]
fn test_chain_of_thought_mcq_template() {
    let prompt = PromptBuilder::new(PromptStyle::ChainOfThought).mcq(CONTEXT, &turn());

    assert_eq!(
        prompt,
        "Consider the dialogue context below, paying close attention to the final Question-Answer pair.\n\n\
         Dialogue Context:\n\
         Question: Did you see the game?\nAnswer: I was at work all night.\n\n\n\
         Last Question: Are you coming to the party?\n\
         Last Answer: I have a deadline tomorrow.\n\n\
         Task: What is the most likely implied meaning (implicature) of the *last Answer* (\"I have a deadline tomorrow.\") \
         in response to the *last Question* (\"Are you coming to the party?\"), given the preceding dialogue? \
         First, reason step by step based on the Dialogue Context to determine the implied meaning of the last Answer, \
         then choose the best option (1-4) representing this implied meaning.\n\n\
         Options:\n\
         1) Yes, definitely.\n\
         2) Probably not.\n\
         3) They love parties.\n\
         4) The deadline moved.\n\n\
         Start your response with \"Reasoning:\" followed by your step-by-step reasoning. \
         End it with a final line of the form \"Final Answer: <n>\", where <n> is the number of the chosen option."
    );
    assert!(prompt.contains(REASONING_MARKER));
    assert!(prompt.contains(FINAL_ANSWER_MARKER));
}

#[test]
fn test_unrecognized_style_renders_chain_of_thought() {
    let fallback = PromptBuilder::new(PromptStyle::Unrecognized("few-shot".to_string()));
    let cot = PromptBuilder::new(PromptStyle::ChainOfThought);

    assert_eq!(fallback.mcq(CONTEXT, &turn()), cot.mcq(CONTEXT, &turn()));
    assert_eq!(fallback.qa(CONTEXT, &item()), cot.qa(CONTEXT, &item()));
}

#[test]
fn test_zero_shot_qa_template() {
    let prompt = PromptBuilder::new(PromptStyle::ZeroShot).qa(CONTEXT, &item());

    assert_eq!(
        prompt,
        "Based on the conversation history provided below, answer the question about the conversation.\n\n\
         Conversation History:\n\
         Question: Did you see the game?\nAnswer: I was at work all night.\n\n\n\
         Question: Why might B skip the party?\n\n\
         Answer:"
    );
}

#[test]
fn test_reasoning_qa_template() {
    let prompt = PromptBuilder::new(PromptStyle::ChainOfThought).qa(CONTEXT, &item());

    assert_eq!(
        prompt,
        "Based on the conversation history provided below and the question: first provide step-by-step reasoning \
         to determine the answer to the question about the conversation, then write down your answer.\n\n\
         Conversation History:\n\
         Question: Did you see the game?\nAnswer: I was at work all night.\n\n\n\
         Question: Why might B skip the party?\n\n\
         Answer:"
    );
}

#[test]
fn test_empty_context_still_renders_current_turn() {
    let prompt = PromptBuilder::new(PromptStyle::ZeroShot).mcq("", &turn());
    assert!(prompt.contains("Conversation History:\n\nLast Question: Are you coming to the party?"));
}

#[test]
fn test_format_options() {
    let options = vec!["a".to_string(), "b".to_string()];
    assert_eq!(format_options(&options), "1) a\n2) b");
    assert_eq!(format_options(&[]), "");
}

use dialog_eval_core::{DialogueId, EvalError, Task};
use dialog_eval_workflow::load_dataset;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

const DATASET: &str = r#"{
  "data": {
    "dialogs": [
      {
        "dialog_id": 3,
        "dialog": [
          {
            "question": "Is the report done?",
            "answer": "I sent a draft.",
            "explict_answer": "Not finished.",
            "option": ["Finished", "Draft only", "Never started", "Lost it"],
            "answer_index": 1
          }
        ],
        "question": [
          { "question": "What did A send?", "answer": "A draft." }
        ]
      }
    ]
  }
}"#;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_dataset() {
    let file = write_temp(DATASET);

    let dataset = load_dataset(file.path()).await.unwrap();

    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.total_tasks(), 2);
    let dialogue = &dataset.dialogues[0];
    assert_eq!(dialogue.id, DialogueId::Number(3));
    match Task::from_record(&dialogue.turns[0]) {
        Task::Mcq(turn) => {
            assert_eq!(turn.correct_index, Some(1));
            assert_eq!(turn.explicit_answer.as_deref(), Some("Not finished."));
        }
        other => panic!("expected MCQ, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dataset(dir.path().join("missing.json")).await.unwrap_err();
    assert!(matches!(err, EvalError::NotFound(_)));
}

#[tokio::test]
async fn test_invalid_json() {
    let file = write_temp("{ not json");
    let err = load_dataset(file.path()).await.unwrap_err();

    match err {
        EvalError::Dataset(message) => assert!(message.starts_with("could not decode JSON")),
        other => panic!("expected dataset error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_envelope() {
    let file = write_temp(r#"{"dialogs": []}"#);
    let err = load_dataset(file.path()).await.unwrap_err();
    assert!(matches!(err, EvalError::Dataset(_)));
}

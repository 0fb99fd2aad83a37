use dialog_eval_core::{Dataset, EvalError, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Read and parse a dialogue dataset file.
///
/// Missing files and malformed documents are fatal: the run cannot start
/// without a dataset.
pub async fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    tracing::info!("Loading dialog data from {}", path.display());

    let raw = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => EvalError::NotFound(format!("data file {}", path.display())),
        _ => EvalError::Io(e),
    })?;

    let dataset = Dataset::from_json_str(&raw).map_err(|e| match e {
        EvalError::Serialization(msg) => {
            EvalError::Dataset(format!("could not decode JSON from {}: {}", path.display(), msg))
        }
        other => other,
    })?;

    tracing::info!(
        dialogs = dataset.len(),
        tasks = dataset.total_tasks(),
        "Loaded {} dialogs from {}",
        dataset.len(),
        path.display()
    );

    Ok(dataset)
}

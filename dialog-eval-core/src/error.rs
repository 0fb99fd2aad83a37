use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, EvalError>;

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for EvalError {
    fn from(err: config::ConfigError) -> Self {
        EvalError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for EvalError {
    fn from(err: validator::ValidationErrors) -> Self {
        EvalError::Validation(err.to_string())
    }
}

/// Failure of a single model call.
///
/// These never abort a run: the pipeline records them on the affected task.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response contained no message content")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("client configuration: {0}")]
    Config(String),
}

impl InferenceError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            InferenceError::Timeout(_) | InferenceError::Transport(_) => true,
            InferenceError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

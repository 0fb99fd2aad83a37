use config::{Config as ConfigLoader, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

use super::dataset::TaskKind;
use super::prompt::PromptStyle;
use crate::error::{EvalError, Result};

pub const ENV_PREFIX: &str = "DIALOG_EVAL";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

// ===== Model Settings =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ModelSettings {
    #[validate(length(min = 1, max = 255))]
    pub model: String,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    /// Completion limit for MCQ tasks.
    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1))]
    pub max_tokens: u32,
    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1))]
    pub qa_max_tokens: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    #[validate(range(min = 1))]
    pub timeout: u64,
    #[serde(default)]
    pub prompt_style: PromptStyle,
    #[serde(default)]
    pub use_logit_bias: bool,
    #[serde(default = "default_logit_bias_map")]
    pub logit_bias_map: HashMap<String, i32>,
    #[serde(default = "default_api_base")]
    #[validate(length(min = 1))]
    pub api_base: String,
    #[serde(default)]
    #[validate(range(max = 10))]
    pub max_retries: u32,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            qa_max_tokens: default_max_tokens(),
            timeout: default_timeout(),
            prompt_style: PromptStyle::default(),
            use_logit_bias: false,
            logit_bias_map: default_logit_bias_map(),
            api_base: default_api_base(),
            max_retries: 0,
        }
    }

    pub fn max_tokens_for(&self, kind: TaskKind) -> u32 {
        match kind {
            TaskKind::Qa => self.qa_max_tokens,
            _ => self.max_tokens,
        }
    }

    /// Logit bias applies to MCQ requests only, and only when enabled.
    pub fn logit_bias_for(&self, kind: TaskKind) -> Option<&HashMap<String, i32>> {
        (kind == TaskKind::Mcq && self.use_logit_bias).then_some(&self.logit_bias_map)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_max_tokens() -> u32 {
    200
}

fn default_timeout() -> u64 {
    30
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// Token ids of the digits 1-4 in the cl100k vocabulary.
fn default_logit_bias_map() -> HashMap<String, i32> {
    ["16", "17", "18", "19"]
        .into_iter()
        .map(|token| (token.to_string(), 100))
        .collect()
}

// ===== Data and Output =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSettings {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("./results")
}

/// How long the running dialogue context lives.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextScope {
    /// One context accumulated over the whole run.
    #[default]
    Run,
    /// Cleared at every dialogue boundary.
    Dialogue,
}

// ===== Complete Evaluation Configuration =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct EvalConfig {
    #[validate(nested)]
    pub model: ModelSettings,
    pub data: DataSettings,
    #[serde(default)]
    pub output: OutputSettings,
    /// `None` means no limit beyond the dataset size.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_iterations: Option<usize>,
    #[serde(default = "default_save_interval")]
    #[validate(range(min = 1))]
    pub save_interval: usize,
    #[serde(default)]
    pub context_scope: ContextScope,
}

fn default_save_interval() -> usize {
    100
}

impl EvalConfig {
    /// Load from a YAML (or any `config`-supported) file, layered with
    /// `DIALOG_EVAL__SECTION__KEY` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(EvalError::NotFound(format!(
                "configuration file {}",
                path.display()
            )));
        }

        let settings = ConfigLoader::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize::<Self>()?.finish()
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let settings = ConfigLoader::builder()
            .add_source(File::from_str(raw, FileFormat::Yaml))
            .build()?;

        settings.try_deserialize::<Self>()?.finish()
    }

    fn finish(mut self) -> Result<Self> {
        let normalized = self.data.path.to_string_lossy().replace('\\', "/");
        self.data.path = PathBuf::from(normalized);
        self.validate()?;
        Ok(self)
    }
}

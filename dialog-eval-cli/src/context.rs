//! Run context resolved from arguments and configuration

use anyhow::{Context as _, Result};
use dialog_eval_core::EvalConfig;
use dialog_eval_workflow::{output_prefix, OpenAiClient};
use std::path::PathBuf;

use crate::cli::Cli;

/// Everything a run needs before the dataset is loaded.
#[derive(Debug)]
pub struct RunContext {
    pub config: EvalConfig,
    pub output_dir: PathBuf,
    pub start_iteration: usize,
    /// Filename prefix of the final tables, `<type>_<style>`.
    pub prefix: String,
}

impl RunContext {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = EvalConfig::load(&cli.config)
            .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

        let output_dir = cli
            .output_dir
            .clone()
            .unwrap_or_else(|| config.output.directory.clone());
        let start_iteration = usize::try_from(cli.start_iteration)
            .context("start iteration does not fit in memory on this platform")?;
        let prefix = output_prefix(&config.data.path, &config.model.prompt_style);

        Ok(Self {
            config,
            output_dir,
            start_iteration,
            prefix,
        })
    }

    /// Model client using the configured model and the API key from the environment.
    pub fn client(&self) -> Result<OpenAiClient> {
        OpenAiClient::from_env(self.config.model.clone()).context("failed to create model client")
    }
}

use anyhow::{Context as _, Result};
use clap::Parser;
use dialog_eval_core::ResultSink;
use dialog_eval_workflow::{load_dataset, CsvResultSink, DialoguePipeline, PipelineOptions};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod context;
mod output;

use cli::Cli;
use context::RunContext;
use output::RunReport;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dialog_eval=info,dialog_eval_workflow=info,dialog_eval_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = RunContext::new(&cli)?;
    tracing::info!(
        model = %ctx.config.model.model,
        prompt_style = %ctx.config.model.prompt_style,
        output_dir = %ctx.output_dir.display(),
        "Configuration loaded"
    );

    let dataset = load_dataset(&ctx.config.data.path)
        .await
        .context("failed to load dataset")?;
    let client = ctx.client()?;
    let sink = CsvResultSink::create(&ctx.output_dir).with_context(|| {
        format!("failed to create output directory {}", ctx.output_dir.display())
    })?;
    let sink = Arc::new(sink);

    let mut pipeline = DialoguePipeline::new(
        Arc::new(client),
        sink.clone(),
        PipelineOptions::from(&ctx.config),
    );
    let progress = output::progress_bar(pipeline.budget_for(&dataset) as u64)?;
    pipeline = pipeline.with_progress(progress.clone());

    let interrupted = tokio::select! {
        outcome = pipeline.run(&dataset, ctx.start_iteration) => {
            outcome?;
            false
        }
        Ok(()) = tokio::signal::ctrl_c() => {
            progress.abandon_with_message("interrupted");
            tracing::warn!("Interrupted, saving the tasks completed so far");
            true
        }
    };

    let records = pipeline.into_results();
    let files = sink
        .write_results(&records, &ctx.prefix)
        .context("failed to write result tables")?;

    let mut report = RunReport::from_records(&records);
    report.interrupted = interrupted;
    report.files = files;
    report.print();

    Ok(())
}

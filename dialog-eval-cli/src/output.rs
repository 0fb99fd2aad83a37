//! Terminal output: progress display and the end-of-run summary

use anyhow::Result;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use dialog_eval_core::ResultRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Progress bar over the task budget.
pub fn progress_bar(total: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    Ok(pb)
}

/// Aggregate figures for one run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub mcq_total: usize,
    pub mcq_correct: usize,
    pub mcq_unparsed: usize,
    pub qa_total: usize,
    pub failed_calls: usize,
    pub interrupted: bool,
    pub files: Vec<PathBuf>,
}

impl RunReport {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut report = Self::default();
        for record in records {
            if record.exchange.is_failed() {
                report.failed_calls += 1;
            }
            if let Some(outcome) = record.as_mcq() {
                report.mcq_total += 1;
                if outcome.is_correct {
                    report.mcq_correct += 1;
                }
                if outcome.predicted_choice.is_none() {
                    report.mcq_unparsed += 1;
                }
            } else if record.as_qa().is_some() {
                report.qa_total += 1;
            }
        }
        report
    }

    /// MCQ accuracy in percent, if any MCQ was scored.
    pub fn accuracy(&self) -> Option<f64> {
        (self.mcq_total > 0).then(|| self.mcq_correct as f64 * 100.0 / self.mcq_total as f64)
    }

    pub fn print(&self) {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        table.set_header(vec![
            Cell::new("Metric").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

        let accuracy = self
            .accuracy()
            .map(|value| format!("{:.2}%", value))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![Cell::new("MCQ tasks"), Cell::new(self.mcq_total)]);
        table.add_row(vec![Cell::new("MCQ correct"), Cell::new(self.mcq_correct)]);
        table.add_row(vec![Cell::new("MCQ accuracy"), Cell::new(accuracy)]);
        table.add_row(vec![Cell::new("MCQ without answer"), Cell::new(self.mcq_unparsed)]);
        table.add_row(vec![Cell::new("QA tasks"), Cell::new(self.qa_total)]);
        table.add_row(vec![Cell::new("Failed model calls"), Cell::new(self.failed_calls)]);

        println!("\n{}", "Run summary".bold().underline());
        println!("{table}");

        if self.interrupted {
            println!("{} Run was interrupted; tables hold the tasks completed so far", "⚠".yellow());
        }
        if self.files.is_empty() {
            println!("{} No result tables were written", "⚠".yellow());
        }
        for file in &self.files {
            println!("{} {}", "✓".green(), file.display());
        }
    }
}

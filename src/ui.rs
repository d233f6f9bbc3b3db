// UI layer: console progress for a run, the confirmation prompt shown before
// anything is created remotely, and the final prediction report.

use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use crate::models::{ImagePrediction, TrainingStatus};
use crate::prediction::report_lines;
use crate::progress::Progress;
use crate::workflow::RunReport;

/// `Progress` implementation drawing an upload bar and a training spinner.
/// When stdout is not a terminal the bars stay hidden and plain lines are
/// printed instead.
#[derive(Default)]
pub struct ConsoleProgress {
    uploads: Mutex<Option<ProgressBar>>,
    training: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

fn style(template: &str, fallback: fn() -> ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| fallback())
}

/// Print through `bar` so the line does not tear the bar apart.
fn print_line(bar: Option<&ProgressBar>, line: String) {
    match bar {
        Some(bar) if !bar.is_hidden() => bar.println(line),
        _ => println!("{}", line),
    }
}

impl Progress for ConsoleProgress {
    fn step(&self, message: &str) {
        println!("{}", message.bold());
    }

    fn uploads_started(&self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(style(
            "{bar:40.cyan/blue} {pos}/{len} {msg}",
            ProgressStyle::default_bar,
        ));
        if let Ok(mut slot) = self.uploads.lock() {
            *slot = Some(bar);
        }
    }

    fn image_uploaded(&self, file: &str, ok: bool) {
        let slot = match self.uploads.lock() {
            Ok(slot) => slot,
            Err(_) => return,
        };
        if let Some(bar) = slot.as_ref() {
            bar.inc(1);
            bar.set_message(file.to_string());
        }
        if !ok {
            print_line(slot.as_ref(), format!("{} {}", "upload failed:".red(), file));
        }
    }

    fn uploads_finished(&self) {
        if let Ok(mut slot) = self.uploads.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }

    fn training_status(&self, status: &TrainingStatus) {
        let mut slot = match self.training.lock() {
            Ok(slot) => slot,
            Err(_) => return,
        };
        let spinner = slot.get_or_insert_with(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(style("{spinner} {msg}", ProgressStyle::default_spinner));
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner
        });
        let line = format!("Training status: {}", status);
        if spinner.is_hidden() {
            println!("{}", line);
        } else {
            spinner.set_message(line);
        }
    }

    fn training_finished(&self, status: &TrainingStatus) {
        if let Ok(mut slot) = self.training.lock() {
            if let Some(spinner) = slot.take() {
                spinner.finish_and_clear();
            }
        }
        let status = match status {
            TrainingStatus::Completed => status.to_string().green(),
            _ => status.to_string().red(),
        };
        println!("Training status: {}", status);
    }
}

/// Ask before creating a project. Non-interactive sessions proceed.
pub fn confirm_project_creation(project_name: &str, endpoint: &str) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Ok(true);
    }
    let answer = Confirm::new()
        .with_prompt(format!(
            "Create a new project \"{}\" on {}?",
            project_name, endpoint
        ))
        .default(true)
        .interact()?;
    Ok(answer)
}

pub fn print_results(prediction: &ImagePrediction) {
    println!("{}", "Results:".bold());
    for line in report_lines(prediction) {
        println!("\t {}", line);
    }
}

pub fn print_summary(report: &RunReport) {
    println!(
        "Project {} ({} images uploaded), iteration {} is now the default.",
        report.project.id.as_str().cyan(),
        report.uploads.succeeded(),
        report.iteration.id.as_str().cyan()
    );
}

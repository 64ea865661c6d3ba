//! Check command implementation
//!
//! Analyzes each input in check mode and reports the repairs it needs
//! without writing anything.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use quartet_format::Mode;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{CheckOutput, FileReport};
use super::reporting;
use crate::analysis::{Analysis, Status};
use crate::input::{collect_inputs, load_input};

/// Run the check command
///
/// # Arguments
/// * `paths` - Files or directories to check
/// * `recursive` - Whether directories are scanned recursively
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 if every file is clean, 1 if repairs are needed, 2 if a
/// file could not be analyzed
pub fn run(paths: &[String], recursive: bool, json_output: bool) -> Result<ExitCode> {
    let files = collect_inputs(paths, recursive);
    if files.is_empty() {
        bail!("no Quartet files found in {}", paths.join(", "));
    }

    let reports: Vec<FileReport> = files
        .iter()
        .map(|path| check_file(path, json_output))
        .collect();
    let output = CheckOutput::new(reports);

    if json_output {
        let json = serde_json::to_string_pretty(&output)
            .context("Failed to serialize check report")?;
        println!("{}", json);
    } else {
        print_summary(&output);
    }
    Ok(output.status().into())
}

fn check_file(path: &Path, json_output: bool) -> FileReport {
    let input = match load_input(path) {
        Ok(input) => input,
        Err(err) => {
            if !json_output {
                println!("{} {}", "Checking:".cyan().bold(), path.display());
                println!("  {} {}", "x".red(), err.to_string().red());
                reporting::print_status(Status::Failed);
            }
            return FileReport::input_error(&path.display().to_string(), &err);
        }
    };

    let analysis = Analysis::run(&input, Mode::Check);
    if !json_output {
        reporting::print_analysis(&analysis);
    }
    FileReport::from(&analysis)
}

fn print_summary(output: &CheckOutput) {
    let summary = &output.summary;
    if summary.files < 2 {
        return;
    }
    let line = format!(
        "{} file(s): {} clean, {} to repair, {} failed",
        summary.files, summary.clean, summary.modified, summary.failed
    );
    match output.status() {
        Status::Clean => println!("\n{}", line.green().bold()),
        Status::Modified => println!("\n{}", line.yellow().bold()),
        Status::Failed => println!("\n{}", line.red().bold()),
    }
}

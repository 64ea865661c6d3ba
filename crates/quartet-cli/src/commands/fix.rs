//! Fix command implementation
//!
//! Analyzes an input in fix mode and writes the repaired bank and songs as
//! separate files. Nothing is written when the analysis fails.

use anyhow::{Context, Result};
use colored::Colorize;
use quartet_format::Mode;
use std::path::Path;
use std::process::ExitCode;

use super::{reporting, song_file_name, write_output};
use crate::analysis::{Analysis, Status};
use crate::input::load_input;

/// Run the fix command
///
/// # Arguments
/// * `input` - Input file (.4q, .quar, .set or .4v)
/// * `out_dir` - Directory receiving `<stem>.set` and the songs
///
/// # Returns
/// Exit code: 0 if nothing needed repair, 1 if repaired files were written,
/// 2 if the input could not be repaired
pub fn run(input: &str, out_dir: &str) -> Result<ExitCode> {
    let loaded = load_input(Path::new(input))
        .with_context(|| format!("Failed to load input file: {}", input))?;
    let analysis = Analysis::run(&loaded, Mode::Fix);
    reporting::print_analysis(&analysis);

    if analysis.status() == Status::Failed {
        println!("{}", "Nothing written".red().bold());
        return Ok(analysis.status().into());
    }

    let out_dir = Path::new(out_dir);
    let stem = loaded.stem();
    if let Some(set) = &analysis.set {
        // A song's companion bank keeps its own name.
        let set_stem = analysis
            .set_path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| stem.clone());
        write_output(out_dir, &format!("{}.set", set_stem), &set.to_bytes())?;
    }
    let count = analysis.songs.len();
    for (i, song) in analysis.songs.iter().enumerate() {
        write_output(out_dir, &song_file_name(&stem, i, count), &song.to_bytes())?;
    }

    Ok(analysis.status().into())
}

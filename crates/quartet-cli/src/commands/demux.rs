//! Demux command implementation
//!
//! Splits a `.4q` or `.quar` container into its song, bank and info files.
//! Chunks are written as stored; use `fix` to repair them.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use quartet_format::charset::decode_atari;
use quartet_format::{demux, Report};
use std::path::Path;
use std::process::ExitCode;

use super::{reporting, song_file_name, write_output};

/// Run the demux command
///
/// # Arguments
/// * `input` - Container file
/// * `out_dir` - Output directory (default: the input's directory)
/// * `utf8` - Convert the info text from the Atari ST charset
pub fn run(input: &str, out_dir: Option<&str>, utf8: bool) -> Result<ExitCode> {
    let path = Path::new(input);
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read container: {}", input))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());
    let mut report = Report::new(name);
    let Some(bundle) = demux(&data, &mut report)? else {
        bail!("{} is not a .4q or .quar container", input);
    };

    println!(
        "{} {} ({}, {} song(s))",
        "Demuxing:".cyan().bold(),
        input,
        bundle.kind.extension(),
        bundle.songs.len()
    );
    reporting::print_report(&report);

    let out_dir = match out_dir {
        Some(dir) => Path::new(dir).to_path_buf(),
        None => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf(),
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "quartet".to_string());

    let count = bundle.songs.len();
    for (i, song) in bundle.songs.iter().enumerate() {
        write_output(&out_dir, &song_file_name(&stem, i, count), song)?;
    }
    write_output(&out_dir, &format!("{}.set", stem), bundle.instrument_set)?;
    if let Some(info) = bundle.info {
        let text = if utf8 {
            decode_atari(info).into_bytes()
        } else {
            info.to_vec()
        };
        write_output(&out_dir, &format!("{}.txt", stem), &text)?;
    }

    Ok(ExitCode::SUCCESS)
}

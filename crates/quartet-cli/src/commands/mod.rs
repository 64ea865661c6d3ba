//! CLI command implementations

pub mod check;
pub mod demux;
pub mod extract;
pub mod fix;
pub mod json_output;

mod reporting;

use anyhow::{Context, Result};
use std::path::Path;

/// Create `dir` if needed and write `name` into it.
pub(crate) fn write_output(dir: &Path, name: &str, data: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, data)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    println!("  {} {}", colored::Colorize::green("->"), path.display());
    Ok(())
}

/// Output name of song `index` out of `count`: `<stem>.4v`, or
/// `<stem>-NN.4v` when there are several.
pub(crate) fn song_file_name(stem: &str, index: usize, count: usize) -> String {
    if count > 1 {
        format!("{}-{:02}.4v", stem, index + 1)
    } else {
        format!("{}.4v", stem)
    }
}

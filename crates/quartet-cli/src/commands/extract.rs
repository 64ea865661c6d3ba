//! Extract command implementation
//!
//! Writes each instrument of a bank as an unsigned 8-bit mono WAV file.

use anyhow::{Context, Result};
use colored::Colorize;
use quartet_format::{Instrument, InstrumentSet, Mode};
use std::path::Path;
use std::process::ExitCode;

use super::reporting;
use crate::analysis::{Analysis, Status};
use crate::input::load_input;

/// Run the extract command
///
/// # Arguments
/// * `input` - Bank, container, or song with a same-stem bank
/// * `out_dir` - Directory receiving `Inn-name.wav` files
pub fn run(input: &str, out_dir: &str) -> Result<ExitCode> {
    let loaded = load_input(Path::new(input))
        .with_context(|| format!("Failed to load input file: {}", input))?;
    let analysis = Analysis::run(&loaded, Mode::Check);
    reporting::print_analysis(&analysis);

    let set = match &analysis.set {
        Some(set) if analysis.status() != Status::Failed => set,
        Some(_) => return Ok(analysis.status().into()),
        None => anyhow::bail!("{} has no instrument bank", input),
    };

    let out_dir = Path::new(out_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;
    for inst in set.instruments() {
        let path = out_dir.join(wav_file_name(inst));
        write_wav(&path, set, inst)?;
        println!("  {} {}", "->".green(), path.display());
    }

    Ok(ExitCode::SUCCESS)
}

/// `Inn-name.wav`, with characters unsafe in file names replaced.
pub(crate) fn wav_file_name(inst: &Instrument) -> String {
    let name: String = inst
        .display_name()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() {
        format!("I{:02}.wav", inst.slot)
    } else {
        format!("I{:02}-{}.wav", inst.slot, name)
    }
}

/// Replay rate: the embedded header's, else the bank's.
pub(crate) fn sample_rate(set: &InstrumentSet, inst: &Instrument) -> u32 {
    match inst.sample_header.header() {
        Some(header) if header.sample_rate > 0 => header.sample_rate,
        _ => u32::from(set.rate_khz.max(1)) * 1000,
    }
}

fn write_wav(path: &Path, set: &InstrumentSet, inst: &Instrument) -> Result<()> {
    let pcm = set
        .pcm(inst.slot as usize)
        .with_context(|| format!("I#{:02} has no sample data", inst.slot))?;
    let signed = inst.sample_header.header().is_some_and(|h| h.signed);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate(set, inst),
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for &byte in pcm {
        let sample = if signed { byte as i8 } else { (byte ^ 0x80) as i8 };
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;
    Ok(())
}

//! Whole-file analysis.
//!
//! Runs the bank analyzer and the song validator over one loaded input and
//! keeps everything the commands need to print or write: the repaired
//! structures, the shared report and the first fatal error.

use quartet_format::{
    demux, AnalyzeOptions, InstrumentSet, Mode, QuartetError, QuartetResult, Report, Song,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::input::{InputKind, LoadedInput};

/// Outcome of an analysis, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Nothing to repair.
    Clean,
    /// Repairs were applied.
    Modified,
    /// A fatal error stopped the analysis.
    Failed,
}

impl Status {
    /// Process exit code for this status.
    pub fn exit_code(self) -> u8 {
        match self {
            Status::Clean => 0,
            Status::Modified => 1,
            Status::Failed => 2,
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status.exit_code())
    }
}

/// Result of analyzing one input file.
#[derive(Debug)]
pub struct Analysis {
    pub path: PathBuf,
    pub kind: InputKind,
    pub source_hash: String,
    /// Bank file the song was checked against, when it is not `path`.
    pub set_path: Option<PathBuf>,
    /// Repaired bank.
    pub set: Option<InstrumentSet>,
    /// Validated songs, in container order.
    pub songs: Vec<Song>,
    /// Container info text (Atari charset).
    pub info: Option<Vec<u8>>,
    pub report: Report,
    pub error: Option<QuartetError>,
}

impl Analysis {
    /// Analyze a loaded input.
    ///
    /// A fatal error does not discard what was decoded before it: a bank that
    /// analyzed fine is kept when one of its songs fails.
    pub fn run(input: &LoadedInput, mode: Mode) -> Self {
        let mut analysis = Self {
            path: input.path.clone(),
            kind: input.kind,
            source_hash: input.source_hash.clone(),
            set_path: None,
            set: None,
            songs: Vec::new(),
            info: None,
            report: Report::new(input.display_name()),
            error: None,
        };
        let options = AnalyzeOptions { mode };
        if let Err(err) = analysis.analyze(input, &options) {
            tracing::debug!(code = err.code(), "analysis failed: {}", err);
            analysis.error = Some(err);
        }
        analysis
    }

    fn analyze(&mut self, input: &LoadedInput, options: &AnalyzeOptions) -> QuartetResult<()> {
        match input.kind {
            InputKind::Container(_) => {
                let Some(bundle) = demux(&input.data, &mut self.report)? else {
                    return Ok(());
                };
                self.info = bundle.info.map(<[u8]>::to_vec);
                let set = self
                    .report
                    .scoped("set", |r| InstrumentSet::analyze(bundle.instrument_set, options, r))?;
                let count = set.instrument_count();
                self.set = Some(set);
                let numbered = bundle.songs.len() > 1;
                for (i, data) in bundle.songs.iter().enumerate() {
                    let label = if numbered {
                        format!("song #{}", i + 1)
                    } else {
                        "song".to_string()
                    };
                    let song = self
                        .report
                        .scoped(label, |r| Song::analyze(data, Some(count), r))?;
                    self.songs.push(song);
                }
            }
            InputKind::InstrumentSet => {
                self.set = Some(InstrumentSet::analyze(
                    &input.data,
                    options,
                    &mut self.report,
                )?);
            }
            InputKind::Song => {
                let mut count = None;
                if let Some((set_path, data)) = &input.companion_set {
                    let label = set_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "set".to_string());
                    let set = self
                        .report
                        .scoped(label, |r| InstrumentSet::analyze(data, options, r))?;
                    count = Some(set.instrument_count());
                    self.set_path = Some(set_path.clone());
                    self.set = Some(set);
                }
                let song = Song::analyze(&input.data, count, &mut self.report)?;
                self.songs.push(song);
            }
        }
        Ok(())
    }

    /// Overall status.
    pub fn status(&self) -> Status {
        if self.error.is_some() {
            Status::Failed
        } else if self.report.is_modified() {
            Status::Modified
        } else {
            Status::Clean
        }
    }
}

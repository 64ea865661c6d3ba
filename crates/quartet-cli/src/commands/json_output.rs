//! JSON output types for machine-readable CLI output.
//!
//! `check --json` prints one [`CheckOutput`] document. Library error codes
//! (`QUARTET_xxx`) pass through unchanged; failures that happen before any
//! analysis use the `CLI_xxx` codes below.

use quartet_format::vset::InstrumentSetSummary;
use quartet_format::{Fix, QuartetError, Song, Warning};
use serde::Serialize;

use crate::analysis::{Analysis, Status};
use crate::input::InputError;

/// Error codes for CLI operations.
///
/// These codes are stable and can be used for programmatic error handling.
pub mod error_codes {
    /// File could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// Unknown file extension
    pub const UNKNOWN_EXTENSION: &str = "CLI_002";
    /// ICE! packed input
    pub const PACKED: &str = "CLI_003";
    /// JSON serialization error
    pub const JSON_SERIALIZE: &str = "CLI_004";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "QUARTET_004")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Structure the error was found in (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    /// Byte offset (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            structure: None,
            offset: None,
        }
    }
}

impl From<&QuartetError> for JsonError {
    fn from(err: &QuartetError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            structure: Some(err.structure().as_str().to_string()),
            offset: err.offset(),
        }
    }
}

impl From<&InputError> for JsonError {
    fn from(err: &InputError) -> Self {
        let code = match err {
            InputError::FileRead { .. } => error_codes::FILE_READ,
            InputError::UnknownExtension { .. } => error_codes::UNKNOWN_EXTENSION,
            InputError::Packed { .. } => error_codes::PACKED,
        };
        Self::new(code, err.to_string())
    }
}

/// Per-channel timing in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelSummary {
    pub channel: char,
    pub events: usize,
    pub ticks: u64,
    pub max_loop_depth: usize,
}

/// Song overview in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct SongSummary {
    pub rate_khz: u16,
    pub measure: u16,
    pub tempo: u16,
    pub time_signature: (u8, u8),
    pub ticks: u64,
    pub rows: u64,
    pub channels: Vec<ChannelSummary>,
    pub used_instruments: Vec<usize>,
}

impl From<&Song> for SongSummary {
    fn from(song: &Song) -> Self {
        Self {
            rate_khz: song.header.rate_khz,
            measure: song.header.measure,
            tempo: song.tempo(),
            time_signature: song.header.time_signature,
            ticks: song.ticks,
            rows: song.rows(),
            channels: song
                .channels
                .iter()
                .map(|c| ChannelSummary {
                    channel: c.tag(),
                    events: c.events.len(),
                    ticks: c.ticks,
                    max_loop_depth: c.max_loop_depth,
                })
                .collect(),
            used_instruments: song.used_instruments(),
        }
    }
}

/// Report for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub status: Status,
    /// BLAKE3 hash of the file content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument_set: Option<InstrumentSetSummary>,
    pub songs: Vec<SongSummary>,
    /// Applied repairs, in order
    pub fixes: Vec<Fix>,
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

impl FileReport {
    /// Report for a file that could not be loaded.
    pub fn input_error(path: &str, err: &InputError) -> Self {
        Self {
            path: path.to_string(),
            kind: None,
            status: Status::Failed,
            source_hash: None,
            instrument_set: None,
            songs: Vec::new(),
            fixes: Vec::new(),
            warnings: Vec::new(),
            error: Some(err.into()),
        }
    }
}

impl From<&Analysis> for FileReport {
    fn from(analysis: &Analysis) -> Self {
        Self {
            path: analysis.path.display().to_string(),
            kind: Some(analysis.kind.to_string()),
            status: analysis.status(),
            source_hash: Some(analysis.source_hash.clone()),
            instrument_set: analysis.set.as_ref().map(|s| s.summary()),
            songs: analysis.songs.iter().map(SongSummary::from).collect(),
            fixes: analysis.report.fixes.clone(),
            warnings: analysis.report.warnings.clone(),
            error: analysis.error.as_ref().map(JsonError::from),
        }
    }
}

/// Totals over all checked files.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CheckSummary {
    pub files: usize,
    pub clean: usize,
    pub modified: usize,
    pub failed: usize,
}

/// JSON output for the `check` command.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    /// Whether every file is clean
    pub success: bool,
    pub summary: CheckSummary,
    pub files: Vec<FileReport>,
}

impl CheckOutput {
    /// Build the document and its totals.
    pub fn new(files: Vec<FileReport>) -> Self {
        let mut summary = CheckSummary {
            files: files.len(),
            ..Default::default()
        };
        for file in &files {
            match file.status {
                Status::Clean => summary.clean += 1,
                Status::Modified => summary.modified += 1,
                Status::Failed => summary.failed += 1,
            }
        }
        Self {
            success: summary.clean == summary.files,
            summary,
            files,
        }
    }

    /// Worst status over all files.
    pub fn status(&self) -> Status {
        self.files
            .iter()
            .map(|f| f.status)
            .max()
            .unwrap_or(Status::Clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_codes_format() {
        for code in [
            error_codes::FILE_READ,
            error_codes::UNKNOWN_EXTENSION,
            error_codes::PACKED,
            error_codes::JSON_SERIALIZE,
        ] {
            assert!(code.starts_with("CLI_"));
            assert_eq!(code.len(), 7);
        }
    }

    #[test]
    fn test_json_error_from_quartet_error() {
        let err = QuartetError::Packed;
        let json = JsonError::from(&err);
        assert_eq!(json.code, "QUARTET_013");
        assert_eq!(json.structure.as_deref(), Some("container"));

        let value = serde_json::to_value(&json).unwrap();
        assert!(value.get("offset").is_none());
    }

    #[test]
    fn test_json_error_from_input_error() {
        let err = InputError::Packed {
            path: PathBuf::from("x.4q"),
        };
        assert_eq!(JsonError::from(&err).code, error_codes::PACKED);
    }

    #[test]
    fn test_check_output_summary() {
        let bad = FileReport::input_error(
            "missing.4v",
            &InputError::UnknownExtension { extension: None },
        );
        let mut ok = bad.clone();
        ok.status = Status::Clean;
        ok.error = None;

        let output = CheckOutput::new(vec![ok.clone()]);
        assert!(output.success);
        assert_eq!(output.status(), Status::Clean);

        let output = CheckOutput::new(vec![ok, bad]);
        assert!(!output.success);
        assert_eq!(
            output.summary,
            CheckSummary {
                files: 2,
                clean: 1,
                modified: 0,
                failed: 1
            }
        );
        assert_eq!(output.status(), Status::Failed);
    }
}

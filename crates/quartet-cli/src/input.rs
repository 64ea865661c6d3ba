//! Input classification and loading.
//!
//! Files are classified by signature first (containers and ICE! packed data
//! are recognizable from their first bytes) and by extension otherwise: a
//! bank and a song have no magic of their own. A song file is loaded
//! together with the same-stem `.set` next to it, when there is one.

use quartet_format::container::{is_ice_packed, FOURQ_MAGIC, QUAR_MAGIC};
use quartet_format::ContainerKind;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recognized container extensions.
pub const CONTAINER_EXTENSIONS: &[&str] = &["4q", "quar"];

/// Recognized instrument bank extensions.
pub const SET_EXTENSIONS: &[&str] = &["set"];

/// Recognized song extensions.
pub const SONG_EXTENSIONS: &[&str] = &["4v"];

/// What a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// A `.4q` or `.quar` bundle.
    Container(ContainerKind),
    /// A bare `.set` instrument bank.
    InstrumentSet,
    /// A bare `.4v` song.
    Song,
}

impl InputKind {
    /// Returns the string representation for reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Container(ContainerKind::FourQ) => "4q",
            InputKind::Container(ContainerKind::Quar) => "quar",
            InputKind::InstrumentSet => "set",
            InputKind::Song => "4v",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file read into memory.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub path: PathBuf,
    pub kind: InputKind,
    pub data: Vec<u8>,
    /// BLAKE3 hash of the file content (hex string).
    pub source_hash: String,
    /// Same-stem bank of a song file, as `(path, bytes)`.
    pub companion_set: Option<(PathBuf, Vec<u8>)>,
}

impl LoadedInput {
    /// File name used as the report subject.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// File stem used to name output files.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "quartet".to_string())
    }
}

/// Errors that can occur during input loading.
#[derive(Debug)]
pub enum InputError {
    /// File could not be read.
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Neither a known signature nor a known extension.
    UnknownExtension { extension: Option<String> },

    /// ICE! packed file.
    Packed { path: PathBuf },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::FileRead { path, source } => {
                write!(f, "failed to read file '{}': {}", path.display(), source)
            }
            InputError::UnknownExtension { extension } => match extension {
                Some(ext) => write!(
                    f,
                    "unknown file extension '.{}' (expected .4q, .quar, .set or .4v)",
                    ext
                ),
                None => write!(f, "file has no extension (expected .4q, .quar, .set or .4v)"),
            },
            InputError::Packed { path } => {
                write!(f, "'{}' is ICE! packed, unpack it first", path.display())
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::FileRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
}

/// Classify a file from its content and extension.
pub fn classify(path: &Path, data: &[u8]) -> Result<InputKind, InputError> {
    if is_ice_packed(data) {
        return Err(InputError::Packed {
            path: path.to_path_buf(),
        });
    }
    if data.starts_with(FOURQ_MAGIC) {
        return Ok(InputKind::Container(ContainerKind::FourQ));
    }
    if data.starts_with(QUAR_MAGIC) {
        return Ok(InputKind::Container(ContainerKind::Quar));
    }

    let extension = extension_of(path);
    match extension.as_deref() {
        Some(ext) if SET_EXTENSIONS.contains(&ext) => Ok(InputKind::InstrumentSet),
        Some(ext) if SONG_EXTENSIONS.contains(&ext) => Ok(InputKind::Song),
        _ => Err(InputError::UnknownExtension { extension }),
    }
}

/// Whether a path looks like a Quartet file, by extension only.
pub fn is_quartet_path(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| {
        CONTAINER_EXTENSIONS.contains(&ext.as_str())
            || SET_EXTENSIONS.contains(&ext.as_str())
            || SONG_EXTENSIONS.contains(&ext.as_str())
    })
}

/// The same-stem bank next to a song, trying both extension cases.
pub fn companion_set_path(song: &Path) -> Option<PathBuf> {
    ["set", "SET"]
        .iter()
        .map(|ext| song.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

fn read(path: &Path) -> Result<Vec<u8>, InputError> {
    std::fs::read(path).map_err(|e| InputError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and classify a file.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use quartet_cli::input::load_input;
///
/// let input = load_input(Path::new("intro.4v")).unwrap();
/// println!("{} is a {} file", input.display_name(), input.kind);
/// ```
pub fn load_input(path: &Path) -> Result<LoadedInput, InputError> {
    let data = read(path)?;
    let kind = classify(path, &data)?;
    let source_hash = blake3::hash(&data).to_hex().to_string();

    let companion_set = match kind {
        InputKind::Song => match companion_set_path(path) {
            Some(set_path) => {
                let set = read(&set_path)?;
                Some((set_path, set))
            }
            None => None,
        },
        _ => None,
    };

    Ok(LoadedInput {
        path: path.to_path_buf(),
        kind,
        data,
        source_hash,
        companion_set,
    })
}

/// Expand command-line paths into the list of files to check.
///
/// Files are taken as given. Directories are scanned for Quartet extensions,
/// one level deep unless `recursive` is set. Results of each directory are
/// sorted so runs are reproducible.
pub fn collect_inputs(paths: &[String], recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        let path = Path::new(path);
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_quartet_path(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_as_str() {
        assert_eq!(InputKind::Song.as_str(), "4v");
        assert_eq!(InputKind::InstrumentSet.to_string(), "set");
        assert_eq!(
            InputKind::Container(ContainerKind::Quar).to_string(),
            "quar"
        );
    }

    #[test]
    fn test_classify_by_magic_before_extension() {
        let kind = classify(Path::new("bundle.set"), b"QUARTET\0rest").unwrap();
        assert_eq!(kind, InputKind::Container(ContainerKind::FourQ));
        let kind = classify(Path::new("noext"), b"QUAR\0\0\0\0").unwrap();
        assert_eq!(kind, InputKind::Container(ContainerKind::Quar));
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(
            classify(Path::new("DRUMS.SET"), b"\x08\x02").unwrap(),
            InputKind::InstrumentSet
        );
        assert_eq!(
            classify(Path::new("intro.4v"), b"\x00\x08").unwrap(),
            InputKind::Song
        );
    }

    #[test]
    fn test_classify_unknown_and_packed() {
        let result = classify(Path::new("notes.txt"), b"hello");
        assert!(matches!(
            result,
            Err(InputError::UnknownExtension { extension: Some(ref ext) }) if ext == "txt"
        ));
        let result = classify(Path::new("intro.4v"), b"Ice!packed");
        assert!(matches!(result, Err(InputError::Packed { .. })));
    }

    #[test]
    fn test_load_song_with_companion_set() {
        let tmp = tempfile::tempdir().unwrap();
        let song = tmp.path().join("intro.4v");
        std::fs::write(&song, b"song").unwrap();
        std::fs::write(tmp.path().join("intro.set"), b"bank").unwrap();

        let input = load_input(&song).unwrap();
        assert_eq!(input.kind, InputKind::Song);
        assert_eq!(input.stem(), "intro");
        assert_eq!(input.source_hash.len(), 64);
        let (path, data) = input.companion_set.unwrap();
        assert!(path.ends_with("intro.set"));
        assert_eq!(data, b"bank");
    }

    #[test]
    fn test_load_file_not_found() {
        let result = load_input(Path::new("/nonexistent/intro.4v"));
        assert!(matches!(result, Err(InputError::FileRead { .. })));
    }

    #[test]
    fn test_collect_inputs_filters_and_recurses() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(tmp.path().join("b.4v"), b"").unwrap();
        std::fs::write(tmp.path().join("a.set"), b"").unwrap();
        std::fs::write(tmp.path().join("readme.txt"), b"").unwrap();
        std::fs::write(sub.join("c.4q"), b"").unwrap();

        let dir = tmp.path().to_string_lossy().to_string();
        let flat = collect_inputs(std::slice::from_ref(&dir), false);
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.set", "b.4v"]);

        let deep = collect_inputs(&[dir], true);
        assert_eq!(deep.len(), 3);
    }
}

//! Quartet doctor library.
//!
//! File-level plumbing around `quartet-format`: input classification and
//! loading, whole-file analysis, and the `check`, `fix`, `demux` and
//! `extract` commands.

pub mod analysis;
pub mod commands;
pub mod input;
pub mod logging;

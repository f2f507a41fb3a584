use std::io;
use std::path::PathBuf;

use crate::text_run::{ContainerId, RunId};

/// Errors raised by the annotation engine.
///
/// A failed operation never leaves a container half-mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HighlightError {
    #[error("selection is empty")]
    EmptySelection,
    #[error("cannot split a run of length {len} at offset {offset}")]
    InvalidOffset { offset: usize, len: usize },
    #[error("selection spans two articles ({start} and {end})")]
    CrossContainerSelection { start: ContainerId, end: ContainerId },
    #[error("run {0} does not exist")]
    UnknownRun(RunId),
    #[error("offset {offset} is outside run {run} of length {len}")]
    OffsetOutOfRange { run: RunId, offset: usize, len: usize },
    #[error("range {start}..{end} is outside an article of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("article container {0} does not exist")]
    UnknownContainer(ContainerId),
}

/// Errors raised while reading a law document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed law document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document contains no laws")]
    NoLaws,
    #[error("law index {index} out of range (document has {count})")]
    LawIndex { index: usize, count: usize },
}

/// Errors raised while reading or writing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T, E = HighlightError> = std::result::Result<T, E>;

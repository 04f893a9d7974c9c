//! The error type shared by every stage of the viewer.
//!
//! All setup failures are fatal, so the variants carry enough context (file path, line number,
//! shader stage, backend log) to diagnose a problem from the log alone.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::ShaderStage;

/// Convenience alias used throughout both crates.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A geometry record was present but could not be used.
    ///
    /// `line` is 1-based; it is `0` for failures that concern the whole file.
    #[error("malformed geometry (line {line}): {reason}")]
    Format { line: usize, reason: String },

    /// A shader stage failed to compile. `log` is the backend's info log.
    #[error("failed to compile {stage} shader:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    /// A shader program failed to link or validate. `log` is the backend's info log.
    #[error("failed to link shader program:\n{log}")]
    Link { log: String },

    /// The backend refused to create a GPU object.
    #[error("failed to create {what}: {reason}")]
    Resource { what: &'static str, reason: String },

    /// The backend raised its error flag while rendering a frame.
    #[error("graphics backend reported error 0x{code:04X}")]
    Backend { code: u32 },

    /// A configuration file exists but could not be parsed.
    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Window or context creation failed.
    #[error("window error: {0}")]
    Window(String),

    /// A context-bound operation was attempted off the thread that owns the context.
    #[error("graphics context used from a thread other than the one that created it")]
    WrongThread,

    /// Bad command line.
    #[error("{0}")]
    Usage(String),
}

impl Error {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            line,
            reason: reason.into(),
        }
    }
}

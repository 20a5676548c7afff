//! codecursor: cursor-based line editor for source files
//!
//! This crate provides the [`SourceFile`] editing engine, its configuration, and
//! the edit-script layer used by the `codecursor` and `maskview` CLIs.

mod config;
pub mod log;
pub mod script;
mod source;

use std::path::PathBuf;

pub use codecursor_mask::{Delimiter, Delimiters, MaskError, Masker};
pub use config::EditorConfig;
pub use script::{parse_commands, parse_script, run, Command, Op};
pub use source::{IndentRule, Search, SourceFile};

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8", path.display())]
    NonUtf8 { path: PathBuf },
    #[error("no file path to write to")]
    NoPath,
    #[error("match text {match_text:?} must end with the open bracket {open:?}")]
    BracketMatch { match_text: String, open: char },
    #[error("invalid delimiters: {0}")]
    Delimiters(#[from] MaskError),
    #[error("{0}")]
    Parse(String),
    #[error("command {index} failed: {command}")]
    CommandFailed { index: usize, command: String },
}

impl EditError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

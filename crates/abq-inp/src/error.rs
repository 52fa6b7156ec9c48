//! Error types for abq-inp

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, InpError>;

#[derive(Error, Debug)]
pub enum InpError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: empty keyword name")]
    EmptyKeyword { line: usize },

    #[error("line {line}: malformed option `{token}` in *{keyword} (more than one '=')")]
    MalformedOption {
        line: usize,
        keyword: String,
        token: String,
    },

    #[error("line {line}: unterminated quote in keyword line `{text}`")]
    UnterminatedQuote { line: usize, text: String },

    #[error("line {line}: missing INPUT parameter in *INCLUDE")]
    MissingIncludeInput { line: usize },

    #[error("include cycle detected: {0}")]
    IncludeCycle(String),

    #[error("{message} (while expanding include {path})")]
    Include { path: PathBuf, message: String },
}

impl InpError {
    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            InpError::EmptyKeyword { line }
            | InpError::MalformedOption { line, .. }
            | InpError::UnterminatedQuote { line, .. }
            | InpError::MissingIncludeInput { line } => Some(*line),
            _ => None,
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum ScrublineError {
    #[error("Please select a folder containing both video and transcript files")]
    MissingFiles,

    #[error("Error loading transcript: {reason}")]
    Parse { reason: String },

    #[error("Please load a video and transcript first")]
    TranscriptNotLoaded,

    #[error("Please enter your OpenAI API key")]
    MissingCredential,

    #[error("Please enter a valid API key")]
    EmptyCredential,

    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("Error: {message}")]
    Upstream { message: String },

    #[error("Settings directory could not be determined")]
    NoSettingsDir,

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ScrublineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrublineError>;

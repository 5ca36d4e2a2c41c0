//! Error types shared across the avatar pipeline

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the avatar backend
#[derive(Error, Debug)]
pub enum Error {
    /// Language model call or response coercion failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// TTS endpoint returned a failure
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// External transcoder failed
    #[error("Transcode error: {0}")]
    Transcode(String),

    /// Phoneme extraction failed
    #[error("Cue extraction error: {0}")]
    CueExtraction(String),

    /// Speech-to-text failed
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// External call exceeded its deadline
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this error a deadline expiry?
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

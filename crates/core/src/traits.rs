//! Trait seams for the synthesis pipeline
//!
//! The response assembler is generic over these so tests can run the
//! fan-out logic against mocks instead of real TTS and phoneme tools.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::message::LipSync;

/// Turns one line of text into an audio file on scratch storage
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` into an MP3 at `target`
    async fn synthesize(&self, text: &str, target: &Path) -> Result<()>;
}

/// Derives timed mouth cues from a synthesized audio file
#[async_trait]
pub trait CueExtractor: Send + Sync {
    /// Analyze the audio at `audio` and return its mouth cues
    async fn extract(&self, audio: &Path) -> Result<LipSync>;
}

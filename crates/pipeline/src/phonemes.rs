//! Mouth-cue extraction via the rhubarb CLI
//!
//! Two sequential external steps per message: transcode the synthesized
//! MP3 to WAV, then run rhubarb to produce the timed-cue JSON. Errors
//! propagate to the assembler, which applies the same per-message
//! soft-failure policy it uses for synthesis.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use avatar_config::LipSyncConfig;
use avatar_core::{CueExtractor, Error, LipSync, Result};

use crate::transcode::Transcoder;

/// Rhubarb-backed cue extractor
pub struct RhubarbExtractor {
    config: LipSyncConfig,
    transcoder: Transcoder,
}

impl RhubarbExtractor {
    pub fn new(config: LipSyncConfig, transcoder: Transcoder) -> Self {
        Self { config, transcoder }
    }

    async fn run_rhubarb(&self, wav: &Path, transcript: &Path) -> Result<()> {
        let wav_str = wav
            .to_str()
            .ok_or_else(|| Error::CueExtraction(format!("non-UTF8 path: {}", wav.display())))?;
        let out_str = transcript.to_str().ok_or_else(|| {
            Error::CueExtraction(format!("non-UTF8 path: {}", transcript.display()))
        })?;

        let child = Command::new(&self.config.rhubarb_bin)
            .args(["-f", "json", "-o", out_str, wav_str, "-r", &self.config.recognizer])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CueExtraction(format!("failed to spawn rhubarb: {e}")))?;

        let timeout = Duration::from_millis(self.config.process_timeout_ms);
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Timeout(self.config.process_timeout_ms))?
            .map_err(|e| Error::CueExtraction(format!("rhubarb wait failed: {e}")))?;

        if !output.status.success() {
            let detail = String::from_utf8_lossy(&output.stderr);
            let snippet: String = detail.chars().take(300).collect();
            return Err(Error::CueExtraction(format!(
                "rhubarb exited with {}: {snippet}",
                output.status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CueExtractor for RhubarbExtractor {
    async fn extract(&self, audio: &Path) -> Result<LipSync> {
        let started = std::time::Instant::now();

        let wav = audio.with_extension("wav");
        let transcript = audio.with_extension("json");

        // Rhubarb only reads WAV; the synthesizer leaves an MP3 behind.
        self.transcoder.to_lipsync_wav(audio, &wav).await?;
        self.run_rhubarb(&wav, &transcript).await?;

        let raw = tokio::fs::read(&transcript).await?;
        let lipsync: LipSync = serde_json::from_slice(&raw)?;

        tracing::debug!(
            audio_file = %audio.display(),
            cues = lipsync.mouth_cues.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extracted mouth cues"
        );

        Ok(lipsync)
    }
}

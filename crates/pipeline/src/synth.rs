//! HTTP speech synthesis
//!
//! Sends plan text plus the configured reference voice sample to a
//! voice-cloning TTS endpoint, writes the returned WAV beside the target
//! path, then transcodes to MP3.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;

use avatar_config::TtsConfig;
use avatar_core::{Error, Result, Synthesizer};

use crate::transcode::Transcoder;

/// Voice-cloning TTS client
pub struct HttpSynthesizer {
    http: reqwest::Client,
    config: TtsConfig,
    transcoder: Transcoder,
}

impl HttpSynthesizer {
    pub fn new(config: TtsConfig, transcoder: Transcoder) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_default();

        Self {
            http,
            config,
            transcoder,
        }
    }

    async fn request_audio(&self, text: &str) -> Result<Vec<u8>> {
        let sample = tokio::fs::read(&self.config.voice_sample)
            .await
            .map_err(|e| {
                Error::Synthesis(format!(
                    "cannot read voice sample {}: {e}",
                    self.config.voice_sample
                ))
            })?;

        let sample_name = Path::new(&self.config.voice_sample)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("voice-sample.mp3")
            .to_string();

        let form = multipart::Form::new()
            .text("input", text.to_string())
            .part(
                "voice_file",
                multipart::Part::bytes(sample).file_name(sample_name),
            );

        let deadline = Duration::from_millis(self.config.request_timeout_ms);
        let response = tokio::time::timeout(
            deadline,
            self.http.post(&self.config.endpoint).multipart(form).send(),
        )
        .await
        .map_err(|_| Error::Timeout(self.config.request_timeout_ms))?
        .map_err(|e| Error::Synthesis(format!("TTS request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(Error::Synthesis(format!(
                "TTS endpoint returned {status}: {snippet}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(format!("failed to read TTS body: {e}")))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, target: &Path) -> Result<()> {
        let started = std::time::Instant::now();

        let wav_bytes = self.request_audio(text).await?;

        let wav_path = target.with_extension("wav");
        tokio::fs::write(&wav_path, &wav_bytes).await?;

        self.transcoder.wav_to_mp3(&wav_path, target).await?;

        tracing::debug!(
            target_file = %target.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "synthesized message audio"
        );

        Ok(())
    }
}

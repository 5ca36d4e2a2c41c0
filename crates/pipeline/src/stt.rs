//! Local speech-to-text
//!
//! Transcodes recorded browser audio to 16 kHz mono PCM, then runs a
//! local whisper model over the samples in fixed-length chunks with
//! overlap. The model is loaded once per process, on first use.

use std::sync::Arc;

use tokio::sync::OnceCell;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use avatar_config::SttConfig;
use avatar_core::{Error, Result};

use crate::transcode::Transcoder;

const SAMPLE_RATE: usize = 16_000;

/// Whisper-backed transcriber with a lazily-loaded shared model
pub struct Transcriber {
    config: SttConfig,
    transcoder: Transcoder,
    model: OnceCell<Arc<WhisperContext>>,
}

impl Transcriber {
    pub fn new(config: SttConfig, transcoder: Transcoder) -> Self {
        Self {
            config,
            transcoder,
            model: OnceCell::new(),
        }
    }

    /// Transcribe recorded audio (webm or any container ffmpeg reads)
    ///
    /// Silent or empty input yields an empty string, not an error.
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        if audio.is_empty() {
            return Ok(String::new());
        }

        let scratch = tempfile::TempDir::new()?;
        let input = scratch.path().join("input.webm");
        let wav = scratch.path().join("output.wav");

        tokio::fs::write(&input, audio).await?;
        self.transcoder.to_pcm16k_wav(&input, &wav).await?;

        let samples = read_samples(&wav)?;
        if samples.is_empty() {
            return Ok(String::new());
        }

        let context = self.model().await?;
        let chunks = chunk_bounds(
            samples.len(),
            self.config.chunk_seconds as usize * SAMPLE_RATE,
            self.config.stride_seconds as usize * SAMPLE_RATE,
        );

        let text = tokio::task::spawn_blocking(move || -> Result<String> {
            let mut pieces = Vec::with_capacity(chunks.len());
            for (start, end) in chunks {
                pieces.push(run_whisper(&context, &samples[start..end])?);
            }
            Ok(pieces.join(" ").trim().to_string())
        })
        .await
        .map_err(|e| Error::Transcription(format!("transcription task panicked: {e}")))??;

        tracing::info!(transcript_len = text.len(), "transcribed audio");
        Ok(text)
    }

    async fn model(&self) -> Result<Arc<WhisperContext>> {
        let path = self.config.model.clone();
        self.model
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || {
                    tracing::info!(model = %path, "loading whisper model");
                    WhisperContext::new_with_params(&path, WhisperContextParameters::default())
                        .map(Arc::new)
                        .map_err(|e| Error::Transcription(format!("model load failed: {e}")))
                })
                .await
                .map_err(|e| Error::Transcription(format!("model load task panicked: {e}")))?
            })
            .await
            .cloned()
    }
}

/// Read a 16-bit PCM WAV into normalized f32 samples
fn read_samples(path: &std::path::Path) -> Result<Vec<f32>> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| Error::Transcription(format!("cannot read wav: {e}")))?;

    let samples: std::result::Result<Vec<i16>, _> = reader.into_samples::<i16>().collect();
    let samples = samples.map_err(|e| Error::Transcription(format!("bad wav samples: {e}")))?;

    Ok(samples.iter().map(|&s| s as f32 / 32768.0).collect())
}

/// Chunk boundaries over `len` samples: `chunk_len` windows advancing by
/// `chunk_len - stride` so consecutive chunks overlap by `stride`.
fn chunk_bounds(len: usize, chunk_len: usize, stride: usize) -> Vec<(usize, usize)> {
    if len == 0 || chunk_len == 0 {
        return Vec::new();
    }
    if len <= chunk_len {
        return vec![(0, len)];
    }

    let step = chunk_len.saturating_sub(stride).max(1);
    let mut bounds = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_len).min(len);
        bounds.push((start, end));
        if end == len {
            break;
        }
        start += step;
    }
    bounds
}

fn run_whisper(context: &WhisperContext, samples: &[f32]) -> Result<String> {
    let mut state = context
        .create_state()
        .map_err(|e| Error::Transcription(format!("cannot create whisper state: {e}")))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    state
        .full(params, samples)
        .map_err(|e| Error::Transcription(format!("whisper inference failed: {e}")))?;

    let segments = state
        .full_n_segments()
        .map_err(|e| Error::Transcription(format!("cannot count segments: {e}")))?;

    let mut text = String::new();
    for i in 0..segments {
        let segment = state
            .full_get_segment_text(i)
            .map_err(|e| Error::Transcription(format!("cannot read segment {i}: {e}")))?;
        text.push_str(segment.trim());
        text.push(' ');
    }

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_bounds_short_audio_is_single_chunk() {
        let bounds = chunk_bounds(1_000, 30 * SAMPLE_RATE, 5 * SAMPLE_RATE);
        assert_eq!(bounds, vec![(0, 1_000)]);
    }

    #[test]
    fn test_chunk_bounds_empty_audio() {
        assert!(chunk_bounds(0, 30 * SAMPLE_RATE, 5 * SAMPLE_RATE).is_empty());
    }

    #[test]
    fn test_chunk_bounds_overlap() {
        let chunk = 30 * SAMPLE_RATE;
        let stride = 5 * SAMPLE_RATE;
        let len = 70 * SAMPLE_RATE;
        let bounds = chunk_bounds(len, chunk, stride);

        // consecutive chunks overlap by exactly the stride
        for pair in bounds.windows(2) {
            assert_eq!(pair[0].1 - pair[1].0, stride);
        }
        // full coverage, ordered starts
        assert_eq!(bounds.first().unwrap().0, 0);
        assert_eq!(bounds.last().unwrap().1, len);
    }

    #[test]
    fn test_sample_normalization_range() {
        // i16::MIN maps to -1.0, i16::MAX just below 1.0
        assert!((i16::MIN as f32 / 32768.0 + 1.0).abs() < f32::EPSILON);
        assert!(i16::MAX as f32 / 32768.0 < 1.0);
    }

    #[tokio::test]
    async fn test_empty_audio_transcribes_to_empty_string() {
        let transcriber = Transcriber::new(
            SttConfig::default(),
            Transcoder::new("/nonexistent/ffmpeg", 1_000),
        );
        let text = transcriber.transcribe(&[]).await.unwrap();
        assert!(text.is_empty());
    }
}

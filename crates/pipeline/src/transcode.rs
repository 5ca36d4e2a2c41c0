//! Deadline-wrapped ffmpeg invocations
//!
//! Every external transcode runs under a timeout; on expiry the child is
//! killed so no subprocess outlives its request.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use avatar_core::{Error, Result};

/// Shared ffmpeg wrapper
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg_bin: String,
    timeout: Duration,
}

impl Transcoder {
    pub fn new(ffmpeg_bin: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// WAV to MP3, the transport format sent to the client
    pub async fn wav_to_mp3(&self, input: &Path, output: &Path) -> Result<()> {
        self.run(&["-y", "-i", path_str(input)?, path_str(output)?])
            .await
    }

    /// Any input to plain WAV, the format the phoneme tool accepts
    pub async fn to_lipsync_wav(&self, input: &Path, output: &Path) -> Result<()> {
        self.run(&["-y", "-i", path_str(input)?, path_str(output)?])
            .await
    }

    /// Any input to 16 kHz mono signed 16-bit PCM WAV for the recognizer
    pub async fn to_pcm16k_wav(&self, input: &Path, output: &Path) -> Result<()> {
        self.run(&[
            "-y",
            "-i",
            path_str(input)?,
            "-ar",
            "16000",
            "-ac",
            "1",
            "-c:a",
            "pcm_s16le",
            path_str(output)?,
        ])
        .await
    }

    async fn run(&self, args: &[&str]) -> Result<()> {
        // kill_on_drop reaps the child when the timeout drops the future
        let child = Command::new(&self.ffmpeg_bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Transcode(format!("failed to spawn ffmpeg: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|e| Error::Transcode(format!("ffmpeg wait failed: {e}")))?;

        if !output.status.success() {
            let detail = String::from_utf8_lossy(&output.stderr);
            let tail: String = detail
                .lines()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(Error::Transcode(format!(
                "ffmpeg exited with {}: {tail}",
                output.status
            )));
        }

        Ok(())
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::Transcode(format!("non-UTF8 path: {}", path.display())))
}

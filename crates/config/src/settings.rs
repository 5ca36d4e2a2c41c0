//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Text-to-speech endpoint configuration
    #[serde(default)]
    pub tts: TtsConfig,

    /// Lip-sync tool configuration
    #[serde(default)]
    pub lipsync: LipSyncConfig,

    /// Speech-to-text configuration
    #[serde(default)]
    pub stt: SttConfig,

    /// Message pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_concurrent_messages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.max_concurrent_messages".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        for (field, timeout) in [
            ("llm.request_timeout_ms", self.llm.request_timeout_ms),
            ("tts.request_timeout_ms", self.tts.request_timeout_ms),
            ("lipsync.process_timeout_ms", self.lipsync.process_timeout_ms),
            ("stt.process_timeout_ms", self.stt.process_timeout_ms),
        ] {
            if timeout == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "timeout must be non-zero".to_string(),
                });
            }
        }

        if self.tts.voice_sample.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tts.voice_sample".to_string(),
                message: "reference voice sample path is required".to_string(),
            });
        }

        if !self.stt.model.is_empty() && !self.stt.model.ends_with(".bin") {
            tracing::warn!(
                "stt.model does not look like a ggml model file: {}",
                self.stt.model
            );
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions URL
    #[serde(default = "default_llm_url")]
    pub api_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request deadline in milliseconds
    #[serde(default = "default_llm_timeout")]
    pub request_timeout_ms: u64,
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_llm_timeout() -> u64 {
    30_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_llm_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_ms: default_llm_timeout(),
        }
    }
}

/// Voice-cloning TTS endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Speech synthesis upload endpoint
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    /// Provider voices listing endpoint
    #[serde(default = "default_voices_url")]
    pub voices_url: String,

    /// Path to the reference voice sample sent with every request
    #[serde(default = "default_voice_sample")]
    pub voice_sample: String,

    /// Per-request deadline in milliseconds
    #[serde(default = "default_tts_timeout")]
    pub request_timeout_ms: u64,
}

fn default_tts_endpoint() -> String {
    "http://127.0.0.1:4123/v1/audio/speech/upload".to_string()
}

fn default_voices_url() -> String {
    "http://127.0.0.1:4123/v1/audio/voices".to_string()
}

fn default_voice_sample() -> String {
    "assets/voice-sample.mp3".to_string()
}

fn default_tts_timeout() -> u64 {
    30_000
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            voices_url: default_voices_url(),
            voice_sample: default_voice_sample(),
            request_timeout_ms: default_tts_timeout(),
        }
    }
}

/// Lip-sync tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipSyncConfig {
    /// Path to the rhubarb binary
    #[serde(default = "default_rhubarb_bin")]
    pub rhubarb_bin: String,

    /// Path to the ffmpeg binary
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    /// Rhubarb recognizer mode
    #[serde(default = "default_recognizer")]
    pub recognizer: String,

    /// Per-subprocess deadline in milliseconds
    #[serde(default = "default_process_timeout")]
    pub process_timeout_ms: u64,
}

fn default_rhubarb_bin() -> String {
    "bin/rhubarb".to_string()
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_recognizer() -> String {
    "phonetic".to_string()
}

fn default_process_timeout() -> u64 {
    30_000
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            rhubarb_bin: default_rhubarb_bin(),
            ffmpeg_bin: default_ffmpeg_bin(),
            recognizer: default_recognizer(),
            process_timeout_ms: default_process_timeout(),
        }
    }
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Path to the ggml whisper model
    #[serde(default = "default_stt_model")]
    pub model: String,

    /// Chunk length fed to the recognizer, in seconds
    #[serde(default = "default_chunk_seconds")]
    pub chunk_seconds: u32,

    /// Overlap between consecutive chunks, in seconds
    #[serde(default = "default_stride_seconds")]
    pub stride_seconds: u32,

    /// Per-subprocess deadline for transcoding, in milliseconds
    #[serde(default = "default_process_timeout")]
    pub process_timeout_ms: u64,
}

fn default_stt_model() -> String {
    "models/ggml-base.en.bin".to_string()
}

fn default_chunk_seconds() -> u32 {
    30
}

fn default_stride_seconds() -> u32 {
    5
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: default_stt_model(),
            chunk_seconds: default_chunk_seconds(),
            stride_seconds: default_stride_seconds(),
            process_timeout_ms: default_process_timeout(),
        }
    }
}

/// Message pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on concurrently processed messages per turn
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_messages: usize,

    /// Root for per-turn scratch directories; system temp when empty
    #[serde(default)]
    pub scratch_root: String,
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_messages: default_max_concurrent(),
            scratch_root: String::new(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default log level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (AVATAR__ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("AVATAR")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.pipeline.max_concurrent_messages, 4);
        assert_eq!(settings.lipsync.recognizer, "phonetic");
        assert_eq!(settings.stt.chunk_seconds, 30);
        assert_eq!(settings.stt.stride_seconds, 5);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.pipeline.max_concurrent_messages = 0;
        assert!(settings.validate().is_err());

        settings.pipeline.max_concurrent_messages = 4;
        assert!(settings.validate().is_ok());

        settings.tts.request_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_voice_sample_required() {
        let mut settings = Settings::default();
        settings.tts.voice_sample = String::new();
        assert!(settings.validate().is_err());
    }
}

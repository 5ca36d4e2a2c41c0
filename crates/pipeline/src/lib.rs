//! Message-to-speech-to-animation pipeline
//!
//! This crate provides the per-turn processing stages:
//! - `Transcoder`: deadline-wrapped ffmpeg invocations
//! - `HttpSynthesizer`: voice-cloning TTS over HTTP plus WAV to MP3 transcode
//! - `RhubarbExtractor`: mouth-cue extraction via the rhubarb CLI
//! - `ResponseAssembler`: bounded, order-preserving fan-out merging audio
//!   and cues into assembled messages
//! - `Transcriber`: local whisper speech-to-text behind a lazy singleton

pub mod assemble;
pub mod phonemes;
pub mod stt;
pub mod synth;
pub mod transcode;

pub use assemble::ResponseAssembler;
pub use phonemes::RhubarbExtractor;
pub use stt::Transcriber;
pub use synth::HttpSynthesizer;
pub use transcode::Transcoder;

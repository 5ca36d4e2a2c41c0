//! Application state
//!
//! Shared state across all handlers.

use std::sync::Arc;

use avatar_config::Settings;
use avatar_core::{CueExtractor, Synthesizer};
use avatar_llm::{ChatClient, CompletionModel, ConversationPlanner};
use avatar_pipeline::{
    HttpSynthesizer, ResponseAssembler, RhubarbExtractor, Transcoder, Transcriber,
};

use crate::session::SessionStore;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub sessions: Arc<SessionStore>,
    pub planner: Arc<ConversationPlanner>,
    pub assembler: Arc<ResponseAssembler>,
    pub transcriber: Arc<Transcriber>,
    /// Client for proxying the provider voices listing
    pub http: reqwest::Client,
}

impl AppState {
    /// Wire up the production components
    pub fn new(config: Settings) -> Self {
        let model: Arc<dyn CompletionModel> = Arc::new(ChatClient::new(config.llm.clone()));

        let transcoder = Transcoder::new(
            config.lipsync.ffmpeg_bin.clone(),
            config.lipsync.process_timeout_ms,
        );
        let synthesizer: Arc<dyn Synthesizer> = Arc::new(HttpSynthesizer::new(
            config.tts.clone(),
            transcoder.clone(),
        ));
        let extractor: Arc<dyn CueExtractor> = Arc::new(RhubarbExtractor::new(
            config.lipsync.clone(),
            transcoder.clone(),
        ));

        Self::with_components(config, model, synthesizer, extractor)
    }

    /// Wire up with injected seams; used by tests to avoid real
    /// network calls and subprocesses
    pub fn with_components(
        config: Settings,
        model: Arc<dyn CompletionModel>,
        synthesizer: Arc<dyn Synthesizer>,
        extractor: Arc<dyn CueExtractor>,
    ) -> Self {
        let transcoder = Transcoder::new(
            config.lipsync.ffmpeg_bin.clone(),
            config.stt.process_timeout_ms,
        );

        Self {
            planner: Arc::new(ConversationPlanner::new(model)),
            assembler: Arc::new(ResponseAssembler::new(
                synthesizer,
                extractor,
                &config.pipeline,
            )),
            transcriber: Arc::new(Transcriber::new(config.stt.clone(), transcoder)),
            sessions: Arc::new(SessionStore::new()),
            http: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }
}

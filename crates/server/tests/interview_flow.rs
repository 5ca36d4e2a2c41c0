//! Integration tests for the text-turn flow (plan -> assemble -> respond)
//!
//! These exercise the handlers against injected planner and pipeline
//! seams, verifying session bookkeeping and the degrade-to-default
//! behavior end to end.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Json, State};

use avatar_config::Settings;
use avatar_core::{CueExtractor, Error, LipSync, MouthCue, Result, Synthesizer};
use avatar_llm::{ChatMessage, CompletionModel};
use avatar_server::http::{tts, TtsRequest};
use avatar_server::AppState;

/// Model that always returns the same two-message plan
struct CannedModel;

#[async_trait]
impl CompletionModel for CannedModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Ok(r#"{"messages":[
            {"text":"Welcome to the interview.","facialExpression":"smile","animation":"TalkingOne"},
            {"text":"Tell me about your projects.","facialExpression":"default","animation":"TalkingThree"}
        ]}"#
            .to_string())
    }
}

/// Model that always fails
struct FailingModel;

#[async_trait]
impl CompletionModel for FailingModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(Error::Llm("upstream unavailable".to_string()))
    }
}

/// Synthesizer that writes the text as fake MP3 bytes
struct FakeSynthesizer;

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, target: &Path) -> Result<()> {
        tokio::fs::write(target, text.as_bytes()).await?;
        Ok(())
    }
}

/// Extractor returning a single covering cue
struct FakeExtractor;

#[async_trait]
impl CueExtractor for FakeExtractor {
    async fn extract(&self, _audio: &Path) -> Result<LipSync> {
        Ok(LipSync {
            mouth_cues: vec![MouthCue {
                value: "X".to_string(),
                start: 0.0,
                end: 1.0,
            }],
        })
    }
}

fn state_with_model(model: Arc<dyn CompletionModel>) -> AppState {
    AppState::with_components(
        Settings::default(),
        model,
        Arc::new(FakeSynthesizer),
        Arc::new(FakeExtractor),
    )
}

fn request(user: &str, message: &str) -> TtsRequest {
    serde_json::from_value(serde_json::json!({
        "userName": user,
        "message": message,
    }))
    .unwrap()
}

#[tokio::test]
async fn test_unknown_user_gets_session_and_messages() {
    let state = state_with_model(Arc::new(CannedModel));

    let response = tts(State(state.clone()), Json(request("newuser", "hello")))
        .await
        .unwrap();

    assert_eq!(response.0.messages.len(), 2);
    assert_eq!(response.0.messages[0].text, "Welcome to the interview.");
    assert_eq!(state.sessions.count(), 1);
}

#[tokio::test]
async fn test_successful_turn_updates_session() {
    let state = state_with_model(Arc::new(CannedModel));

    tts(State(state.clone()), Json(request("asha", "hello")))
        .await
        .unwrap();

    let session = state.sessions.get_or_create("asha");
    let session_state = session.lock().await;

    assert!(session_state.first_greeted);
    assert_eq!(session_state.turns.len(), 2);
    assert_eq!(session_state.turns[0].content, "hello");
    // assistant turn is the flattened concatenation of planned texts
    assert_eq!(
        session_state.turns[1].content,
        "Welcome to the interview. Tell me about your projects."
    );
}

#[tokio::test]
async fn test_planner_failure_degrades_to_default_plan() {
    let state = state_with_model(Arc::new(FailingModel));

    let response = tts(State(state.clone()), Json(request("asha", "hello")))
        .await
        .expect("planner failure must not surface as an error response");

    assert_eq!(response.0.messages.len(), 1);
    assert!(response.0.messages[0].text.contains("repeat"));

    // failed planning leaves the session untouched
    let session = state.sessions.get_or_create("asha");
    let session_state = session.lock().await;
    assert!(!session_state.first_greeted);
    assert!(session_state.turns.is_empty());
}

#[tokio::test]
async fn test_messages_carry_audio_and_cues() {
    let state = state_with_model(Arc::new(CannedModel));

    let response = tts(State(state), Json(request("asha", "hello")))
        .await
        .unwrap();

    for message in &response.0.messages {
        assert!(!message.audio.is_empty());
        assert_eq!(message.lipsync.mouth_cues.len(), 1);
    }
}

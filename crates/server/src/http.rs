//! HTTP Endpoints
//!
//! REST API for the interview avatar client.

use axum::{
    extract::{Multipart, State},
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use avatar_core::{AssembledMessage, ResumeSummary, Turn};
use avatar_llm::PlannerContext;

use crate::resume::{self, ResumeFormat};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/voices", get(voices))
        .route("/upload-resume", post(upload_resume))
        .route("/tts", post(tts))
        .route("/sts", post(sts))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Proxy the provider's voices listing
async fn voices(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    let response = state
        .http
        .get(&state.config.tts.voices_url)
        .send()
        .await
        .map_err(|e| ServerError::VoicesUpstream(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ServerError::VoicesUpstream(format!(
            "provider returned {}",
            response.status()
        )));
    }

    let body = response
        .json()
        .await
        .map_err(|e| ServerError::VoicesUpstream(e.to_string()))?;

    Ok(Json(body))
}

/// Response for a successful resume upload
#[derive(Debug, Serialize)]
struct UploadResponse {
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(rename = "resumeSummary")]
    resume_summary: ResumeSummary,
}

/// Accept a resume upload, summarize it, and start a session
async fn upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("resume") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ServerError::MissingFile)?
                .to_vec();
            upload = Some((filename, bytes));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or(ServerError::MissingFile)?;

    let format = resume::extension(&filename)
        .and_then(ResumeFormat::from_extension)
        .ok_or(ServerError::UnsupportedFileType)?;

    let user_name = resume::user_name_from_filename(&filename);

    let raw_text =
        resume::extract_text(format, &bytes).map_err(ServerError::ResumeProcessing)?;

    let resume_summary = state
        .planner
        .summarize_resume(&raw_text)
        .await
        .map_err(ServerError::ResumeProcessing)?;

    state
        .sessions
        .create_with_resume(&user_name, resume_summary.clone());

    Ok(Json(UploadResponse {
        user_name,
        resume_summary,
    }))
}

/// Text-turn request
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub message: String,
    #[serde(rename = "chatHistory", default)]
    pub chat_history: Option<Vec<Turn>>,
}

/// Assembled-message response shared by /tts and /sts
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<AssembledMessage>,
}

/// Main text-turn entry point
pub async fn tts(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Result<Json<MessagesResponse>, ServerError> {
    let session = state.sessions.get_or_create(&request.user_name);

    // Plan under the session lock so turns for one user serialize.
    let plans = {
        let mut session_state = session.lock().await;

        let history = request
            .chat_history
            .as_deref()
            .unwrap_or(&session_state.turns)
            .to_vec();

        let ctx = PlannerContext {
            user_name: &session.user_name,
            resume_summary: &session_state.resume_summary,
            first_greeted: session_state.first_greeted,
            history: &history,
        };

        let (plans, planned_ok) = state.planner.plan(&request.message, &ctx).await;

        if planned_ok {
            session_state.first_greeted = true;
            session_state.turns.push(Turn::user(&request.message));
            let spoken = plans
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            session_state.turns.push(Turn::assistant(spoken));
        }

        plans
    };

    let messages = state
        .assembler
        .assemble(plans)
        .await
        .map_err(ServerError::TtsPipeline)?;

    Ok(Json(MessagesResponse { messages }))
}

/// Speech-turn request
#[derive(Debug, Deserialize)]
pub struct StsRequest {
    /// Base64-encoded recorded audio
    pub audio: String,
    #[serde(rename = "chatHistory", default)]
    pub chat_history: Option<Vec<Turn>>,
}

/// Speech-turn entry point; always anonymous context
pub async fn sts(
    State(state): State<AppState>,
    Json(request): Json<StsRequest>,
) -> Result<Json<MessagesResponse>, ServerError> {
    let audio = base64::engine::general_purpose::STANDARD
        .decode(request.audio.as_bytes())
        .map_err(|_| ServerError::InvalidAudio)?;

    let transcript = state
        .transcriber
        .transcribe(&audio)
        .await
        .map_err(ServerError::StsPipeline)?;

    tracing::info!(transcript = %transcript, "speech turn transcribed");

    let history = request.chat_history.unwrap_or_default();
    let ctx = PlannerContext {
        history: &history,
        ..PlannerContext::default()
    };

    let (plans, _) = state.planner.plan(&transcript, &ctx).await;

    let messages = state
        .assembler
        .assemble(plans)
        .await
        .map_err(ServerError::StsPipeline)?;

    Ok(Json(MessagesResponse { messages }))
}

/// Health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_config::Settings;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Settings::default());
        let _ = create_router(state);
    }

    #[test]
    fn test_tts_request_wire_names() {
        let json = r#"{"userName":"asha","message":"hi","chatHistory":[{"role":"user","content":"x"}]}"#;
        let request: TtsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.user_name, "asha");
        assert_eq!(request.chat_history.unwrap().len(), 1);
    }

    #[test]
    fn test_sts_request_defaults() {
        let request: StsRequest = serde_json::from_str(r#"{"audio":"QUJD"}"#).unwrap();
        assert!(request.chat_history.is_none());
    }
}

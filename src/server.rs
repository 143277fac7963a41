//! HTTP Endpoints
//!
//! Thin surface for a presentation layer: list inputs, run the pipeline,
//! hand back both files.

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::VoiceoverError;
use crate::models::{Deliverable, Gender, PipelineParams};
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

/// Create the application router
pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/videos", get(list_videos))
        .route("/api/voices", get(list_voices))
        .route("/api/generate", post(generate))
        .with_state(AppState { pipeline })
}

/// Error body returned for every failed request
pub struct ApiError(VoiceoverError);

impl From<VoiceoverError> for ApiError {
    fn from(err: VoiceoverError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = serde_json::json!({
            "error": format!("An error occurred: {}", self.0),
        });
        (status, Json(body)).into_response()
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_videos(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let videos = state.pipeline.videos()?;
    if videos.is_empty() {
        log::warn!("No video files found in the media directory");
    }
    Ok(Json(serde_json::json!({ "videos": videos })))
}

#[derive(Debug, Deserialize)]
struct VoicesQuery {
    gender: Gender,
}

#[derive(Debug, Serialize)]
struct VoiceEntry {
    index: usize,
    name: String,
    id: String,
}

async fn list_voices(
    State(state): State<AppState>,
    Query(query): Query<VoicesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let selection = state.pipeline.voices(query.gender).await?;
    let voices: Vec<VoiceEntry> = selection
        .voices
        .iter()
        .enumerate()
        .map(|(i, voice)| VoiceEntry {
            index: i + 1,
            name: format!("Voice {}: {}", i + 1, voice.name),
            id: voice.id.clone(),
        })
        .collect();
    let warning = selection.fallback.then(|| {
        format!(
            "No {} voices available. Falling back to default voice.",
            query.gender
        )
    });

    Ok(Json(serde_json::json!({
        "gender": query.gender,
        "fallback": selection.fallback,
        "warning": warning,
        "voices": voices,
    })))
}

#[derive(Debug, Serialize)]
struct DownloadBody {
    file_name: String,
    mime_type: String,
    /// base64 encoded file contents
    data: String,
}

impl From<Deliverable> for DownloadBody {
    fn from(deliverable: Deliverable) -> Self {
        Self {
            data: STANDARD.encode(&deliverable.bytes),
            file_name: deliverable.file_name,
            mime_type: deliverable.mime_type,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    video: DownloadBody,
    audio: DownloadBody,
    warnings: Vec<String>,
}

async fn generate(
    State(state): State<AppState>,
    Json(params): Json<PipelineParams>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let output = state.pipeline.run(params).await?;
    Ok(Json(GenerateResponse {
        video: output.video.into(),
        audio: output.audio.into(),
        warnings: output.warnings,
    }))
}

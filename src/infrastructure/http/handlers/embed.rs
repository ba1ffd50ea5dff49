//! Embed Handlers - 风格嵌入

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::form::FormFields;
use crate::application::{EmbedAudio, EmbedText};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct EmbedTextResponse {
    pub prompt: String,
    pub embedding: Vec<f32>,
    pub shape: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct EmbedAudioResponse {
    pub filename: String,
    pub embedding: Vec<f32>,
    pub shape: Vec<usize>,
}

/// 文本提示的嵌入
pub async fn embed_text(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<EmbedTextResponse>, ApiError> {
    let form = FormFields::read(multipart).await?;
    let query = EmbedText {
        prompt: form.required_text("prompt")?,
    };

    let result = state.embed_text_handler.handle(query).await?;
    let shape = result.embedding.shape();

    Ok(Json(EmbedTextResponse {
        prompt: result.source,
        embedding: result.embedding.into_values(),
        shape,
    }))
}

/// 音频文件的嵌入
pub async fn embed_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<EmbedAudioResponse>, ApiError> {
    let mut form = FormFields::read(multipart).await?;
    let query = EmbedAudio {
        audio: form.required_file("audio_file")?,
    };

    let result = state.embed_audio_handler.handle(query).await?;
    let shape = result.embedding.shape();

    Ok(Json(EmbedAudioResponse {
        filename: result.source,
        embedding: result.embedding.into_values(),
        shape,
    }))
}

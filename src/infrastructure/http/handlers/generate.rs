//! Generate Handlers - 音乐生成
//!
//! 生成结果以文件流返回

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::form::FormFields;
use crate::application::{GenerateBlend, GenerateFromAudio, GenerateFromText, RenderedTrack};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub const GENERATION_DURATION_HEADER: &str = "x-generation-duration-secs";
pub const GENERATION_CHUNKS_HEADER: &str = "x-generation-chunks";

/// 从文本提示生成
///
/// 表单字段: prompt, duration?, format?
pub async fn generate_text(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = FormFields::read(multipart).await?;

    let command = GenerateFromText {
        prompt: form.required_text("prompt")?,
        duration_secs: form.int("duration")?,
        format: form.optional_text("format"),
    };

    let track = state.generate_text_handler.handle(command).await?;
    track_response(track).await
}

/// 从参考音频生成
///
/// 表单字段: audio_file, duration?, prompt?, audio_weight?, text_weight?, format?
pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = FormFields::read(multipart).await?;

    let command = GenerateFromAudio {
        audio: form.required_file("audio_file")?,
        prompt: form.optional_text("prompt"),
        duration_secs: form.int("duration")?,
        audio_weight: form.float("audio_weight")?,
        text_weight: form.float("text_weight")?,
        format: form.optional_text("format"),
    };

    let track = state.generate_audio_handler.handle(command).await?;
    track_response(track).await
}

/// 混合多个风格生成
///
/// 表单字段: duration?, text_prompts?, text_weights?, audio_files*, audio_weights?, format?
pub async fn generate_blend(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = FormFields::read(multipart).await?;

    let command = GenerateBlend {
        duration_secs: form.int("duration")?,
        text_prompts: form.optional_text("text_prompts"),
        text_weights: form.optional_text("text_weights"),
        audio_files: form.take_files("audio_files"),
        audio_weights: form.optional_text("audio_weights"),
        format: form.optional_text("format"),
    };

    let track = state.generate_blend_handler.handle(command).await?;
    track_response(track).await
}

/// 流式返回生成的音频文件
async fn track_response(track: RenderedTrack) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(&track.path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open audio file: {}", e)))?;

    let file_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?
        .len();

    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, track.content_type)
        .header(header::CONTENT_LENGTH, file_size)
        .header(header::CONTENT_DISPOSITION, content_disposition(&track.filename))
        .header(GENERATION_DURATION_HEADER, format!("{:.3}", track.duration_secs))
        .header(GENERATION_CHUNKS_HEADER, track.num_chunks)
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// `attachment; filename="..."`，非 ASCII 文件名额外带 RFC 5987 的 `filename*`
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("magenta_rt_funk.wav"),
            "attachment; filename=\"magenta_rt_funk.wav\""
        );
    }

    #[test]
    fn test_content_disposition_unicode() {
        assert_eq!(
            content_disposition("magenta_rt_é.wav"),
            "attachment; filename=\"magenta_rt__.wav\"; filename*=UTF-8''magenta_rt_%C3%A9.wav"
        );
    }
}

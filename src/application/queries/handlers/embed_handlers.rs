//! Embed Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{ModelError, StyleEncoderPort, StyleInput};
use crate::application::queries::{EmbedAudio, EmbedText, EmbeddingResult};
use crate::application::services::UploadLoader;

/// EmbedText Handler
pub struct EmbedTextHandler {
    encoder: Arc<dyn StyleEncoderPort>,
}

impl EmbedTextHandler {
    pub fn new(encoder: Arc<dyn StyleEncoderPort>) -> Self {
        Self { encoder }
    }

    pub async fn handle(&self, query: EmbedText) -> Result<EmbeddingResult, ApplicationError> {
        if query.prompt.trim().is_empty() {
            return Err(ApplicationError::validation("Prompt is required"));
        }

        let embedding = self.encoder.embed_text(&query.prompt).await?;

        tracing::debug!(prompt = %query.prompt, dim = embedding.dim(), "Text embedded");

        Ok(EmbeddingResult {
            source: query.prompt,
            embedding,
        })
    }
}

/// EmbedAudio Handler
pub struct EmbedAudioHandler {
    encoder: Arc<dyn StyleEncoderPort>,
    loader: Arc<UploadLoader>,
}

impl EmbedAudioHandler {
    pub fn new(encoder: Arc<dyn StyleEncoderPort>, loader: Arc<UploadLoader>) -> Self {
        Self { encoder, loader }
    }

    pub async fn handle(&self, query: EmbedAudio) -> Result<EmbeddingResult, ApplicationError> {
        let wave = self.loader.load(&query.audio).await?;

        let mut embeddings = self.encoder.embed(&[StyleInput::Audio(wave)]).await?;
        if embeddings.len() != 1 {
            return Err(ModelError::CountMismatch {
                expected: 1,
                actual: embeddings.len(),
            }
            .into());
        }
        let embedding = embeddings.remove(0);

        tracing::debug!(
            filename = %query.audio.display_name(),
            dim = embedding.dim(),
            "Audio embedded"
        );

        Ok(EmbeddingResult {
            source: query.audio.display_name().to_string(),
            embedding,
        })
    }
}

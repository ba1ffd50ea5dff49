//! Generate Command Handlers

use std::sync::Arc;

use futures_util::future::try_join_all;

use crate::application::commands::{GenerateBlend, GenerateFromAudio, GenerateFromText};
use crate::application::error::ApplicationError;
use crate::application::ports::{ModelError, StyleEncoderPort, StyleInput};
use crate::application::services::{RenderedTrack, TrackRenderer, UploadLoader};
use crate::domain::generation::{track_filename, GenerationDuration, OutputFormat};
use crate::domain::style::{
    blend_styles, parse_prompt_list, parse_weight_list, StyleEmbedding, StyleError, StyleWeight,
};

/// 生成命令的默认值
#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    /// 请求未指定时长时使用
    pub duration: GenerationDuration,
    /// 请求未指定格式时的输出格式
    pub output_format: OutputFormat,
    /// 下载文件名前缀
    pub filename_prefix: String,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            duration: GenerationDuration::default(),
            output_format: OutputFormat::Wav,
            filename_prefix: "magenta_rt".to_string(),
        }
    }
}

impl GenerationDefaults {
    fn resolve_format(&self, raw: Option<&str>) -> Result<OutputFormat, ApplicationError> {
        match non_blank(raw) {
            Some(f) => Ok(f.parse()?),
            None => Ok(self.output_format),
        }
    }

    fn resolve_duration(&self, secs: Option<i64>) -> Result<GenerationDuration, ApplicationError> {
        match secs {
            Some(s) => Ok(GenerationDuration::new(s)?),
            None => Ok(self.duration),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 校验模型返回的嵌入数量
fn expect_embeddings(
    embeddings: Vec<StyleEmbedding>,
    expected: usize,
) -> Result<Vec<StyleEmbedding>, ApplicationError> {
    if embeddings.len() != expected {
        return Err(ModelError::CountMismatch {
            expected,
            actual: embeddings.len(),
        }
        .into());
    }
    Ok(embeddings)
}

// ============================================================================
// GenerateFromText
// ============================================================================

/// GenerateFromText Handler
pub struct GenerateFromTextHandler {
    encoder: Arc<dyn StyleEncoderPort>,
    renderer: Arc<TrackRenderer>,
    defaults: GenerationDefaults,
}

impl GenerateFromTextHandler {
    pub fn new(
        encoder: Arc<dyn StyleEncoderPort>,
        renderer: Arc<TrackRenderer>,
        defaults: GenerationDefaults,
    ) -> Self {
        Self {
            encoder,
            renderer,
            defaults,
        }
    }

    pub async fn handle(&self, command: GenerateFromText) -> Result<RenderedTrack, ApplicationError> {
        let prompt = non_blank(Some(command.prompt.as_str()))
            .ok_or_else(|| ApplicationError::validation("Prompt is required"))?
            .to_string();
        let duration = self.defaults.resolve_duration(command.duration_secs)?;
        let format = self.defaults.resolve_format(command.format.as_deref())?;

        tracing::info!(
            prompt = %prompt,
            duration_secs = duration.secs(),
            "Generating audio from text"
        );

        let style = self.encoder.embed_text(&prompt).await?;
        let filename = track_filename(&self.defaults.filename_prefix, &prompt, format);

        self.renderer.render(&style, duration, format, filename).await
    }
}

// ============================================================================
// GenerateFromAudio
// ============================================================================

/// GenerateFromAudio Handler
pub struct GenerateFromAudioHandler {
    encoder: Arc<dyn StyleEncoderPort>,
    renderer: Arc<TrackRenderer>,
    loader: Arc<UploadLoader>,
    defaults: GenerationDefaults,
}

impl GenerateFromAudioHandler {
    pub fn new(
        encoder: Arc<dyn StyleEncoderPort>,
        renderer: Arc<TrackRenderer>,
        loader: Arc<UploadLoader>,
        defaults: GenerationDefaults,
    ) -> Self {
        Self {
            encoder,
            renderer,
            loader,
            defaults,
        }
    }

    pub async fn handle(
        &self,
        command: GenerateFromAudio,
    ) -> Result<RenderedTrack, ApplicationError> {
        let duration = self.defaults.resolve_duration(command.duration_secs)?;
        let format = self.defaults.resolve_format(command.format.as_deref())?;
        let audio_weight = match command.audio_weight {
            Some(w) => StyleWeight::bounded(w)?,
            None => StyleWeight::default(),
        };
        let text_weight = match command.text_weight {
            Some(w) => StyleWeight::bounded(w)?,
            None => StyleWeight::default(),
        };
        let prompt = non_blank(command.prompt.as_deref()).map(str::to_string);

        tracing::info!(
            filename = %command.audio.display_name(),
            duration_secs = duration.secs(),
            "Generating audio from uploaded file"
        );

        let wave = self.loader.load(&command.audio).await?;

        let style = match prompt {
            Some(prompt) => {
                tracing::info!(prompt = %prompt, "Blending audio with text");
                let inputs = [StyleInput::Audio(wave), StyleInput::Text(prompt)];
                let embeddings = expect_embeddings(self.encoder.embed(&inputs).await?, 2)?;
                let weighted: Vec<(f32, StyleEmbedding)> = [audio_weight.value(), text_weight.value()]
                    .into_iter()
                    .zip(embeddings)
                    .collect();
                blend_styles(&weighted)?
            }
            None => {
                let mut embeddings =
                    expect_embeddings(self.encoder.embed(&[StyleInput::Audio(wave)]).await?, 1)?;
                embeddings.remove(0)
            }
        };

        let filename = track_filename(&self.defaults.filename_prefix, "audio_styled", format);

        self.renderer.render(&style, duration, format, filename).await
    }
}

// ============================================================================
// GenerateBlend
// ============================================================================

/// GenerateBlend Handler
pub struct GenerateBlendHandler {
    encoder: Arc<dyn StyleEncoderPort>,
    renderer: Arc<TrackRenderer>,
    loader: Arc<UploadLoader>,
    defaults: GenerationDefaults,
}

impl GenerateBlendHandler {
    pub fn new(
        encoder: Arc<dyn StyleEncoderPort>,
        renderer: Arc<TrackRenderer>,
        loader: Arc<UploadLoader>,
        defaults: GenerationDefaults,
    ) -> Self {
        Self {
            encoder,
            renderer,
            loader,
            defaults,
        }
    }

    pub async fn handle(&self, command: GenerateBlend) -> Result<RenderedTrack, ApplicationError> {
        let duration = self.defaults.resolve_duration(command.duration_secs)?;
        let format = self.defaults.resolve_format(command.format.as_deref())?;

        let mut weights: Vec<f32> = Vec::new();
        let mut inputs: Vec<StyleInput> = Vec::new();

        if let Some(raw) = non_blank(command.text_prompts.as_deref()) {
            let prompts = parse_prompt_list(raw)?;
            let text_weights = match non_blank(command.text_weights.as_deref()) {
                Some(w) => parse_weight_list(w)?,
                None => vec![1.0; prompts.len()],
            };

            if prompts.len() != text_weights.len() {
                return Err(ApplicationError::validation(
                    "Number of text prompts must match number of weights",
                ));
            }

            for (weight, prompt) in text_weights.into_iter().zip(prompts) {
                tracing::info!(prompt = %prompt, weight = weight, "Added text prompt");
                weights.push(weight);
                inputs.push(StyleInput::Text(prompt));
            }
        }

        if !command.audio_files.is_empty() {
            let audio_weights = match non_blank(command.audio_weights.as_deref()) {
                Some(w) => parse_weight_list(w)?,
                None => vec![1.0; command.audio_files.len()],
            };

            if command.audio_files.len() != audio_weights.len() {
                return Err(ApplicationError::validation(
                    "Number of audio files must match number of weights",
                ));
            }

            let waves = try_join_all(command.audio_files.iter().map(|f| self.loader.load(f))).await?;

            for ((weight, wave), file) in audio_weights.into_iter().zip(waves).zip(&command.audio_files) {
                tracing::info!(filename = %file.display_name(), weight = weight, "Added audio file");
                weights.push(weight);
                inputs.push(StyleInput::Audio(wave));
            }
        }

        if inputs.is_empty() {
            return Err(StyleError::NoStyles.into());
        }

        let embeddings = expect_embeddings(self.encoder.embed(&inputs).await?, inputs.len())?;
        let weighted: Vec<(f32, StyleEmbedding)> = weights.into_iter().zip(embeddings).collect();
        let style = blend_styles(&weighted)?;

        tracing::info!("Generating with {} blended styles", weighted.len());

        let filename = track_filename(&self.defaults.filename_prefix, "blended", format);

        self.renderer.render(&style, duration, format, filename).await
    }
}

//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::{
    // Command handlers
    GenerateBlendHandler, GenerateFromAudioHandler, GenerateFromTextHandler, GenerationDefaults,
    // Query handlers
    EmbedAudioHandler, EmbedTextHandler,
    // Ports
    AudioCodecPort, MusicGeneratorPort, ScratchStoragePort, StyleEncoderPort,
    // Services
    RenderSettings, TrackRenderer, UploadLoader,
};

/// 应用状态
///
/// 模型在启动时加载一次，所有请求共享
pub struct AppState {
    // ========== Ports ==========
    pub generator: Arc<dyn MusicGeneratorPort>,
    pub encoder: Arc<dyn StyleEncoderPort>,

    // ========== Services ==========
    pub renderer: Arc<TrackRenderer>,

    // ========== Command Handlers ==========
    pub generate_text_handler: GenerateFromTextHandler,
    pub generate_audio_handler: GenerateFromAudioHandler,
    pub generate_blend_handler: GenerateBlendHandler,

    // ========== Query Handlers ==========
    pub embed_text_handler: EmbedTextHandler,
    pub embed_audio_handler: EmbedAudioHandler,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        generator: Arc<dyn MusicGeneratorPort>,
        encoder: Arc<dyn StyleEncoderPort>,
        codec: Arc<dyn AudioCodecPort>,
        storage: Arc<dyn ScratchStoragePort>,
        settings: RenderSettings,
        defaults: GenerationDefaults,
    ) -> Self {
        let renderer = Arc::new(TrackRenderer::new(
            generator.clone(),
            codec.clone(),
            storage.clone(),
            settings,
        ));
        let loader = Arc::new(UploadLoader::new(codec, storage));

        Self {
            generator,
            encoder: encoder.clone(),
            renderer: renderer.clone(),

            // Command handlers
            generate_text_handler: GenerateFromTextHandler::new(
                encoder.clone(),
                renderer.clone(),
                defaults.clone(),
            ),
            generate_audio_handler: GenerateFromAudioHandler::new(
                encoder.clone(),
                renderer.clone(),
                loader.clone(),
                defaults.clone(),
            ),
            generate_blend_handler: GenerateBlendHandler::new(
                encoder.clone(),
                renderer,
                loader.clone(),
                defaults,
            ),

            // Query handlers
            embed_text_handler: EmbedTextHandler::new(encoder.clone()),
            embed_audio_handler: EmbedAudioHandler::new(encoder, loader),

            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::infrastructure::adapters::{
        FakeMusicModel, FakeMusicModelConfig, ScratchDir, SymphoniaCodec,
    };
    use std::path::Path;

    /// 使用假模型与临时目录构建应用状态
    pub async fn fake_state(dir: &Path) -> AppState {
        let model = Arc::new(FakeMusicModel::new(FakeMusicModelConfig::default()));
        let storage = Arc::new(ScratchDir::new(dir, 10 * 1024 * 1024).await.unwrap());

        AppState::new(
            model.clone(),
            model,
            Arc::new(SymphoniaCodec::default()),
            storage,
            RenderSettings::default(),
            GenerationDefaults::default(),
        )
    }
}

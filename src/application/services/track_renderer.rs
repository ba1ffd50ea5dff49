//! Track Renderer - 分块生成循环
//!
//! 按分块计划反复调用生成模型，拼接、编码并写入临时文件。
//! 同时进行的生成数由信号量限制，整个循环受超时约束。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioCodecPort, GenerationState, MusicGeneratorPort, ScratchStoragePort,
};
use crate::domain::audio::{concatenate, Waveform};
use crate::domain::generation::{ChunkPlan, GenerationDuration, OutputFormat};
use crate::domain::style::StyleEmbedding;

/// 生成设置
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// 最大并发生成数
    pub max_concurrent: usize,
    /// 单次生成的超时时间
    pub timeout: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            timeout: Duration::from_secs(600),
        }
    }
}

/// 已生成的音频文件
#[derive(Debug, Clone)]
pub struct RenderedTrack {
    /// 临时文件路径
    pub path: PathBuf,
    /// 下载文件名
    pub filename: String,
    pub content_type: &'static str,
    pub size_bytes: usize,
    pub duration_secs: f64,
    pub num_chunks: usize,
}

/// 分块生成器
pub struct TrackRenderer {
    generator: Arc<dyn MusicGeneratorPort>,
    codec: Arc<dyn AudioCodecPort>,
    storage: Arc<dyn ScratchStoragePort>,
    permits: Arc<Semaphore>,
    settings: RenderSettings,
}

impl TrackRenderer {
    pub fn new(
        generator: Arc<dyn MusicGeneratorPort>,
        codec: Arc<dyn AudioCodecPort>,
        storage: Arc<dyn ScratchStoragePort>,
        settings: RenderSettings,
    ) -> Self {
        Self {
            generator,
            codec,
            storage,
            permits: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
            settings,
        }
    }

    /// 当前空闲的生成槽位
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// 生成、拼接、编码并保存
    pub async fn render(
        &self,
        style: &StyleEmbedding,
        duration: GenerationDuration,
        format: OutputFormat,
        filename: String,
    ) -> Result<RenderedTrack, ApplicationError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ApplicationError::internal("Generation semaphore closed"))?;

        let info = self.generator.info();
        let plan = ChunkPlan::new(duration, info.chunk_length_secs, info.crossfade_secs)?;

        let chunks = tokio::time::timeout(self.settings.timeout, self.generate_chunks(style, &plan))
            .await
            .map_err(|_| ApplicationError::Timeout(self.settings.timeout))??;

        let wave = concatenate(&chunks, plan.crossfade_secs)?;
        let duration_secs = wave.duration_secs();

        let codec = self.codec.clone();
        let encoded = tokio::task::spawn_blocking(move || codec.encode(&wave, format)).await??;

        let path = self
            .storage
            .save_output(&encoded, format.extension())
            .await?;

        tracing::info!(
            path = %path.display(),
            chunks = plan.num_chunks,
            duration_secs = duration_secs,
            size = encoded.len(),
            format = %format,
            "Track rendered"
        );

        Ok(RenderedTrack {
            path,
            filename,
            content_type: format.content_type(),
            size_bytes: encoded.len(),
            duration_secs,
            num_chunks: plan.num_chunks,
        })
    }

    async fn generate_chunks(
        &self,
        style: &StyleEmbedding,
        plan: &ChunkPlan,
    ) -> Result<Vec<Waveform>, ApplicationError> {
        let mut chunks = Vec::new();
        let mut state: Option<GenerationState> = None;

        for i in 0..plan.num_chunks {
            let chunk = self.generator.generate_chunk(state.take(), style).await?;
            state = Some(chunk.state);
            chunks.push(chunk.audio);
            tracing::info!("Generated chunk {}/{}", i + 1, plan.num_chunks);
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{FakeMusicModel, FakeMusicModelConfig, ScratchDir, SymphoniaCodec};
    use crate::application::ports::{GeneratedChunk, GeneratorInfo, ModelError, StyleEncoderPort};
    use async_trait::async_trait;
    use tempfile::tempdir;

    async fn renderer(dir: &std::path::Path, settings: RenderSettings) -> (TrackRenderer, Arc<FakeMusicModel>) {
        let model = Arc::new(FakeMusicModel::new(FakeMusicModelConfig::default()));
        let storage = Arc::new(ScratchDir::new(dir, 50 * 1024 * 1024).await.unwrap());
        let renderer = TrackRenderer::new(
            model.clone(),
            Arc::new(SymphoniaCodec::default()),
            storage,
            settings,
        );
        (renderer, model)
    }

    #[tokio::test]
    async fn test_render_produces_expected_duration() {
        let dir = tempdir().unwrap();
        let (renderer, model) = renderer(dir.path(), RenderSettings::default()).await;
        let style = model.embed_text("funk").await.unwrap();

        let track = renderer
            .render(
                &style,
                GenerationDuration::new(4).unwrap(),
                OutputFormat::Wav,
                "funk.wav".to_string(),
            )
            .await
            .unwrap();

        assert_eq!(track.num_chunks, 2);
        assert!(track.path.exists());
        assert_eq!(track.content_type, "audio/wav");
        // 每块 2s + 40ms 重叠，拼接后多出一段 crossfade
        let frames = 2 * (96000 + 1920) - 1920;
        assert!((track.duration_secs - 4.04).abs() < 1e-6);
        // 16-bit 立体声 WAV: 44 字节头 + 4 字节/帧
        assert_eq!(track.size_bytes, 44 + frames * 4);
    }

    struct StalledGenerator {
        info: GeneratorInfo,
    }

    #[async_trait]
    impl MusicGeneratorPort for StalledGenerator {
        fn info(&self) -> &GeneratorInfo {
            &self.info
        }

        async fn generate_chunk(
            &self,
            _state: Option<GenerationState>,
            _style: &StyleEmbedding,
        ) -> Result<GeneratedChunk, ModelError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(ModelError::Timeout)
        }
    }

    #[tokio::test]
    async fn test_render_times_out() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(ScratchDir::new(dir.path(), 1024).await.unwrap());
        let generator = Arc::new(StalledGenerator {
            info: GeneratorInfo {
                model_name: "stalled".to_string(),
                chunk_length_secs: 2.0,
                crossfade_secs: 0.0,
                sample_rate: 48000,
                channels: 2,
            },
        });
        let renderer = TrackRenderer::new(
            generator,
            Arc::new(SymphoniaCodec::default()),
            storage,
            RenderSettings {
                max_concurrent: 1,
                timeout: Duration::from_millis(50),
            },
        );

        let result = renderer
            .render(
                &StyleEmbedding::new(vec![0.0; 4]),
                GenerationDuration::default(),
                OutputFormat::Wav,
                "x.wav".to_string(),
            )
            .await;

        let err = match result {
            Err(e) => e,
            Ok(_) => panic!("render should time out"),
        };
        assert!(matches!(err, ApplicationError::Timeout(d) if d == Duration::from_millis(50)));
        assert_eq!(err.to_string(), "Generation timed out after 0.05s");
        assert_eq!(renderer.available_slots(), 1);
    }
}

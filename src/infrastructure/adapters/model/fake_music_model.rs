//! Fake Music Model - 用于测试和本地运行的进程内模型
//!
//! 不加载任何权重：嵌入由输入的 md5 派生，生成结果为与风格相关的正弦音

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    GeneratedChunk, GenerationState, GeneratorInfo, ModelError, MusicGeneratorPort,
    StyleEncoderPort, StyleInput,
};
use crate::domain::audio::Waveform;
use crate::domain::style::StyleEmbedding;

/// Fake 模型配置
#[derive(Debug, Clone)]
pub struct FakeMusicModelConfig {
    pub chunk_length_secs: f64,
    pub crossfade_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// 嵌入向量维度
    pub embedding_dim: usize,
    /// 每次调用的模拟延迟
    pub latency: Duration,
}

impl Default for FakeMusicModelConfig {
    fn default() -> Self {
        Self {
            chunk_length_secs: 2.0,
            crossfade_secs: 0.04,
            sample_rate: 48000,
            channels: 2,
            embedding_dim: 768,
            latency: Duration::ZERO,
        }
    }
}

/// 生成状态：已生成块数与振荡器相位
#[derive(Debug, Default, Serialize, Deserialize)]
struct FakeState {
    chunk_index: u64,
    phase: f64,
}

/// Fake Music Model
///
/// 同时实现生成模型和风格编码器
pub struct FakeMusicModel {
    config: FakeMusicModelConfig,
    info: GeneratorInfo,
}

impl FakeMusicModel {
    pub fn new(config: FakeMusicModelConfig) -> Self {
        let info = GeneratorInfo {
            model_name: "fake".to_string(),
            chunk_length_secs: config.chunk_length_secs,
            crossfade_secs: config.crossfade_secs,
            sample_rate: config.sample_rate,
            channels: config.channels,
        };
        tracing::info!(
            chunk_length_secs = config.chunk_length_secs,
            sample_rate = config.sample_rate,
            "FakeMusicModel initialized"
        );
        Self { config, info }
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    /// 由种子生成单位长度的伪随机向量
    fn seeded_embedding(&self, seed: [u8; 16]) -> StyleEmbedding {
        let mut state = u64::from_le_bytes(seed[..8].try_into().unwrap_or([1; 8])) | 1;
        let mut values: Vec<f32> = (0..self.config.embedding_dim)
            .map(|_| {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 40) as f32 / (1u64 << 24) as f32 * 2.0 - 1.0
            })
            .collect();

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        StyleEmbedding::new(values)
    }

    fn embed_one(&self, input: &StyleInput) -> StyleEmbedding {
        let digest = match input {
            StyleInput::Text(text) => md5::compute(format!("text:{}", text)),
            StyleInput::Audio(wave) => {
                let bytes: Vec<u8> = wave
                    .samples()
                    .iter()
                    .flat_map(|s| ((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes())
                    .collect();
                md5::compute(bytes)
            }
        };
        self.seeded_embedding(digest.0)
    }

    /// 风格向量映射到 110 Hz ~ 1760 Hz
    fn frequency_for(style: &StyleEmbedding) -> f64 {
        let first = style.values().first().copied().unwrap_or(0.0).clamp(-1.0, 1.0) as f64;
        110.0 * 2f64.powf((first + 1.0) * 2.0)
    }
}

#[async_trait]
impl StyleEncoderPort for FakeMusicModel {
    async fn embed(&self, inputs: &[StyleInput]) -> Result<Vec<StyleEmbedding>, ModelError> {
        self.simulate_latency().await;
        tracing::debug!(
            inputs = ?inputs.iter().map(StyleInput::describe).collect::<Vec<_>>(),
            "FakeMusicModel: embedding"
        );
        Ok(inputs.iter().map(|i| self.embed_one(i)).collect())
    }
}

#[async_trait]
impl MusicGeneratorPort for FakeMusicModel {
    fn info(&self) -> &GeneratorInfo {
        &self.info
    }

    async fn generate_chunk(
        &self,
        state: Option<GenerationState>,
        style: &StyleEmbedding,
    ) -> Result<GeneratedChunk, ModelError> {
        self.simulate_latency().await;

        let prev: FakeState = match state {
            Some(s) => serde_json::from_value(s.as_value().clone())
                .map_err(|e| ModelError::InvalidResponse(format!("Bad generation state: {}", e)))?,
            None => FakeState::default(),
        };

        let sample_rate = self.config.sample_rate as f64;
        // 每块末尾多出一段 crossfade，供拼接时重叠
        let frames = ((self.config.chunk_length_secs + self.config.crossfade_secs) * sample_rate)
            .round() as usize;
        let step = std::f64::consts::TAU * Self::frequency_for(style) / sample_rate;
        let channels = self.config.channels as usize;

        let mut samples = Vec::with_capacity(frames * channels);
        let mut phase = prev.phase;
        for _ in 0..frames {
            let v = (phase.sin() * 0.3) as f32;
            samples.extend(std::iter::repeat(v).take(channels));
            phase = (phase + step) % std::f64::consts::TAU;
        }

        let audio = Waveform::new(samples, self.config.sample_rate, self.config.channels)
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let next = FakeState {
            chunk_index: prev.chunk_index + 1,
            phase,
        };
        let state = serde_json::to_value(&next)
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        Ok(GeneratedChunk {
            state: GenerationState::new(state),
            audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_embedding_is_unit_length_and_stable() {
        let model = FakeMusicModel::new(FakeMusicModelConfig::default());
        let a = model.embed_text("jazz").await.unwrap();
        let b = model.embed_text("jazz").await.unwrap();
        let c = model.embed_text("metal").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        let norm: f32 = a.values().iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_generate_chunk_advances_state() {
        let model = FakeMusicModel::new(FakeMusicModelConfig::default());
        let style = model.embed_text("ambient").await.unwrap();

        let first = model.generate_chunk(None, &style).await.unwrap();
        assert_eq!(first.audio.num_frames(), 96000 + 1920);
        assert_eq!(first.state.as_value()["chunk_index"], 1);

        let second = model
            .generate_chunk(Some(first.state), &style)
            .await
            .unwrap();
        assert_eq!(second.state.as_value()["chunk_index"], 2);
    }

    #[tokio::test]
    async fn test_generate_chunk_rejects_foreign_state() {
        let model = FakeMusicModel::new(FakeMusicModelConfig::default());
        let style = StyleEmbedding::new(vec![0.0; 8]);
        let state = GenerationState::new(serde_json::json!("opaque"));
        assert!(model.generate_chunk(Some(state), &style).await.is_err());
    }
}

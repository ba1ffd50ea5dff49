//! Music Generator Port - 分块生成模型抽象
//!
//! 外部的自回归音乐生成模型：给定上一块的状态与风格向量，产生下一块音频。
//! 具体实现在 infrastructure/adapters/model 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::audio::Waveform;
use crate::domain::generation::ChunkPlan;
use crate::domain::style::StyleEmbedding;

/// 模型调用错误
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Model request timeout")]
    Timeout,

    #[error("Model service error: {0}")]
    ServiceError(String),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected} embeddings, model returned {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

impl ModelError {
    /// 网络抖动与超时可以重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModelError::NetworkError(_) | ModelError::Timeout)
    }
}

/// 生成模型的静态参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorInfo {
    /// 模型名称
    #[serde(rename = "model")]
    pub model_name: String,
    /// 每块音频长度（秒）
    #[serde(rename = "chunk_length")]
    pub chunk_length_secs: f64,
    /// 块间 crossfade 长度（秒）
    #[serde(rename = "crossfade_length")]
    pub crossfade_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl GeneratorInfo {
    /// 校验模型服务上报的参数
    pub fn validate(&self) -> Result<(), ModelError> {
        if !ChunkPlan::is_valid_chunk_length(self.chunk_length_secs) {
            return Err(ModelError::InvalidResponse(format!(
                "chunk_length must be at least {}s, got {}",
                ChunkPlan::MIN_CHUNK_LENGTH_SECS,
                self.chunk_length_secs
            )));
        }
        if !self.crossfade_secs.is_finite() || self.crossfade_secs < 0.0 {
            return Err(ModelError::InvalidResponse(format!(
                "Invalid crossfade_length: {}",
                self.crossfade_secs
            )));
        }
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(ModelError::InvalidResponse(format!(
                "Invalid audio format: {} Hz / {} ch",
                self.sample_rate, self.channels
            )));
        }
        Ok(())
    }
}

/// 生成状态
///
/// 由模型产生并在下一次调用时原样传回，对本服务不透明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationState(serde_json::Value);

impl GenerationState {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// 单块生成结果
#[derive(Debug, Clone)]
pub struct GeneratedChunk {
    pub state: GenerationState,
    pub audio: Waveform,
}

/// Music Generator Port
#[async_trait]
pub trait MusicGeneratorPort: Send + Sync {
    /// 模型参数（块长度、crossfade 长度、采样率）
    fn info(&self) -> &GeneratorInfo;

    /// 生成下一块音频
    ///
    /// `state` 为 None 表示从头开始
    async fn generate_chunk(
        &self,
        state: Option<GenerationState>,
        style: &StyleEmbedding,
    ) -> Result<GeneratedChunk, ModelError>;

    /// 检查模型是否可用
    async fn health_check(&self) -> bool {
        true
    }
}

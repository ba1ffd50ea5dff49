//! Style Encoder Port - 文本/音频联合嵌入模型抽象

use async_trait::async_trait;

use super::ModelError;
use crate::domain::audio::Waveform;
use crate::domain::style::StyleEmbedding;

/// 风格输入：文本提示或参考音频
#[derive(Debug, Clone)]
pub enum StyleInput {
    Text(String),
    Audio(Waveform),
}

impl StyleInput {
    /// 日志用的简短描述
    pub fn describe(&self) -> String {
        match self {
            StyleInput::Text(text) => format!("text({})", text),
            StyleInput::Audio(wave) => format!("audio({:.1}s)", wave.duration_secs()),
        }
    }
}

/// Style Encoder Port
#[async_trait]
pub trait StyleEncoderPort: Send + Sync {
    /// 批量嵌入，输出与输入一一对应且顺序一致
    async fn embed(&self, inputs: &[StyleInput]) -> Result<Vec<StyleEmbedding>, ModelError>;

    /// 嵌入单个文本提示
    async fn embed_text(&self, text: &str) -> Result<StyleEmbedding, ModelError> {
        let mut embeddings = self.embed(&[StyleInput::Text(text.to_string())]).await?;
        match embeddings.len() {
            1 => Ok(embeddings.remove(0)),
            n => Err(ModelError::CountMismatch {
                expected: 1,
                actual: n,
            }),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }
}

//! Embed Queries - 风格嵌入查询

use crate::application::services::UploadedAudio;
use crate::domain::style::StyleEmbedding;

/// 文本提示的嵌入
#[derive(Debug, Clone)]
pub struct EmbedText {
    pub prompt: String,
}

/// 音频文件的嵌入
#[derive(Debug, Clone)]
pub struct EmbedAudio {
    pub audio: UploadedAudio,
}

/// 嵌入结果
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// 文本提示或文件名
    pub source: String,
    pub embedding: StyleEmbedding,
}

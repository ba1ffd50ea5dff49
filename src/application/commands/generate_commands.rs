//! Generate Commands - 音乐生成命令

use crate::application::services::UploadedAudio;

/// 从文本提示生成
#[derive(Debug, Clone)]
pub struct GenerateFromText {
    pub prompt: String,
    /// 时长（秒），None 使用默认值
    pub duration_secs: Option<i64>,
    /// 输出格式（wav / opus），None 使用配置的默认格式
    pub format: Option<String>,
}

/// 从参考音频生成，可选混合文本提示
#[derive(Debug, Clone)]
pub struct GenerateFromAudio {
    pub audio: UploadedAudio,
    pub prompt: Option<String>,
    pub duration_secs: Option<i64>,
    /// 参考音频权重，默认 1.0
    pub audio_weight: Option<f32>,
    /// 文本提示权重，默认 1.0
    pub text_weight: Option<f32>,
    pub format: Option<String>,
}

/// 混合多个文本提示和/或参考音频生成
#[derive(Debug, Clone, Default)]
pub struct GenerateBlend {
    pub duration_secs: Option<i64>,
    /// 逗号分隔的文本提示
    pub text_prompts: Option<String>,
    /// 逗号分隔的文本权重
    pub text_weights: Option<String>,
    pub audio_files: Vec<UploadedAudio>,
    /// 逗号分隔的音频权重
    pub audio_weights: Option<String>,
    pub format: Option<String>,
}

//! Audio Codec Port - 音频解码/编码抽象
//!
//! 上传的参考音频解码为 PCM，生成结果编码为 WAV 或 Opus

use std::path::Path;

use thiserror::Error;

use crate::domain::audio::Waveform;
use crate::domain::generation::OutputFormat;

/// 编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported audio: {0}")]
    Unsupported(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Audio Codec Port
///
/// CPU 密集，调用方应放在 blocking 线程池中执行
pub trait AudioCodecPort: Send + Sync {
    /// 解码音频文件（容器由扩展名提示 + 内容探测）
    fn decode_file(&self, path: &Path) -> Result<Waveform, CodecError>;

    /// 编码波形
    fn encode(&self, wave: &Waveform, format: OutputFormat) -> Result<Vec<u8>, CodecError>;
}

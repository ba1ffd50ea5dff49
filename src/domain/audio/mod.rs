//! Audio Context - 音频限界上下文
//!
//! 职责:
//! - PCM 波形值对象
//! - 分块音频的 crossfade 拼接

mod crossfade;
mod waveform;

use thiserror::Error;

pub use crossfade::concatenate;
pub use waveform::Waveform;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No audio chunks to concatenate")]
    Empty,

    #[error("Invalid waveform: {0}")]
    InvalidFormat(String),

    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },
}

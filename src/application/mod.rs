//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（生成模型、风格编码器、编解码器、临时存储）
//! - commands: 生成命令及处理器
//! - queries: 嵌入查询及处理器
//! - services: 分块生成循环、上传音频加载
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    GenerateBlend, GenerateFromAudio, GenerateFromText,
    // Handlers
    handlers::{
        GenerateBlendHandler, GenerateFromAudioHandler, GenerateFromTextHandler,
        GenerationDefaults,
    },
};

pub use error::ApplicationError;

pub use ports::{
    AudioCodecPort, CodecError, GeneratedChunk, GenerationState, GeneratorInfo, ModelError,
    MusicGeneratorPort, ScratchFile, ScratchStoragePort, StorageError, StyleEncoderPort,
    StyleInput, SweepResult,
};

pub use queries::{
    EmbedAudio, EmbedText, EmbeddingResult,
    // Handlers
    handlers::{EmbedAudioHandler, EmbedTextHandler},
};

pub use services::{RenderSettings, RenderedTrack, TrackRenderer, UploadLoader, UploadedAudio};

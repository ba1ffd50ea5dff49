//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_codec;
mod music_generator;
mod scratch_storage;
mod style_encoder;

pub use audio_codec::{AudioCodecPort, CodecError};
pub use music_generator::{
    GeneratedChunk, GenerationState, GeneratorInfo, ModelError, MusicGeneratorPort,
};
pub use scratch_storage::{ScratchFile, ScratchStoragePort, StorageError, SweepResult};
pub use style_encoder::{StyleEncoderPort, StyleInput};

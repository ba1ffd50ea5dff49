//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use std::time::Duration;
use thiserror::Error;

use crate::application::ports::{CodecError, ModelError, StorageError};
use crate::domain::audio::AudioError;
use crate::domain::generation::GenerationError;
use crate::domain::style::StyleError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误（请求参数）
    #[error("{0}")]
    ValidationError(String),

    /// 外部模型错误
    #[error("Model error: {0}")]
    ModelError(String),

    /// 音频处理错误
    #[error("Audio error: {0}")]
    AudioError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 生成超时
    #[error("Generation timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<StyleError> for ApplicationError {
    fn from(err: StyleError) -> Self {
        match err {
            // 模型返回了维度不一致的向量，不是请求问题
            StyleError::DimensionMismatch { .. } => Self::ModelError(err.to_string()),
            _ => Self::ValidationError(err.to_string()),
        }
    }
}

impl From<GenerationError> for ApplicationError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidChunkLength(_) => Self::ModelError(err.to_string()),
            _ => Self::ValidationError(err.to_string()),
        }
    }
}

impl From<AudioError> for ApplicationError {
    fn from(err: AudioError) -> Self {
        Self::AudioError(err.to_string())
    }
}

impl From<ModelError> for ApplicationError {
    fn from(err: ModelError) -> Self {
        Self::ModelError(err.to_string())
    }
}

impl From<CodecError> for ApplicationError {
    fn from(err: CodecError) -> Self {
        Self::AudioError(err.to_string())
    }
}

impl From<StorageError> for ApplicationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { .. } => Self::ValidationError(err.to_string()),
            StorageError::IoError(_) => Self::StorageError(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApplicationError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::InternalError(format!("Blocking task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_errors_are_validation() {
        let err: ApplicationError = StyleError::NoStyles.into();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert_eq!(
            err.to_string(),
            "Must provide at least one text prompt or audio file"
        );
    }

    #[test]
    fn test_dimension_mismatch_is_model_error() {
        let err: ApplicationError = StyleError::DimensionMismatch {
            expected: 768,
            actual: 512,
        }
        .into();
        assert!(matches!(err, ApplicationError::ModelError(_)));
    }

    #[test]
    fn test_duration_error_is_validation() {
        let err: ApplicationError = GenerationError::DurationOutOfRange {
            value: 500,
            min: 2,
            max: 120,
        }
        .into();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }
}

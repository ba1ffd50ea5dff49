//! Generation Context - 生成参数限界上下文
//!
//! 职责:
//! - 生成时长与分块计划
//! - 输出格式与下载文件名

mod value_objects;

use thiserror::Error;

pub use value_objects::{track_filename, ChunkPlan, GenerationDuration, OutputFormat};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Duration must be between {min} and {max} seconds, got {value}")]
    DurationOutOfRange { value: i64, min: u32, max: u32 },

    #[error("Invalid chunk length: {0}")]
    InvalidChunkLength(f64),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

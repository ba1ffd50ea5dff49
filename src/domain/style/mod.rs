//! Style Context - 风格限界上下文
//!
//! 职责:
//! - 风格嵌入与权重值对象
//! - 多风格加权混合
//! - 逗号分隔的提示/权重列表解析

mod blend;
mod value_objects;

use thiserror::Error;

pub use blend::{blend_styles, normalize_weights, parse_prompt_list, parse_weight_list};
pub use value_objects::{StyleEmbedding, StyleWeight};

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("Must provide at least one text prompt or audio file")]
    NoStyles,

    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    #[error("Weight {value} exceeds maximum {max}")]
    WeightOutOfRange { value: f32, max: f32 },

    #[error("Weights must not all be zero")]
    ZeroTotalWeight,

    #[error("Prompt #{0} is empty")]
    EmptyPrompt(usize),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

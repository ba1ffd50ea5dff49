//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Audio Context: 波形与 crossfade 拼接
//! - Style Context: 风格嵌入与加权混合
//! - Generation Context: 时长、分块计划、输出格式

pub mod audio;
pub mod generation;
pub mod style;

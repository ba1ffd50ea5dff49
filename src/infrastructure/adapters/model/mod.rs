//! Model Adapter - 生成模型与风格编码器实现

mod fake_music_model;
mod http_model_client;

pub use fake_music_model::{FakeMusicModel, FakeMusicModelConfig};
pub use http_model_client::{HttpModelClient, HttpModelClientConfig};

//! HTTP Routes
//!
//! API Endpoints:
//! - /                 GET   服务信息
//! - /health           GET   健康检查
//! - /generate/text    POST  从文本提示生成
//! - /generate/audio   POST  从参考音频生成（可混合文本）
//! - /generate/blend   POST  混合多个文本提示与参考音频生成
//! - /embed/text       POST  文本提示的风格嵌入
//! - /embed/audio      POST  音频文件的风格嵌入

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/generate", generate_routes())
        .nest("/embed", embed_routes())
}

/// Generate 路由
fn generate_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/text", post(handlers::generate_text))
        .route("/audio", post(handlers::generate_audio))
        .route("/blend", post(handlers::generate_blend))
}

/// Embed 路由
fn embed_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/text", post(handlers::embed_text))
        .route("/audio", post(handlers::embed_audio))
}

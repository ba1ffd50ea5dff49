//! Status Handlers - 服务状态

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub model: String,
    pub version: &'static str,
    pub started_at: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models_loaded: bool,
    /// 当前空闲的生成槽位
    pub generation_slots: usize,
}

/// 服务信息
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "running",
        model: state.generator.info().model_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at.to_rfc3339(),
    })
}

/// 健康检查，同时探测生成模型与风格编码器
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (generator_ok, encoder_ok) =
        tokio::join!(state.generator.health_check(), state.encoder.health_check());

    Json(HealthResponse {
        status: "healthy",
        models_loaded: generator_ok && encoder_ok,
        generation_slots: state.renderer.available_slots(),
    })
}

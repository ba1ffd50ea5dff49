//! Magenta RT API - 音乐生成 HTTP 服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Audio Context: 波形与 crossfade 拼接
//! - Style Context: 风格嵌入的加权混合
//! - Generation Context: 时长、分块计划、输出格式
//!
//! 应用层 (application/):
//! - Ports: 端口定义（MusicGenerator, StyleEncoder, AudioCodec, ScratchStorage）
//! - Commands: 生成命令处理器
//! - Queries: 嵌入查询处理器
//! - Services: 分块生成循环、上传加载
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: multipart 表单 API
//! - Adapters: 模型 HTTP 客户端、假模型、symphonia/opus 编解码、临时目录
//! - Worker: 临时目录 GC

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

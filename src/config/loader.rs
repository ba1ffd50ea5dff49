//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, ModelBackend};
use crate::domain::generation::GenerationDuration;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// Opus 编码器接受的比特率范围
const OPUS_BITRATE_RANGE: std::ops::RangeInclusive<u32> = 6_000..=510_000;

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `MRT_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `MRT_SERVER__PORT=7860`
/// - `MRT_MODEL__BACKEND=fake`
/// - `MRT_MODEL__URL=http://model-server:8000`
/// - `MRT_GENERATION__MAX_CONCURRENT=2`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 7860)?
        .set_default("model.backend", "http")?
        .set_default("model.url", "http://localhost:8000")?
        .set_default("model.timeout_secs", 300)?
        .set_default("model.max_retries", 0)?
        .set_default("generation.default_duration", 10)?
        .set_default("generation.max_concurrent", 1)?
        .set_default("generation.timeout_secs", 600)?
        .set_default("generation.output_format", "wav")?
        .set_default("generation.opus_bitrate", 96000)?
        .set_default("storage.scratch_dir", "data/scratch")?
        .set_default("storage.max_upload_size", 50 * 1024 * 1024)?
        .set_default("gc.enabled", true)?
        .set_default("gc.interval_secs", 600)?
        .set_default("gc.output_ttl_secs", 3600)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: MRT_MODEL__URL=http://model-server:8000
    builder = builder.add_source(
        Environment::with_prefix("MRT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.model.backend == ModelBackend::Http && config.model.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Model URL cannot be empty".to_string(),
        ));
    }

    GenerationDuration::new(config.generation.default_duration as i64)
        .map_err(|e| ConfigError::ValidationError(format!("Default duration: {}", e)))?;

    if config.generation.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "Max concurrent generations cannot be 0".to_string(),
        ));
    }

    if config.generation.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Generation timeout cannot be 0".to_string(),
        ));
    }

    if !OPUS_BITRATE_RANGE.contains(&config.generation.opus_bitrate) {
        return Err(ConfigError::ValidationError(format!(
            "Opus bitrate must be between {} and {}",
            OPUS_BITRATE_RANGE.start(),
            OPUS_BITRATE_RANGE.end()
        )));
    }

    if config.storage.max_upload_size == 0 {
        return Err(ConfigError::ValidationError(
            "Max upload size cannot be 0".to_string(),
        ));
    }

    if config.gc.enabled && config.gc.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "GC interval cannot be 0 when GC is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Model Backend: {}", config.model.backend);
    if config.model.backend == ModelBackend::Http {
        tracing::info!("Model URL: {}", config.model.url);
        tracing::info!("Model Timeout: {}s", config.model.timeout_secs);
    }
    tracing::info!("Default Duration: {}s", config.generation.default_duration);
    tracing::info!("Max Concurrent Generations: {}", config.generation.max_concurrent);
    tracing::info!("Generation Timeout: {}s", config.generation.timeout_secs);
    tracing::info!("Output Format: {}", config.generation.output_format);
    tracing::info!("Scratch Directory: {:?}", config.storage.scratch_dir);
    tracing::info!("GC Enabled: {}", config.gc.enabled);
    if config.gc.enabled {
        tracing::info!("GC Interval: {}s", config.gc.interval_secs);
        tracing::info!("Output TTL: {}s", config.gc.output_ttl_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::OutputFormat;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_url_allowed_for_fake_backend() {
        let mut config = AppConfig::default();
        config.model.url = String::new();
        assert!(validate_config(&config).is_err());

        config.model.backend = ModelBackend::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_default_duration() {
        let mut config = AppConfig::default();
        config.generation.default_duration = 121;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_concurrency() {
        let mut config = AppConfig::default();
        config.generation.max_concurrent = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_opus_bitrate() {
        let mut config = AppConfig::default();
        config.generation.opus_bitrate = 1000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[model]
backend = "fake"

[generation]
output_format = "opus"
max_concurrent = 3
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.backend, ModelBackend::Fake);
        assert_eq!(config.generation.output_format, OutputFormat::Opus);
        assert_eq!(config.generation.max_concurrent, 3);
        assert_eq!(config.gc.output_ttl_secs, 3600);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[generation]\ntimeout_secs = 0").unwrap();

        let result = load_config_from_path(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}

//! Magenta RT API - 音乐生成 HTTP 服务

use std::sync::Arc;
use std::time::Duration;

use magenta_rt_api::application::{
    GenerationDefaults, MusicGeneratorPort, RenderSettings, StyleEncoderPort,
};
use magenta_rt_api::config::{load_config, print_config, AppConfig, ModelBackend};
use magenta_rt_api::domain::generation::GenerationDuration;
use magenta_rt_api::infrastructure::adapters::{
    FakeMusicModel, FakeMusicModelConfig, HttpModelClient, HttpModelClientConfig, ScratchDir,
    SymphoniaCodec,
};
use magenta_rt_api::infrastructure::http::{AppState, HttpServer, ServerConfig};
use magenta_rt_api::infrastructure::{ScratchGcConfig, ScratchGcWorker};

/// 初始化日志（RUST_LOG 优先于配置）
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},magenta_rt_api={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 按配置加载模型后端
async fn load_models(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn MusicGeneratorPort>, Arc<dyn StyleEncoderPort>)> {
    match config.model.backend {
        ModelBackend::Http => {
            let client_config = HttpModelClientConfig::new(&config.model.url)
                .with_timeout(Duration::from_secs(config.model.timeout_secs))
                .with_retries(config.model.max_retries);
            let client = Arc::new(HttpModelClient::connect(client_config).await?);
            Ok((client.clone(), client))
        }
        ModelBackend::Fake => {
            tracing::warn!("Using fake model backend, generated audio is synthetic");
            let model = Arc::new(FakeMusicModel::new(FakeMusicModelConfig::default()));
            Ok((model.clone(), model))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Magenta RT API v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    tracing::info!("Loading models...");
    let (generator, encoder) = load_models(&config).await?;
    tracing::info!("Models loaded successfully!");

    let storage = Arc::new(
        ScratchDir::new(&config.storage.scratch_dir, config.storage.max_upload_size).await?,
    );
    let codec = Arc::new(SymphoniaCodec::new(config.generation.opus_bitrate));

    // 启动临时目录 GC
    if config.gc.enabled {
        let gc = ScratchGcWorker::new(
            ScratchGcConfig {
                interval: Duration::from_secs(config.gc.interval_secs),
                output_ttl: Duration::from_secs(config.gc.output_ttl_secs),
            },
            storage.clone(),
        );
        tokio::spawn(gc.run());
    }

    let settings = RenderSettings {
        max_concurrent: config.generation.max_concurrent,
        timeout: Duration::from_secs(config.generation.timeout_secs),
    };
    let defaults = GenerationDefaults {
        duration: GenerationDuration::new(config.generation.default_duration as i64)?,
        output_format: config.generation.output_format,
        ..Default::default()
    };

    let state = AppState::new(generator, encoder, codec, storage, settings, defaults);

    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_body_limit(config.storage.max_upload_size as usize);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

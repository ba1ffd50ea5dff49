//! Scratch GC Worker - 定期清理过期的生成结果

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::application::ports::{ScratchStoragePort, StorageError, SweepResult};

/// GC Worker 配置
#[derive(Debug, Clone)]
pub struct ScratchGcConfig {
    /// 清理间隔
    pub interval: Duration,
    /// 生成结果保留时间
    pub output_ttl: Duration,
}

impl Default for ScratchGcConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            output_ttl: Duration::from_secs(3600),
        }
    }
}

/// 临时目录 GC Worker
pub struct ScratchGcWorker {
    config: ScratchGcConfig,
    storage: Arc<dyn ScratchStoragePort>,
}

impl ScratchGcWorker {
    pub fn new(config: ScratchGcConfig, storage: Arc<dyn ScratchStoragePort>) -> Self {
        Self { config, storage }
    }

    /// 启动 Worker，按间隔循环执行清理
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            output_ttl_secs = self.config.output_ttl.as_secs(),
            "ScratchGcWorker started"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_once().await {
                tracing::warn!("Scratch GC failed: {}", e);
            }
        }
    }

    /// 执行一次清理
    pub async fn sweep_once(&self) -> Result<SweepResult, StorageError> {
        let result = self.storage.sweep(self.config.output_ttl).await?;
        tracing::debug!(
            removed_files = result.removed_files,
            removed_bytes = result.removed_bytes,
            "Scratch GC pass finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::ScratchDir;

    #[tokio::test]
    async fn test_sweep_once_removes_expired_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ScratchDir::new(dir.path(), 1024).await.unwrap());
        let output = storage.save_output(b"data", "wav").await.unwrap();

        let keep = ScratchGcWorker::new(ScratchGcConfig::default(), storage.clone());
        assert_eq!(keep.sweep_once().await.unwrap().removed_files, 0);
        assert!(output.exists());

        let expire = ScratchGcWorker::new(
            ScratchGcConfig {
                interval: Duration::from_secs(1),
                output_ttl: Duration::ZERO,
            },
            storage,
        );
        assert_eq!(expire.sweep_once().await.unwrap().removed_files, 1);
        assert!(!output.exists());
    }
}

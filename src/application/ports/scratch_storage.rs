//! Scratch Storage Port - 临时文件存储抽象

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: u64 },
}

/// 作用域内的临时文件，Drop 时删除
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "Failed to remove scratch file: {}", e);
            }
        }
    }
}

/// 清理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepResult {
    pub removed_files: u64,
    pub removed_bytes: u64,
}

/// Scratch Storage Port
#[async_trait]
pub trait ScratchStoragePort: Send + Sync {
    /// 保存上传文件，返回的 guard 离开作用域即删除文件
    async fn save_upload(&self, data: &[u8], extension: &str) -> Result<ScratchFile, StorageError>;

    /// 保存生成结果，由 GC 按过期时间清理
    async fn save_output(&self, data: &[u8], extension: &str) -> Result<PathBuf, StorageError>;

    /// 删除修改时间早于 `max_age` 的生成结果
    async fn sweep(&self, max_age: Duration) -> Result<SweepResult, StorageError>;
}

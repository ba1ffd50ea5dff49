//! Scratch Dir - 文件系统临时存储实现
//!
//! 实现 ScratchStoragePort trait
//!
//! 目录布局:
//! - `{base}/uploads/`  上传文件，请求结束即删除
//! - `{base}/outputs/`  生成结果，由 GC 按修改时间清理

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{ScratchFile, ScratchStoragePort, StorageError, SweepResult};

const UPLOADS_DIR: &str = "uploads";
const OUTPUTS_DIR: &str = "outputs";

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::IoError(e.to_string())
}

/// 文件系统临时存储
pub struct ScratchDir {
    base_dir: PathBuf,
    max_upload_size: u64,
}

impl ScratchDir {
    /// 创建临时存储，确保子目录存在
    pub async fn new(base_dir: impl AsRef<Path>, max_upload_size: u64) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(base_dir.join(UPLOADS_DIR))
            .await
            .map_err(io_error)?;
        fs::create_dir_all(base_dir.join(OUTPUTS_DIR))
            .await
            .map_err(io_error)?;

        Ok(Self {
            base_dir,
            max_upload_size,
        })
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.base_dir.join(OUTPUTS_DIR)
    }

    fn unique_path(&self, sub_dir: &str, extension: &str) -> PathBuf {
        let name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension)
        };
        self.base_dir.join(sub_dir).join(name)
    }
}

#[async_trait]
impl ScratchStoragePort for ScratchDir {
    async fn save_upload(&self, data: &[u8], extension: &str) -> Result<ScratchFile, StorageError> {
        if data.len() as u64 > self.max_upload_size {
            return Err(StorageError::TooLarge {
                size: data.len(),
                max: self.max_upload_size,
            });
        }

        let path = self.unique_path(UPLOADS_DIR, extension);
        fs::write(&path, data).await.map_err(io_error)?;

        tracing::debug!("Saved upload: {}, size={} bytes", path.display(), data.len());

        Ok(ScratchFile::new(path))
    }

    async fn save_output(&self, data: &[u8], extension: &str) -> Result<PathBuf, StorageError> {
        let path = self.unique_path(OUTPUTS_DIR, extension);
        fs::write(&path, data).await.map_err(io_error)?;

        tracing::debug!("Saved output: {}, size={} bytes", path.display(), data.len());

        Ok(path)
    }

    async fn sweep(&self, max_age: Duration) -> Result<SweepResult, StorageError> {
        let mut result = SweepResult::default();
        let now = SystemTime::now();

        let mut entries = fs::read_dir(self.outputs_dir()).await.map_err(io_error)?;

        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();

            if age < max_age {
                continue;
            }

            // 文件可能已被并发的请求或清理删除
            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    result.removed_files += 1;
                    result.removed_bytes += metadata.len();
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove {}: {}", entry.path().display(), e);
                }
            }
        }

        if result.removed_files > 0 {
            tracing::info!(
                "Swept outputs: files={}, bytes={}",
                result.removed_files,
                result.removed_bytes
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn scratch(max_upload_size: u64) -> (TempDir, ScratchDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = ScratchDir::new(temp_dir.path(), max_upload_size).await.unwrap();
        (temp_dir, storage)
    }

    #[tokio::test]
    async fn test_upload_removed_on_drop() {
        let (_temp_dir, storage) = scratch(1024).await;

        let file = storage.save_upload(b"RIFF....", "wav").await.unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "wav");

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let (_temp_dir, storage) = scratch(4).await;

        let result = storage.save_upload(b"12345", "wav").await;
        assert!(matches!(
            result,
            Err(StorageError::TooLarge { size: 5, max: 4 })
        ));
    }

    #[tokio::test]
    async fn test_output_paths_are_unique() {
        let (_temp_dir, storage) = scratch(1024).await;

        let a = storage.save_output(b"a", "ogg").await.unwrap();
        let b = storage.save_output(b"b", "ogg").await.unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with(storage.outputs_dir()));
    }

    #[tokio::test]
    async fn test_sweep_respects_max_age() {
        let (_temp_dir, storage) = scratch(1024).await;

        let output = storage.save_output(b"abcd", "wav").await.unwrap();
        let upload = storage.save_upload(b"xyz", "wav").await.unwrap();

        let kept = storage.sweep(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(kept, SweepResult::default());
        assert!(output.exists());

        let swept = storage.sweep(Duration::ZERO).await.unwrap();
        assert_eq!(swept.removed_files, 1);
        assert_eq!(swept.removed_bytes, 4);
        assert!(!output.exists());
        // 上传目录不参与清理
        assert!(upload.path().exists());
    }
}

//! Upload Loader - 上传音频的落盘与解码
//!
//! 上传内容先写入临时文件再交给解码器，临时文件在解码后（包括失败时）删除。

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{AudioCodecPort, ScratchStoragePort};
use crate::domain::audio::Waveform;

/// 上传的音频文件
#[derive(Debug, Clone)]
pub struct UploadedAudio {
    /// 客户端提供的文件名
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedAudio {
    pub fn new(filename: Option<String>, data: Vec<u8>) -> Self {
        Self { filename, data }
    }

    /// 小写扩展名，作为解码器的格式提示
    pub fn extension(&self) -> String {
        self.filename
            .as_deref()
            .and_then(|f| std::path::Path::new(f).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("upload")
    }
}

/// 上传音频加载器
pub struct UploadLoader {
    codec: Arc<dyn AudioCodecPort>,
    storage: Arc<dyn ScratchStoragePort>,
}

impl UploadLoader {
    pub fn new(codec: Arc<dyn AudioCodecPort>, storage: Arc<dyn ScratchStoragePort>) -> Self {
        Self { codec, storage }
    }

    /// 写入临时文件并解码为波形
    pub async fn load(&self, upload: &UploadedAudio) -> Result<Waveform, ApplicationError> {
        if upload.data.is_empty() {
            return Err(ApplicationError::validation(format!(
                "Audio file '{}' is empty",
                upload.display_name()
            )));
        }

        let scratch = self
            .storage
            .save_upload(&upload.data, &upload.extension())
            .await?;

        let codec = self.codec.clone();
        let path = scratch.path().to_path_buf();
        let decoded = tokio::task::spawn_blocking(move || codec.decode_file(&path)).await?;
        drop(scratch);

        let wave = decoded.map_err(|e| {
            ApplicationError::validation(format!(
                "Failed to decode audio file '{}': {}",
                upload.display_name(),
                e
            ))
        })?;

        tracing::debug!(
            filename = %upload.display_name(),
            duration_secs = wave.duration_secs(),
            sample_rate = wave.sample_rate(),
            channels = wave.channels(),
            "Upload decoded"
        );

        Ok(wave)
    }
}

//! Multipart 表单读取
//!
//! 所有生成与嵌入接口都使用 multipart/form-data 提交

use axum::extract::Multipart;
use std::collections::HashMap;

use crate::application::UploadedAudio;
use crate::infrastructure::http::error::ApiError;

/// 作为文件读取的字段名，其余字段按文本读取
const FILE_FIELDS: &[&str] = &["audio_file", "audio_files"];

/// 已读取的表单
#[derive(Debug, Default)]
pub struct FormFields {
    texts: HashMap<String, String>,
    files: Vec<(String, UploadedAudio)>,
}

impl FormFields {
    /// 读取整个 multipart 表单
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if FILE_FIELDS.contains(&name.as_str()) {
                let filename = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await?.to_vec();
                form.files.push((name, UploadedAudio::new(filename, data)));
            } else {
                let value = field.text().await?;
                form.texts.insert(name, value);
            }
        }

        Ok(form)
    }

    /// 文本字段，空白视为未提供
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required_text(&self, name: &str) -> Result<String, ApiError> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest(format!("Field '{}' is required", name)))
    }

    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>, ApiError> {
        self.parse(name)
    }

    pub fn float(&self, name: &str) -> Result<Option<f32>, ApiError> {
        self.parse(name)
    }

    fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, ApiError> {
        match self.text(name) {
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                ApiError::BadRequest(format!("Invalid value for '{}': {}", name, raw))
            }),
            None => Ok(None),
        }
    }

    /// 取出第一个同名文件
    pub fn take_file(&mut self, name: &str) -> Option<UploadedAudio> {
        let index = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(index).1)
    }

    pub fn required_file(&mut self, name: &str) -> Result<UploadedAudio, ApiError> {
        self.take_file(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Field '{}' is required", name)))
    }

    /// 取出所有同名文件，保持提交顺序
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedAudio> {
        let (matched, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.files).into_iter().partition(|(n, _)| n == name);
        self.files = rest;
        matched.into_iter().map(|(_, file)| file).collect()
    }
}

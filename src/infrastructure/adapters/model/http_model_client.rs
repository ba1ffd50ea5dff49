//! HTTP Model Client - 调用外部模型 HTTP 服务
//!
//! 实现 MusicGeneratorPort 与 StyleEncoderPort，模型本身运行在独立进程中
//!
//! 外部模型 API:
//! GET  {base}/config          -> {"model", "chunk_length", "crossfade_length", "sample_rate", "channels"}
//! POST {base}/embed           {"inputs": [{"type": "text", "text"} | {"type": "audio", ...}]}
//!                             -> {"embeddings": [[f32]]}
//! POST {base}/generate_chunk  {"state": any|null, "style": [f32]}
//!                             -> {"state": any, "audio": {"sample_rate", "channels", "samples"}}
//! GET  {base}/health

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    GeneratedChunk, GenerationState, GeneratorInfo, ModelError, MusicGeneratorPort,
    StyleEncoderPort, StyleInput,
};
use crate::domain::audio::Waveform;
use crate::domain::style::StyleEmbedding;

/// 嵌入请求中的单个输入
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum EmbedInput<'a> {
    Text {
        text: &'a str,
    },
    Audio {
        sample_rate: u32,
        channels: u16,
        samples: &'a [f32],
    },
}

impl<'a> From<&'a StyleInput> for EmbedInput<'a> {
    fn from(input: &'a StyleInput) -> Self {
        match input {
            StyleInput::Text(text) => EmbedInput::Text { text },
            StyleInput::Audio(wave) => EmbedInput::Audio {
                sample_rate: wave.sample_rate(),
                channels: wave.channels(),
                samples: wave.samples(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: Vec<EmbedInput<'a>>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateChunkRequest<'a> {
    state: Option<&'a GenerationState>,
    style: &'a [f32],
}

#[derive(Debug, Deserialize)]
struct AudioPayload {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateChunkResponse {
    state: GenerationState,
    audio: AudioPayload,
}

/// HTTP 模型客户端配置
#[derive(Debug, Clone)]
pub struct HttpModelClientConfig {
    /// 模型服务基础 URL
    pub base_url: String,
    /// 单次请求超时时间
    pub timeout: Duration,
    /// 网络错误的重试次数
    pub max_retries: u32,
    /// 重试退避基数，第 n 次重试等待 n 倍
    pub retry_backoff: Duration,
}

impl Default for HttpModelClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(300),
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl HttpModelClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// HTTP 模型客户端
pub struct HttpModelClient {
    client: Client,
    config: HttpModelClientConfig,
    info: GeneratorInfo,
}

impl HttpModelClient {
    /// 连接模型服务并读取模型参数
    pub async fn connect(config: HttpModelClientConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::NetworkError(e.to_string()))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let config = HttpModelClientConfig { base_url, ..config };

        let info: GeneratorInfo = Self::fetch(&client, &format!("{}/config", config.base_url)).await?;
        info.validate()?;

        tracing::info!(
            url = %config.base_url,
            model = %info.model_name,
            chunk_length_secs = info.chunk_length_secs,
            crossfade_secs = info.crossfade_secs,
            sample_rate = info.sample_rate,
            "Connected to model service"
        );

        Ok(Self {
            client,
            config,
            info,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, ModelError> {
        let response = client.get(url).send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    /// POST JSON，网络错误按配置重试
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ModelError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut attempt = 0u32;

        loop {
            let result = match self.client.post(&url).json(body).send().await {
                Ok(response) => read_json(response).await,
                Err(e) => Err(map_reqwest_error(e)),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        url = %url,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        "Model request failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                other => return other,
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Timeout
    } else if e.is_connect() {
        ModelError::NetworkError(format!("Cannot connect to model service: {}", e))
    } else {
        ModelError::NetworkError(e.to_string())
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ModelError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ModelError::ServiceError(format!("HTTP {}: {}", status, error_text)));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ModelError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl StyleEncoderPort for HttpModelClient {
    async fn embed(&self, inputs: &[StyleInput]) -> Result<Vec<StyleEmbedding>, ModelError> {
        let request = EmbedRequest {
            inputs: inputs.iter().map(EmbedInput::from).collect(),
        };

        tracing::debug!(
            url = %self.url("embed"),
            inputs = ?inputs.iter().map(StyleInput::describe).collect::<Vec<_>>(),
            "Sending embed request"
        );

        let response: EmbedResponse = self.post_json("embed", &request).await?;

        if response.embeddings.len() != inputs.len() {
            return Err(ModelError::CountMismatch {
                expected: inputs.len(),
                actual: response.embeddings.len(),
            });
        }

        Ok(response
            .embeddings
            .into_iter()
            .map(StyleEmbedding::new)
            .collect())
    }

    async fn health_check(&self) -> bool {
        MusicGeneratorPort::health_check(self).await
    }
}

#[async_trait]
impl MusicGeneratorPort for HttpModelClient {
    fn info(&self) -> &GeneratorInfo {
        &self.info
    }

    async fn generate_chunk(
        &self,
        state: Option<GenerationState>,
        style: &StyleEmbedding,
    ) -> Result<GeneratedChunk, ModelError> {
        let request = GenerateChunkRequest {
            state: state.as_ref(),
            style: style.values(),
        };

        let response: GenerateChunkResponse = self.post_json("generate_chunk", &request).await?;
        let audio = Waveform::new(
            response.audio.samples,
            response.audio.sample_rate,
            response.audio.channels,
        )
        .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            frames = audio.num_frames(),
            sample_rate = audio.sample_rate(),
            "Chunk received"
        );

        Ok(GeneratedChunk {
            state: response.state,
            audio,
        })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(&self.url("health"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

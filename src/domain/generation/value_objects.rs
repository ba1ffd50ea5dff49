//! Generation Context - Value Objects

use serde::{Deserialize, Serialize};

use super::GenerationError;

/// 生成时长（秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationDuration(u32);

impl GenerationDuration {
    pub const MIN_SECS: u32 = 2;
    pub const MAX_SECS: u32 = 120;
    pub const DEFAULT_SECS: u32 = 10;

    pub fn new(secs: i64) -> Result<Self, GenerationError> {
        if secs < Self::MIN_SECS as i64 || secs > Self::MAX_SECS as i64 {
            return Err(GenerationError::DurationOutOfRange {
                value: secs,
                min: Self::MIN_SECS,
                max: Self::MAX_SECS,
            });
        }
        Ok(Self(secs as u32))
    }

    pub fn secs(&self) -> u32 {
        self.0
    }
}

impl Default for GenerationDuration {
    fn default() -> Self {
        Self(Self::DEFAULT_SECS)
    }
}

/// 分块计划
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPlan {
    pub num_chunks: usize,
    pub chunk_length_secs: f64,
    pub crossfade_secs: f64,
}

impl ChunkPlan {
    /// 可接受的最短块长度（秒），块数上限因此为 MAX_SECS / 0.1
    pub const MIN_CHUNK_LENGTH_SECS: f64 = 0.1;

    /// 块长度是否可用于分块
    pub fn is_valid_chunk_length(chunk_length_secs: f64) -> bool {
        chunk_length_secs.is_finite() && chunk_length_secs >= Self::MIN_CHUNK_LENGTH_SECS
    }

    /// 按模型的块长度计算块数
    ///
    /// 块数 = round(duration / chunk_length)，.5 时取偶数，至少为 1
    pub fn new(
        duration: GenerationDuration,
        chunk_length_secs: f64,
        crossfade_secs: f64,
    ) -> Result<Self, GenerationError> {
        if !Self::is_valid_chunk_length(chunk_length_secs) {
            return Err(GenerationError::InvalidChunkLength(chunk_length_secs));
        }

        let ratio = duration.secs() as f64 / chunk_length_secs;
        let num_chunks = (ratio.round_ties_even() as usize).max(1);

        let crossfade_secs = if crossfade_secs.is_finite() {
            crossfade_secs.max(0.0)
        } else {
            0.0
        };

        Ok(Self {
            num_chunks,
            chunk_length_secs,
            crossfade_secs,
        })
    }

    /// 预计输出时长（秒）
    pub fn expected_secs(&self) -> f64 {
        self.num_chunks as f64 * self.chunk_length_secs
    }
}

/// 输出音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 16-bit PCM WAV
    #[default]
    Wav,
    /// OGG 容器内的 Opus
    Opus,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Opus => "ogg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "audio/wav",
            OutputFormat::Opus => "audio/ogg",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Wav => write!(f, "wav"),
            OutputFormat::Opus => write!(f, "opus"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "opus" | "ogg" => Ok(OutputFormat::Opus),
            _ => Err(GenerationError::UnsupportedFormat(s.to_string())),
        }
    }
}

const LABEL_MAX_CHARS: usize = 30;

/// 生成下载文件名：`{prefix}_{label}.{ext}`
///
/// label 中空格替换为 `_`，截断为 30 个字符，且去除不能出现在
/// Content-Disposition 中的字符
pub fn track_filename(prefix: &str, label: &str, format: OutputFormat) -> String {
    let label: String = label
        .replace(' ', "_")
        .chars()
        .take(LABEL_MAX_CHARS)
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    format!("{}_{}.{}", prefix, label, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_bounds() {
        assert!(GenerationDuration::new(1).is_err());
        assert!(GenerationDuration::new(2).is_ok());
        assert!(GenerationDuration::new(120).is_ok());
        assert!(GenerationDuration::new(121).is_err());
        assert_eq!(GenerationDuration::default().secs(), 10);
    }

    #[test]
    fn test_chunk_plan_rounds_half_to_even() {
        // 5 / 2 = 2.5 -> 2
        let plan = ChunkPlan::new(GenerationDuration::new(5).unwrap(), 2.0, 0.04).unwrap();
        assert_eq!(plan.num_chunks, 2);
        // 7 / 2 = 3.5 -> 4
        let plan = ChunkPlan::new(GenerationDuration::new(7).unwrap(), 2.0, 0.04).unwrap();
        assert_eq!(plan.num_chunks, 4);
        // 10 / 2 = 5
        let plan = ChunkPlan::new(GenerationDuration::new(10).unwrap(), 2.0, 0.04).unwrap();
        assert_eq!(plan.num_chunks, 5);
        assert!((plan.expected_secs() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_chunk_plan_at_least_one_chunk() {
        let plan = ChunkPlan::new(GenerationDuration::new(2).unwrap(), 10.0, 0.0).unwrap();
        assert_eq!(plan.num_chunks, 1);
    }

    #[test]
    fn test_chunk_plan_rejects_bad_chunk_length() {
        assert!(ChunkPlan::new(GenerationDuration::default(), 0.0, 0.0).is_err());
        assert!(ChunkPlan::new(GenerationDuration::default(), f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_chunk_plan_rejects_tiny_chunk_length() {
        let result = ChunkPlan::new(GenerationDuration::new(10).unwrap(), 1e-9, 0.0);
        assert!(matches!(result, Err(GenerationError::InvalidChunkLength(_))));

        // 最短块长度下块数仍有上限
        let max = GenerationDuration::new(GenerationDuration::MAX_SECS as i64).unwrap();
        let plan = ChunkPlan::new(max, ChunkPlan::MIN_CHUNK_LENGTH_SECS, 0.0).unwrap();
        assert_eq!(plan.num_chunks, 1200);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("WAV".parse::<OutputFormat>().unwrap(), OutputFormat::Wav);
        assert_eq!("opus".parse::<OutputFormat>().unwrap(), OutputFormat::Opus);
        assert!("mp3".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_track_filename() {
        assert_eq!(
            track_filename("magenta_rt", "ambient synth", OutputFormat::Wav),
            "magenta_rt_ambient_synth.wav"
        );
        let long = "a very long prompt that keeps going and going";
        let name = track_filename("magenta_rt", long, OutputFormat::Opus);
        assert_eq!(name, "magenta_rt_a_very_long_prompt_that_keeps_.ogg");
        assert_eq!(
            track_filename("x", "say \"hi\"", OutputFormat::Wav),
            "x_say__hi_.wav"
        );
    }
}

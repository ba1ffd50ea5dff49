//! Audio Context - Waveform 值对象

use super::AudioError;

/// PCM 波形
///
/// 样本为交错存储的 f32，范围约为 [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl Waveform {
    /// 创建波形，校验采样率、声道数与样本数
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidFormat("sample rate must be positive".to_string()));
        }
        if channels == 0 {
            return Err(AudioError::InvalidFormat("channel count must be positive".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::InvalidFormat(format!(
                "{} samples cannot be split evenly into {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// 指定帧数的静音
    pub fn silence(num_frames: usize, sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        Self::new(
            vec![0.0; num_frames * channels as usize],
            sample_rate,
            channels,
        )
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// 帧数（每帧包含所有声道的一个样本）
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 时长（秒）
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// 峰值幅度
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// 秒数换算为帧数（四舍五入）
    pub fn frames_for(&self, secs: f64) -> usize {
        (secs * self.sample_rate as f64).round().max(0.0) as usize
    }
}

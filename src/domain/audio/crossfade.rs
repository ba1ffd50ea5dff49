//! Crossfade 拼接
//!
//! 相邻两段在边界处重叠 `crossfade` 帧，前一段按 cos 淡出，后一段按 sin 淡入
//! （等功率曲线），其余部分直接拼接。

use std::f32::consts::FRAC_PI_2;

use super::{AudioError, Waveform};

/// 以交叉淡化方式拼接多个波形
///
/// 所有片段必须具有相同的采样率和声道数。
/// 输出帧数 = Σ 各段帧数 − (n − 1) × 重叠帧数
pub fn concatenate(chunks: &[Waveform], crossfade_secs: f64) -> Result<Waveform, AudioError> {
    let first = chunks.first().ok_or(AudioError::Empty)?;
    let sample_rate = first.sample_rate();
    let channels = first.channels();

    for chunk in &chunks[1..] {
        if chunk.sample_rate() != sample_rate || chunk.channels() != channels {
            return Err(AudioError::Mismatch {
                expected: format!("{} Hz / {} ch", sample_rate, channels),
                actual: format!("{} Hz / {} ch", chunk.sample_rate(), chunk.channels()),
            });
        }
    }

    if chunks.len() == 1 {
        return Ok(first.clone());
    }

    let crossfade_frames = first.frames_for(crossfade_secs.max(0.0));
    let ch = channels as usize;

    let capacity: usize = chunks.iter().map(|c| c.samples().len()).sum();
    let mut out: Vec<f32> = Vec::with_capacity(capacity);
    out.extend_from_slice(first.samples());
    // 重叠只限制在相邻的前一段内，不能回溯到更早的段
    let mut prev_frames = first.num_frames();

    for chunk in &chunks[1..] {
        let out_frames = out.len() / ch;
        let overlap = crossfade_frames.min(prev_frames).min(chunk.num_frames());
        let tail_start = (out_frames - overlap) * ch;
        let incoming = chunk.samples();

        for frame in 0..overlap {
            let (fade_out, fade_in) = equal_power_gains(frame, overlap);
            for c in 0..ch {
                let idx = frame * ch + c;
                let prev = out[tail_start + idx];
                out[tail_start + idx] = prev * fade_out + incoming[idx] * fade_in;
            }
        }

        out.extend_from_slice(&incoming[overlap * ch..]);
        prev_frames = chunk.num_frames();
    }

    Waveform::new(out, sample_rate, channels)
}

/// 重叠区第 `frame` 帧的 (淡出, 淡入) 增益
fn equal_power_gains(frame: usize, overlap: usize) -> (f32, f32) {
    let t = (frame as f32 + 0.5) / overlap as f32;
    let angle = t * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f32, frames: usize, channels: u16) -> Waveform {
        Waveform::new(vec![value; frames * channels as usize], 1000, channels).unwrap()
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(concatenate(&[], 0.01), Err(AudioError::Empty)));
    }

    #[test]
    fn test_single_chunk_unchanged() {
        let chunk = constant(0.5, 100, 2);
        let out = concatenate(&[chunk.clone()], 0.01).unwrap();
        assert_eq!(out, chunk);
    }

    #[test]
    fn test_output_length_subtracts_overlaps() {
        // 1000 Hz, 10ms crossfade = 10 帧
        let chunks = vec![constant(0.1, 100, 2), constant(0.2, 100, 2), constant(0.3, 100, 2)];
        let out = concatenate(&chunks, 0.01).unwrap();
        assert_eq!(out.num_frames(), 300 - 2 * 10);
        assert_eq!(out.channels(), 2);
    }

    #[test]
    fn test_zero_crossfade_is_plain_append() {
        let chunks = vec![constant(0.1, 50, 1), constant(0.2, 50, 1)];
        let out = concatenate(&chunks, 0.0).unwrap();
        assert_eq!(out.num_frames(), 100);
        assert_eq!(out.samples()[49], 0.1);
        assert_eq!(out.samples()[50], 0.2);
    }

    #[test]
    fn test_overlap_blends_from_previous_to_next() {
        let chunks = vec![constant(1.0, 100, 1), constant(-1.0, 100, 1)];
        let out = concatenate(&chunks, 0.02).unwrap();
        let samples = out.samples();

        // 重叠区起点接近前一段，终点接近后一段
        let start = samples[80];
        let end = samples[99];
        assert!(start > 0.9);
        assert!(end < -0.9);
        // 重叠区之后完全是后一段
        assert_eq!(samples[100], -1.0);
        assert_eq!(samples.len(), 180);
    }

    #[test]
    fn test_equal_power_keeps_constant_signal_energy() {
        let (a, b) = equal_power_gains(3, 10);
        assert!(((a * a + b * b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_overlap_clamped_to_short_chunk() {
        let chunks = vec![constant(0.1, 100, 1), constant(0.2, 5, 1)];
        let out = concatenate(&chunks, 0.05).unwrap();
        assert_eq!(out.num_frames(), 100);
    }

    #[test]
    fn test_short_middle_chunk_does_not_reach_back() {
        // 10 帧 crossfade，中间段只有 5 帧
        let chunks = [constant(1.0, 100, 1), constant(0.0, 5, 1), constant(-1.0, 100, 1)];
        let out = concatenate(&chunks, 0.01).unwrap();

        assert_eq!(out.num_frames(), 100 + 5 + 100 - 5 - 5);
        // 第一段在其与中间段的重叠区之前保持原样
        assert!(out.samples()[..95].iter().all(|&v| v == 1.0));
        assert_eq!(out.samples()[194], -1.0);
    }

    #[test]
    fn test_mismatched_channels_is_error() {
        let chunks = vec![constant(0.1, 10, 1), constant(0.1, 10, 2)];
        assert!(matches!(
            concatenate(&chunks, 0.0),
            Err(AudioError::Mismatch { .. })
        ));
    }
}

//! Symphonia Codec - 基于 symphonia 的解码器 + WAV/Opus 编码器
//!
//! 支持：
//! - 上传音频解码（WAV / MP3 / FLAC / OGG Vorbis，由 symphonia 探测）
//! - 波形 → 16-bit PCM WAV
//! - 波形 → Opus (OGG 容器)

use std::fs::File;
use std::path::Path;

use ogg::writing::PacketWriter;
use opus::{Application, Channels, Encoder};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioCodecPort, CodecError};
use crate::domain::audio::Waveform;
use crate::domain::generation::OutputFormat;

/// Opus 最大包大小
const OPUS_MAX_PACKET: usize = 4000;

/// 音频编解码器
pub struct SymphoniaCodec {
    /// Opus 目标比特率（bps）
    opus_bitrate: u32,
}

impl Default for SymphoniaCodec {
    fn default() -> Self {
        Self {
            opus_bitrate: 96_000,
        }
    }
}

impl SymphoniaCodec {
    pub fn new(opus_bitrate: u32) -> Self {
        Self { opus_bitrate }
    }

    /// 将 PCM f32 样本编码为 WAV
    fn encode_wav(&self, wave: &Waveform) -> Result<Vec<u8>, CodecError> {
        let bits_per_sample: u16 = 16;
        let num_channels = wave.channels();
        let sample_rate = wave.sample_rate();
        let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
        let block_align = num_channels * (bits_per_sample / 8);

        let data_size = wave.samples().len() * 2;
        if data_size > (u32::MAX - 36) as usize {
            return Err(CodecError::EncodingError(
                "Audio too long for a WAV container".to_string(),
            ));
        }
        let file_size = 36 + data_size;

        let mut wav = Vec::with_capacity(44 + data_size);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(file_size as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());

        for &s in wave.samples() {
            wav.extend_from_slice(&to_i16(s).to_le_bytes());
        }

        Ok(wav)
    }

    /// 将 PCM f32 样本编码为 Opus (OGG 容器)
    fn encode_opus(&self, wave: &Waveform) -> Result<Vec<u8>, CodecError> {
        let (channels, channel_count) = match wave.channels() {
            1 => (Channels::Mono, 1usize),
            2 => (Channels::Stereo, 2usize),
            n => {
                return Err(CodecError::Unsupported(format!(
                    "Opus output supports mono or stereo, got {} channels",
                    n
                )))
            }
        };

        let sample_rate = opus_compatible_sample_rate(wave.sample_rate());
        let samples = resample(wave.samples(), wave.sample_rate(), sample_rate, channel_count);

        let mut encoder = Encoder::new(sample_rate, channels, Application::Audio).map_err(|e| {
            CodecError::EncodingError(format!("Failed to create Opus encoder: {}", e))
        })?;
        encoder
            .set_bitrate(opus::Bitrate::Bits(self.opus_bitrate as i32))
            .map_err(|e| CodecError::EncodingError(format!("Failed to set bitrate: {}", e)))?;

        // 编码器延迟 (lookahead) 作为 pre-skip
        let pre_skip = encoder.get_lookahead().map(|l| l as u16).unwrap_or(312);

        let pcm_i16: Vec<i16> = samples.iter().map(|&s| to_i16(s)).collect();

        // 20ms 帧
        let frame_size = (sample_rate as usize * 20) / 1000;
        let samples_per_frame = frame_size * channel_count;

        // 末尾补足刷新编码器缓冲区所需的静音帧
        let flush_frames = (pre_skip as usize).div_ceil(frame_size).max(1);
        let mut frames: Vec<Vec<i16>> = pcm_i16
            .chunks(samples_per_frame)
            .map(|chunk| {
                let mut frame = chunk.to_vec();
                frame.resize(samples_per_frame, 0);
                frame
            })
            .collect();
        frames.extend((0..flush_frames).map(|_| vec![0i16; samples_per_frame]));

        // RFC 7845: granule position 以 48kHz 计
        let granule_scale = 48000.0 / sample_rate as f64;
        let frame_granule = (frame_size as f64 * granule_scale) as u64;
        let mut granule_pos = (pre_skip as f64 * granule_scale) as u64;

        let mut ogg_data = Vec::new();
        {
            let mut writer = PacketWriter::new(&mut ogg_data);
            let serial = 0;

            writer
                .write_packet(
                    opus_head(channel_count as u8, wave.sample_rate(), pre_skip),
                    serial,
                    ogg::PacketWriteEndInfo::EndPage,
                    0,
                )
                .map_err(|e| CodecError::EncodingError(format!("Failed to write Opus head: {}", e)))?;
            writer
                .write_packet(opus_tags(), serial, ogg::PacketWriteEndInfo::EndPage, 0)
                .map_err(|e| CodecError::EncodingError(format!("Failed to write Opus tags: {}", e)))?;

            let mut output_buf = vec![0u8; OPUS_MAX_PACKET];
            let last = frames.len() - 1;

            for (i, frame) in frames.iter().enumerate() {
                let encoded_len = encoder
                    .encode(frame, &mut output_buf)
                    .map_err(|e| CodecError::EncodingError(format!("Opus encode failed: {}", e)))?;

                granule_pos += frame_granule;
                let end_info = if i == last {
                    ogg::PacketWriteEndInfo::EndStream
                } else {
                    ogg::PacketWriteEndInfo::NormalPacket
                };

                writer
                    .write_packet(output_buf[..encoded_len].to_vec(), serial, end_info, granule_pos)
                    .map_err(|e| {
                        CodecError::EncodingError(format!("Failed to write Opus packet: {}", e))
                    })?;
            }
        }

        Ok(ogg_data)
    }
}

impl AudioCodecPort for SymphoniaCodec {
    fn decode_file(&self, path: &Path) -> Result<Waveform, CodecError> {
        let file = File::open(path).map_err(|e| CodecError::IoError(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| CodecError::DecodingError(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| CodecError::DecodingError("No audio track found".to_string()))?;
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| CodecError::Unsupported(format!("Decoder creation failed: {}", e)))?;

        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(CodecError::DecodingError(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(CodecError::DecodingError(e.to_string()));
                }
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count() as u16);

            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        let sample_rate = sample_rate
            .ok_or_else(|| CodecError::DecodingError("Unknown sample rate".to_string()))?;
        let channels =
            channels.ok_or_else(|| CodecError::DecodingError("Unknown channel count".to_string()))?;

        if samples.is_empty() {
            return Err(CodecError::DecodingError("No audio samples decoded".to_string()));
        }

        Waveform::new(samples, sample_rate, channels)
            .map_err(|e| CodecError::DecodingError(e.to_string()))
    }

    fn encode(&self, wave: &Waveform, format: OutputFormat) -> Result<Vec<u8>, CodecError> {
        let encoded = match format {
            OutputFormat::Wav => self.encode_wav(wave)?,
            OutputFormat::Opus => self.encode_opus(wave)?,
        };

        tracing::debug!(
            format = %format,
            frames = wave.num_frames(),
            size = encoded.len(),
            "Encoded audio"
        );

        Ok(encoded)
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Opus 支持: 8000, 12000, 16000, 24000, 48000
fn opus_compatible_sample_rate(sample_rate: u32) -> u32 {
    match sample_rate {
        8000 | 12000 | 16000 | 24000 | 48000 => sample_rate,
        r if r <= 8000 => 8000,
        r if r <= 12000 => 12000,
        r if r <= 16000 => 16000,
        r if r <= 24000 => 24000,
        _ => 48000,
    }
}

/// 简单线性重采样
fn resample(samples: &[f32], from_rate: u32, to_rate: u32, channels: usize) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let frame_count = samples.len() / channels;
    let new_frame_count = (frame_count as f64 * ratio) as usize;
    let mut resampled = Vec::with_capacity(new_frame_count * channels);

    for i in 0..new_frame_count {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        for ch in 0..channels {
            let idx0 = src_idx * channels + ch;
            let idx1 = (src_idx + 1).min(frame_count - 1) * channels + ch;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);

            resampled.push(s0 + (s1 - s0) * frac);
        }
    }

    resampled
}

/// Opus Head 包 (RFC 7845)
fn opus_head(channels: u8, input_sample_rate: u32, pre_skip: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(channels);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&input_sample_rate.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // output gain
    head.push(0); // channel mapping family
    head
}

/// Opus Tags 包
fn opus_tags() -> Vec<u8> {
    let vendor = env!("CARGO_PKG_NAME");
    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor.as_bytes());
    tags.extend_from_slice(&0u32.to_le_bytes()); // no user comments
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tone(sample_rate: u32, channels: u16, secs: f32) -> Waveform {
        let frames = (sample_rate as f32 * secs) as usize;
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for i in 0..frames {
            let v = (i as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32).sin() * 0.5;
            for _ in 0..channels {
                samples.push(v);
            }
        }
        Waveform::new(samples, sample_rate, channels).unwrap()
    }

    #[test]
    fn test_encode_wav_header() {
        let codec = SymphoniaCodec::default();
        let wav = codec.encode(&tone(22050, 1, 0.1), OutputFormat::Wav).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 2205 * 2);
    }

    #[test]
    fn test_decode_wav_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let codec = SymphoniaCodec::default();
        let original = tone(16000, 2, 0.25);
        std::fs::write(&path, codec.encode(&original, OutputFormat::Wav).unwrap()).unwrap();

        let decoded = codec.decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate(), 16000);
        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.num_frames(), original.num_frames());
        assert!((decoded.peak() - original.peak()).abs() < 1e-3);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(SymphoniaCodec::default().decode_file(&path).is_err());
    }

    #[test]
    fn test_encode_opus_produces_ogg_stream() {
        let codec = SymphoniaCodec::default();
        let ogg = codec.encode(&tone(48000, 2, 0.5), OutputFormat::Opus).unwrap();
        assert_eq!(&ogg[0..4], b"OggS");
        assert!(ogg.windows(8).any(|w| w == b"OpusHead"));
    }

    #[test]
    fn test_encode_opus_rejects_multichannel() {
        let codec = SymphoniaCodec::default();
        let wave = Waveform::silence(480, 48000, 6).unwrap();
        assert!(matches!(
            codec.encode(&wave, OutputFormat::Opus),
            Err(CodecError::Unsupported(_))
        ));
    }

    #[test]
    fn test_opus_sample_rate_mapping() {
        assert_eq!(opus_compatible_sample_rate(44100), 48000);
        assert_eq!(opus_compatible_sample_rate(22050), 24000);
        assert_eq!(opus_compatible_sample_rate(16000), 16000);
    }

    #[test]
    fn test_resample_length() {
        let samples = vec![0.0f32; 24000 * 2];
        let out = resample(&samples, 24000, 48000, 2);
        assert_eq!(out.len(), 48000 * 2);
    }
}

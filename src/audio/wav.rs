//! WAV decoding for file mode and WAV encoding for backend upload.

use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::{CallguardError, Result};
use std::io::{Cursor, Read};
use std::path::Path;

/// Audio source that replays a WAV file.
///
/// Accepts arbitrary rates and channel counts, downmixing to mono and
/// resampling to the pipeline rate up front. Reads hand back fixed-size
/// batches so file playback exercises the same framing path as live capture.
pub struct WavAudioSource {
    samples: Vec<f32>,
    position: usize,
    batch_size: usize,
}

impl WavAudioSource {
    /// Creates a source from a WAV file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| CallguardError::AudioCapture {
            message: format!("failed to open {}: {}", path.display(), e),
        })?;
        Self::from_reader(Box::new(file))
    }

    /// Creates a source from any reader holding WAV data.
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| CallguardError::AudioCapture {
                message: format!("failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels as usize;

        let raw: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => wav_reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<std::result::Result<Vec<_>, _>>(),
            hound::SampleFormat::Float => wav_reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>(),
        }
        .map_err(|e| CallguardError::AudioCapture {
            message: format!("failed to read WAV samples: {}", e),
        })?;

        let mono = downmix_to_mono(&raw, source_channels);

        let samples = if source_rate != defaults::SAMPLE_RATE {
            resample(&mono, source_rate, defaults::SAMPLE_RATE)
        } else {
            mono
        };

        Ok(Self {
            samples,
            position: 0,
            batch_size: defaults::FRAME_SAMPLES,
        })
    }

    /// Creates a source from stdin. All data is buffered first because
    /// `StdinLock` is not `Send`.
    pub fn from_stdin() -> Result<Self> {
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .map_err(|e| CallguardError::AudioCapture {
                message: format!("failed to read from stdin: {}", e),
            })?;
        Self::from_reader(Box::new(Cursor::new(buffer)))
    }

    /// Total decoded duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1_000 / defaults::SAMPLE_RATE as u64
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }
        let end = std::cmp::min(self.position + self.batch_size, self.samples.len());
        let batch = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(batch)
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Average interleaved channels down to mono.
fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as f32
            }
        })
        .collect()
}

/// Encode normalized samples as an in-memory 16-bit PCM mono WAV.
///
/// Samples are clamped to [-1, 1] and scaled to i16, matching what
/// transcription backends expect for uploaded audio.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|e| {
            CallguardError::AudioEncoding {
                message: format!("failed to create WAV writer: {}", e),
            }
        })?;
        for &sample in samples {
            let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| CallguardError::AudioEncoding {
                    message: format!("failed to write WAV sample: {}", e),
                })?;
        }
        writer
            .finalize()
            .map_err(|e| CallguardError::AudioEncoding {
                message: format!("failed to finalize WAV data: {}", e),
            })?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn from_reader_16khz_mono_normalizes_values() {
        let wav_data = make_wav_data(16_000, 1, &[i16::MAX, 0, i16::MIN + 1]);
        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.samples.len(), 3);
        assert!((source.samples[0] - 1.0).abs() < 1e-4);
        assert_eq!(source.samples[1], 0.0);
        assert!((source.samples[2] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn from_reader_stereo_downmixes_to_mono() {
        // Pairs: (8192, 16384), (-8192, 8192)
        let wav_data = make_wav_data(16_000, 2, &[8192, 16384, -8192, 8192]);
        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.samples.len(), 2);
        let expected0 = (8192.0 + 16384.0) / 2.0 / i16::MAX as f32;
        assert!((source.samples[0] - expected0).abs() < 1e-4);
        assert!(source.samples[1].abs() < 1e-4);
    }

    #[test]
    fn from_reader_48khz_resamples_to_16khz() {
        let wav_data = make_wav_data(48_000, 1, &vec![1000i16; 48_000]);
        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert!(source.samples.len() >= 15_900 && source.samples.len() <= 16_100);
        assert_eq!(source.duration_ms(), source.samples.len() as u64 / 16);
    }

    #[test]
    fn read_samples_returns_frame_sized_batches_then_remainder() {
        let wav_data = make_wav_data(16_000, 1, &vec![1i16; 4_000]);
        let mut source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.read_samples().unwrap().len(), 1_600);
        assert_eq!(source.read_samples().unwrap().len(), 1_600);
        assert_eq!(source.read_samples().unwrap().len(), 800);
        assert!(source.read_samples().unwrap().is_empty());
    }

    #[test]
    fn wav_source_is_finite() {
        let wav_data = make_wav_data(16_000, 1, &[0i16; 10]);
        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();
        assert!(source.is_finite());
    }

    #[test]
    fn invalid_wav_data_returns_error() {
        let result = WavAudioSource::from_reader(Box::new(Cursor::new(vec![0u8, 1, 2, 3])));
        match result {
            Err(CallguardError::AudioCapture { message }) => {
                assert!(message.contains("failed to parse WAV"));
            }
            _ => panic!("expected AudioCapture error"),
        }
    }

    #[test]
    fn missing_file_returns_error() {
        let result = WavAudioSource::from_path(Path::new("/nonexistent/call.wav"));
        assert!(result.is_err());
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![0.1f32, 0.2, 0.3];
        assert_eq!(resample(&samples, 16_000, 16_000), samples);
    }

    #[test]
    fn resample_upsample_interpolates() {
        let resampled = resample(&[0.0, 1.0, 2.0], 8_000, 16_000);
        assert_eq!(resampled.len(), 6);
        assert_eq!(resampled[0], 0.0);
        assert!(resampled[1] > 0.0 && resampled[1] < 1.0);
        assert_eq!(resampled[2], 1.0);
    }

    #[test]
    fn resample_downsample_halves_length() {
        let resampled = resample(&vec![0.5f32; 3_200], 16_000, 8_000);
        assert_eq!(resampled.len(), 1_600);
    }

    #[test]
    fn resample_handles_empty_and_single_sample() {
        assert!(resample(&[], 16_000, 8_000).is_empty());
        let single = resample(&[0.25f32], 16_000, 8_000);
        assert_eq!(single, vec![0.25]);
    }

    #[test]
    fn encode_wav_produces_parseable_pcm16() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let bytes = encode_wav(&samples, 16_000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded[0], 0);
        assert_eq!(decoded[1], (0.5 * i16::MAX as f32) as i16);
        assert_eq!(decoded[3], i16::MAX);
        assert_eq!(decoded[4], -i16::MAX);
    }

    #[test]
    fn encode_wav_clamps_out_of_range_samples() {
        let bytes = encode_wav(&[2.0f32, -2.0], 16_000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![i16::MAX, -i16::MAX]);
    }

    #[test]
    fn encode_wav_empty_input_still_produces_header() {
        let bytes = encode_wav(&[], 16_000).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }
}

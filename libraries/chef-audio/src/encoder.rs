/// WAV encoding via hound
///
/// The encode side of the capability table: 16-bit PCM WAV from the f32
/// intermediate. Other extensions are rejected by the pipeline's format
/// checks before this is reached, and rejected here again at use.
use std::path::Path;

use tracing::info;

use chef_core::AudioBuffer;

use crate::error::{AudioError, Result};
use crate::formats;

/// Write `buffer` to `destination`, picking the encoder by extension
pub fn encode(buffer: &AudioBuffer, destination: &Path) -> Result<()> {
    let ext = destination
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if !formats::can_encode(&ext) {
        return Err(AudioError::UnsupportedFormat(ext));
    }

    info!(path = %destination.display(), frames = buffer.frames(), "writing output file");
    write_wav(buffer, destination)
}

fn write_wav(buffer: &AudioBuffer, destination: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.format.channels,
        sample_rate: buffer.format.sample_rate.as_hz(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(destination, spec)
        .map_err(|e| AudioError::EncodeError(e.to_string()))?;

    for &sample in &buffer.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * f32::from(i16::MAX)) as i16)
            .map_err(|e| AudioError::EncodeError(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| AudioError::EncodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chef_core::AudioFormat;
    use tempfile::TempDir;

    #[test]
    fn round_trips_through_hound() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");
        let buffer = AudioBuffer::new(vec![0.0, 0.5, -0.5, 1.0], AudioFormat::stereo(44_100));

        encode(&buffer, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44_100);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[3], i16::MAX);
        assert!((f32::from(samples[1]) / f32::from(i16::MAX) - 0.5).abs() < 0.001);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.mp3");
        let buffer = AudioBuffer::new(vec![0.0; 4], AudioFormat::stereo(44_100));

        let err = encode(&buffer, &path).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat(ext) if ext == "mp3"));
        assert!(!path.exists());
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hot.wav");
        let buffer = AudioBuffer::new(vec![2.0, -2.0], AudioFormat::stereo(48_000));

        encode(&buffer, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![i16::MAX, -i16::MAX]);
    }
}

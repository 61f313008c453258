/// Audio decoding via Symphonia
///
/// Full-file decode to the normalized intermediate: interleaved stereo f32 at
/// the source's native sample rate. Multi-channel audio is folded into the
/// stereo pair, mono is duplicated.
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use chef_core::{AudioBuffer, AudioFormat};

use crate::error::{AudioError, Result};

// Equal-power fold-in for channels past the front pair (-3dB)
const FOLD_MIX: f32 = 0.707;

/// Decode a whole file into the normalized PCM intermediate
pub fn decode(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(AudioError::FileNotFound(path.display().to_string()));
    }

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Symphonia(format!("Failed to probe file: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::DecodeError("No audio tracks found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Symphonia(format!("Failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Symphonia(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count();

                if sample_buf.is_none() {
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    fold_to_stereo(buf.samples(), channels, &mut samples);
                }
            }
            // A malformed packet is skippable; the rest of the file may be fine
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(path = %path.display(), error = %e, "skipping undecodable packet");
            }
            Err(e) => return Err(AudioError::Symphonia(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeError(format!(
            "No audio decoded from {}",
            path.display()
        )));
    }

    debug!(
        path = %path.display(),
        frames = samples.len() / 2,
        sample_rate,
        "decoded file"
    );

    Ok(AudioBuffer::new(samples, AudioFormat::stereo(sample_rate)))
}

/// Append interleaved `channels`-wide frames as interleaved stereo
fn fold_to_stereo(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => {
            out.reserve(interleaved.len() * 2);
            for &sample in interleaved {
                out.push(sample);
                out.push(sample);
            }
        }
        2 => out.extend_from_slice(interleaved),
        n => {
            for frame in interleaved.chunks_exact(n) {
                let mut left = frame[0];
                let mut right = frame[1];
                for &extra in &frame[2..] {
                    left += extra * FOLD_MIX;
                    right += extra * FOLD_MIX;
                }
                out.push(left.clamp(-1.0, 1.0));
                out.push(right.clamp(-1.0, 1.0));
            }
        }
    }
}

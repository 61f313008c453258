/// Highpass / lowpass filters
///
/// Second-order Butterworth sections from the `biquad` crate, one per
/// channel. Coefficients are built lazily for the sample rate the chain
/// actually runs at.
use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type, Q_BUTTERWORTH_F32};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::chain::AudioEffect;

/// Highpass filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighpassSettings {
    /// Cutoff frequency in Hz
    pub cutoff_frequency_hz: f32,
}

impl Default for HighpassSettings {
    fn default() -> Self {
        Self {
            cutoff_frequency_hz: 50.0,
        }
    }
}

/// Lowpass filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowpassSettings {
    /// Cutoff frequency in Hz
    pub cutoff_frequency_hz: f32,
}

impl Default for LowpassSettings {
    fn default() -> Self {
        Self {
            cutoff_frequency_hz: 50.0,
        }
    }
}

struct StereoBiquad {
    filter_type: Type<f32>,
    cutoff_hz: f32,
    sample_rate: Option<u32>,
    sections: Option<(DirectForm1<f32>, DirectForm1<f32>)>,
}

impl StereoBiquad {
    fn new(filter_type: Type<f32>, cutoff_hz: f32) -> Self {
        Self {
            filter_type,
            cutoff_hz,
            sample_rate: None,
            sections: None,
        }
    }

    fn ensure_rate(&mut self, sample_rate: u32) {
        if self.sample_rate == Some(sample_rate) {
            return;
        }
        self.sample_rate = Some(sample_rate);

        // Keep the cutoff below Nyquist so coefficient creation cannot fail
        let cutoff = self
            .cutoff_hz
            .clamp(1.0, sample_rate as f32 * 0.49);

        match Coefficients::<f32>::from_params(
            self.filter_type,
            (sample_rate as f32).hz(),
            cutoff.hz(),
            Q_BUTTERWORTH_F32,
        ) {
            Ok(coefficients) => {
                self.sections = Some((
                    DirectForm1::<f32>::new(coefficients),
                    DirectForm1::<f32>::new(coefficients),
                ));
            }
            Err(e) => {
                warn!(?e, cutoff, sample_rate, "filter coefficients rejected, passing through");
                self.sections = None;
            }
        }
    }

    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.ensure_rate(sample_rate);
        let Some((left, right)) = self.sections.as_mut() else {
            return;
        };
        for frame in buffer.chunks_exact_mut(2) {
            frame[0] = left.run(frame[0]);
            frame[1] = right.run(frame[1]);
        }
    }

    fn reset(&mut self) {
        // Drop filter memories; coefficients rebuild on the next process call
        self.sample_rate = None;
        self.sections = None;
    }
}

/// Butterworth highpass
pub struct HighpassFilter {
    inner: StereoBiquad,
}

impl HighpassFilter {
    pub fn new(settings: HighpassSettings) -> Self {
        Self {
            inner: StereoBiquad::new(Type::HighPass, settings.cutoff_frequency_hz),
        }
    }
}

impl AudioEffect for HighpassFilter {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.inner.process(buffer, sample_rate);
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn name(&self) -> &str {
        "HighpassFilter"
    }
}

/// Butterworth lowpass
pub struct LowpassFilter {
    inner: StereoBiquad,
}

impl LowpassFilter {
    pub fn new(settings: LowpassSettings) -> Self {
        Self {
            inner: StereoBiquad::new(Type::LowPass, settings.cutoff_frequency_hz),
        }
    }
}

impl AudioEffect for LowpassFilter {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.inner.process(buffer, sample_rate);
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn name(&self) -> &str {
        "LowpassFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, frames: usize) -> Vec<f32> {
        (0..frames)
            .flat_map(|i| {
                let t = i as f32 / sample_rate as f32;
                let s = (2.0 * std::f32::consts::PI * freq * t).sin();
                [s, s]
            })
            .collect()
    }

    fn rms(buffer: &[f32]) -> f32 {
        (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32).sqrt()
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let mut filter = LowpassFilter::new(LowpassSettings {
            cutoff_frequency_hz: 500.0,
        });
        let mut buffer = sine(8_000.0, 44_100, 44_100);
        let before = rms(&buffer);
        filter.process(&mut buffer, 44_100);
        assert!(rms(&buffer) < before * 0.2);
    }

    #[test]
    fn lowpass_passes_low_frequencies() {
        let mut filter = LowpassFilter::new(LowpassSettings {
            cutoff_frequency_hz: 2_000.0,
        });
        let mut buffer = sine(100.0, 44_100, 44_100);
        let before = rms(&buffer);
        filter.process(&mut buffer, 44_100);
        assert!(rms(&buffer) > before * 0.9);
    }

    #[test]
    fn highpass_attenuates_low_frequencies() {
        let mut filter = HighpassFilter::new(HighpassSettings {
            cutoff_frequency_hz: 2_000.0,
        });
        let mut buffer = sine(100.0, 44_100, 44_100);
        let before = rms(&buffer);
        filter.process(&mut buffer, 44_100);
        assert!(rms(&buffer) < before * 0.2);
    }

    #[test]
    fn absurd_cutoff_is_clamped_not_fatal() {
        let mut filter = LowpassFilter::new(LowpassSettings {
            cutoff_frequency_hz: 1_000_000.0,
        });
        let mut buffer = sine(440.0, 44_100, 1_024);
        filter.process(&mut buffer, 44_100);
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}

/// Dynamic range compressor
///
/// Feed-forward design with a stereo-linked peak envelope: attack/release
/// smoothing on the detected level, static gain curve above the threshold.
use serde::{Deserialize, Serialize};

use super::chain::AudioEffect;
use super::gain::{db_to_linear, linear_to_db};

/// Compressor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorSettings {
    /// Threshold in dB; signal above it is compressed
    pub threshold_db: f32,
    /// Compression ratio (1.0 = none, 4.0 = 4:1)
    pub ratio: f32,
    /// Attack time in milliseconds
    pub attack_ms: f32,
    /// Release time in milliseconds
    pub release_ms: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: 0.0,
            ratio: 1.0,
            attack_ms: 1.0,
            release_ms: 100.0,
        }
    }
}

/// Dynamic range compressor
pub struct Compressor {
    settings: CompressorSettings,
    envelope: f32,
}

impl Compressor {
    pub fn new(mut settings: CompressorSettings) -> Self {
        settings.ratio = settings.ratio.max(1.0);
        Self {
            settings,
            envelope: 0.0,
        }
    }

    /// Gain reduction in dB for a detected level in dB
    fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let over = level_db - self.settings.threshold_db;
        if over <= 0.0 {
            0.0
        } else {
            over * (1.0 - 1.0 / self.settings.ratio)
        }
    }
}

impl AudioEffect for Compressor {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        let attack = smoothing_coeff(self.settings.attack_ms, sample_rate);
        let release = smoothing_coeff(self.settings.release_ms, sample_rate);

        for frame in buffer.chunks_exact_mut(2) {
            let peak = frame[0].abs().max(frame[1].abs());

            let coeff = if peak > self.envelope { attack } else { release };
            self.envelope = coeff * self.envelope + (1.0 - coeff) * peak;

            let reduction_db = self.gain_reduction_db(linear_to_db(self.envelope));
            let gain = db_to_linear(-reduction_db);
            frame[0] *= gain;
            frame[1] *= gain;
        }
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn name(&self) -> &str {
        "Compressor"
    }
}

/// One-pole smoothing coefficient for a time constant in milliseconds
pub(crate) fn smoothing_coeff(time_ms: f32, sample_rate: u32) -> f32 {
    let samples = (time_ms.max(0.01) / 1000.0) * sample_rate as f32;
    (-1.0 / samples).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
    }

    fn loud_sine(frames: usize) -> Vec<f32> {
        (0..frames)
            .flat_map(|i| {
                let s = 0.9 * (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 44_100.0).sin();
                [s, s]
            })
            .collect()
    }

    #[test]
    fn unity_ratio_passes_signal() {
        let mut comp = Compressor::new(CompressorSettings::default());
        let original = loud_sine(4_410);
        let mut buffer = original.clone();
        comp.process(&mut buffer, 44_100);
        for (a, b) in buffer.iter().zip(&original) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn hot_signal_is_attenuated() {
        let mut comp = Compressor::new(CompressorSettings {
            threshold_db: -20.0,
            ratio: 8.0,
            attack_ms: 0.1,
            release_ms: 50.0,
        });
        let mut buffer = loud_sine(44_100);
        let before = peak(&buffer);
        comp.process(&mut buffer, 44_100);
        assert!(peak(&buffer) < before * 0.5);
    }

    #[test]
    fn quiet_signal_is_untouched() {
        let mut comp = Compressor::new(CompressorSettings {
            threshold_db: -6.0,
            ratio: 8.0,
            attack_ms: 1.0,
            release_ms: 50.0,
        });
        let mut buffer = vec![0.05; 2_000];
        comp.process(&mut buffer, 44_100);
        for sample in &buffer {
            assert!((sample - 0.05).abs() < 0.005);
        }
    }
}

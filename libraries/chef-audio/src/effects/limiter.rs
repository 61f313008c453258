/// Brick-wall limiter
///
/// Instant attack, smoothed release: the gain drops immediately when the
/// stereo peak exceeds the threshold and recovers with the release constant.
use serde::{Deserialize, Serialize};

use super::chain::AudioEffect;
use super::compressor::smoothing_coeff;
use super::gain::db_to_linear;

/// Limiter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterSettings {
    /// Ceiling in dB
    pub threshold_db: f32,
    /// Release time in milliseconds
    pub release_ms: f32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            threshold_db: -10.0,
            release_ms: 100.0,
        }
    }
}

/// Brick-wall limiter
pub struct Limiter {
    settings: LimiterSettings,
    gain: f32,
}

impl Limiter {
    pub fn new(settings: LimiterSettings) -> Self {
        Self {
            settings,
            gain: 1.0,
        }
    }
}

impl AudioEffect for Limiter {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        let ceiling = db_to_linear(self.settings.threshold_db);
        let release = smoothing_coeff(self.settings.release_ms, sample_rate);

        for frame in buffer.chunks_exact_mut(2) {
            let peak = frame[0].abs().max(frame[1].abs());
            let target = if peak * self.gain > ceiling {
                ceiling / peak.max(1e-10)
            } else {
                1.0
            };

            self.gain = if target < self.gain {
                // Instant attack
                target
            } else {
                release * self.gain + (1.0 - release) * target
            };

            frame[0] *= self.gain;
            frame[1] *= self.gain;
        }
    }

    fn reset(&mut self) {
        self.gain = 1.0;
    }

    fn name(&self) -> &str {
        "Limiter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaks_never_exceed_ceiling() {
        let mut limiter = Limiter::new(LimiterSettings {
            threshold_db: -6.0,
            release_ms: 50.0,
        });
        let mut buffer: Vec<f32> = (0..8_820)
            .flat_map(|i| {
                let s = (i as f32 * 0.05).sin();
                [s, s]
            })
            .collect();

        limiter.process(&mut buffer, 44_100);

        let ceiling = db_to_linear(-6.0);
        for sample in &buffer {
            assert!(sample.abs() <= ceiling + 1e-4);
        }
    }

    #[test]
    fn quiet_signal_passes() {
        let mut limiter = Limiter::new(LimiterSettings::default());
        let mut buffer = vec![0.1; 1_000];
        limiter.process(&mut buffer, 44_100);
        for sample in &buffer {
            assert!((sample - 0.1).abs() < 1e-5);
        }
    }
}

/// Plain gain
use serde::{Deserialize, Serialize};

use super::chain::AudioEffect;

/// Gain settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainSettings {
    /// Gain in dB
    pub gain_db: f32,
}

impl Default for GainSettings {
    fn default() -> Self {
        Self { gain_db: 1.0 }
    }
}

/// Fixed gain applied to every sample
pub struct Gain {
    linear: f32,
}

impl Gain {
    pub fn new(settings: GainSettings) -> Self {
        Self {
            linear: db_to_linear(settings.gain_db),
        }
    }
}

impl AudioEffect for Gain {
    fn process(&mut self, buffer: &mut [f32], _sample_rate: u32) {
        for sample in buffer.iter_mut() {
            *sample *= self.linear;
        }
    }

    fn reset(&mut self) {
        // Stateless
    }

    fn name(&self) -> &str {
        "Gain"
    }
}

pub(crate) fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub(crate) fn linear_to_db(linear: f32) -> f32 {
    20.0 * linear.max(1e-10).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minus_six_db_halves() {
        let mut gain = Gain::new(GainSettings { gain_db: -6.02 });
        let mut buffer = vec![1.0, -1.0];
        gain.process(&mut buffer, 44_100);
        assert!((buffer[0] - 0.5).abs() < 0.01);
        assert!((buffer[1] + 0.5).abs() < 0.01);
    }

    #[test]
    fn db_linear_round_trip() {
        for db in [-24.0, -6.0, 0.0, 6.0, 12.0] {
            assert!((linear_to_db(db_to_linear(db)) - db).abs() < 0.001);
        }
    }
}

/// Reverb
///
/// Schroeder topology (parallel damped combs into serial allpasses), the
/// classic Freeverb tuning scaled to the running sample rate.
use serde::{Deserialize, Serialize};

use super::chain::AudioEffect;

// Freeverb tunings at 44.1 kHz, per channel; the right channel is offset by
// STEREO_SPREAD samples
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const FIXED_GAIN: f32 = 0.015;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Reverb settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbSettings {
    /// Room size, 0.0 to 1.0
    pub room_size: f32,
    /// High-frequency damping, 0.0 to 1.0
    pub damping: f32,
    /// Wet signal level, 0.0 to 1.0
    pub wet_level: f32,
    /// Dry signal level, 0.0 to 1.0
    pub dry_level: f32,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.33,
            dry_level: 0.4,
        }
    }
}

struct Comb {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp: f32,
    filter_store: f32,
}

impl Comb {
    fn new(len: usize, feedback: f32, damp: f32) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
            feedback,
            damp,
            filter_store: 0.0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filter_store = output * (1.0 - self.damp) + self.filter_store * self.damp;
        self.buffer[self.index] = input + self.filter_store * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

struct Allpass {
    buffer: Vec<f32>,
    index: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        let output = -input + buffered;
        self.buffer[self.index] = input + buffered * ALLPASS_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

struct ChannelState {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl ChannelState {
    fn new(sample_rate: u32, offset: usize, feedback: f32, damp: f32) -> Self {
        let scale = sample_rate as f32 / 44_100.0;
        let scaled = |len: usize| ((len + offset) as f32 * scale) as usize;

        Self {
            combs: COMB_TUNINGS
                .iter()
                .map(|&len| Comb::new(scaled(len), feedback, damp))
                .collect(),
            allpasses: ALLPASS_TUNINGS
                .iter()
                .map(|&len| Allpass::new(scaled(len)))
                .collect(),
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(input);
        }
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }
}

/// Schroeder reverb
pub struct Reverb {
    settings: ReverbSettings,
    sample_rate: Option<u32>,
    left: Option<ChannelState>,
    right: Option<ChannelState>,
}

impl Reverb {
    pub fn new(mut settings: ReverbSettings) -> Self {
        settings.room_size = settings.room_size.clamp(0.0, 1.0);
        settings.damping = settings.damping.clamp(0.0, 1.0);
        Self {
            settings,
            sample_rate: None,
            left: None,
            right: None,
        }
    }

    fn ensure_rate(&mut self, sample_rate: u32) {
        if self.sample_rate == Some(sample_rate) {
            return;
        }
        self.sample_rate = Some(sample_rate);

        // Freeverb scalings
        let feedback = 0.7 + 0.28 * self.settings.room_size;
        let damp = 0.4 * self.settings.damping;

        self.left = Some(ChannelState::new(sample_rate, 0, feedback, damp));
        self.right = Some(ChannelState::new(sample_rate, STEREO_SPREAD, feedback, damp));
    }
}

impl AudioEffect for Reverb {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.ensure_rate(sample_rate);
        let (Some(left), Some(right)) = (self.left.as_mut(), self.right.as_mut()) else {
            return;
        };

        let wet = self.settings.wet_level;
        let dry = self.settings.dry_level;

        for frame in buffer.chunks_exact_mut(2) {
            let input = (frame[0] + frame[1]) * FIXED_GAIN;
            let wet_l = left.process(input);
            let wet_r = right.process(input);
            frame[0] = frame[0] * dry + wet_l * wet;
            frame[1] = frame[1] * dry + wet_r * wet;
        }
    }

    fn reset(&mut self) {
        self.sample_rate = None;
        self.left = None;
        self.right = None;
    }

    fn name(&self) -> &str {
        "Reverb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_produces_a_tail() {
        let mut reverb = Reverb::new(ReverbSettings::default());
        let mut buffer = vec![0.0_f32; 44_100 * 2];
        buffer[0] = 1.0;
        buffer[1] = 1.0;

        reverb.process(&mut buffer, 44_100);

        // Energy well after the impulse means a tail exists
        let tail = &buffer[8_000..];
        assert!(tail.iter().any(|s| s.abs() > 1e-5));
        assert!(buffer.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn zero_wet_keeps_dry_signal_scaled() {
        let mut reverb = Reverb::new(ReverbSettings {
            wet_level: 0.0,
            dry_level: 1.0,
            ..ReverbSettings::default()
        });
        let original: Vec<f32> = (0..2_048).map(|i| (i as f32 * 0.01).sin()).collect();
        let mut buffer = original.clone();
        reverb.process(&mut buffer, 44_100);
        for (a, b) in buffer.iter().zip(&original) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn tail_decays() {
        let mut reverb = Reverb::new(ReverbSettings {
            room_size: 0.3,
            ..ReverbSettings::default()
        });
        let mut buffer = vec![0.0_f32; 44_100 * 4];
        buffer[0] = 1.0;
        buffer[1] = 1.0;

        reverb.process(&mut buffer, 44_100);

        let early: f32 = buffer[..44_100].iter().map(|s| s * s).sum();
        let late: f32 = buffer[132_300..].iter().map(|s| s * s).sum();
        assert!(late < early);
    }
}

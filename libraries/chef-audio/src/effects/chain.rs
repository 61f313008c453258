/// Effect chain for batch audio processing
///
/// Effects are processed in order. All of them operate on interleaved stereo
/// f32 samples in the [-1.0, 1.0] range at a fixed sample rate.

/// Trait for audio effects that can be chained together
pub trait AudioEffect: Send {
    /// Process the buffer in-place
    ///
    /// # Arguments
    /// * `buffer` - Interleaved stereo samples (L, R, L, R, ...)
    /// * `sample_rate` - Sample rate in Hz
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32);

    /// Reset internal state (filter memories, envelopes, delay lines)
    fn reset(&mut self);

    /// Effect name (for diagnostics)
    fn name(&self) -> &str;
}

/// Ordered chain of audio effects
#[derive(Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn AudioEffect>>,
}

impl std::fmt::Debug for dyn AudioEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEffect")
            .field("name", &self.name())
            .finish()
    }
}

impl std::fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectChain")
            .field("effects", &self.names())
            .finish()
    }
}

impl EffectChain {
    /// Create a new empty effect chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect to the end of the chain
    pub fn add_effect(&mut self, effect: Box<dyn AudioEffect>) {
        self.effects.push(effect);
    }

    /// Process audio through the entire chain, in order
    pub fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        for effect in &mut self.effects {
            effect.process(buffer, sample_rate);
        }
    }

    /// Reset every effect in the chain
    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Number of effects in the chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Names of the chained effects, in processing order
    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(|e| e.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Gain, GainSettings};

    #[test]
    fn empty_chain_is_identity() {
        let mut chain = EffectChain::new();
        assert!(chain.is_empty());

        let mut buffer = vec![0.25; 8];
        chain.process(&mut buffer, 44_100);
        assert_eq!(buffer, vec![0.25; 8]);
    }

    #[test]
    fn effects_apply_in_order() {
        let mut chain = EffectChain::new();
        // -6.02 dB then +6.02 dB is (almost) a no-op
        chain.add_effect(Box::new(Gain::new(GainSettings { gain_db: -6.02 })));
        chain.add_effect(Box::new(Gain::new(GainSettings { gain_db: 6.02 })));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.names(), vec!["Gain", "Gain"]);

        let mut buffer = vec![0.5; 16];
        chain.process(&mut buffer, 44_100);
        for sample in &buffer {
            assert!((sample - 0.5).abs() < 0.001);
        }
    }
}

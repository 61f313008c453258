//! Effect registry
//!
//! Maps effect names to factory functions. Registration is validated up
//! front: duplicate or empty names are rejected and every factory must be
//! able to construct its effect from default parameters, so a registered
//! name is always constructible at call time.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::error;

use crate::effects::{
    AudioEffect, Compressor, CompressorSettings, Gain, GainSettings, HighpassFilter,
    HighpassSettings, Limiter, LimiterSettings, LowpassFilter, LowpassSettings, Reverb,
    ReverbSettings,
};
use crate::error::{AudioError, Result};

/// Effect parameters as they arrive from a transformation: JSON keywords
pub type EffectParams = Map<String, Value>;

/// Factory building one effect from bound parameters
pub type EffectFactory = fn(&EffectParams) -> Result<Box<dyn AudioEffect>>;

/// Registry of available effect types
#[derive(Default, Clone)]
pub struct EffectRegistry {
    factories: BTreeMap<String, EffectFactory>,
}

impl EffectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in effect registered
    pub fn with_builtin_effects() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_effects();
        registry
    }

    /// Register an effect factory.
    ///
    /// Fails when the name is empty, already taken, or the factory cannot
    /// construct its effect from default (empty) parameters.
    pub fn register(&mut self, name: &str, factory: EffectFactory) -> Result<()> {
        if name.is_empty() {
            return Err(AudioError::InvalidRegistration {
                effect: name.to_string(),
                message: "effect name must not be empty".to_string(),
            });
        }
        if self.factories.contains_key(name) {
            return Err(AudioError::InvalidRegistration {
                effect: name.to_string(),
                message: "effect name already registered".to_string(),
            });
        }
        // Probe with defaults so a broken factory fails here, not at render
        factory(&EffectParams::new()).map_err(|e| AudioError::InvalidRegistration {
            effect: name.to_string(),
            message: e.to_string(),
        })?;

        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Construct an effect by name with bound parameters
    pub fn create(&self, name: &str, params: &EffectParams) -> Result<Box<dyn AudioEffect>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| AudioError::UnknownEffect(name.to_string()))?;
        factory(params)
    }

    /// Check if a name is registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered effect names, sorted
    pub fn available(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    fn register_builtin_effects(&mut self) {
        let builtins: [(&str, EffectFactory); 6] = [
            ("Gain", |params| {
                let settings: GainSettings = settings_from_params("Gain", params)?;
                Ok(Box::new(Gain::new(settings)))
            }),
            ("Compressor", |params| {
                let settings: CompressorSettings = settings_from_params("Compressor", params)?;
                Ok(Box::new(Compressor::new(settings)))
            }),
            ("Limiter", |params| {
                let settings: LimiterSettings = settings_from_params("Limiter", params)?;
                Ok(Box::new(Limiter::new(settings)))
            }),
            ("HighpassFilter", |params| {
                let settings: HighpassSettings =
                    settings_from_params("HighpassFilter", params)?;
                Ok(Box::new(HighpassFilter::new(settings)))
            }),
            ("LowpassFilter", |params| {
                let settings: LowpassSettings = settings_from_params("LowpassFilter", params)?;
                Ok(Box::new(LowpassFilter::new(settings)))
            }),
            ("Reverb", |params| {
                let settings: ReverbSettings = settings_from_params("Reverb", params)?;
                Ok(Box::new(Reverb::new(settings)))
            }),
        ];

        for (name, factory) in builtins {
            // A failure here is a programming error in a builtin
            if let Err(e) = self.register(name, factory) {
                error!(effect = name, error = %e, "builtin effect failed registration");
            }
        }
    }
}

/// Deserialize a typed settings struct from JSON keyword parameters
fn settings_from_params<T: DeserializeOwned>(effect: &str, params: &EffectParams) -> Result<T> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| AudioError::invalid_params(effect, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtins_are_registered_and_sorted() {
        let registry = EffectRegistry::with_builtin_effects();
        assert_eq!(
            registry.available(),
            vec![
                "Compressor",
                "Gain",
                "HighpassFilter",
                "Limiter",
                "LowpassFilter",
                "Reverb",
            ]
        );
        assert!(registry.is_registered("Reverb"));
        assert!(!registry.is_registered("Chorus"));
    }

    #[test]
    fn create_with_default_params() {
        let registry = EffectRegistry::with_builtin_effects();
        let effect = registry.create("Gain", &EffectParams::new()).unwrap();
        assert_eq!(effect.name(), "Gain");
    }

    #[test]
    fn create_with_bound_params() {
        let registry = EffectRegistry::with_builtin_effects();
        let mut params = EffectParams::new();
        params.insert("gain_db".to_string(), json!(-6.02));

        let mut effect = registry.create("Gain", &params).unwrap();
        let mut buffer = vec![1.0, 1.0];
        effect.process(&mut buffer, 44_100);
        assert!((buffer[0] - 0.5).abs() < 0.01);
    }

    #[test]
    fn unknown_effect_is_an_error() {
        let registry = EffectRegistry::with_builtin_effects();
        let err = registry.create("Chorus", &EffectParams::new()).unwrap_err();
        assert!(matches!(err, AudioError::UnknownEffect(name) if name == "Chorus"));
    }

    #[test]
    fn bad_params_are_an_error() {
        let registry = EffectRegistry::with_builtin_effects();
        let mut params = EffectParams::new();
        params.insert("gain_db".to_string(), json!("loud"));

        let err = registry.create("Gain", &params).unwrap_err();
        assert!(matches!(err, AudioError::InvalidParams { .. }));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = EffectRegistry::with_builtin_effects();
        let err = registry
            .register("Gain", |params| {
                let settings: GainSettings = settings_from_params("Gain", params)?;
                Ok(Box::new(Gain::new(settings)))
            })
            .unwrap_err();
        assert!(matches!(err, AudioError::InvalidRegistration { .. }));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut registry = EffectRegistry::new();
        let err = registry
            .register("", |params| {
                let settings: GainSettings = settings_from_params("Gain", params)?;
                Ok(Box::new(Gain::new(settings)))
            })
            .unwrap_err();
        assert!(matches!(err, AudioError::InvalidRegistration { .. }));
    }
}

//! Batch validation and per-file rendering
//!
//! Every batch is validated in full before any file I/O happens: input
//! formats first, then the output format, then the effect chain. The first
//! per-file failure aborts the rest of the batch; outputs already written
//! stay on disk.

use std::path::PathBuf;

use tracing::{debug, info};

use chef_audio::effects::EffectChain;
use chef_audio::registry::EffectRegistry;
use chef_audio::{decoder, encoder, formats};
use chef_core::types::{AudioFile, Preset, Transformation};

use crate::error::{RenderError, Result};

/// Reject any selected file whose extension the decoder cannot handle
pub fn check_input_formats(files: &[AudioFile]) -> Result<()> {
    for file in files {
        if !formats::can_decode(file.source_ext()) {
            return Err(RenderError::UnsupportedInputFormat(file.file_name()));
        }
    }
    Ok(())
}

/// Reject an output extension the encoder cannot produce.
///
/// An empty extension means "reuse each source file's extension" and is
/// always accepted here; a non-encodable source surfaces per file at encode
/// time instead.
pub fn check_output_format(output_ext: &str) -> Result<()> {
    if !output_ext.is_empty() && !formats::can_encode(output_ext) {
        return Err(RenderError::UnsupportedOutputFormat(output_ext.to_string()));
    }
    Ok(())
}

/// Reject an empty chain or one with an effect slot still unchosen
pub fn check_transformations(transformations: &[Transformation]) -> Result<()> {
    if transformations.is_empty() || transformations.iter().any(|t| t.name.is_none()) {
        return Err(RenderError::NoTransformationSelected);
    }
    Ok(())
}

/// Build the effect chain from the registry with each transformation's bound
/// parameters, in processing order
pub fn build_chain(
    registry: &EffectRegistry,
    transformations: &[Transformation],
) -> Result<EffectChain> {
    let mut chain = EffectChain::new();
    for transformation in transformations {
        let name = transformation
            .name
            .as_deref()
            .ok_or(RenderError::NoTransformationSelected)?;
        chain.add_effect(registry.create(name, &transformation.params)?);
    }
    Ok(chain)
}

/// Run the full pre-flight validation and return the ready-to-use chain
pub fn validate(
    registry: &EffectRegistry,
    files: &[AudioFile],
    preset: &Preset,
) -> Result<EffectChain> {
    check_input_formats(files)?;
    check_output_format(&preset.ext)?;
    check_transformations(&preset.transformations)?;
    build_chain(registry, &preset.transformations)
}

/// Render one file through an already-built chain.
///
/// Decodes to the file's PCM cache on first use, processes a copy of the
/// cached buffer, and writes it to the destination derived from the preset's
/// rename rule and output extension. Returns the written path.
pub fn render_file(
    file: &mut AudioFile,
    chain: &mut EffectChain,
    preset: &Preset,
) -> Result<PathBuf> {
    if file.decoded().is_none() {
        debug!(path = %file.source_path().display(), "decoding");
        let buffer = decoder::decode(file.source_path())?;
        file.set_decoded(buffer);
    }

    // The cache holds the untouched source PCM; effects run on a copy
    let mut buffer = match file.decoded() {
        Some(decoded) => decoded.clone(),
        None => return Err(RenderError::UnsupportedInputFormat(file.file_name())),
    };

    chain.reset();
    let sample_rate = buffer.format.sample_rate.as_hz();
    chain.process(&mut buffer.samples, sample_rate);

    file.update_destination(&preset.name_change_parameters, &preset.ext);
    let destination = file.destination_path();
    encoder::encode(&buffer, &destination)?;

    info!(
        source = %file.source_path().display(),
        destination = %destination.display(),
        "rendered"
    );
    Ok(destination)
}

/// Validate and render a whole batch on the calling thread.
///
/// Returns the written output paths. The first failing file aborts the rest;
/// paths already written are not removed.
pub fn render_batch(
    registry: &EffectRegistry,
    files: &mut [AudioFile],
    preset: &Preset,
) -> Result<Vec<PathBuf>> {
    let mut chain = validate(registry, files, preset)?;

    let mut written = Vec::with_capacity(files.len());
    for file in files.iter_mut() {
        written.push(render_file(file, &mut chain, preset)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chef_core::types::NameChangeParameters;

    fn preset_with(names: &[Option<&str>]) -> Preset {
        Preset {
            ext: String::new(),
            transformations: names
                .iter()
                .map(|name| match name {
                    Some(n) => Transformation::named(*n),
                    None => Transformation::empty(),
                })
                .collect(),
            name_change_parameters: NameChangeParameters::default(),
        }
    }

    #[test]
    fn undecodable_input_is_rejected_by_filename() {
        let files = vec![
            AudioFile::new("/music/good.wav"),
            AudioFile::new("/music/cover.webp"),
        ];
        let err = check_input_formats(&files).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnsupportedInputFormat(name) if name == "cover.webp"
        ));
    }

    #[test]
    fn input_check_is_case_insensitive() {
        let files = vec![AudioFile::new("/music/Take.FLAC")];
        assert!(check_input_formats(&files).is_ok());
    }

    #[test]
    fn empty_output_ext_is_accepted() {
        assert!(check_output_format("").is_ok());
        assert!(check_output_format("wav").is_ok());
    }

    #[test]
    fn non_encodable_output_ext_is_rejected() {
        let err = check_output_format("mp3").unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnsupportedOutputFormat(ext) if ext == "mp3"
        ));
    }

    #[test]
    fn empty_chain_is_rejected() {
        let preset = preset_with(&[]);
        assert!(matches!(
            check_transformations(&preset.transformations),
            Err(RenderError::NoTransformationSelected)
        ));
    }

    #[test]
    fn unnamed_slot_is_rejected() {
        let preset = preset_with(&[Some("Gain"), None]);
        assert!(matches!(
            check_transformations(&preset.transformations),
            Err(RenderError::NoTransformationSelected)
        ));
    }

    #[test]
    fn chain_builds_in_order() {
        let registry = EffectRegistry::with_builtin_effects();
        let preset = preset_with(&[Some("Reverb"), Some("Gain")]);
        let chain = build_chain(&registry, &preset.transformations).unwrap();
        assert_eq!(chain.names(), vec!["Reverb", "Gain"]);
    }

    #[test]
    fn unknown_effect_fails_validation() {
        let registry = EffectRegistry::with_builtin_effects();
        let files = vec![AudioFile::new("/music/good.wav")];
        let preset = preset_with(&[Some("Chorus")]);
        let err = validate(&registry, &files, &preset).unwrap_err();
        assert!(matches!(err, RenderError::Audio(_)));
    }

    #[test]
    fn validation_checks_inputs_before_chain() {
        // Both the input and the chain are bad; the input error wins.
        let registry = EffectRegistry::with_builtin_effects();
        let files = vec![AudioFile::new("/music/cover.webp")];
        let preset = preset_with(&[]);
        let err = validate(&registry, &files, &preset).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedInputFormat(_)));
    }
}

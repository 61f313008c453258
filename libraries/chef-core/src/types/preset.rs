//! Preset value objects
//!
//! A [`Preset`] bundles an output extension, an ordered effect chain and a
//! filename-change rule. Presets are immutable in memory; edits go through
//! the copying helpers so the currently loaded preset can be diffed against
//! what the repository returned.

use serde::{Deserialize, Serialize};

/// One effect in the chain, identified by name, with bound parameters.
///
/// `name = None` means "not yet chosen" in the chain editor; executing such a
/// chain is a validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    /// Registered effect name, or `None` while the user is still choosing
    pub name: Option<String>,
    /// Keyword parameters passed to the effect factory
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Transformation {
    /// An effect slot with no effect chosen yet
    pub fn empty() -> Self {
        Self {
            name: None,
            params: serde_json::Map::new(),
        }
    }

    /// A named effect with default parameters
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            params: serde_json::Map::new(),
        }
    }
}

/// How a source filename stem maps to an output stem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameChangeMode {
    /// Literal search-and-replace on the stem
    Replace,
    /// Template with `$item` / `$date` wildcards
    Wildcards,
}

/// A pure description of the filename-change rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChangeParameters {
    pub mode: NameChangeMode,
    #[serde(default)]
    pub wildcards_input: String,
    #[serde(default)]
    pub replace_from_input: String,
    #[serde(default)]
    pub replace_to_input: String,
}

impl Default for NameChangeParameters {
    fn default() -> Self {
        Self {
            mode: NameChangeMode::Replace,
            wildcards_input: String::new(),
            replace_from_input: String::new(),
            replace_to_input: String::new(),
        }
    }
}

impl NameChangeParameters {
    /// Replace-mode rule
    pub fn replace(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            mode: NameChangeMode::Replace,
            replace_from_input: from.into(),
            replace_to_input: to.into(),
            ..Self::default()
        }
    }

    /// Wildcard-mode rule
    pub fn wildcards(template: impl Into<String>) -> Self {
        Self {
            mode: NameChangeMode::Wildcards,
            wildcards_input: template.into(),
            ..Self::default()
        }
    }

    /// Apply the rule to a source stem.
    ///
    /// Replace mode with an empty search string is the identity. Wildcard
    /// mode expands the template in a single left-to-right pass, so text
    /// substituted for one wildcard is never re-scanned for another.
    pub fn change_name(&self, old_name: &str) -> String {
        match self.mode {
            NameChangeMode::Replace => {
                if self.replace_from_input.is_empty() {
                    old_name.to_string()
                } else {
                    old_name.replace(&self.replace_from_input, &self.replace_to_input)
                }
            }
            NameChangeMode::Wildcards => {
                let date = chrono::Local::now().to_string();
                expand_wildcards(&self.wildcards_input, old_name, &date)
            }
        }
    }
}

/// Single-pass wildcard expansion: `$item` -> the source stem, `$date` -> the
/// rendered timestamp. Anything else after a `$` is kept literally.
fn expand_wildcards(template: &str, item: &str, date: &str) -> String {
    let mut out = String::with_capacity(template.len() + item.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("$item") {
            out.push_str(item);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("$date") {
            out.push_str(date);
            rest = after;
        } else {
            out.push('$');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Output extension + effect chain + filename rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Output extension; empty means "reuse each source file's extension"
    pub ext: String,
    /// Ordered effect chain; order is processing order
    pub transformations: Vec<Transformation>,
    pub name_change_parameters: NameChangeParameters,
}

impl Preset {
    /// An empty preset: no extension override, no effects, identity rename
    pub fn empty() -> Self {
        Self {
            ext: String::new(),
            transformations: Vec::new(),
            name_change_parameters: NameChangeParameters::default(),
        }
    }

    /// Copy of this preset with the transformation at `index` replaced.
    /// An out-of-range index leaves the chain unchanged.
    pub fn replace_transform_at(&self, index: usize, new_transform: Transformation) -> Self {
        let mut transformations = self.transformations.clone();
        if let Some(slot) = transformations.get_mut(index) {
            *slot = new_transform;
        }
        Self {
            transformations,
            ..self.clone()
        }
    }

    /// Copy of this preset with one transformation moved to a new position.
    /// An out-of-range `from_index` leaves the chain unchanged; `to_index` is
    /// clamped to the end.
    pub fn move_transform(&self, from_index: usize, to_index: usize) -> Self {
        let mut transformations = self.transformations.clone();
        if from_index < transformations.len() {
            let transform = transformations.remove(from_index);
            let to_index = to_index.min(transformations.len());
            transformations.insert(to_index, transform);
        }
        Self {
            transformations,
            ..self.clone()
        }
    }
}

/// Row-level info about a persisted preset, for list rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetMetadata {
    pub id: i64,
    pub name: String,
    pub default: bool,
}

/// Render-specific errors
use thiserror::Error;

/// Result type alias using `RenderError`
pub type Result<T> = std::result::Result<T, RenderError>;

/// Render error types
#[derive(Error, Debug)]
pub enum RenderError {
    /// A selected file's extension cannot be decoded
    #[error("Unsupported input format: {0}")]
    UnsupportedInputFormat(String),

    /// The selected output extension cannot be encoded
    #[error("Unsupported output format: {0}")]
    UnsupportedOutputFormat(String),

    /// The effect chain is empty or contains an unnamed slot
    #[error("No transformation selected")]
    NoTransformationSelected,

    /// Failure inside the codec/effect backend
    #[error(transparent)]
    Audio(#[from] chef_audio::AudioError),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Whether this error describes a fixable problem with the user's
    /// selection rather than an unexpected failure. Recipe errors get their
    /// own dialog text; everything else is logged and reported generically.
    pub fn is_recipe_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedInputFormat(_)
                | Self::UnsupportedOutputFormat(_)
                | Self::NoTransformationSelected
        )
    }
}

impl From<RenderError> for chef_core::ChefError {
    fn from(err: RenderError) -> Self {
        chef_core::ChefError::audio(err.to_string())
    }
}

/// Audio-specific errors
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Extension not handled by the codec backend
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Encoding error
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Effect name not present in the registry
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    /// Effect parameters did not deserialize
    #[error("Invalid parameters for effect '{effect}': {message}")]
    InvalidParams { effect: String, message: String },

    /// Registration-time validation failure
    #[error("Invalid effect registration '{effect}': {message}")]
    InvalidRegistration { effect: String, message: String },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Symphonia error
    #[error("Symphonia error: {0}")]
    Symphonia(String),
}

impl AudioError {
    /// Create an invalid parameters error
    pub fn invalid_params(effect: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            effect: effect.into(),
            message: message.into(),
        }
    }
}

impl From<AudioError> for chef_core::ChefError {
    fn from(err: AudioError) -> Self {
        chef_core::ChefError::audio(err.to_string())
    }
}

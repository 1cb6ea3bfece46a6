//! Error types for glyphmap

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GlyphMapError>;

/// Main error type for glyphmap
#[derive(Debug, Error)]
pub enum GlyphMapError {
    /// The glyph buffer handed to the shaper was too small. The mapper
    /// recovers from this by doubling the buffer and retrying.
    #[error("Glyph buffer too small: capacity {capacity}")]
    InsufficientBuffer { capacity: usize },

    #[error(
        "Glyph buffer exhausted for text {text_start}..{}: {attempts} attempts, last capacity {last_capacity}",
        .text_start + .text_length
    )]
    ResourceExhaustion {
        text_start: u32,
        text_length: u32,
        attempts: u32,
        last_capacity: usize,
    },

    #[error("No font available for text {text_start}..{}", .text_start + .text_length)]
    NoFontAvailable { text_start: u32, text_length: u32 },

    #[error("Platform text service failed: {0}")]
    Platform(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Font error: {0}")]
    Font(#[from] FontError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GlyphMapError {
    /// Shorthand for a failed platform service call
    pub fn platform(message: impl Into<String>) -> Self {
        GlyphMapError::Platform(message.into())
    }
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Font file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid font data")]
    InvalidData,

    #[error("Font family not found: {0}")]
    FamilyNotFound(String),
}

//! Error types for the atlas managers, the layout solver, and the config
//! loader.

use thiserror::Error;

/// Errors from the glyph cache and font store.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("face load failed: {0}")]
    FaceLoad(String),

    #[error("glyph {codepoint:#x} failed to load")]
    GlyphLoad { codepoint: u32 },

    /// The atlas could not place a region. Recoverable: the manager grows
    /// the atlas and retries once.
    #[error("atlas full")]
    AtlasFull,

    /// The atlas hit its configured size cap, or a single region cannot fit
    /// even after growing. Fatal configuration error.
    #[error("atlas exhausted at size {0}")]
    AtlasExhausted(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the nine-slice image store.
#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("atlas full")]
    AtlasFull,

    #[error("atlas exhausted at size {0}")]
    AtlasExhausted(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural misuse of the chain layout API. These are programming errors
/// surfaced at the call site, not runtime conditions to recover from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("chain orientation mismatch")]
    OrientationMismatch,

    #[error("chain is not a group")]
    NotAGroup,

    #[error("widget already registered in this chain tree")]
    DuplicateWidget,
}

/// Errors from the JSON config loader.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

//! fOS Text - Text Primitives for Inline Layout
//!
//! This crate provides the character-level services the line layout core
//! calls into:
//! - Bidi classification and embedding levels (`unicode-bidi` tables)
//! - Reference-counted embedding contexts and resolver status
//! - Line-break opportunities, including CJK kinsoku rules
//! - Text measurement (monospace for tests, `ttf-parser` for real fonts)

pub mod bidi;
pub mod face;
pub mod line_break;
pub mod metrics;

pub use bidi::{BidiClass, BidiContext, BidiStatus, Level};
pub use face::FaceMetrics;
pub use line_break::{is_breakable, is_justification_space, SOFT_HYPHEN, ZERO_WIDTH_SPACE};
pub use metrics::{is_zero_width, FontMetrics, MonospaceMetrics, TextMetrics};

/// Text error types
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("Failed to parse font: {0}")]
    FontParsing(String),
}

pub type Result<T> = std::result::Result<T, TextError>;

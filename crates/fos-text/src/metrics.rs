//! Text measurement
//!
//! Line layout never touches glyphs directly. It asks a `TextMetrics`
//! implementation for advance widths and the vertical font metrics used
//! for `line-height: normal` and baseline alignment. All values are whole
//! pixels.

use crate::bidi::BidiClass;
use crate::line_break::{SOFT_HYPHEN, ZERO_WIDTH_SPACE};

/// Vertical metrics of a font at a given size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontMetrics {
    /// Pixels above the baseline
    pub ascent: i32,
    /// Pixels below the baseline
    pub descent: i32,
    /// Extra gap between lines
    pub line_gap: i32,
}

impl FontMetrics {
    /// Height of glyph boxes
    pub fn height(&self) -> i32 {
        self.ascent + self.descent
    }

    /// Baseline-to-baseline distance for `line-height: normal`
    pub fn line_spacing(&self) -> i32 {
        self.ascent + self.descent + self.line_gap
    }
}

/// Measurement service for line layout
pub trait TextMetrics {
    /// Advance width of one character
    fn char_width(&self, c: char, font_size: f32) -> i32;

    /// Vertical metrics at `font_size`
    fn font_metrics(&self, font_size: f32) -> FontMetrics;

    /// Advance width of a run of characters
    fn text_width(&self, text: &[char], font_size: f32) -> i32 {
        text.iter().map(|&c| self.char_width(c, font_size)).sum()
    }
}

/// Characters that never take horizontal space
pub fn is_zero_width(c: char) -> bool {
    c == SOFT_HYPHEN
        || c == ZERO_WIDTH_SPACE
        || c == '\n'
        || matches!(BidiClass::of(c), BidiClass::BN)
        || BidiClass::of(c).is_explicit()
}

/// Fixed-advance measurement
///
/// Every visible character is `advance` pixels wide regardless of font
/// size, which makes line widths exact in tests. Ascent is 80% of the font
/// size, rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceMetrics {
    pub advance: i32,
}

impl MonospaceMetrics {
    pub fn new(advance: i32) -> Self {
        Self { advance }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { advance: 10 }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn char_width(&self, c: char, _font_size: f32) -> i32 {
        if is_zero_width(c) { 0 } else { self.advance }
    }

    fn font_metrics(&self, font_size: f32) -> FontMetrics {
        let ascent = (font_size * 0.8).round() as i32;
        let descent = font_size.round() as i32 - ascent;
        FontMetrics {
            ascent,
            descent,
            line_gap: 0,
        }
    }
}

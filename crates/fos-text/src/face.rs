//! Font-backed measurement
//!
//! Scales `hmtx` advances and `hhea` vertical metrics of a parsed face to
//! the requested font size.

use ttf_parser::{Face, GlyphId};

use crate::metrics::{is_zero_width, FontMetrics, TextMetrics};
use crate::{Result, TextError};

/// Measurement from a parsed font face
pub struct FaceMetrics<'a> {
    face: Face<'a>,
}

impl<'a> FaceMetrics<'a> {
    /// Parse face `index` of a font file or collection
    pub fn from_data(data: &'a [u8], index: u32) -> Result<Self> {
        let face = Face::parse(data, index).map_err(|e| TextError::FontParsing(e.to_string()))?;
        tracing::debug!(glyphs = face.number_of_glyphs(), upem = face.units_per_em(), "parsed font face");
        Ok(Self { face })
    }

    /// Get underlying ttf-parser face
    pub fn ttf_face(&self) -> &Face<'a> {
        &self.face
    }

    fn scale(&self, units: i32, font_size: f32) -> i32 {
        (units as f32 * font_size / f32::from(self.face.units_per_em())).round() as i32
    }
}

impl TextMetrics for FaceMetrics<'_> {
    fn char_width(&self, c: char, font_size: f32) -> i32 {
        if is_zero_width(c) {
            return 0;
        }
        // Missing glyphs measure as .notdef
        let glyph = self.face.glyph_index(c).unwrap_or(GlyphId(0));
        let advance = self.face.glyph_hor_advance(glyph).unwrap_or(0);
        self.scale(i32::from(advance), font_size)
    }

    fn font_metrics(&self, font_size: f32) -> FontMetrics {
        FontMetrics {
            ascent: self.scale(i32::from(self.face.ascender()), font_size),
            descent: self.scale(-i32::from(self.face.descender()), font_size),
            line_gap: self.scale(i32::from(self.face.line_gap()), font_size),
        }
    }
}

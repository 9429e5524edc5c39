//! Computed Styles
//!
//! The resolved style values inline layout consumes. Lengths are whole
//! pixels; `auto` margins resolve to zero for inline content.

use crate::properties::{
    Clear, Direction, Display, Float, LineHeight, Overflow, PageBreakInside, Position,
    TextAlign, TextOverflow, UnicodeBidi, VerticalAlign, WhiteSpace, WordWrap,
};
use crate::{Declaration, Result, StyleError};

/// Computed style for a render object
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    // Display & positioning
    pub display: Display,
    pub position: Position,
    pub float: Float,
    pub clear: Clear,
    /// Offsets of a positioned box; `None` is `auto`
    pub inset: Insets,

    // Box model
    /// Content width of a block; `None` is `auto`
    pub width: Option<i32>,
    pub margin: EdgeSizes,
    pub padding: EdgeSizes,
    pub border_width: EdgeSizes,
    pub overflow: Overflow,

    // Text
    pub font_size: f32,
    pub line_height: LineHeight,
    pub vertical_align: VerticalAlign,
    pub direction: Direction,
    pub unicode_bidi: UnicodeBidi,
    pub white_space: WhiteSpace,
    pub text_align: TextAlign,
    pub word_wrap: WordWrap,
    pub text_overflow: TextOverflow,
    /// Legacy visual-order text: skip bidi reordering
    pub visually_ordered: bool,

    // Paged media
    pub orphans: u32,
    pub widows: u32,
    pub page_break_inside: PageBreakInside,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            position: Position::Static,
            float: Float::None,
            clear: Clear::None,
            inset: Insets::default(),
            width: None,
            margin: EdgeSizes::default(),
            padding: EdgeSizes::default(),
            border_width: EdgeSizes::default(),
            overflow: Overflow::Visible,
            font_size: 16.0,
            line_height: LineHeight::Normal,
            vertical_align: VerticalAlign::Baseline,
            direction: Direction::Ltr,
            unicode_bidi: UnicodeBidi::Normal,
            white_space: WhiteSpace::Normal,
            text_align: TextAlign::Auto,
            word_wrap: WordWrap::Normal,
            text_overflow: TextOverflow::Clip,
            visually_ordered: false,
            orphans: 2,
            widows: 2,
            page_break_inside: PageBreakInside::Auto,
        }
    }
}

impl ComputedStyle {
    /// Style of a block container
    pub fn block() -> Self {
        Self {
            display: Display::Block,
            ..Self::default()
        }
    }

    /// Build a style from declaration text, e.g. `"white-space: pre; width: 100px"`
    pub fn from_css(css: &str) -> Result<Self> {
        let mut style = Self::default();
        style.apply_css(css)?;
        Ok(style)
    }

    /// Apply declaration text on top of this style
    pub fn apply_css(&mut self, css: &str) -> Result<()> {
        for decl in crate::parse_declarations(css)? {
            self.apply_declaration(&decl)?;
        }
        Ok(())
    }

    /// Child style: inherited properties copied, the rest at initial values
    pub fn inherit(parent: &ComputedStyle) -> Self {
        Self {
            font_size: parent.font_size,
            line_height: parent.line_height,
            direction: parent.direction,
            white_space: parent.white_space,
            text_align: parent.text_align,
            word_wrap: parent.word_wrap,
            visually_ordered: parent.visually_ordered,
            orphans: parent.orphans,
            widows: parent.widows,
            ..Self::default()
        }
    }

    /// Apply a declaration to this computed style
    pub fn apply_declaration(&mut self, decl: &Declaration) -> Result<()> {
        match decl.property.as_str() {
            "display" => {
                self.display = keyword(decl, &[
                    ("inline", Display::Inline),
                    ("block", Display::Block),
                    ("inline-block", Display::InlineBlock),
                    ("none", Display::None),
                ])?;
            }
            "position" => {
                self.position = keyword(decl, &[
                    ("static", Position::Static),
                    ("relative", Position::Relative),
                    ("absolute", Position::Absolute),
                    ("fixed", Position::Fixed),
                ])?;
            }
            "float" => {
                self.float = keyword(decl, &[
                    ("none", Float::None),
                    ("left", Float::Left),
                    ("right", Float::Right),
                ])?;
            }
            "clear" => {
                self.clear = keyword(decl, &[
                    ("none", Clear::None),
                    ("left", Clear::Left),
                    ("right", Clear::Right),
                    ("both", Clear::Both),
                ])?;
            }
            "top" => self.inset.top = self.auto_or_length(decl)?,
            "right" => self.inset.right = self.auto_or_length(decl)?,
            "bottom" => self.inset.bottom = self.auto_or_length(decl)?,
            "left" => self.inset.left = self.auto_or_length(decl)?,
            "width" => self.width = self.auto_or_length(decl)?,
            "margin" => self.margin = self.edges(decl)?,
            "margin-top" => self.margin.top = self.length_or_auto_zero(decl)?,
            "margin-right" => self.margin.right = self.length_or_auto_zero(decl)?,
            "margin-bottom" => self.margin.bottom = self.length_or_auto_zero(decl)?,
            "margin-left" => self.margin.left = self.length_or_auto_zero(decl)?,
            "padding" => self.padding = self.edges(decl)?,
            "padding-top" => self.padding.top = self.length(decl)?,
            "padding-right" => self.padding.right = self.length(decl)?,
            "padding-bottom" => self.padding.bottom = self.length(decl)?,
            "padding-left" => self.padding.left = self.length(decl)?,
            "border-width" => self.border_width = self.edges(decl)?,
            "border-top-width" => self.border_width.top = self.length(decl)?,
            "border-right-width" => self.border_width.right = self.length(decl)?,
            "border-bottom-width" => self.border_width.bottom = self.length(decl)?,
            "border-left-width" => self.border_width.left = self.length(decl)?,
            "overflow" => {
                self.overflow = keyword(decl, &[
                    ("visible", Overflow::Visible),
                    ("hidden", Overflow::Hidden),
                    ("scroll", Overflow::Scroll),
                    ("auto", Overflow::Auto),
                ])?;
            }
            "font-size" => {
                self.font_size = parse_px(&decl.value, self.font_size)
                    .ok_or_else(|| invalid(decl))?;
            }
            "line-height" => {
                let value = decl.value.trim();
                self.line_height = if value.eq_ignore_ascii_case("normal") {
                    LineHeight::Normal
                } else if let Ok(number) = value.parse::<f32>() {
                    LineHeight::Number(number)
                } else {
                    LineHeight::Px(self.length(decl)?)
                };
            }
            "vertical-align" => {
                self.vertical_align = keyword(decl, &[
                    ("baseline", VerticalAlign::Baseline),
                    ("sub", VerticalAlign::Sub),
                    ("super", VerticalAlign::Super),
                    ("top", VerticalAlign::Top),
                    ("bottom", VerticalAlign::Bottom),
                ])?;
            }
            "direction" => {
                self.direction = keyword(decl, &[("ltr", Direction::Ltr), ("rtl", Direction::Rtl)])?;
            }
            "unicode-bidi" => {
                self.unicode_bidi = keyword(decl, &[
                    ("normal", UnicodeBidi::Normal),
                    ("embed", UnicodeBidi::Embed),
                    ("bidi-override", UnicodeBidi::BidiOverride),
                ])?;
            }
            "white-space" => {
                self.white_space = keyword(decl, &[
                    ("normal", WhiteSpace::Normal),
                    ("pre", WhiteSpace::Pre),
                    ("nowrap", WhiteSpace::Nowrap),
                    ("pre-wrap", WhiteSpace::PreWrap),
                    ("pre-line", WhiteSpace::PreLine),
                ])?;
            }
            "text-align" => {
                self.text_align = keyword(decl, &[
                    ("auto", TextAlign::Auto),
                    ("start", TextAlign::Auto),
                    ("left", TextAlign::Left),
                    ("right", TextAlign::Right),
                    ("center", TextAlign::Center),
                    ("justify", TextAlign::Justify),
                    ("-khtml-left", TextAlign::KhtmlLeft),
                    ("-khtml-right", TextAlign::KhtmlRight),
                    ("-khtml-center", TextAlign::KhtmlCenter),
                    ("-webkit-left", TextAlign::KhtmlLeft),
                    ("-webkit-right", TextAlign::KhtmlRight),
                    ("-webkit-center", TextAlign::KhtmlCenter),
                ])?;
            }
            "word-wrap" | "overflow-wrap" => {
                self.word_wrap = keyword(decl, &[
                    ("normal", WordWrap::Normal),
                    ("break-word", WordWrap::BreakWord),
                    ("anywhere", WordWrap::BreakWord),
                ])?;
            }
            "text-overflow" => {
                self.text_overflow = keyword(decl, &[
                    ("clip", TextOverflow::Clip),
                    ("ellipsis", TextOverflow::Ellipsis),
                ])?;
            }
            "-khtml-visual-order" => {
                self.visually_ordered = keyword(decl, &[("visual", true), ("logical", false)])?;
            }
            "orphans" => self.orphans = count(decl)?,
            "widows" => self.widows = count(decl)?,
            "page-break-inside" => {
                self.page_break_inside = keyword(decl, &[
                    ("auto", PageBreakInside::Auto),
                    ("avoid", PageBreakInside::Avoid),
                ])?;
            }
            _ => {
                tracing::debug!(property = %decl.property, "ignoring unsupported property");
                return Err(StyleError::UnknownProperty(decl.property.clone()));
            }
        }
        Ok(())
    }

    /// Resolved line height in pixels, `normal` taken from the font's natural spacing
    pub fn computed_line_height(&self, normal: i32) -> i32 {
        match self.line_height {
            LineHeight::Normal => normal,
            LineHeight::Number(factor) => (factor * self.font_size).round() as i32,
            LineHeight::Px(px) => px,
        }
    }

    /// Margin, border and padding on the left side
    pub fn left_bpm(&self) -> i32 {
        self.margin.left + self.border_width.left + self.padding.left
    }

    /// Margin, border and padding on the right side
    pub fn right_bpm(&self) -> i32 {
        self.margin.right + self.border_width.right + self.padding.right
    }

    pub fn is_floating(&self) -> bool {
        self.float != Float::None
    }

    pub fn is_out_of_flow_positioned(&self) -> bool {
        matches!(self.position, Position::Absolute | Position::Fixed)
    }

    pub fn has_overflow_clip(&self) -> bool {
        self.overflow != Overflow::Visible
    }

    fn length(&self, decl: &Declaration) -> Result<i32> {
        parse_px(&decl.value, self.font_size)
            .map(|px| px.round() as i32)
            .ok_or_else(|| invalid(decl))
    }

    fn length_or_auto_zero(&self, decl: &Declaration) -> Result<i32> {
        Ok(self.auto_or_length(decl)?.unwrap_or(0))
    }

    fn auto_or_length(&self, decl: &Declaration) -> Result<Option<i32>> {
        if decl.value.trim().eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        self.length(decl).map(Some)
    }

    fn edges(&self, decl: &Declaration) -> Result<EdgeSizes> {
        let sizes = decl
            .value
            .split_whitespace()
            .map(|part| {
                let px = if part.eq_ignore_ascii_case("auto") {
                    Some(0.0)
                } else {
                    parse_px(part, self.font_size)
                };
                px.map(|px| px.round() as i32).ok_or_else(|| invalid(decl))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(match sizes.as_slice() {
            [all] => EdgeSizes::all(*all),
            [vertical, horizontal] => EdgeSizes::new(*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => EdgeSizes::new(*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => EdgeSizes::new(*top, *right, *bottom, *left),
            _ => return Err(invalid(decl)),
        })
    }
}

/// Edge sizes for margin, padding, border (whole pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeSizes {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl EdgeSizes {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self { top, right, bottom, left }
    }

    pub fn all(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> i32 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0 && self.right == 0 && self.bottom == 0 && self.left == 0
    }
}

/// Offsets of a positioned box (`None` is `auto`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Insets {
    pub top: Option<i32>,
    pub right: Option<i32>,
    pub bottom: Option<i32>,
    pub left: Option<i32>,
}

fn invalid(decl: &Declaration) -> StyleError {
    StyleError::InvalidValue {
        property: decl.property.clone(),
        value: decl.value.clone(),
    }
}

fn keyword<T: Copy>(decl: &Declaration, table: &[(&str, T)]) -> Result<T> {
    let value = decl.value.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|(_, v)| *v)
        .ok_or_else(|| invalid(decl))
}

fn count(decl: &Declaration) -> Result<u32> {
    decl.value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| invalid(decl))
}

/// Parse `12px`, `1.5em` or a unitless `0`
fn parse_px(value: &str, font_size: f32) -> Option<f32> {
    let value = value.trim();
    if let Some(number) = value.strip_suffix("px") {
        return number.trim().parse().ok();
    }
    if let Some(number) = value.strip_suffix("em") {
        return number.trim().parse::<f32>().ok().map(|n| n * font_size);
    }
    value.parse::<f32>().ok().filter(|n| *n == 0.0)
}

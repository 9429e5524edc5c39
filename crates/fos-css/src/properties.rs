//! CSS Property Values
//!
//! Keyword enums for the properties inline layout reads.
//! Uses enums for fixed values to save memory vs strings.

/// `direction`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn is_ltr(self) -> bool {
        self == Direction::Ltr
    }
}

/// `unicode-bidi`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnicodeBidi {
    #[default]
    Normal,
    Embed,
    BidiOverride,
}

/// `white-space`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WhiteSpace {
    #[default]
    Normal,
    Pre,
    Nowrap,
    PreWrap,
    PreLine,
}

impl WhiteSpace {
    /// Spaces and tabs are kept as authored
    pub fn preserves_spaces(self) -> bool {
        matches!(self, WhiteSpace::Pre | WhiteSpace::PreWrap)
    }

    /// Newlines force a line break
    pub fn preserves_newlines(self) -> bool {
        matches!(self, WhiteSpace::Pre | WhiteSpace::PreWrap | WhiteSpace::PreLine)
    }

    /// Lines may wrap at soft break opportunities
    pub fn auto_wrap(self) -> bool {
        matches!(self, WhiteSpace::Normal | WhiteSpace::PreWrap | WhiteSpace::PreLine)
    }
}

/// `text-align`, including the legacy `-khtml-`/`-webkit-` aliases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    #[default]
    Auto,
    Left,
    Right,
    Center,
    Justify,
    KhtmlLeft,
    KhtmlRight,
    KhtmlCenter,
}

/// `word-wrap` / `overflow-wrap`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WordWrap {
    #[default]
    Normal,
    BreakWord,
}

/// `clear`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Clear {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl Clear {
    /// Accumulate two clear requests
    pub fn union(self, other: Clear) -> Clear {
        match (self.clears_left() || other.clears_left(), self.clears_right() || other.clears_right()) {
            (true, true) => Clear::Both,
            (true, false) => Clear::Left,
            (false, true) => Clear::Right,
            (false, false) => Clear::None,
        }
    }

    pub fn clears_left(self) -> bool {
        matches!(self, Clear::Left | Clear::Both)
    }

    pub fn clears_right(self) -> bool {
        matches!(self, Clear::Right | Clear::Both)
    }
}

/// `float`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Float {
    #[default]
    None,
    Left,
    Right,
}

/// `position`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
}

/// `display` as authored (before blockification of floats/positioned boxes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Display {
    #[default]
    Inline,
    Block,
    InlineBlock,
    None,
}

impl Display {
    pub fn is_inline_type(self) -> bool {
        matches!(self, Display::Inline | Display::InlineBlock)
    }
}

/// `vertical-align` keywords supported by line layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlign {
    #[default]
    Baseline,
    Sub,
    Super,
    Top,
    Bottom,
}

/// `page-break-inside`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PageBreakInside {
    #[default]
    Auto,
    Avoid,
}

/// `text-overflow`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextOverflow {
    #[default]
    Clip,
    Ellipsis,
}

/// `overflow`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

/// `line-height`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LineHeight {
    #[default]
    Normal,
    /// Multiplier of the font size
    Number(f32),
    /// Absolute pixels
    Px(i32),
}

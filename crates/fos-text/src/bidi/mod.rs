//! Bidirectional character classes and embedding levels
//!
//! Classification is backed by the Unicode Character Database tables of the
//! `unicode-bidi` crate. Line layout resolves a pragmatic subset of UAX #9:
//! explicit embeddings and overrides, weak and neutral types, and L2
//! reordering. Isolates are treated as other neutrals.

mod context;

pub use context::{BidiContext, BidiStatus};

/// Bidirectional character type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BidiClass {
    // Strong types
    /// Left-to-Right
    L,
    /// Right-to-Left
    R,
    /// Arabic Letter
    AL,

    // Weak types
    /// European Number
    EN,
    /// European Number Separator
    ES,
    /// European Number Terminator
    ET,
    /// Arabic Number
    AN,
    /// Common Number Separator
    CS,
    /// Nonspacing Mark
    NSM,
    /// Boundary Neutral
    BN,

    // Neutral types
    /// Paragraph Separator
    B,
    /// Segment Separator
    S,
    /// Whitespace
    WS,
    /// Other Neutrals
    ON,

    // Explicit formatting
    /// Left-to-Right Embedding
    LRE,
    /// Left-to-Right Override
    LRO,
    /// Right-to-Left Embedding
    RLE,
    /// Right-to-Left Override
    RLO,
    /// Pop Directional Format
    PDF,
    /// Left-to-Right Isolate
    LRI,
    /// Right-to-Left Isolate
    RLI,
    /// First Strong Isolate
    FSI,
    /// Pop Directional Isolate
    PDI,
}

impl BidiClass {
    /// Get bidi class for a character
    pub fn of(c: char) -> Self {
        use unicode_bidi::BidiClass as U;

        match unicode_bidi::bidi_class(c) {
            U::L => BidiClass::L,
            U::R => BidiClass::R,
            U::AL => BidiClass::AL,
            U::EN => BidiClass::EN,
            U::ES => BidiClass::ES,
            U::ET => BidiClass::ET,
            U::AN => BidiClass::AN,
            U::CS => BidiClass::CS,
            U::NSM => BidiClass::NSM,
            U::BN => BidiClass::BN,
            U::B => BidiClass::B,
            U::S => BidiClass::S,
            U::WS => BidiClass::WS,
            U::ON => BidiClass::ON,
            U::LRE => BidiClass::LRE,
            U::LRO => BidiClass::LRO,
            U::RLE => BidiClass::RLE,
            U::RLO => BidiClass::RLO,
            U::PDF => BidiClass::PDF,
            U::LRI => BidiClass::LRI,
            U::RLI => BidiClass::RLI,
            U::FSI => BidiClass::FSI,
            U::PDI => BidiClass::PDI,
        }
    }

    /// Class as seen by the line resolver: isolates degrade to `ON`
    pub fn resolved(self) -> Self {
        match self {
            BidiClass::LRI | BidiClass::RLI | BidiClass::FSI | BidiClass::PDI => BidiClass::ON,
            other => other,
        }
    }

    /// Check if this is a strong type
    pub fn is_strong(self) -> bool {
        matches!(self, BidiClass::L | BidiClass::R | BidiClass::AL)
    }

    /// Check if this is an explicit embedding, override or pop
    pub fn is_explicit(self) -> bool {
        matches!(
            self,
            BidiClass::LRE | BidiClass::RLE | BidiClass::LRO | BidiClass::RLO | BidiClass::PDF
        )
    }

    /// Check if this is a number type
    pub fn is_number(self) -> bool {
        matches!(self, BidiClass::EN | BidiClass::AN)
    }

    /// Check if RTL type
    pub fn is_rtl(self) -> bool {
        matches!(self, BidiClass::R | BidiClass::AL | BidiClass::RLE | BidiClass::RLO)
    }
}

/// Embedding level (0-125, even=LTR, odd=RTL)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub u8);

impl Level {
    /// Maximum embedding level
    pub const MAX: u8 = 125;

    /// LTR level 0
    pub const LTR: Level = Level(0);

    /// RTL level 1
    pub const RTL: Level = Level(1);

    /// Create new level
    pub fn new(level: u8) -> Option<Self> {
        if level <= Self::MAX {
            Some(Level(level))
        } else {
            None
        }
    }

    /// Check if LTR
    pub fn is_ltr(self) -> bool {
        self.0 % 2 == 0
    }

    /// Check if RTL
    pub fn is_rtl(self) -> bool {
        self.0 % 2 == 1
    }

    /// Strong direction of this level
    pub fn direction(self) -> BidiClass {
        if self.is_rtl() { BidiClass::R } else { BidiClass::L }
    }

    /// Next higher even level
    pub fn next_ltr(self) -> Option<Self> {
        Self::new(self.0.saturating_add(2) & !1)
    }

    /// Next higher odd level
    pub fn next_rtl(self) -> Option<Self> {
        Self::new(self.0.saturating_add(1) | 1)
    }
}

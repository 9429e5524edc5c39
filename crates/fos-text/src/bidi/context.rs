//! Embedding contexts
//!
//! A `BidiContext` is one node of an immutable embedding stack. Children
//! point at their parent through `Rc`, so snapshots of resolver state kept
//! on finished lines can share chains with the contexts of a later pass.
//! Equality is structural: two independently built chains with the same
//! levels, directions and override flags compare equal.

use std::rc::Rc;

use super::{BidiClass, Level};

/// One level of the embedding stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidiContext {
    level: Level,
    dir: BidiClass,
    basic_dir: BidiClass,
    is_override: bool,
    parent: Option<Rc<BidiContext>>,
}

impl BidiContext {
    /// Paragraph root: level 0/L or level 1/R
    pub fn root(rtl: bool, is_override: bool) -> Rc<Self> {
        let (level, dir) = if rtl {
            (Level::RTL, BidiClass::R)
        } else {
            (Level::LTR, BidiClass::L)
        };
        Rc::new(Self {
            level,
            dir,
            basic_dir: dir,
            is_override,
            parent: None,
        })
    }

    /// Push an embedding (`R` or `L`) on top of this context.
    ///
    /// The new level is the next one of matching parity. Returns `None`
    /// once that level would reach `max_level`; the request is then ignored.
    pub fn push(self: &Rc<Self>, dir: BidiClass, is_override: bool, max_level: u8) -> Option<Rc<Self>> {
        let (dir, level) = if dir.is_rtl() {
            (BidiClass::R, self.level.next_rtl())
        } else {
            (BidiClass::L, self.level.next_ltr())
        };
        let level = match level {
            Some(level) if level.0 < max_level => level,
            _ => {
                tracing::debug!(level = self.level.0, max_level, "embedding overflow, push ignored");
                return None;
            }
        };

        Some(Rc::new(Self {
            level,
            dir,
            basic_dir: self.basic_dir,
            is_override,
            parent: Some(Rc::clone(self)),
        }))
    }

    /// Context below this one
    pub fn parent(&self) -> Option<&Rc<BidiContext>> {
        self.parent.as_ref()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Embedding direction (`L` or `R`)
    pub fn dir(&self) -> BidiClass {
        self.dir
    }

    /// Paragraph base direction, shared along the chain
    pub fn basic_dir(&self) -> BidiClass {
        self.basic_dir
    }

    pub fn is_override(&self) -> bool {
        self.is_override
    }

    /// Number of embeddings above the root
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.as_deref();
        while let Some(ctx) = current {
            depth += 1;
            current = ctx.parent.as_deref();
        }
        depth
    }
}

/// Resolver state carried from character to character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidiStatus {
    /// Direction at the end of the current run
    pub eor: BidiClass,
    /// Most recent strong type
    pub last_strong: BidiClass,
    /// Most recent resolved type
    pub last: BidiClass,
}

impl Default for BidiStatus {
    fn default() -> Self {
        Self {
            eor: BidiClass::ON,
            last_strong: BidiClass::ON,
            last: BidiClass::ON,
        }
    }
}

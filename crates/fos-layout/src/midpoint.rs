//! Collapsed-Whitespace Midpoints
//!
//! The line breaker records where collapsed whitespace starts and stops as
//! an alternating list of positions: even entries end a visible stretch
//! (inclusive), odd entries start the next one. Run construction consumes
//! the list with a cursor and a `between` flag.

use crate::iterator::BidiIterator;
use crate::layout_tree::{NodeId, RenderTree};

/// Position meaning "before the first character" of an object
pub const EXCLUDE_OBJECT: usize = usize::MAX;

/// One recorded position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Midpoint {
    pub obj: Option<NodeId>,
    pub pos: usize,
    /// The character at `pos` itself is skipped
    pub exclusive: bool,
}

impl Midpoint {
    fn iterator(&self, block: NodeId) -> BidiIterator {
        BidiIterator::new(block, self.obj, self.pos)
    }
}

/// Midpoint list of the line being built
#[derive(Debug, Clone, Default)]
pub struct Midpoints {
    points: Vec<Midpoint>,
    /// Next point run construction will look at
    pub(crate) current: usize,
    /// Inside collapsed whitespace
    pub(crate) between: bool,
}

impl Midpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Midpoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.current = 0;
        self.between = false;
    }

    /// Rewind the cursor for run construction
    pub(crate) fn reset_cursor(&mut self) {
        self.current = 0;
        self.between = false;
    }

    pub(crate) fn peek(&self) -> Option<Midpoint> {
        self.points.get(self.current).copied()
    }

    /// Record a position. A point on an inline flow is moved to the next
    /// object and made exclusive; it is dropped if nothing follows.
    pub fn add(&mut self, tree: &RenderTree, point: BidiIterator) {
        if let Some(obj) = point.obj {
            if tree.is_inline_flow(obj) && (tree.first_child(obj).is_some() || point.end_of_inline) {
                let mut next = point;
                next.increment(tree, None, true);
                if !next.at_end() {
                    self.points.push(Midpoint {
                        obj: next.obj,
                        pos: next.pos,
                        exclusive: true,
                    });
                }
                return;
            }
        }
        self.points.push(Midpoint {
            obj: point.obj,
            pos: point.pos,
            exclusive: false,
        });
    }

    /// Step the last point back one character
    pub fn retract_last(&mut self) {
        if let Some(last) = self.points.last_mut() {
            last.pos = retract(last.pos);
        }
    }

    /// Fix up an open whitespace span that reaches the break.
    ///
    /// When the break lies inside the span, the span's start is dropped
    /// and its end pulled back over the break character, unless the span
    /// ends before a soft hyphen.
    pub fn check(&mut self, tree: &RenderTree, line_break: &BidiIterator) {
        let count = self.points.len();
        if line_break.obj.is_none() || count == 0 || count % 2 != 0 {
            return;
        }

        let block = line_break.block;
        let endpoint = self.points[count - 2];
        let startpoint = self.points[count - 1].iterator(block);
        let mut current = endpoint.iterator(block);
        while !current.at_end() && current != startpoint && current != *line_break {
            current.increment(tree, None, true);
        }
        if current != *line_break {
            return;
        }

        // The break sits in the span: drop its start
        self.points.pop();
        let Some(obj) = endpoint.obj else {
            return;
        };
        if tree.style(obj).white_space.preserves_spaces() {
            return;
        }
        if tree.is_text(obj) {
            let soft_hyphen_next = endpoint.pos != EXCLUDE_OBJECT
                && tree.char_at(obj, endpoint.pos + 1) == Some(fos_text::SOFT_HYPHEN);
            if soft_hyphen_next {
                return;
            }
        }
        if let Some(last) = self.points.last_mut() {
            last.pos = retract(last.pos);
        }
    }

    /// Forget every point from the one at (`obj`, `pos`) on
    pub fn chop_at(&mut self, obj: NodeId, pos: usize) {
        if let Some(index) = self.points.iter().position(|p| p.obj == Some(obj) && p.pos == pos) {
            self.points.truncate(index);
        }
    }
}

fn retract(pos: usize) -> usize {
    match pos {
        0 | EXCLUDE_OBJECT => EXCLUDE_OBJECT,
        pos => pos - 1,
    }
}

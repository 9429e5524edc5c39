//! Floats
//!
//! Floats met by the line breaker are queued on the block and placed as
//! soon as they fit; placed floats narrow the lines beside them.

use fos_css::{Clear, Float};

use crate::box_model::Point;
use crate::inline::BlockFlow;
use crate::layout_tree::{NodeId, RenderTree};

/// A float registered with its containing block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatingObject {
    pub node: NodeId,
    pub side: Float,
    /// Left edge of the margin box
    pub left: i32,
    /// Margin box width
    pub width: i32,
    /// Top of the margin box, `None` until placed
    pub start_y: Option<i32>,
    pub end_y: i32,
    /// Border box position
    pub position: Point,
}

impl FloatingObject {
    fn covers(&self, y: i32) -> bool {
        self.start_y.is_some_and(|top| top <= y) && self.end_y > y
    }
}

impl BlockFlow {
    pub fn floats(&self) -> &[FloatingObject] {
        &self.floats
    }

    pub(crate) fn has_floats(&self) -> bool {
        !self.floats.is_empty()
    }

    /// Queue a float for placement
    pub(crate) fn insert_floating_object(&mut self, tree: &RenderTree, node: NodeId) {
        if self.floats.iter().any(|f| f.node == node) {
            return;
        }
        let style = tree.style(node);
        let (width, _) = tree.intrinsic_size(node);
        let side = if style.float == Float::Right { Float::Right } else { Float::Left };
        self.floats.push(FloatingObject {
            node,
            side,
            left: 0,
            width: width + style.margin.horizontal(),
            start_y: None,
            end_y: 0,
            position: Point::default(),
        });
    }

    /// Margin box width of a float
    pub(crate) fn float_width(tree: &RenderTree, node: NodeId) -> i32 {
        tree.intrinsic_size(node).0 + tree.style(node).margin.horizontal()
    }

    /// Place every queued float, in order, no higher than the line
    pub(crate) fn position_new_floats(&mut self, tree: &RenderTree) {
        let Some(last) = self.floats.last() else {
            return;
        };
        if last.start_y.is_some() {
            return;
        }

        let first_new = self
            .floats
            .iter()
            .rposition(|f| f.start_y.is_some())
            .map_or(0, |placed| placed + 1);
        let mut y = self.height;
        if let Some(top) = first_new.checked_sub(1).and_then(|i| self.floats[i].start_y) {
            y = y.max(top);
        }

        let lo = self.content_left;
        let ro = self.content_left + self.content_width;
        for index in first_new..self.floats.len() {
            let node = self.floats[index].node;
            let style = tree.style(node);
            let (width, height) = tree.intrinsic_size(node);
            let float_width = self.floats[index].width;
            let fwidth = float_width.min(ro - lo);

            if style.clear.clears_left() {
                y = y.max(self.left_bottom());
            }
            if style.clear.clears_right() {
                y = y.max(self.right_bottom());
            }

            let (left, position) = if self.floats[index].side == Float::Left {
                let (mut fx, mut remaining_left) = self.left_rel_offset(y, lo);
                loop {
                    let (rx, remaining_right) = self.right_rel_offset(y, ro);
                    if rx - fx >= fwidth {
                        break;
                    }
                    y += remaining_left.min(remaining_right);
                    (fx, remaining_left) = self.left_rel_offset(y, lo);
                }
                let fx = fx.max(0);
                (fx, Point::new(fx + style.margin.left, y + style.margin.top))
            } else {
                let (mut fx, mut remaining_right) = self.right_rel_offset(y, ro);
                loop {
                    let (lx, remaining_left) = self.left_rel_offset(y, lo);
                    if fx - lx >= fwidth {
                        break;
                    }
                    y += remaining_left.min(remaining_right);
                    (fx, remaining_right) = self.right_rel_offset(y, ro);
                }
                let fx = fx.max(float_width);
                (
                    fx - float_width,
                    Point::new(fx - style.margin.right - width, y + style.margin.top),
                )
            };

            let float = &mut self.floats[index];
            float.left = left;
            float.position = position;
            float.start_y = Some(y);
            float.end_y = y + height + style.margin.vertical();
            tracing::trace!(node = node.0, x = position.x, y = position.y, "float placed");
        }
    }

    /// Right edge of left floats at `y`, and how far down that holds
    fn left_rel_offset(&self, y: i32, fixed: i32) -> (i32, i32) {
        let mut left = fixed;
        let mut remaining = 1;
        for float in self.floats.iter().filter(|f| f.side == Float::Left && f.covers(y)) {
            if float.left + float.width > left {
                left = float.left + float.width;
                remaining = float.end_y - y;
            }
        }
        (left, remaining)
    }

    /// Left edge of right floats at `y`, and how far down that holds
    fn right_rel_offset(&self, y: i32, fixed: i32) -> (i32, i32) {
        let mut right = fixed;
        let mut remaining = 1;
        for float in self.floats.iter().filter(|f| f.side == Float::Right && f.covers(y)) {
            if float.left < right {
                right = float.left;
                remaining = float.end_y - y;
            }
        }
        (right, remaining)
    }

    pub fn left_offset(&self, y: i32) -> i32 {
        self.left_rel_offset(y, self.content_left).0
    }

    pub fn right_offset(&self, y: i32) -> i32 {
        self.right_rel_offset(y, self.content_left + self.content_width).0
    }

    /// Space between the floats at `y`
    pub fn line_width(&self, y: i32) -> i32 {
        (self.right_offset(y) - self.left_offset(y)).max(0)
    }

    /// Closest float bottom strictly below `y`
    pub(crate) fn nearest_float_bottom(&self, y: i32) -> Option<i32> {
        self.floats
            .iter()
            .filter(|f| f.start_y.is_some() && f.end_y > y)
            .map(|f| f.end_y)
            .min()
    }

    fn bottom_of(&self, side: Option<Float>) -> i32 {
        self.floats
            .iter()
            .filter(|f| f.start_y.is_some() && side.is_none_or(|s| f.side == s))
            .map(|f| f.end_y)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn left_bottom(&self) -> i32 {
        self.bottom_of(Some(Float::Left))
    }

    pub(crate) fn right_bottom(&self) -> i32 {
        self.bottom_of(Some(Float::Right))
    }

    pub(crate) fn lowest_float_bottom(&self) -> i32 {
        self.bottom_of(None)
    }

    /// Place pending floats and honor a pending `clear` from a line break
    pub(crate) fn new_line(&mut self, tree: &RenderTree) {
        self.position_new_floats(tree);
        let new_y = match self.clear_status {
            Clear::Left => self.left_bottom(),
            Clear::Right => self.right_bottom(),
            Clear::Both => self.lowest_float_bottom(),
            Clear::None => 0,
        };
        self.height = self.height.max(new_y);
        self.clear_status = Clear::None;
    }

    /// Move down past floats until `width_to_fit` fits, if it ever does;
    /// otherwise settle on the widest line found below them.
    pub(crate) fn fit_below_floats(&mut self, width_to_fit: i32, available: &mut i32) {
        let mut last_float_bottom = self.height;
        let mut new_width = *available;
        while let Some(bottom) = self.nearest_float_bottom(last_float_bottom) {
            new_width = self.line_width(bottom);
            last_float_bottom = bottom;
            if new_width >= width_to_fit {
                break;
            }
        }
        if new_width > *available {
            tracing::trace!(from = self.height, to = last_float_bottom, "line moved below floats");
            self.height = last_float_bottom;
            *available = new_width;
        }
    }
}

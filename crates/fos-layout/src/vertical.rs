//! Vertical Alignment
//!
//! Places the boxes of one line on a shared baseline. Every box first gets
//! a logical height from `line-height` and a baseline from its font; the
//! line is as tall as the largest ascent plus the largest descent, and
//! boxes aligned `top`/`bottom` are fitted in afterwards.

use fos_css::VerticalAlign;
use fos_text::{FontMetrics, TextMetrics};

use crate::box_model::Point;
use crate::config::LayoutConfig;
use crate::inline::BlockFlow;
use crate::layout_tree::{NodeId, RenderTree};
use crate::line_box::{BoxId, BoxKind};
use crate::resolver::BidiRun;

/// Where `vertical-align` puts a box relative to its parent's baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalHint {
    /// Pixels below the parent baseline (negative is above)
    Offset(i32),
    /// Top of the line
    Top,
    /// Bottom of the line
    Bottom,
}

/// Running maxima while measuring a line
#[derive(Debug, Default, Clone, Copy)]
struct Extents {
    max_position_top: i32,
    max_position_bottom: i32,
    max_ascent: i32,
    max_descent: i32,
}

impl RenderTree {
    fn font_metrics(&self, node: NodeId, metrics: &dyn TextMetrics) -> FontMetrics {
        metrics.font_metrics(self.style(node).font_size)
    }

    /// Logical height of an object's boxes
    pub(crate) fn line_height(&self, node: NodeId, metrics: &dyn TextMetrics) -> i32 {
        if self.is_replaced(node) {
            return self.intrinsic_size(node).1 + self.style(node).margin.vertical();
        }
        let fm = self.font_metrics(node, metrics);
        self.style(node).computed_line_height(fm.line_spacing())
    }

    /// Distance from the top of the logical box to the baseline
    pub(crate) fn baseline_position(&self, node: NodeId, metrics: &dyn TextMetrics) -> i32 {
        if self.is_replaced(node) {
            return self.line_height(node, metrics);
        }
        let fm = self.font_metrics(node, metrics);
        fm.ascent + (self.line_height(node, metrics) - fm.height()) / 2
    }

    /// Offset from `vertical-align`, accumulated through inline ancestors
    pub fn vertical_hint(&self, node: NodeId) -> VerticalHint {
        // Text and line breaks sit where their parent puts them
        if self.is_text(node) || self.is_br(node) {
            return match self.parent(node) {
                Some(parent) if !self.is_block(parent) => self.vertical_hint(parent),
                _ => VerticalHint::Offset(0),
            };
        }

        let align = self.style(node).vertical_align;
        match align {
            VerticalAlign::Top => return VerticalHint::Top,
            VerticalAlign::Bottom => return VerticalHint::Bottom,
            _ => {}
        }

        let parent = self.parent(node);
        let inherited = match parent.map(|p| self.vertical_hint_of_container(p)) {
            Some(VerticalHint::Offset(offset)) => offset,
            _ => 0,
        };
        let parent_font = parent.map_or(self.style(node).font_size, |p| self.style(p).font_size) as i32;
        VerticalHint::Offset(match align {
            VerticalAlign::Sub => inherited + parent_font / 5 + 1,
            VerticalAlign::Super => inherited - (parent_font / 3 + 1),
            _ => inherited,
        })
    }

    fn vertical_hint_of_container(&self, node: NodeId) -> VerticalHint {
        if self.is_inline_flow(node) {
            self.vertical_hint(node)
        } else {
            VerticalHint::Offset(0)
        }
    }

    /// Align the line rooted at `root` starting at `*block_height`, then
    /// grow the block by the line's height.
    pub(crate) fn vertically_align_boxes(
        &mut self,
        root: BoxId,
        block_height: &mut i32,
        metrics: &dyn TextMetrics,
        strict: bool,
    ) {
        let mut extents = Extents::default();
        self.compute_logical_box_heights(root, &mut extents, metrics, strict);

        if extents.max_ascent + extents.max_descent < extents.max_position_top.max(extents.max_position_bottom) {
            self.adjust_max_ascent_and_descent(root, &mut extents);
        }

        let max_height = extents.max_ascent + extents.max_descent;
        let mut top = *block_height;
        let mut bottom = *block_height;
        self.place_boxes_vertically(root, *block_height, max_height, extents.max_ascent, strict, &mut top, &mut bottom, metrics);

        if let Some(line) = self.arena[root].root_mut() {
            line.top_overflow = top;
            line.bottom_overflow = bottom;
        }
        if !strict {
            self.shrink_boxes_with_no_text_children(root, top, bottom);
        }
        *block_height += max_height;
    }

    fn compute_logical_box_heights(&mut self, id: BoxId, extents: &mut Extents, metrics: &dyn TextMetrics, strict: bool) {
        if self.arena[id].is_root() {
            let node = self.arena[id].node;
            let height = self.line_height(node, metrics);
            let baseline = self.baseline_position(node, metrics);
            let root = &mut self.arena[id];
            root.height = height;
            root.baseline = baseline;
            if root.has_text_children() || strict {
                extents.max_ascent = extents.max_ascent.max(baseline);
                extents.max_descent = extents.max_descent.max(height - baseline);
            }
        }

        let children: Vec<BoxId> = self.arena.children(id).collect();
        for child in children {
            let node = self.arena[child].node;
            if self.is_positioned(node) {
                continue;
            }
            let height = self.line_height(node, metrics);
            let baseline = self.baseline_position(node, metrics);
            let hint = self.vertical_hint(node);
            let inline_box = &mut self.arena[child];
            inline_box.height = height;
            inline_box.baseline = baseline;
            match hint {
                VerticalHint::Top => {
                    inline_box.y = 0;
                    extents.max_position_top = extents.max_position_top.max(height);
                }
                VerticalHint::Bottom => {
                    inline_box.y = 0;
                    extents.max_position_bottom = extents.max_position_bottom.max(height);
                }
                VerticalHint::Offset(offset) => {
                    inline_box.y = offset;
                    if inline_box.has_text_children() || strict {
                        let ascent = baseline - offset;
                        extents.max_ascent = extents.max_ascent.max(ascent);
                        extents.max_descent = extents.max_descent.max(height - ascent);
                    }
                }
            }

            if self.arena[child].is_flow() {
                self.compute_logical_box_heights(child, extents, metrics, strict);
            }
        }
    }

    /// Stretch the line for `top`/`bottom` aligned boxes taller than it
    fn adjust_max_ascent_and_descent(&self, id: BoxId, extents: &mut Extents) {
        let limit = extents.max_position_top.max(extents.max_position_bottom);
        for child in self.arena.children(id) {
            let inline_box = &self.arena[child];
            if self.is_positioned(inline_box.node) {
                continue;
            }
            let hint = self.vertical_hint(inline_box.node);
            if matches!(hint, VerticalHint::Top | VerticalHint::Bottom) {
                if extents.max_ascent + extents.max_descent < inline_box.height {
                    if hint == VerticalHint::Top {
                        extents.max_descent = inline_box.height - extents.max_ascent;
                    } else {
                        extents.max_ascent = inline_box.height - extents.max_descent;
                    }
                }
                if extents.max_ascent + extents.max_descent >= limit {
                    break;
                }
            }
            if inline_box.is_flow() {
                self.adjust_max_ascent_and_descent(child, extents);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place_boxes_vertically(
        &mut self,
        id: BoxId,
        y: i32,
        mut max_height: i32,
        max_ascent: i32,
        strict: bool,
        top: &mut i32,
        bottom: &mut i32,
        metrics: &dyn TextMetrics,
    ) {
        let node = self.arena[id].node;
        let is_root = self.arena[id].is_root();
        if is_root {
            let root = &mut self.arena[id];
            root.y = y + max_ascent - root.baseline;
            // line-height on the block is the minimum line height
            let minimum = self.line_height(node, metrics);
            if self.arena[id].has_text_children() && max_height < minimum {
                max_height = minimum;
            }
        }

        let children: Vec<BoxId> = self.arena.children(id).collect();
        for child in children {
            let child_node = self.arena[child].node;
            if self.is_positioned(child_node) {
                continue;
            }
            if self.arena[child].is_flow() {
                self.place_boxes_vertically(child, y, max_height, max_ascent, strict, top, bottom, metrics);
            }

            let mut affects_extent = true;
            {
                let hint = self.vertical_hint(child_node);
                let inline_box = &mut self.arena[child];
                inline_box.y = match hint {
                    VerticalHint::Top => y,
                    VerticalHint::Bottom => y + max_height - inline_box.height,
                    VerticalHint::Offset(_) => {
                        if !strict && !inline_box.has_text_descendant() {
                            affects_extent = false;
                        }
                        inline_box.y + y + max_ascent - inline_box.baseline
                    }
                };
            }

            let (mut new_y, mut new_height, mut new_baseline) = {
                let inline_box = &self.arena[child];
                (inline_box.y, inline_box.height, inline_box.baseline)
            };
            match self.arena[child].kind {
                BoxKind::Text(_) | BoxKind::LineBreak | BoxKind::Flow(_) => {
                    let fm = self.font_metrics(child_node, metrics);
                    // Trade the logical height for the font's own box
                    // when the half-leading exceeds the natural leading
                    if (fm.ascent - new_baseline).abs() > fm.line_gap / 2 {
                        let ascent = fm.ascent + fm.line_gap / 2;
                        new_y += new_baseline - ascent;
                        new_baseline = ascent;
                        new_height = fm.line_spacing();
                    }
                    if self.arena[child].is_flow() {
                        let style = self.style(child_node);
                        let top_edge = style.border_width.top + style.padding.top;
                        new_height += top_edge + style.border_width.bottom + style.padding.bottom;
                        new_y -= top_edge;
                        new_baseline += top_edge;
                    }
                }
                _ => {
                    let margin = &self.style(child_node).margin;
                    new_y += margin.top;
                    new_height -= margin.vertical();
                }
            }

            let inline_box = &mut self.arena[child];
            inline_box.y = new_y;
            inline_box.height = new_height;
            inline_box.baseline = new_baseline;
            if affects_extent {
                *top = (*top).min(new_y);
                *bottom = (*bottom).max(new_y + new_height);
            }
        }

        if is_root {
            let fm = self.font_metrics(node, metrics);
            let root = &mut self.arena[id];
            if (fm.ascent - root.baseline).abs() > fm.line_gap / 2 {
                let ascent = fm.ascent + fm.line_gap / 2;
                root.height = fm.line_spacing();
                root.y += root.baseline - ascent;
                root.baseline = ascent;
            }
            if root.has_text_descendant() || strict {
                *top = (*top).min(root.y);
                *bottom = (*bottom).max(root.y + root.height);
            }
        }
    }

    /// Quirks mode: flows without text do not stretch the line
    fn shrink_boxes_with_no_text_children(&mut self, id: BoxId, top: i32, bottom: i32) {
        let children: Vec<BoxId> = self.arena.children(id).collect();
        for child in children {
            if !self.is_positioned(self.arena[child].node) && self.arena[child].is_flow() {
                self.shrink_boxes_with_no_text_children(child, top, bottom);
            }
        }

        let inline_box = &mut self.arena[id];
        if !inline_box.has_text_descendant() {
            if inline_box.y < top {
                inline_box.y = top;
            }
            if inline_box.y + inline_box.height > bottom {
                inline_box.height = bottom - inline_box.y;
            }
            if inline_box.baseline > inline_box.height {
                inline_box.baseline = inline_box.height;
            }
        }
    }

    /// Align a constructed line vertically and record where its atomic
    /// and positioned objects ended up. Returns `true` when the line was
    /// pushed to a new page beside floats and has to be broken again.
    pub(crate) fn compute_vertical_positions(
        &mut self,
        block: NodeId,
        flow: &mut BlockFlow,
        root: BoxId,
        runs: &[BidiRun],
        metrics: &dyn TextMetrics,
        config: &LayoutConfig,
    ) -> bool {
        self.vertically_align_boxes(root, &mut flow.height, metrics, config.strict_mode);
        let after_page_break = self.arena[root].root().is_some_and(|line| line.after_page_break);
        if let Some(line) = self.arena[root].root_mut() {
            line.block_height = flow.height;
        }

        if let Some(pagination) = &config.pagination {
            if !after_page_break
                && self.clear_line_of_page_breaks(block, flow, root, pagination, metrics, config.strict_mode)
                && flow.has_floats()
            {
                return true;
            }
        }

        let bottom_of_line = self.arena[root].root().map_or(0, |line| line.bottom_overflow);
        if bottom_of_line > flow.height {
            flow.overflow.include_y(flow.overflow.y, bottom_of_line);
        }

        let mut before_content = true;
        for run in runs {
            let Some(id) = run.inline_box else {
                continue;
            };
            let obj = run.obj;
            if self.is_positioned(obj) {
                // A block-level placeholder before any content keeps the
                // y the breaker gave it; otherwise it goes below the line
                let y = match self.static_y(obj) {
                    Some(static_y) if before_content => static_y,
                    _ => flow.height,
                };
                self.arena[id].y = y;
                self.position_object(obj, id);
            } else {
                before_content = false;
                if self.is_replaced(obj) {
                    self.position_object(obj, id);
                }
            }
        }
        false
    }

    /// Copy a box position to its atomic or positioned object
    fn position_object(&mut self, obj: NodeId, id: BoxId) {
        let (x, y) = (self.arena[id].x, self.arena[id].y);
        if self.is_positioned(obj) {
            let was_inline = self.style(obj).display.is_inline_type();
            if was_inline && self.has_static_x(obj) {
                self.node_mut(obj).static_x = Some(x);
            } else if !was_inline && self.has_static_y(obj) {
                self.node_mut(obj).static_y = Some(y);
            }
        } else {
            self.node_mut(obj).position = Point::new(x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::BidiIterator;
    use fos_css::ComputedStyle;
    use fos_text::{BidiClass, BidiContext, MonospaceMetrics};

    fn run(obj: NodeId, stop: usize) -> BidiRun {
        BidiRun::new(obj, 0, stop, &BidiContext::root(false, false), BidiClass::L)
    }

    /// Build and vertically align a line of the given runs
    fn align(tree: &mut RenderTree, block: NodeId, objs: &[NodeId], strict: bool) -> (BoxId, i32) {
        let mut runs: Vec<BidiRun> = objs.iter().map(|&o| run(o, tree.length(o))).collect();
        let end = BidiIterator::new(block, None, 0);
        let root = tree.construct_line(block, &mut runs, &end).unwrap();
        let mut height = 0;
        tree.vertically_align_boxes(root, &mut height, &MonospaceMetrics::default(), strict);
        (root, height)
    }

    #[test]
    fn test_plain_text_line() {
        // 16px font: ascent 13, descent 3
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::block());
        let text = tree.create_text("abc");
        tree.append_child(block, text).unwrap();

        let (root, height) = align(&mut tree, block, &[text], true);
        assert_eq!(height, 16);
        assert_eq!(tree.arena[root].y, 0);
        assert_eq!(tree.arena[root].baseline, 13);
        let leaf = tree.leaf_boxes(root)[0];
        assert_eq!(tree.arena[leaf].y, 0);
        assert_eq!(tree.arena[leaf].height, 16);
        assert_eq!(tree.arena[root].root().map(|l| (l.top_overflow, l.bottom_overflow)), Some((0, 16)));
    }

    #[test]
    fn test_line_height_is_a_minimum() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::from_css("line-height: 30px").unwrap());
        let text = tree.create_text("abc");
        tree.append_child(block, text).unwrap();

        let (_, height) = align(&mut tree, block, &[text], true);
        assert_eq!(height, 30);
    }

    #[test]
    fn test_replaced_sits_on_baseline() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::block());
        let text = tree.create_text("a");
        let image = tree.create_replaced(10, 40, ComputedStyle::default());
        tree.append_child(block, text).unwrap();
        tree.append_child(block, image).unwrap();

        let (root, height) = align(&mut tree, block, &[text, image], true);
        // Image ascent 40 above the baseline, text descent 3 below
        assert_eq!(height, 43);
        let leaves = tree.leaf_boxes(root);
        assert_eq!(tree.arena[leaves[1]].y, 0);
        assert_eq!(tree.arena[leaves[0]].y, 27);
    }

    #[test]
    fn test_super_raises_text() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::block());
        let plain = tree.create_text("a");
        let sup = tree.create_inline(ComputedStyle::from_css("vertical-align: super").unwrap());
        let raised = tree.create_text("2");
        tree.append_child(block, plain).unwrap();
        tree.append_child(block, sup).unwrap();
        tree.append_child(sup, raised).unwrap();

        assert_eq!(tree.vertical_hint(raised), VerticalHint::Offset(-6));
        let (_, height) = align(&mut tree, block, &[plain, raised], true);
        assert_eq!(height, 22);
    }

    #[test]
    fn test_top_aligned_box_stretches_line() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::block());
        let text = tree.create_text("a");
        let image = tree.create_replaced(10, 50, ComputedStyle::from_css("vertical-align: top").unwrap());
        tree.append_child(block, text).unwrap();
        tree.append_child(block, image).unwrap();

        let (root, height) = align(&mut tree, block, &[text, image], true);
        assert_eq!(height, 50);
        assert_eq!(tree.arena[tree.leaf_boxes(root)[1]].y, 0);
    }

    #[test]
    fn test_quirks_shrinks_empty_flow() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::block());
        let text = tree.create_text("a");
        let span = tree.create_inline(ComputedStyle::from_css("font-size: 40px").unwrap());
        let image = tree.create_replaced(5, 5, ComputedStyle::default());
        tree.append_child(block, text).unwrap();
        tree.append_child(block, span).unwrap();
        tree.append_child(span, image).unwrap();

        let (root, height) = align(&mut tree, block, &[text, image], false);
        let span_box = tree.arena.children(root).nth(1).unwrap();
        let (top, bottom) = tree.arena[root].root().map(|l| (l.top_overflow, l.bottom_overflow)).unwrap();
        assert!(tree.arena[span_box].y >= top);
        assert!(tree.arena[span_box].y + tree.arena[span_box].height <= bottom);
        assert!(height >= 16);
    }
}

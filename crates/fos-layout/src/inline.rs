//! Inline Layout
//!
//! Lays out the inline content of one block container as a list of line
//! boxes. Each line is found by the line breaker, resolved into bidi runs,
//! built into a box tree and positioned; floats met on the way narrow the
//! lines beside them. A second call after an edit rebuilds only the dirty
//! lines when it can resynchronize with the clean ones after them.

use fos_css::{Clear, Direction, TextOverflow};
use fos_text::TextMetrics;
use serde::Serialize;

use crate::box_model::Rect;
use crate::config::LayoutConfig;
use crate::float::FloatingObject;
use crate::iterator::{first_object, next_object, BidiIterator};
use crate::layout_tree::{NodeId, NodeKind, RenderTree};
use crate::line_break::LineBreaker;
use crate::midpoint::Midpoints;
use crate::pagination::WidowsRetry;
use crate::resolver::{reorder_line, BidiState};
use crate::{LayoutError, Result};

/// Line width used when the block has no definite width
const UNCONSTRAINED_WIDTH: i32 = i32::MAX / 4;

/// Counters for one `layout_inline_children` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
    /// Lines built from scratch
    pub lines_built: usize,
    /// Clean lines reattached without being rebuilt
    pub lines_reused: usize,
    /// Lines thrown away
    pub lines_deleted: usize,
    /// Passes over the content, retries included
    pub passes: usize,
    /// Passes repeated for the widows rule
    pub retries: usize,
}

/// Inline layout state a block keeps between passes
#[derive(Debug, Clone, Default)]
pub struct BlockFlow {
    /// Block height so far; the full height after layout
    pub height: i32,
    /// Area covered by the block and everything spilling out of it
    pub overflow: Rect,
    pub(crate) floats: Vec<FloatingObject>,
    /// Clearance requested by a `<br>`, applied at the next line
    pub(crate) clear_status: Clear,
    pub(crate) needs_page_clear: bool,
    pub(crate) contains_page_break: bool,
    pub(crate) stats: LayoutStats,
    pub(crate) content_left: i32,
    pub(crate) content_width: i32,
    pub(crate) border_box_width: i32,
}

impl BlockFlow {
    /// The enclosing block should move this one to the next page
    pub fn needs_page_clear(&self) -> bool {
        self.needs_page_clear
    }

    /// A line was moved past a page boundary
    pub fn contains_page_break(&self) -> bool {
        self.contains_page_break
    }

    pub fn stats(&self) -> &LayoutStats {
        &self.stats
    }
}

/// What a block reports to its caller after inline layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutOutcome {
    pub height: i32,
    pub overflow: Rect,
    pub line_count: usize,
    /// The last pass rebuilt every line
    pub full_layout: bool,
    pub needs_page_clear: bool,
    pub contains_page_break: bool,
    pub stats: LayoutStats,
}

/// Where the widows rule wants the page break on a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakHint {
    None,
    BeforeLine(usize),
    /// The block moves as a whole; no line is pushed
    ClearBlock,
}

/// Inline formatting context: measurement and configuration for laying
/// out the inline content of blocks
pub struct InlineFormattingContext<'a> {
    metrics: &'a dyn TextMetrics,
    config: LayoutConfig,
}

impl<'a> InlineFormattingContext<'a> {
    pub fn new(metrics: &'a dyn TextMetrics, config: LayoutConfig) -> Self {
        Self { metrics, config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out the inline children of `block`
    pub fn layout(&self, tree: &mut RenderTree, block: NodeId, relayout_children: bool) -> Result<LayoutOutcome> {
        match tree.get(block).map(|node| &node.kind) {
            None => return Err(LayoutError::InvalidNode(block)),
            Some(NodeKind::Block) => {}
            Some(_) => return Err(LayoutError::NotABlock(block)),
        }

        let mut flow = tree.take_flow(block);
        flow.stats = LayoutStats::default();
        flow.needs_page_clear = false;
        flow.contains_page_break = false;

        let mut full_layout = self.run_pass(tree, block, &mut flow, relayout_children, BreakHint::None);

        if let Some(pagination) = &self.config.pagination {
            if flow.contains_page_break {
                let hint = match tree.check_widows(block, pagination) {
                    WidowsRetry::Keep => None,
                    WidowsRetry::BreakBefore(line) => Some(BreakHint::BeforeLine(line)),
                    WidowsRetry::ClearBlock => {
                        flow.needs_page_clear = true;
                        flow.contains_page_break = false;
                        Some(BreakHint::ClearBlock)
                    }
                };
                if let Some(hint) = hint {
                    tracing::debug!(block = block.0, ?hint, "widows rule broken, laying out again");
                    flow.stats.retries += 1;
                    full_layout = self.run_pass(tree, block, &mut flow, true, hint);
                }
            }
        }

        let outcome = LayoutOutcome {
            height: flow.height,
            overflow: flow.overflow,
            line_count: tree.lines(block).len(),
            full_layout,
            needs_page_clear: flow.needs_page_clear,
            contains_page_break: flow.contains_page_break,
            stats: flow.stats,
        };
        tree.restore_flow(block, flow);
        tree.node_mut(block).needs_layout = false;

        tracing::debug!(
            block = block.0,
            full_layout,
            height = outcome.height,
            lines = outcome.line_count,
            "inline layout done"
        );
        Ok(outcome)
    }

    /// One pass over the content. Returns whether every line was rebuilt.
    fn run_pass(
        &self,
        tree: &mut RenderTree,
        block: NodeId,
        flow: &mut BlockFlow,
        relayout_children: bool,
        hint: BreakHint,
    ) -> bool {
        let metrics = self.metrics;
        let config = &self.config;
        let max_level = config.max_embedding_level;
        flow.stats.passes += 1;

        let style = tree.style(block).clone();
        flow.content_left = style.border_width.left + style.padding.left;
        flow.content_width = style.width.unwrap_or(UNCONSTRAINED_WIDTH);
        flow.border_box_width = flow.content_width + style.padding.horizontal() + style.border_width.horizontal();
        flow.height = style.border_width.top + style.padding.top;
        flow.overflow = Rect::new(0, 0, if style.width.is_some() { flow.border_box_width } else { 0 }, 0);
        flow.clear_status = Clear::None;

        let full_layout = tree.lines(block).is_empty()
            || tree.first_child(block).is_none()
            || tree.node(block).needs_layout
            || relayout_children
            || flow.has_floats();
        flow.floats.clear();

        tracing::debug!(block = block.0, full_layout, passes = flow.stats.passes, "inline layout");

        let has_text_overflow = style.text_overflow == TextOverflow::Ellipsis && style.has_overflow_clip();
        if has_text_overflow {
            tree.clear_truncation(block);
        }

        self.dirty_changed_objects(tree, block, full_layout);

        let rtl = style.direction == Direction::Rtl;
        let mut bidi = BidiState::new(block, rtl, false);
        let start_position = tree.determine_start_position(block, flow, full_layout, &mut bidi, max_level);
        let mut end_lines = match start_position.first_dirty {
            Some(first) if !full_layout => tree.determine_end_position(block, first),
            _ => None,
        };

        // The dirty region is rebuilt from scratch
        if let Some(first) = start_position.first_dirty {
            let dirty: Vec<_> = tree.lines(block).iter().skip(first).copied().collect();
            flow.stats.lines_deleted += dirty.len();
            for line in dirty {
                tree.delete_line(line);
            }
        }

        let mut midpoints = Midpoints::new();
        let mut end = start_position.start;
        let mut previous_line_broke_at_br = start_position.previous_line_broke_at_br;
        let mut end_line_matched = false;
        let mut line_count = 0;

        'lines: while !end.at_end() {
            let mut start = end;
            if let Some(clean) = end_lines.as_mut() {
                if tree.matched_end_line(&start, &bidi, clean, config.resync_lookahead) {
                    end_line_matched = true;
                    break;
                }
            }

            line_count += 1;
            let old_height = flow.height;
            let old_start = start;
            let old_bidi = bidi.clone();
            let mut page_break_hint = false;
            if hint == BreakHint::BeforeLine(line_count) {
                if let Some(pagination) = &config.pagination {
                    flow.height = pagination.page_top_after(old_height);
                    page_break_hint = true;
                }
            }

            loop {
                midpoints.clear();
                let (line_end, result) = LineBreaker {
                    tree: &*tree,
                    block,
                    flow: &mut *flow,
                    midpoints: &mut midpoints,
                    metrics,
                    max_level,
                }
                .find_next_line_break(&mut start, &mut bidi, previous_line_broke_at_br);
                end = line_end;

                for position in &result.static_positions {
                    let node = tree.node_mut(position.node);
                    if position.x.is_some() {
                        node.static_x = position.x;
                    }
                    if position.y.is_some() {
                        node.static_y = position.y;
                    }
                }
                if start.at_end() {
                    break 'lines;
                }
                previous_line_broke_at_br = result.broke_at_br;
                if result.is_line_empty {
                    break;
                }

                tracing::trace!(
                    from = ?(start.obj, start.pos),
                    to = ?(end.obj, end.pos),
                    width = flow.line_width(flow.height),
                    "line break"
                );

                let visually_ordered = style.visually_ordered;
                let mut line = reorder_line(tree, &mut bidi, &mut midpoints, start, end, max_level, visually_ordered);

                // A lone preserved newline builds no box but still takes a line
                if start == end && end.obj.is_some_and(|obj| tree.is_text(obj)) && end.current(tree) == '\n' {
                    flow.height += tree.line_height(block, metrics);
                }

                let mut root = None;
                if let Some(line_box) = tree.construct_line(block, &mut line.runs, &end) {
                    if let Some(root_line) = tree.arena[line_box].root_mut() {
                        root_line.ends_with_break = previous_line_broke_at_br;
                        root_line.after_page_break = page_break_hint;
                    }
                    tree.compute_horizontal_positions(block, flow, line_box, &line.runs, line.num_spaces, &bidi, metrics);
                    let redo = tree.compute_vertical_positions(block, flow, line_box, &line.runs, metrics, config);
                    flow.stats.lines_built += 1;

                    if redo && !page_break_hint {
                        if let Some(pagination) = &config.pagination {
                            // Floats beside the line moved with the page
                            // break; break the line again from the page top
                            start = old_start;
                            bidi = old_bidi.clone();
                            flow.height = pagination.page_top_after(old_height);
                            tree.delete_line(line_box);
                            flow.stats.lines_built -= 1;
                            page_break_hint = true;
                            continue;
                        }
                    }
                    root = Some(line_box);
                }

                let ends_at_br = end.obj.is_some_and(|obj| tree.is_br(obj));
                let starts_at_br = start.obj.is_some_and(|obj| tree.is_br(obj));
                let at_preserved_newline = end
                    .obj
                    .is_some_and(|obj| tree.style(obj).white_space.preserves_newlines())
                    && end.current(tree) == '\n';
                if end == start || (ends_at_br && !starts_at_br) || at_preserved_newline {
                    let mut embeds = Vec::new();
                    end.increment(tree, Some(&mut embeds), true);
                    bidi.apply_embeddings(&embeds, max_level);
                }

                if let Some(line_box) = root {
                    if let Some(root_line) = tree.arena[line_box].root_mut() {
                        root_line.line_break.obj = end.obj;
                        root_line.line_break.pos = end.pos;
                        root_line.line_break.status = bidi.status;
                        root_line.line_break.context = Some(bidi.context.clone());
                    }
                }
                flow.new_line(tree);
                break;
            }
        }

        if let Some(clean) = end_lines {
            if end_line_matched {
                tree.reattach_end_lines(flow, clean);
            } else {
                tree.discard_end_lines(flow, clean);
            }
        }

        // A float on the last line may still be waiting
        flow.position_new_floats(tree);
        flow.height += style.border_width.bottom + style.padding.bottom;
        flow.overflow.include_y(0, flow.height);
        self.check_lines_for_overflow(tree, block, flow);
        if has_text_overflow {
            tree.check_lines_for_text_overflow(block, flow, metrics);
        }

        for float in flow.floats.iter().filter(|f| f.start_y.is_some()) {
            tree.node_mut(float.node).position = float.position;
        }
        full_layout
    }

    /// Dirty the lines of objects changed since the last pass
    fn dirty_changed_objects(&self, tree: &mut RenderTree, block: NodeId, full_layout: bool) {
        let mut objects = Vec::new();
        let mut current = first_object(tree, block, false, None);
        while let Some(obj) = current {
            objects.push(obj);
            current = next_object(tree, block, Some(obj), false, None, None);
        }

        for obj in objects {
            if tree.is_positioned(obj) {
                if full_layout {
                    for id in tree.boxes(obj).to_vec() {
                        tree.dirty_line_boxes(id);
                    }
                }
            } else if full_layout || tree.node(obj).needs_layout {
                tree.dirty_node_boxes(obj);
            }
            tree.node_mut(obj).needs_layout = false;
        }
    }

    /// Grow the overflow rect over every line, reused ones included
    fn check_lines_for_overflow(&self, tree: &RenderTree, block: NodeId, flow: &mut BlockFlow) {
        for &line in tree.lines(block) {
            let inline_box = &tree.arena[line];
            flow.overflow.include_x(inline_box.x, inline_box.x + inline_box.width);
            if let Some(root) = inline_box.root() {
                flow.overflow.include_y(root.top_overflow, root.bottom_overflow);
            }
        }
    }
}

/// Lay out the inline children of `block` with `metrics` and `config`.
///
/// Builds (or incrementally rebuilds) the block's line boxes, reachable
/// afterwards through `RenderTree::lines`, and returns the block height
/// and overflow.
pub fn layout_inline_children(
    tree: &mut RenderTree,
    block: NodeId,
    metrics: &dyn TextMetrics,
    config: &LayoutConfig,
    relayout_children: bool,
) -> Result<LayoutOutcome> {
    InlineFormattingContext::new(metrics, config.clone()).layout(tree, block, relayout_children)
}

/// Whether a direct inline child of a block needs a line box
pub fn inline_child_needs_line_box(tree: &RenderTree, child: NodeId) -> bool {
    let Some(block) = tree.parent(child) else {
        return false;
    };
    crate::line_break::requires_line_box(tree, &BidiIterator::new(block, Some(child), 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_css::ComputedStyle;
    use fos_text::MonospaceMetrics;

    fn block_style(css: &str) -> ComputedStyle {
        let mut style = ComputedStyle::block();
        style.apply_css(css).unwrap();
        style
    }

    fn layout(tree: &mut RenderTree, block: NodeId) -> LayoutOutcome {
        layout_inline_children(tree, block, &MonospaceMetrics::default(), &LayoutConfig::default(), false).unwrap()
    }

    fn line_texts(tree: &RenderTree, block: NodeId) -> Vec<String> {
        tree.lines(block)
            .iter()
            .map(|&line| {
                tree.leaf_boxes(line)
                    .into_iter()
                    .filter_map(|id| {
                        let inline_box = tree.inline_box(id)?;
                        let slice = inline_box.text()?;
                        Some(tree.text(inline_box.node)[slice.start..slice.end()].iter().collect::<String>())
                    })
                    .collect::<String>()
                    .trim()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_wraps_into_lines() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(block_style("width: 100px"));
        let text = tree.create_text("aaaa bbbb cccc");
        tree.append_child(block, text).unwrap();

        let outcome = layout(&mut tree, block);
        assert_eq!(outcome.line_count, 2);
        assert_eq!(outcome.height, 32);
        assert!(outcome.full_layout);
        assert_eq!(line_texts(&tree, block), vec!["aaaa bbbb".to_string(), "cccc".to_string()]);
        assert_eq!(outcome.stats.lines_built, 2);
    }

    #[test]
    fn test_padding_and_border_offset_lines() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(block_style("width: 100px; padding: 5px; border-width: 2px"));
        let text = tree.create_text("abc");
        tree.append_child(block, text).unwrap();

        let outcome = layout(&mut tree, block);
        let line = tree.lines(block)[0];
        let root = tree.inline_box(line).unwrap();
        assert_eq!(root.x, 7);
        assert_eq!(root.y, 7);
        assert_eq!(outcome.height, 7 + 16 + 7);
    }

    #[test]
    fn test_not_a_block() {
        let mut tree = RenderTree::new();
        let text = tree.create_text("abc");
        let metrics = MonospaceMetrics::default();
        let config = LayoutConfig::default();
        assert!(matches!(
            layout_inline_children(&mut tree, text, &metrics, &config, false),
            Err(LayoutError::NotABlock(_))
        ));
        assert!(matches!(
            layout_inline_children(&mut tree, NodeId(42), &metrics, &config, false),
            Err(LayoutError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_br_lines_end_with_break() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(block_style("width: 200px"));
        let first = tree.create_text("one");
        let br = tree.create_line_break(ComputedStyle::default());
        let second = tree.create_text("two");
        tree.append_child(block, first).unwrap();
        tree.append_child(block, br).unwrap();
        tree.append_child(block, second).unwrap();

        let outcome = layout(&mut tree, block);
        assert_eq!(outcome.line_count, 2);
        let lines = tree.lines(block);
        let first_line = tree.inline_box(lines[0]).and_then(|b| b.root()).unwrap();
        assert!(first_line.ends_with_break);
        assert_eq!(first_line.line_break.obj, Some(second));
        assert_eq!(line_texts(&tree, block), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_float_narrows_first_line() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(block_style("width: 100px"));
        let float = tree.create_float(40, 20, ComputedStyle::from_css("float: left").unwrap());
        let text = tree.create_text("aaa bbb ccc");
        tree.append_child(block, float).unwrap();
        tree.append_child(block, text).unwrap();

        let outcome = layout(&mut tree, block);
        let lines = tree.lines(block);
        assert_eq!(tree.inline_box(lines[0]).unwrap().x, 40);
        assert_eq!(tree.position(float), crate::box_model::Point::new(0, 0));
        assert_eq!(line_texts(&tree, block)[0], "aaa");
        assert!(outcome.line_count >= 2);
    }

    #[test]
    fn test_second_layout_rebuilds_only_last_line() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(block_style("width: 100px"));
        let text = tree.create_text("aaaa bbbb cccc");
        tree.append_child(block, text).unwrap();

        let first = layout(&mut tree, block);
        let first_line = tree.lines(block)[0];
        let second = layout(&mut tree, block);
        assert!(!second.full_layout);
        // The last line did not end at a <br>, so it is broken again
        assert_eq!(second.stats.lines_built, 1);
        assert_eq!(second.height, first.height);
        assert_eq!(tree.lines(block)[0], first_line);
        assert_eq!(line_texts(&tree, block), vec!["aaaa bbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_inline_child_needs_line_box() {
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::block());
        let blank = tree.create_text("   ");
        let word = tree.create_text("x");
        tree.append_child(block, blank).unwrap();
        tree.append_child(block, word).unwrap();
        assert!(!inline_child_needs_line_box(&tree, blank));
        assert!(inline_child_needs_line_box(&tree, word));
    }
}

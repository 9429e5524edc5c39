//! Horizontal Placement
//!
//! Measures the runs of a constructed line, applies `text-align` and
//! justification, and assigns x positions and widths to every box. Text
//! overflow truncation (`text-overflow: ellipsis`) also lives here since
//! it only moves things horizontally.

use fos_css::{Direction, TextAlign};
use fos_text::{is_justification_space, BidiClass, TextMetrics};

use crate::inline::BlockFlow;
use crate::layout_tree::{NodeId, RenderTree};
use crate::line_box::{BoxId, BoxKind, EllipsisBox, Truncation};
use crate::line_break::text_width;
use crate::resolver::{BidiRun, BidiState};

/// U+2026, drawn where a line is cut
pub const ELLIPSIS: char = '\u{2026}';

impl RenderTree {
    /// Measure runs and place the line's boxes horizontally
    pub(crate) fn compute_horizontal_positions(
        &mut self,
        block: NodeId,
        flow: &mut BlockFlow,
        root: BoxId,
        runs: &[BidiRun],
        mut num_spaces: usize,
        bidi: &BidiState,
        metrics: &dyn TextMetrics,
    ) {
        let mut total_width = self.flow_spacing_width(root);
        for run in runs {
            let Some(id) = run.inline_box else {
                continue;
            };
            if self.is_positioned(run.obj) {
                // Placeholders only carry a static position
                continue;
            }
            let width = if self.is_text(run.obj) {
                text_width(self, metrics, run.obj, run.start, run.stop)
            } else if self.is_br(run.obj) {
                0
            } else {
                total_width += self.style(run.obj).margin.horizontal();
                self.intrinsic_size(run.obj).0
            };
            self.arena[id].width = width;
            total_width += width;
        }

        let style = self.style(block);
        let rtl = style.direction == Direction::Rtl;
        let mut x = flow.left_offset(flow.height);
        let available = flow.line_width(flow.height);

        let ends_paragraph_line = bidi.current.obj.is_none_or(|obj| self.is_br(obj));
        let align = match style.text_align {
            TextAlign::Justify if num_spaces != 0 && !ends_paragraph_line => TextAlign::Justify,
            TextAlign::Justify | TextAlign::Auto => {
                if bidi.context.basic_dir() == BidiClass::L {
                    TextAlign::Left
                } else {
                    TextAlign::Right
                }
            }
            other => other,
        };
        match align {
            TextAlign::Left | TextAlign::KhtmlLeft => {
                if rtl && total_width > available {
                    x -= total_width - available;
                }
                num_spaces = 0;
            }
            TextAlign::Right | TextAlign::KhtmlRight => {
                if rtl || total_width < available {
                    x += available - total_width;
                }
                num_spaces = 0;
            }
            TextAlign::Center | TextAlign::KhtmlCenter => {
                x += ((available - total_width) / 2).max(0);
                num_spaces = 0;
            }
            _ => {}
        }

        if num_spaces > 0 {
            for run in runs {
                if num_spaces == 0 {
                    break;
                }
                if !self.is_text(run.obj) {
                    continue;
                }
                let spaces = self.text(run.obj)[run.start..run.stop]
                    .iter()
                    .filter(|&&c| is_justification_space(c))
                    .count();
                if spaces > 0 && !self.style(run.obj).white_space.preserves_spaces() {
                    let extra = i64::from(available - total_width) * spaces as i64 / num_spaces as i64;
                    let space_add = (extra as i32).max(0);
                    if let Some(id) = run.inline_box {
                        let inline_box = &mut self.arena[id];
                        inline_box.width += space_add;
                        if let Some(slice) = inline_box.text_mut() {
                            slice.space_add = space_add;
                        }
                    }
                    total_width += space_add;
                }
                num_spaces -= spaces;
            }
        }

        let right = self.place_boxes_horizontally(root, x, flow.border_box_width);
        flow.overflow.include_x(x.min(0), right);
    }

    /// Assign x positions below `id` starting at `x`; returns the right edge.
    /// Placeholders in right-to-left flows measure from `block_width`.
    pub(crate) fn place_boxes_horizontally(&mut self, id: BoxId, mut x: i32, block_width: i32) -> i32 {
        self.arena[id].x = x;
        let start_x = x;
        let node = self.arena[id].node;
        if !self.arena[id].is_root() {
            let style = self.style(node);
            if self.arena[id].include_left_edge() {
                x += style.border_width.left + style.padding.left;
            }
        }

        let children: Vec<BoxId> = self.arena.children(id).collect();
        for child in children {
            let child_node = self.arena[child].node;
            match self.arena[child].kind {
                BoxKind::Text(_) | BoxKind::LineBreak => {
                    self.arena[child].x = x;
                    x += self.arena[child].width;
                }
                BoxKind::Placeholder => {
                    let parent_ltr = self
                        .parent(child_node)
                        .is_none_or(|p| self.style(p).direction == Direction::Ltr);
                    self.arena[child].x = if parent_ltr { x } else { block_width - x };
                }
                BoxKind::Flow(_) => {
                    let margin = &self.style(child_node).margin;
                    let (left, right) = (margin.left, margin.right);
                    if self.arena[child].include_left_edge() {
                        x += left;
                    }
                    x = self.place_boxes_horizontally(child, x, block_width);
                    if self.arena[child].include_right_edge() {
                        x += right;
                    }
                }
                BoxKind::Replaced | BoxKind::Root(_) => {
                    let (left, right) = {
                        let margin = &self.style(child_node).margin;
                        (margin.left, margin.right)
                    };
                    x += left;
                    self.arena[child].x = x;
                    x += self.arena[child].width + right;
                }
            }
        }

        if !self.arena[id].is_root() && self.arena[id].include_right_edge() {
            let style = self.style(node);
            x += style.border_width.right + style.padding.right;
        }
        self.arena[id].width = x - start_x;
        x
    }

    /// Drop ellipses and truncation left from an earlier pass
    pub(crate) fn clear_truncation(&mut self, block: NodeId) {
        for root in self.node(block).boxes.clone() {
            let had_ellipsis = self.arena[root].root_mut().and_then(|line| line.ellipsis.take()).is_some();
            if !had_ellipsis {
                continue;
            }
            for id in self.line_box_ids(root) {
                if let Some(slice) = self.arena[id].text_mut() {
                    slice.truncation = Truncation::None;
                }
            }
        }
    }

    /// Place an ellipsis on every line spilling past the block's end edge
    pub(crate) fn check_lines_for_text_overflow(&mut self, block: NodeId, flow: &BlockFlow, metrics: &dyn TextMetrics) {
        let style = self.style(block);
        let ellipsis_width = metrics.char_width(ELLIPSIS, style.font_size);
        let ltr = style.direction == Direction::Ltr;

        for root in self.node(block).boxes.clone() {
            let (x, y, width) = {
                let line = &self.arena[root];
                (line.x, line.y, line.width)
            };
            let block_edge = if ltr { flow.right_offset(y) } else { flow.left_offset(y) };
            let line_edge = if ltr { x + width } else { x };
            let spills = if ltr { line_edge > block_edge } else { line_edge < block_edge };
            if spills && self.can_accommodate_ellipsis(root, ltr, block_edge, line_edge, ellipsis_width) {
                self.place_ellipsis(root, ltr, block_edge, ellipsis_width, metrics);
            }
        }
    }

    fn can_accommodate_ellipsis(&self, root: BoxId, ltr: bool, block_edge: i32, line_edge: i32, ellipsis_width: i32) -> bool {
        let delta = if ltr { line_edge - block_edge } else { block_edge - line_edge };
        if self.arena[root].width - delta < ellipsis_width {
            return false;
        }

        // Replaced content under the ellipsis cannot be cut
        let ellipsis_left = if ltr { block_edge - ellipsis_width } else { block_edge };
        let ellipsis_right = ellipsis_left + ellipsis_width;
        self.line_box_ids(root).into_iter().all(|id| {
            let inline_box = &self.arena[id];
            !matches!(inline_box.kind, BoxKind::Replaced)
                || inline_box.x + inline_box.width <= ellipsis_left
                || inline_box.x >= ellipsis_right
        })
    }

    fn place_ellipsis(&mut self, root: BoxId, ltr: bool, block_edge: i32, ellipsis_width: i32, metrics: &dyn TextMetrics) {
        let (line_x, line_y, line_width, line_height, baseline) = {
            let line = &self.arena[root];
            (line.x, line.y, line.width, line.height, line.baseline)
        };

        let x = if ltr && line_x + line_width + ellipsis_width <= block_edge {
            line_x + line_width
        } else {
            let mut found = false;
            let mut placed = None;
            for id in self.leaf_boxes(root) {
                if let Some(at) = self.place_ellipsis_on_text(id, ltr, block_edge, ellipsis_width, &mut found, metrics) {
                    placed.get_or_insert(at);
                }
            }
            placed.unwrap_or(if ltr { block_edge - ellipsis_width } else { block_edge })
        };

        tracing::trace!(line = root.0, x, "ellipsis placed");
        if let Some(line) = self.arena[root].root_mut() {
            line.ellipsis = Some(EllipsisBox {
                x,
                y: line_y,
                width: ellipsis_width,
                height: line_height,
                baseline,
            });
        }
    }

    /// Truncate one text box against the ellipsis; returns the ellipsis x
    /// when this box decides it.
    fn place_ellipsis_on_text(
        &mut self,
        id: BoxId,
        ltr: bool,
        block_edge: i32,
        ellipsis_width: i32,
        found: &mut bool,
        metrics: &dyn TextMetrics,
    ) -> Option<i32> {
        let (node, x, width, level, slice) = {
            let inline_box = &self.arena[id];
            let slice = *inline_box.text()?;
            (inline_box.node, inline_box.x, inline_box.width, inline_box.level, slice)
        };
        if *found {
            self.set_truncation(id, Truncation::Full);
            return None;
        }
        if !ltr {
            return None;
        }

        let ellipsis_x = block_edge - ellipsis_width;
        if ellipsis_x <= x {
            self.set_truncation(id, Truncation::Full);
            *found = true;
            return None;
        }
        if ellipsis_x >= x + width || level.is_rtl() {
            return None;
        }

        *found = true;
        let font_size = self.style(node).font_size;
        let chars = &self.text(node)[slice.start..slice.end().min(self.length(node))];
        let mut kept = 0;
        let mut used = 0;
        for &c in chars {
            let advance = metrics.char_width(c, font_size);
            if x + used + advance > ellipsis_x {
                break;
            }
            used += advance;
            kept += 1;
        }

        if kept == 0 {
            self.set_truncation(id, Truncation::Full);
            return Some(ellipsis_x.min(x));
        }
        self.set_truncation(id, Truncation::Partial { kept });
        Some(x + used)
    }

    fn set_truncation(&mut self, id: BoxId, truncation: Truncation) {
        if let Some(slice) = self.arena[id].text_mut() {
            slice.truncation = truncation;
        }
    }
}

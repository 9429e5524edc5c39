//! Page Breaks
//!
//! In paged mode a line may not straddle a page boundary. A crossing line
//! is moved to the top of the next page unless `page-break-inside: avoid`
//! or the orphans count asks the enclosing block to move instead. After a
//! pass the widows count is checked and the block laid out again, once,
//! with a hint saying where the page break should fall.

use fos_css::PageBreakInside;
use fos_text::TextMetrics;

use crate::config::Pagination;
use crate::inline::BlockFlow;
use crate::layout_tree::{NodeId, RenderTree};
use crate::line_box::BoxId;

/// What the widows check asks of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidowsRetry {
    /// The break is acceptable
    Keep,
    /// Lay out again with the page break before this line (1-based)
    BreakBefore(usize),
    /// Lay out again without breaking; the enclosing block moves instead
    ClearBlock,
}

impl RenderTree {
    /// Move `root` past a page boundary it crosses. Returns whether the
    /// line was moved.
    pub(crate) fn clear_line_of_page_breaks(
        &mut self,
        block: NodeId,
        flow: &mut BlockFlow,
        root: BoxId,
        pagination: &Pagination,
        metrics: &dyn TextMetrics,
        strict: bool,
    ) -> bool {
        let Some((top, bottom)) = self.arena[root].root().map(|l| (l.top_overflow, l.bottom_overflow)) else {
            return false;
        };
        if !pagination.crosses_page_break(top, bottom) {
            return false;
        }

        let style = self.style(block);
        let wanted_orphans = style.orphans as usize;
        let avoid_inside = style.page_break_inside == PageBreakInside::Avoid;

        let mut do_page_break = true;
        if avoid_inside && pagination.can_clear_normal {
            flow.needs_page_clear = true;
            do_page_break = false;
        }

        let index = self.node(block).boxes.iter().position(|&b| b == root).unwrap_or(0);
        let orphans = index.min(wanted_orphans);
        if orphans == 0 {
            flow.needs_page_clear = true;
            do_page_break = false;
        } else if orphans < wanted_orphans && pagination.can_clear_harder {
            flow.needs_page_clear = true;
            do_page_break = false;
        }

        if !do_page_break {
            tracing::debug!(block = block.0, line = index, "page break left to the enclosing block");
            return false;
        }

        let line_y = self.arena[root].y;
        let page_top = pagination.page_top_after(line_y);
        tracing::debug!(block = block.0, from = line_y, to = page_top, "line moved past page break");
        flow.height = page_top;
        if let Some(line) = self.arena[root].root_mut() {
            line.after_page_break = true;
        }
        self.vertically_align_boxes(root, &mut flow.height, metrics, strict);

        // The line can come out above the page top when its root box is
        // shifted up by the leading adjustment
        let line_y = self.arena[root].y;
        if line_y < page_top {
            flow.height = page_top + (page_top - line_y);
            self.vertically_align_boxes(root, &mut flow.height, metrics, strict);
        }
        if let Some(line) = self.arena[root].root_mut() {
            line.block_height = flow.height;
        }
        flow.contains_page_break = true;
        true
    }

    /// Check the widows rule on the lines after the first page break
    pub(crate) fn check_widows(&self, block: NodeId, pagination: &Pagination) -> WidowsRetry {
        let lines = &self.node(block).boxes;
        let Some(breaker) = lines
            .iter()
            .position(|&line| self.arena[line].root().is_some_and(|l| l.after_page_break))
        else {
            return WidowsRetry::Keep;
        };

        let style = self.style(block);
        let wanted_widows = style.widows as usize;
        let wanted_orphans = style.orphans as usize;
        let orphans = breaker;
        let widows = lines[breaker..]
            .iter()
            .filter(|&&line| self.arena[line].has_text_children())
            .take(wanted_widows)
            .count();

        if widows >= wanted_widows || orphans == 0 {
            return WidowsRetry::Keep;
        }

        let missing = wanted_widows - widows;
        match orphans.checked_sub(missing) {
            Some(new_orphans) if new_orphans >= wanted_orphans => WidowsRetry::BreakBefore(new_orphans + 1),
            _ if pagination.can_clear_harder => WidowsRetry::ClearBlock,
            _ => WidowsRetry::Keep,
        }
    }
}

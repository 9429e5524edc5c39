//! Line Breaking
//!
//! Finds where the line starting at a given position ends. The breaker
//! skips leading content that needs no line box, then walks objects
//! accumulating committed width (`w`, up to the last break opportunity)
//! and pending width (`tmp_w`, since then). It records collapsed
//! whitespace as midpoints, queues floats and records the static position
//! of positioned boxes along the way. The result is the first position of
//! the next line.

use fos_css::{Direction, WhiteSpace, WordWrap};
use fos_text::{is_breakable, is_justification_space, TextMetrics, SOFT_HYPHEN, ZERO_WIDTH_SPACE};

use crate::inline::BlockFlow;
use crate::iterator::{BidiIterator, InlineWalker};
use crate::layout_tree::{NodeId, RenderTree};
use crate::midpoint::{Midpoints, EXCLUDE_OBJECT};
use crate::resolver::BidiState;

/// Static position found for a positioned box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPosition {
    pub node: NodeId,
    pub x: Option<i32>,
    pub y: Option<i32>,
}

/// What the breaker learned about the line it measured
#[derive(Debug, Clone, Default)]
pub struct LineBreakResult {
    /// Nothing on the line needs a line box
    pub is_line_empty: bool,
    /// The line ended at a `<br>`
    pub broke_at_br: bool,
    pub static_positions: Vec<StaticPosition>,
}

/// Margin, border and padding an inline flow adds on the side being
/// entered (or left, at its end)
pub fn border_padding_margin(tree: &RenderTree, flow: NodeId, end_of_inline: bool) -> i32 {
    let style = tree.style(flow);
    let left_side = if style.direction == Direction::Ltr { !end_of_inline } else { end_of_inline };
    if left_side { style.left_bpm() } else { style.right_bpm() }
}

/// Whether the object under `it` makes a line non-empty
pub fn requires_line_box(tree: &RenderTree, it: &BidiIterator) -> bool {
    let Some(obj) = it.obj else {
        return false;
    };
    if tree.is_floating_or_positioned(obj) {
        return false;
    }
    if tree.is_inline_flow(obj) {
        return border_padding_margin(tree, obj, it.end_of_inline) != 0;
    }
    if tree.is_text(obj) && tree.text(obj).is_empty() {
        return false;
    }
    if tree.style(obj).white_space.preserves_spaces() || tree.is_br(obj) {
        return true;
    }
    !matches!(it.current(tree), '\t' | '\n' | '\u{c}' | ' ' | ZERO_WIDTH_SPACE)
}

/// Width a text box shows for `[start, stop)`; a trailing soft hyphen
/// is drawn as a hyphen.
pub fn text_width(tree: &RenderTree, metrics: &dyn TextMetrics, node: NodeId, start: usize, stop: usize) -> i32 {
    let text = tree.text(node);
    let stop = stop.min(text.len());
    if start >= stop {
        return 0;
    }
    let font_size = tree.style(node).font_size;
    let mut width = metrics.text_width(&text[start..stop], font_size);
    if text[stop - 1] == SOFT_HYPHEN {
        width += metrics.char_width('-', font_size);
    }
    width
}

/// Mutable state of one `find_next_line_break` call
struct BreakState {
    width: i32,
    w: i32,
    tmp_w: i32,
    l_break: BidiIterator,
    it: InlineWalker,
    last_it: InlineWalker,
    pos: usize,
    ignoring_spaces: bool,
    ignore_start: BidiIterator,
    current_is_space: bool,
    check_initial_ws: bool,
    floats_fit: bool,
    trailing_space_object: Option<NodeId>,
    is_line_empty: bool,
}

/// How the object loop goes on
enum Step {
    /// Look at the next object
    Continue,
    /// The line is full; apply the end-of-line fixups
    Break,
    /// A preserved newline ends the line exactly here
    Forced(BidiIterator),
}

pub(crate) struct LineBreaker<'a> {
    pub tree: &'a RenderTree,
    pub block: NodeId,
    pub flow: &'a mut BlockFlow,
    pub midpoints: &'a mut Midpoints,
    pub metrics: &'a dyn TextMetrics,
    pub max_level: u8,
}

impl LineBreaker<'_> {
    pub fn find_next_line_break(
        &mut self,
        start: &mut BidiIterator,
        bidi: &mut BidiState,
        previous_line_broke_cleanly: bool,
    ) -> (BidiIterator, LineBreakResult) {
        let tree = self.tree;
        let mut result = LineBreakResult {
            is_line_empty: true,
            ..LineBreakResult::default()
        };
        let mut width = self.flow.line_width(self.flow.height);

        // Skip leading content that needs no line box
        let saved_context = bidi.context.clone();
        let mut pos_start = *start;
        let mut had_pos_start = false;
        let mut embeds = Vec::new();
        while !start.at_end() && !requires_line_box(tree, start) {
            if let Some(obj) = start.obj {
                if tree.is_floating(obj) {
                    self.flow.insert_floating_object(tree, obj);
                    self.flow.position_new_floats(tree);
                    width = self.flow.line_width(self.flow.height);
                } else if tree.is_pos_with_static_dim(obj) {
                    let point = BidiIterator::new(self.block, Some(obj), 0);
                    if !had_pos_start {
                        had_pos_start = true;
                        pos_start = *start;
                        self.midpoints.add(tree, point);
                    } else {
                        self.midpoints.add(tree, point);
                        self.midpoints.add(tree, point);
                    }
                    let (static_position, _, _) = self.static_position(obj);
                    result.static_positions.push(static_position);
                }
            }
            embeds.clear();
            start.increment(tree, Some(&mut embeds), false);
            bidi.apply_embeddings(&embeds, self.max_level);
        }

        if had_pos_start && !start.at_end() {
            self.midpoints.add(tree, *start);
        }

        if start.at_end() {
            if had_pos_start {
                *start = pos_start;
                bidi.context = saved_context;
                let mut end = pos_start;
                end.increment(tree, None, true);
                return (end, result);
            }
            return (*start, result);
        }

        let it = InlineWalker::new(self.block, start.obj, start.end_of_inline, false);
        let mut st = BreakState {
            width,
            w: 0,
            tmp_w: 0,
            l_break: *start,
            it,
            last_it: it,
            pos: start.pos,
            ignoring_spaces: false,
            ignore_start: BidiIterator::new(self.block, None, 0),
            current_is_space: false,
            check_initial_ws: false,
            floats_fit: true,
            trailing_space_object: None,
            is_line_empty: true,
        };

        let mut hit_break = false;
        while let Some(obj) = st.it.current {
            let step = if tree.is_br(obj) {
                self.on_line_break(&mut st, obj, previous_line_broke_cleanly, &mut result)
            } else if tree.is_floating(obj) {
                self.flow.insert_floating_object(tree, obj);
                if st.floats_fit && BlockFlow::float_width(tree, obj) + st.w + st.tmp_w <= st.width {
                    self.flow.position_new_floats(tree);
                    st.width = self.flow.line_width(self.flow.height);
                } else {
                    st.floats_fit = false;
                }
                Step::Continue
            } else if tree.is_positioned(obj) {
                if tree.is_pos_with_static_dim(obj) {
                    let (static_position, inline_x, block_y) = self.static_position(obj);
                    result.static_positions.push(static_position);
                    if inline_x || block_y {
                        st.trailing_space_object = None;
                        st.ignore_start = BidiIterator::new(self.block, Some(obj), 0);
                        if st.ignoring_spaces {
                            self.midpoints.add(tree, st.ignore_start);
                            self.midpoints.add(tree, st.ignore_start);
                        }
                    }
                }
                Step::Continue
            } else if tree.is_inline_flow(obj) {
                st.tmp_w += border_padding_margin(tree, obj, st.it.end_of_inline);
                if st.is_line_empty {
                    st.is_line_empty = st.tmp_w == 0;
                }
                if tree.is_word_break(obj) {
                    st.w += st.tmp_w;
                    st.tmp_w = 0;
                    st.l_break = BidiIterator::new(self.block, Some(obj), 0).with_end_of_inline(st.it.end_of_inline);
                } else if !st.it.end_of_inline {
                    st.check_initial_ws = true;
                }
                Step::Continue
            } else if tree.is_replaced(obj) {
                self.on_replaced(&mut st, obj);
                Step::Continue
            } else if tree.is_text(obj) {
                self.on_text(&mut st, obj)
            } else {
                Step::Continue
            };

            match step {
                Step::Continue => {}
                Step::Break => {
                    hit_break = true;
                    break;
                }
                Step::Forced(line_break) => {
                    result.is_line_empty = st.is_line_empty;
                    return (line_break, result);
                }
            }

            if let Step::Break = self.look_ahead(&mut st) {
                hit_break = true;
                break;
            }
        }

        if !hit_break {
            let last_auto_wrap = st
                .last_it
                .current
                .is_none_or(|last| tree.style(last).white_space.auto_wrap());
            if st.w + st.tmp_w <= st.width || !last_auto_wrap {
                st.l_break = BidiIterator::new(self.block, None, 0);
            }
        }

        let line_break = self.finish(&mut st, start, pos_start, had_pos_start, bidi, saved_context);
        result.is_line_empty = st.is_line_empty;
        (line_break, result)
    }

    fn on_line_break(
        &mut self,
        st: &mut BreakState,
        obj: NodeId,
        previous_line_broke_cleanly: bool,
        result: &mut LineBreakResult,
    ) -> Step {
        if st.w + st.tmp_w <= st.width {
            st.l_break = BidiIterator::new(self.block, Some(obj), 0).with_end_of_inline(st.it.end_of_inline);
            // A <br> alone on a line still takes up space
            if previous_line_broke_cleanly {
                st.is_line_empty = false;
            }
            st.trailing_space_object = None;
            result.broke_at_br = true;
            if !st.is_line_empty {
                let clear = self.tree.style(obj).clear;
                self.flow.clear_status = self.flow.clear_status.union(clear);
            }
        }
        Step::Break
    }

    fn on_replaced(&mut self, st: &mut BreakState, obj: NodeId) {
        let tree = self.tree;
        let current_ws = tree.style(obj).white_space;
        let last_ws = st.last_it.current.map_or(current_ws, |last| tree.style(last).white_space);
        if current_ws == WhiteSpace::Normal || last_ws == WhiteSpace::Normal {
            st.w += st.tmp_w;
            st.tmp_w = 0;
            st.l_break = BidiIterator::new(self.block, Some(obj), 0);
        }

        let (width, _) = tree.intrinsic_size(obj);
        st.tmp_w += width + tree.style(obj).margin.horizontal();
        if st.ignoring_spaces {
            self.midpoints.add(tree, BidiIterator::new(self.block, Some(obj), 0));
        }
        st.is_line_empty = false;
        st.ignoring_spaces = false;
        st.current_is_space = false;
        st.trailing_space_object = None;
    }

    fn on_text(&mut self, st: &mut BreakState, obj: NodeId) -> Step {
        let tree = self.tree;
        let text = tree.text(obj);
        let style = tree.style(obj);
        let font_size = style.font_size;
        let white_space = style.white_space;
        let auto_wrap = white_space.auto_wrap();
        let preserve_ws = white_space.preserves_spaces();
        let preserve_lf = white_space.preserves_newlines();
        let hyphen_width = self.metrics.char_width('-', font_size);
        let measure = |from: usize, to: usize| -> i32 {
            if from >= to { 0 } else { self.metrics.text_width(&text[from..to], font_size) }
        };

        let mut last_space = st.pos;
        let mut next_is_soft_breakable = false;
        let mut check_break_word = auto_wrap && style.word_wrap == WordWrap::BreakWord;

        while st.pos < text.len() {
            let pos = st.pos;
            let previous_is_space = st.current_is_space;
            let is_soft_breakable = next_is_soft_breakable;
            next_is_soft_breakable = false;
            let c = text[pos];
            st.current_is_space = c == ' ';
            check_break_word &= st.w == 0;

            if preserve_ws || !st.current_is_space {
                st.is_line_empty = false;
            }

            // Soft hyphens are invisible unless the line ends on one
            if c == SOFT_HYPHEN && pos > 0 {
                next_is_soft_breakable = true;
                if !st.ignoring_spaces {
                    self.midpoints.add(tree, BidiIterator::new(self.block, Some(obj), pos - 1));
                    st.tmp_w += measure(last_space, pos);
                    if auto_wrap {
                        st.tmp_w += hyphen_width;
                    }
                    self.midpoints.add(tree, BidiIterator::new(self.block, Some(obj), pos + 1));
                }
                st.pos += 1;
                last_space = st.pos;
                continue;
            }

            if st.ignoring_spaces {
                if !st.current_is_space || preserve_ws {
                    st.ignoring_spaces = false;
                    last_space = pos;
                    self.midpoints.add(tree, BidiIterator::new(self.block, Some(obj), pos));
                } else {
                    st.pos += 1;
                    continue;
                }
            }

            let breakable_position =
                (preserve_lf && c == '\n') || (auto_wrap && (is_breakable(text, pos) || is_soft_breakable));
            if breakable_position || check_break_word {
                st.tmp_w += measure(last_space, pos);
                if st.w == 0 && auto_wrap && st.tmp_w > st.width {
                    self.flow.fit_below_floats(st.tmp_w, &mut st.width);
                }
                if auto_wrap {
                    if st.w + st.tmp_w > st.width {
                        if check_break_word && pos > 0 {
                            st.l_break = BidiIterator::new(self.block, Some(obj), pos - 1);
                        }
                        return Step::Break;
                    } else if pos > 1 && text[pos - 1] == SOFT_HYPHEN {
                        // The hyphen is not shown when the line goes on
                        st.tmp_w -= hyphen_width;
                    }
                }

                if preserve_lf && c == '\n' {
                    return Step::Forced(BidiIterator::new(self.block, Some(obj), pos));
                }

                if auto_wrap && breakable_position {
                    st.w += st.tmp_w;
                    st.tmp_w = 0;
                    st.l_break = BidiIterator::new(self.block, Some(obj), pos);
                }
                last_space = pos;
            }

            if !st.ignoring_spaces && !preserve_ws && st.current_is_space && previous_is_space {
                // Second space in a row: collapse from the first one on
                st.ignoring_spaces = true;
                self.midpoints.add(tree, st.ignore_start);
                last_space = pos;
            }

            if st.current_is_space && !previous_is_space {
                st.ignore_start = BidiIterator::new(self.block, Some(obj), pos);
            }

            if !preserve_ws && st.current_is_space && !st.ignoring_spaces {
                st.trailing_space_object = Some(obj);
            } else if preserve_ws || !st.current_is_space {
                st.trailing_space_object = None;
            }

            st.pos += 1;
        }

        if !st.ignoring_spaces {
            st.tmp_w += measure(last_space, st.pos);
            if check_break_word && st.w == 0 && st.pos > 0 && st.tmp_w > st.width {
                st.l_break = BidiIterator::new(self.block, Some(obj), st.pos - 1);
                return Step::Break;
            }
        }
        Step::Continue
    }

    /// Advance to the next object and decide whether the line can break
    /// between the two
    fn look_ahead(&mut self, st: &mut BreakState) -> Step {
        let tree = self.tree;
        let saved_it = st.last_it;
        st.last_it = st.it;
        let mut next = st.it.next(tree);

        // Margins of inline flows we are about to enter or leave
        while let Some(flow) = next {
            if !tree.is_inline_flow(flow) || tree.is_word_break(flow) {
                break;
            }
            st.tmp_w += border_padding_margin(tree, flow, st.it.end_of_inline);
            if st.is_line_empty {
                st.is_line_empty = st.tmp_w == 0;
            }
            next = st.it.next(tree);
        }

        if st.check_initial_ws {
            if !tree.style(self.block).white_space.preserves_spaces() {
                if let Some(first) = next.filter(|&n| tree.is_text(n)).and_then(|n| tree.char_at(n, 0)) {
                    if is_justification_space(first) {
                        st.current_is_space = true;
                        st.ignoring_spaces = true;
                        self.midpoints.add(tree, BidiIterator::new(self.block, st.last_it.current, 0));
                    }
                }
            }
            st.check_initial_ws = false;
        }

        let Some(last) = st.last_it.current else {
            return Step::Continue;
        };
        let last_style = tree.style(last);
        let auto_wrap = last_style.white_space.auto_wrap();
        let can_break = st
            .l_break
            .obj
            .is_none_or(|b| !tree.is_inline_flow(b) || tree.first_child(b).is_none());

        if can_break {
            let mut check_for_break = auto_wrap;
            if !auto_wrap
                && st.w != 0
                && st.w + st.tmp_w > st.width
                && st.l_break.obj.is_some()
                && !last_style.white_space.preserves_newlines()
            {
                check_for_break = true;
            } else if let Some(next) = next.filter(|&n| tree.is_text(last) && tree.is_text(n)) {
                let next_style = tree.style(next);
                if auto_wrap || next_style.white_space.auto_wrap() {
                    if st.current_is_space {
                        check_for_break = true;
                    } else {
                        check_for_break = match tree.char_at(next, 0) {
                            Some(' ' | '\t') => true,
                            Some('\n') => !next_style.white_space.preserves_newlines(),
                            _ => false,
                        };
                        let mut will_fit_on_line = st.w + st.tmp_w <= st.width;
                        if !will_fit_on_line && st.w == 0 {
                            self.flow.fit_below_floats(st.tmp_w, &mut st.width);
                            will_fit_on_line = st.tmp_w <= st.width;
                        }
                        let can_place_on_line = will_fit_on_line || !auto_wrap;
                        if can_place_on_line && check_for_break {
                            st.w += st.tmp_w;
                            st.tmp_w = 0;
                            st.l_break = BidiIterator::new(self.block, Some(next), 0)
                                .with_end_of_inline(st.it.end_of_inline);
                        }
                    }
                }
            }

            if check_for_break && st.w + st.tmp_w > st.width {
                // Trailing space hangs past the edge rather than wrapping
                if st.current_is_space && !st.ignoring_spaces && !last_style.white_space.preserves_spaces() {
                    st.trailing_space_object = None;
                }
                if st.w != 0 {
                    return Step::Break;
                }
                self.flow.fit_below_floats(st.tmp_w, &mut st.width);
                if st.w + st.tmp_w > st.width {
                    st.it = st.last_it;
                    st.last_it = saved_it;
                    return Step::Break;
                }
            }
        }

        if !tree.is_floating_or_positioned(last) && tree.is_replaced(last) && last_style.white_space.auto_wrap() {
            st.w += st.tmp_w;
            st.tmp_w = 0;
            st.l_break = BidiIterator::new(self.block, st.it.current, 0).with_end_of_inline(st.it.end_of_inline);
        }

        if last_style.white_space.preserves_spaces() {
            st.current_is_space = false;
        }
        st.pos = 0;
        Step::Continue
    }

    fn finish(
        &mut self,
        st: &mut BreakState,
        start: &mut BidiIterator,
        pos_start: BidiIterator,
        had_pos_start: bool,
        bidi: &mut BidiState,
        saved_context: std::rc::Rc<fos_text::BidiContext>,
    ) -> BidiIterator {
        let tree = self.tree;

        // Nothing fit: take at least one unit so the line makes progress
        if st.l_break == *start && !st.l_break.obj.is_some_and(|b| tree.is_br(b)) {
            if tree.style(self.block).white_space == WhiteSpace::Pre {
                st.l_break = if st.pos != 0 {
                    BidiIterator::new(self.block, st.it.current, st.pos - 1).with_end_of_inline(st.it.end_of_inline)
                } else {
                    let last_pos = st.last_it.current.filter(|&n| tree.is_text(n)).map_or(0, |n| tree.length(n));
                    BidiIterator::new(self.block, st.last_it.current, last_pos).with_end_of_inline(st.last_it.end_of_inline)
                };
            } else if st.l_break.obj.is_some() {
                let pos = if st.it.current.is_some_and(|c| tree.is_text(c)) { st.pos } else { 0 };
                st.l_break = BidiIterator::new(self.block, st.it.current, pos).with_end_of_inline(st.it.end_of_inline);
            }
        }

        if had_pos_start {
            *start = pos_start;
            bidi.context = saved_context;
        }

        if st.l_break == *start {
            st.l_break.increment(tree, None, true);
        }

        self.midpoints.check(tree, &st.l_break);

        if let Some(trailing) = st.trailing_space_object {
            // Collapse the trailing space in front of the break
            if self.midpoints.len() % 2 == 1 {
                self.midpoints.retract_last();
            } else if st.l_break.obj.is_none() && tree.is_text(trailing) {
                let length = tree.length(trailing);
                let pos = if length >= 2 { length - 2 } else { EXCLUDE_OBJECT };
                self.midpoints.add(tree, BidiIterator::new(self.block, Some(trailing), pos));
            }
        }

        if st.l_break.pos > 0 {
            st.l_break.pos -= 1;
            st.l_break.increment(tree, None, true);
        }

        if let Some(obj) = st.l_break.obj {
            let pos = st.l_break.pos;
            if pos >= 2 && tree.is_text(obj) && tree.char_at(obj, pos - 1) == Some(SOFT_HYPHEN) {
                // Show the hyphen the line now ends on
                self.midpoints.chop_at(obj, pos - 2);
            }
        }

        st.l_break
    }

    /// Static position of a positioned box at the current line, and
    /// whether its x (inline origin) or y (block origin) comes from it
    fn static_position(&self, obj: NodeId) -> (StaticPosition, bool, bool) {
        let tree = self.tree;
        let is_inline_type = tree.style(obj).display.is_inline_type();
        let block_style = tree.style(self.block);
        let parent_ltr = tree
            .parent(obj)
            .is_none_or(|parent| tree.style(parent).direction == Direction::Ltr);

        let mut position = StaticPosition {
            node: obj,
            x: None,
            y: None,
        };
        let mut inline_x = tree.has_static_x(obj);
        if inline_x {
            position.x = Some(if parent_ltr {
                block_style.border_width.left + block_style.padding.left
            } else {
                block_style.border_width.right + block_style.padding.right
            });
            inline_x = is_inline_type;
        }
        let mut block_y = tree.has_static_y(obj);
        if block_y {
            position.y = Some(self.flow.height);
            block_y = !is_inline_type;
        }
        (position, inline_x, block_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_css::ComputedStyle;
    use fos_text::MonospaceMetrics;

    struct Fixture {
        tree: RenderTree,
        block: NodeId,
    }

    impl Fixture {
        fn new(block_css: &str) -> Self {
            let mut tree = RenderTree::new();
            let mut style = ComputedStyle::block();
            style.apply_css(block_css).unwrap();
            let block = tree.create_block(style);
            Self { tree, block }
        }

        fn text(&mut self, text: &str) -> NodeId {
            let node = self.tree.create_text(text);
            self.tree.append_child(self.block, node).unwrap();
            node
        }

        fn break_line(&self, width: i32) -> (BidiIterator, Midpoints, LineBreakResult) {
            let metrics = MonospaceMetrics::default();
            let mut flow = BlockFlow {
                content_width: width,
                ..BlockFlow::default()
            };
            let mut midpoints = Midpoints::new();
            let mut bidi = BidiState::new(self.block, false, false);
            let mut start = BidiIterator::first(&self.tree, self.block, None);
            let mut breaker = LineBreaker {
                tree: &self.tree,
                block: self.block,
                flow: &mut flow,
                midpoints: &mut midpoints,
                metrics: &metrics,
                max_level: 61,
            };
            let (end, result) = breaker.find_next_line_break(&mut start, &mut bidi, true);
            (end, midpoints, result)
        }

        /// Break a single text node into lines, returning each line's
        /// `(start, end)` after leading whitespace is skipped. `None` if the
        /// breaker fails to move forward.
        fn break_all(&self, text: NodeId, width: i32) -> Option<Vec<(usize, usize)>> {
            let metrics = MonospaceMetrics::default();
            let len = self.tree.length(text);
            let mut flow = BlockFlow {
                content_width: width,
                ..BlockFlow::default()
            };
            let mut bidi = BidiState::new(self.block, false, false);
            let mut end = BidiIterator::first(&self.tree, self.block, None);
            let mut lines = Vec::new();
            let mut broke_at_br = true;
            while !end.at_end() {
                if lines.len() > len {
                    return None;
                }
                let mut start = end;
                let mut midpoints = Midpoints::new();
                let mut breaker = LineBreaker {
                    tree: &self.tree,
                    block: self.block,
                    flow: &mut flow,
                    midpoints: &mut midpoints,
                    metrics: &metrics,
                    max_level: 61,
                };
                let (line_end, result) = breaker.find_next_line_break(&mut start, &mut bidi, broke_at_br);
                if start.at_end() {
                    break;
                }
                broke_at_br = result.broke_at_br;
                end = line_end;
                let stop = if end.at_end() { len } else { end.pos };
                if stop <= start.pos {
                    return None;
                }
                lines.push((start.pos, stop));
            }
            Some(lines)
        }
    }

    #[test]
    fn test_requires_line_box() {
        let mut fx = Fixture::new("");
        let spaces = fx.text("  ");
        let word = fx.text("a");
        let tree = &fx.tree;
        assert!(!requires_line_box(tree, &BidiIterator::new(fx.block, Some(spaces), 0)));
        assert!(requires_line_box(tree, &BidiIterator::new(fx.block, Some(word), 0)));
        assert!(!requires_line_box(tree, &BidiIterator::new(fx.block, None, 0)));
    }

    #[test]
    fn test_everything_fits() {
        let mut fx = Fixture::new("");
        fx.text("hello world");
        let (end, midpoints, result) = fx.break_line(200);
        assert!(end.at_end());
        assert!(midpoints.is_empty());
        assert!(!result.is_line_empty);
    }

    #[test]
    fn test_break_at_last_space() {
        let mut fx = Fixture::new("");
        let text = fx.text("aaaa bbbb cccc");
        // 100px holds "aaaa bbbb" but not "cccc"; the next line starts
        // at the space and skips it
        let (end, _, _) = fx.break_line(100);
        assert_eq!(end, BidiIterator::new(fx.block, Some(text), 9));
    }

    #[test]
    fn test_collapsed_spaces_make_midpoints() {
        let mut fx = Fixture::new("");
        let text = fx.text("a    b");
        let (end, midpoints, _) = fx.break_line(200);
        assert!(end.at_end());
        let positions: Vec<usize> = midpoints.points().iter().map(|m| m.pos).collect();
        assert_eq!(positions, vec![1, 5]);
        assert!(midpoints.points().iter().all(|m| m.obj == Some(text)));
    }

    #[test]
    fn test_overlong_word_takes_whole_line() {
        let mut fx = Fixture::new("");
        fx.text("aaaaaaaaaaaaaaa");
        let (end, _, _) = fx.break_line(100);
        assert!(end.at_end());
    }

    #[test]
    fn test_break_word() {
        let mut fx = Fixture::new("word-wrap: break-word");
        let text = fx.text("aaaaaaaaaaaaaaa");
        let (end, _, _) = fx.break_line(100);
        assert_eq!(end, BidiIterator::new(fx.block, Some(text), 10));
    }

    #[test]
    fn test_preserved_newline_forces_break() {
        let mut fx = Fixture::new("white-space: pre");
        let text = fx.text("ab\ncd");
        let (end, _, _) = fx.break_line(200);
        assert_eq!(end, BidiIterator::new(fx.block, Some(text), 2));
    }

    #[test]
    fn test_br_ends_line() {
        let mut fx = Fixture::new("");
        fx.text("ab");
        let br = fx.tree.create_line_break(ComputedStyle::default());
        fx.tree.append_child(fx.block, br).unwrap();
        fx.text("cd");
        let (end, _, result) = fx.break_line(200);
        assert_eq!(end.obj, Some(br));
        assert!(result.broke_at_br);
    }

    #[test]
    fn test_leading_spaces_skipped() {
        let mut fx = Fixture::new("");
        fx.text("   ab");
        let (end, midpoints, _) = fx.break_line(200);
        assert!(end.at_end());
        assert!(midpoints.is_empty());
    }

    #[test]
    fn test_break_all_wraps_words() {
        let mut fx = Fixture::new("");
        let text = fx.text("aaaa bbbb cccc");
        assert_eq!(fx.break_all(text, 40), Some(vec![(0, 4), (5, 9), (10, 14)]));
    }

    quickcheck::quickcheck! {
        fn prop_every_line_moves_forward(bytes: Vec<u8>, width: u8) -> bool {
            let alphabet = ['a', 'b', ' ', 'a', '-'];
            let text: String = bytes.iter().map(|b| alphabet[*b as usize % alphabet.len()]).collect();
            let mut fx = Fixture::new("");
            let node = fx.text(&text);
            match fx.break_all(node, width as i32 + 1) {
                Some(lines) => lines.windows(2).all(|w| w[0].1 <= w[1].0),
                None => false,
            }
        }
    }

    #[test]
    fn test_text_width_shows_trailing_hyphen() {
        let mut fx = Fixture::new("");
        let text = fx.text("ab\u{ad}cd");
        let metrics = MonospaceMetrics::default();
        assert_eq!(text_width(&fx.tree, &metrics, text, 0, 3), 30);
        assert_eq!(text_width(&fx.tree, &metrics, text, 0, 5), 40);
        assert_eq!(text_width(&fx.tree, &metrics, text, 3, 3), 0);
    }
}

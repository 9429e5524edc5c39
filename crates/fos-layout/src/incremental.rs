//! Incremental Relayout
//!
//! After an edit only the dirty lines of a block are rebuilt. Layout
//! resumes from the break stored on the last clean line before the first
//! dirty one, and the clean lines after the dirty region are set aside;
//! once the rebuilt lines end where one of those clean lines began, with
//! the same bidi state, the rest is reattached and shifted instead of
//! being rebuilt.

use std::rc::Rc;

use fos_text::{BidiClass, BidiContext, BidiStatus};

use crate::inline::BlockFlow;
use crate::iterator::BidiIterator;
use crate::layout_tree::{NodeId, RenderTree};
use crate::line_box::BoxId;
use crate::resolver::BidiState;

/// Where a pass starts
#[derive(Debug, Clone)]
pub(crate) struct StartPosition {
    /// Index of the first line to rebuild in the block's line list
    pub first_dirty: Option<usize>,
    pub start: BidiIterator,
    /// The line before the start ended at a `<br>` (or there is none)
    pub previous_line_broke_at_br: bool,
}

/// Clean lines set aside while the dirty region is rebuilt
#[derive(Debug, Clone)]
pub(crate) struct EndLines {
    /// Extracted root boxes, in order
    pub lines: Vec<BoxId>,
    /// Where the first of them starts
    pub start: BidiIterator,
    pub status: BidiStatus,
    pub context: Option<Rc<BidiContext>>,
    /// Block height before the first of them
    pub y: i32,
}

impl RenderTree {
    /// Find the first line to rebuild and restore the state it starts in
    pub(crate) fn determine_start_position(
        &mut self,
        block: NodeId,
        flow: &mut BlockFlow,
        full_layout: bool,
        bidi: &mut BidiState,
        max_level: u8,
    ) -> StartPosition {
        let lines = self.node(block).boxes.clone();
        let mut first_dirty = None;
        let mut last = None;

        if full_layout {
            flow.stats.lines_deleted += lines.len();
            self.delete_lines(block);
        } else {
            first_dirty = lines.iter().position(|&line| self.arena[line].is_dirty());
            match first_dirty {
                Some(index) if index > 0 => {
                    let prev = self.arena[lines[index - 1]].root();
                    let broke_at_deleted_newline = prev.is_some_and(|p| {
                        p.line_break
                            .obj
                            .is_some_and(|obj| self.is_text(obj) && p.line_break.pos >= self.length(obj))
                    });
                    // A previous line that did not break cleanly may
                    // take content from the dirty one
                    if !prev.is_some_and(|p| p.ends_with_break) || broke_at_deleted_newline {
                        first_dirty = Some(index - 1);
                    }
                }
                Some(_) => {}
                None => {
                    if lines.last().is_some_and(|&line| !self.ends_with_break(line)) {
                        first_dirty = Some(lines.len() - 1);
                    }
                }
            }
            last = match first_dirty {
                Some(index) => index.checked_sub(1).map(|i| lines[i]),
                None => lines.last().copied(),
            };
        }

        let previous_line_broke_at_br = last.is_none_or(|line| self.ends_with_break(line));
        let start = match last.and_then(|line| self.arena[line].root()) {
            Some(root) => {
                flow.height = root.block_height;
                bidi.status = root.line_break.status;
                if let Some(context) = &root.line_break.context {
                    bidi.context = context.clone();
                }
                BidiIterator::new(block, root.line_break.obj, root.line_break.pos)
            }
            None => {
                let mut embeds: Vec<BidiClass> = Vec::new();
                let start = BidiIterator::first(self, block, Some(&mut embeds));
                bidi.apply_embeddings(&embeds, max_level);
                start
            }
        };

        tracing::trace!(block = block.0, full_layout, first_dirty, "start position");
        StartPosition {
            first_dirty,
            start,
            previous_line_broke_at_br,
        }
    }

    fn ends_with_break(&self, line: BoxId) -> bool {
        self.arena[line].root().is_some_and(|root| root.ends_with_break)
    }

    /// Find the clean lines after the dirty region, if any, and set them aside
    pub(crate) fn determine_end_position(&mut self, block: NodeId, start_line: usize) -> Option<EndLines> {
        let lines = self.node(block).boxes.clone();
        let mut first_clean = None;
        for (index, &line) in lines.iter().enumerate().skip(start_line + 1) {
            if self.arena[line].is_dirty() {
                first_clean = None;
            } else if first_clean.is_none() {
                first_clean = Some(index);
            }
        }

        let first_clean = first_clean?;
        let prev = self.arena[lines[first_clean - 1]].root()?;
        let end = EndLines {
            lines: lines[first_clean..].to_vec(),
            start: BidiIterator::new(block, prev.line_break.obj, prev.line_break.pos),
            status: prev.line_break.status,
            context: prev.line_break.context.clone(),
            y: prev.block_height,
        };
        for &line in &end.lines {
            self.extract_line(line);
        }
        Some(end)
    }

    /// Whether the line about to be built at `start` rejoins the clean
    /// lines. Lines skipped over while looking ahead are deleted.
    pub(crate) fn matched_end_line(
        &mut self,
        start: &BidiIterator,
        bidi: &BidiState,
        end: &mut EndLines,
        lookahead: usize,
    ) -> bool {
        let context_matches =
            |context: &Option<Rc<BidiContext>>| context.as_deref().is_some_and(|c| *c == *bidi.context);

        if *start == end.start {
            return end.status == bidi.status && context_matches(&end.context);
        }

        let Some(offset) = end.lines.iter().take(lookahead).position(|&line| {
            self.arena[line]
                .root()
                .is_some_and(|root| root.line_break.obj == start.obj && root.line_break.pos == start.pos)
        }) else {
            return false;
        };

        let Some(line) = self.arena[end.lines[offset]].root() else {
            return false;
        };
        if line.line_break.status != bidi.status || !context_matches(&line.line_break.context) {
            return false;
        }
        let block_height = line.block_height;

        let skipped: Vec<BoxId> = end.lines.drain(..=offset).collect();
        for line in skipped {
            self.delete_line(line);
        }
        if end.lines.is_empty() {
            return false;
        }
        end.y = block_height;
        true
    }

    /// Put matched clean lines back, moved to follow the rebuilt ones
    pub(crate) fn reattach_end_lines(&mut self, flow: &mut BlockFlow, end: EndLines) {
        let delta = flow.height - end.y;
        for &line in &end.lines {
            self.attach_line(line);
            if delta != 0 {
                self.shift_line(line, 0, delta);
            }
        }
        if let Some(root) = end.lines.last().and_then(|&line| self.arena[line].root()) {
            flow.height = root.block_height;
        }
        flow.stats.lines_reused += end.lines.len();
        tracing::debug!(reused = end.lines.len(), delta, "resynchronized with clean lines");
    }

    /// Throw away clean lines that could not be matched
    pub(crate) fn discard_end_lines(&mut self, flow: &mut BlockFlow, end: EndLines) {
        flow.stats.lines_deleted += end.lines.len();
        tracing::debug!(deleted = end.lines.len(), "clean lines did not resynchronize");
        for line in end.lines {
            self.delete_line(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_box::{BoxKind, LineBreakInfo, RootLine};
    use fos_css::ComputedStyle;

    /// Block with three text nodes and one root line per node
    fn three_lines() -> (RenderTree, NodeId, Vec<NodeId>, Vec<BoxId>) {
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::block());
        let texts: Vec<NodeId> = ["aa", "bb", "cc"].iter().map(|t| tree.create_text(t)).collect();
        for &text in &texts {
            tree.append_child(block, text).unwrap();
        }
        let state = BidiState::new(block, false, false);
        let roots = texts
            .iter()
            .enumerate()
            .map(|(i, &text)| {
                let next = texts.get(i + 1).copied();
                let root = RootLine {
                    ends_with_break: true,
                    block_height: 16 * (i as i32 + 1),
                    line_break: LineBreakInfo {
                        obj: next,
                        pos: 0,
                        status: state.status,
                        context: Some(state.context.clone()),
                    },
                    ..RootLine::default()
                };
                let root_id = tree.create_box(block, BoxKind::Root(Box::new(root)));
                let leaf = tree.create_box(text, BoxKind::Text(Default::default()));
                tree.add_to_line(root_id, leaf);
                root_id
            })
            .collect();
        (tree, block, texts, roots)
    }

    #[test]
    fn test_start_after_last_clean_line() {
        let (mut tree, block, texts, roots) = three_lines();
        tree.dirty_node_boxes(texts[1]);
        let mut flow = BlockFlow::default();
        let mut bidi = BidiState::new(block, false, false);

        let start = tree.determine_start_position(block, &mut flow, false, &mut bidi, 61);
        assert_eq!(start.first_dirty, Some(1));
        assert_eq!(start.start.obj, Some(texts[1]));
        assert_eq!(flow.height, 16);
        assert!(start.previous_line_broke_at_br);

        let end = tree.determine_end_position(block, 1).unwrap();
        assert_eq!(end.lines, vec![roots[2]]);
        assert_eq!(end.start.obj, Some(texts[2]));
        assert_eq!(end.y, 32);
        assert_eq!(tree.lines(block), &roots[..2]);
    }

    #[test]
    fn test_unclean_previous_line_is_rebuilt() {
        let (mut tree, block, texts, roots) = three_lines();
        tree.arena[roots[0]].root_mut().unwrap().ends_with_break = false;
        tree.dirty_node_boxes(texts[1]);
        let mut flow = BlockFlow::default();
        let mut bidi = BidiState::new(block, false, false);

        let start = tree.determine_start_position(block, &mut flow, false, &mut bidi, 61);
        assert_eq!(start.first_dirty, Some(0));
        assert_eq!(start.start.obj, Some(texts[0]));
        assert_eq!(flow.height, 0);
    }

    #[test]
    fn test_full_layout_deletes_lines() {
        let (mut tree, block, texts, _) = three_lines();
        let mut flow = BlockFlow::default();
        let mut bidi = BidiState::new(block, false, false);
        let start = tree.determine_start_position(block, &mut flow, true, &mut bidi, 61);
        assert!(tree.lines(block).is_empty());
        assert_eq!(start.first_dirty, None);
        assert_eq!(start.start.obj, Some(texts[0]));
        assert_eq!(flow.stats.lines_deleted, 3);
    }

    #[test]
    fn test_match_and_reattach() {
        let (mut tree, block, texts, roots) = three_lines();
        tree.dirty_node_boxes(texts[1]);
        let mut end = tree.determine_end_position(block, 1).unwrap();
        let bidi = BidiState::new(block, false, false);

        let at_clean = BidiIterator::new(block, Some(texts[2]), 0);
        assert!(tree.matched_end_line(&at_clean, &bidi, &mut end, 8));

        // The rebuilt region came out 4px taller
        let mut flow = BlockFlow {
            height: 36,
            ..BlockFlow::default()
        };
        tree.reattach_end_lines(&mut flow, end);
        assert_eq!(tree.lines(block).last(), Some(&roots[2]));
        assert_eq!(tree.arena[roots[2]].y, 4);
        assert_eq!(flow.height, 52);
        assert_eq!(flow.stats.lines_reused, 1);
    }

    #[test]
    fn test_match_further_ahead() {
        let (mut tree, block, texts, roots) = three_lines();
        tree.dirty_node_boxes(texts[0]);
        let mut end = tree.determine_end_position(block, 0).unwrap();
        assert_eq!(end.lines, vec![roots[1], roots[2]]);
        let bidi = BidiState::new(block, false, false);

        // The rebuilt lines swallowed the second line
        let past_second = BidiIterator::new(block, Some(texts[2]), 0);
        assert!(tree.matched_end_line(&past_second, &bidi, &mut end, 8));
        assert_eq!(end.lines, vec![roots[2]]);
        assert_eq!(end.y, 32);
        assert!(tree.inline_box(roots[1]).is_none());
    }

    #[test]
    fn test_status_mismatch_fails() {
        let (mut tree, block, texts, _) = three_lines();
        tree.dirty_node_boxes(texts[1]);
        let mut end = tree.determine_end_position(block, 1).unwrap();
        let mut bidi = BidiState::new(block, false, false);
        bidi.status.last = BidiClass::R;

        let at_clean = BidiIterator::new(block, Some(texts[2]), 0);
        assert!(!tree.matched_end_line(&at_clean, &bidi, &mut end, 8));

        let mut flow = BlockFlow::default();
        tree.discard_end_lines(&mut flow, end);
        assert_eq!(flow.stats.lines_deleted, 1);
    }
}

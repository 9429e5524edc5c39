//! Line Construction
//!
//! Turns the visually ordered runs of one line into a box tree: a leaf
//! box per run, and flow boxes for the inline flows enclosing them, up to
//! the root box the block owns for the line.

use fos_css::Direction;

use crate::iterator::BidiIterator;
use crate::layout_tree::{NodeId, NodeKind, RenderTree};
use crate::line_box::{BoxId, BoxKind, FlowData, TextSlice};
use crate::resolver::BidiRun;

impl RenderTree {
    /// Box of `node` (an inline flow or the block) that accepts children on
    /// the line being built, creating it and its ancestors as needed.
    fn create_line_boxes(&mut self, block: NodeId, node: NodeId) -> BoxId {
        // The last box of the flow is reused only while its line is open
        // and nothing follows it there
        if let Some(&last) = self.node(node).boxes.last() {
            let last_box = &self.arena[last];
            if !last_box.is_constructed() && last_box.next_on_line.is_none() {
                return last;
            }
        }

        if node == block {
            return self.create_box(node, BoxKind::Root(Box::default()));
        }
        let id = self.create_box(node, BoxKind::Flow(FlowData::default()));
        let parent = self.parent(node).unwrap_or(block);
        let parent_box = self.create_line_boxes(block, parent);
        self.add_to_line(parent_box, id);
        id
    }

    /// Build the box tree of one line. Returns `None` when there are no runs.
    pub(crate) fn construct_line(&mut self, block: NodeId, runs: &mut [BidiRun], end: &BidiIterator) -> Option<BoxId> {
        if runs.is_empty() {
            return None;
        }

        let mut parent_box: Option<BoxId> = None;
        for run in runs.iter_mut() {
            let kind = match self.kind(run.obj) {
                NodeKind::Text(_) => BoxKind::Text(TextSlice {
                    start: run.start,
                    len: run.stop - run.start,
                    ..TextSlice::default()
                }),
                NodeKind::LineBreak => BoxKind::LineBreak,
                NodeKind::Positioned { .. } => BoxKind::Placeholder,
                _ => BoxKind::Replaced,
            };
            let id = self.create_box(run.obj, kind);
            self.arena[id].level = run.level;
            run.inline_box = Some(id);

            let obj_parent = self.parent(run.obj).unwrap_or(block);
            let parent = match parent_box {
                Some(parent) if self.arena[parent].node == obj_parent => parent,
                _ => self.create_line_boxes(block, obj_parent),
            };
            self.add_to_line(parent, id);
            parent_box = Some(parent);
        }

        let root = *self.node(block).boxes.last()?;
        let end_object = end.obj.filter(|_| end.pos == 0);
        self.determine_spacing_for_flow_boxes(root, end.at_end(), end_object);
        self.set_constructed(root);
        Some(root)
    }

    /// Decide which edges of each flow box carry margin, border and padding
    pub(crate) fn determine_spacing_for_flow_boxes(&mut self, id: BoxId, last_line: bool, end_object: Option<NodeId>) {
        let mut include_left = false;
        let mut include_right = false;

        // The root box never has edges
        if self.arena[id].parent.is_some() {
            let node = self.arena[id].node;
            let ltr = self.style(node).direction == Direction::Ltr;
            let chain = &self.node(node).boxes;
            let index = chain.iter().position(|&b| b == id).unwrap_or(0);
            let first = chain.first().copied().unwrap_or(id);
            let last = chain.last().copied().unwrap_or(id);

            // The flow starts on this line
            if !self.arena[first].is_constructed() {
                if ltr && first == id {
                    include_left = true;
                } else if !ltr && last == id {
                    include_right = true;
                }
            }

            // The flow ends on this line
            if !self.arena[last].is_constructed() {
                if ltr {
                    let is_last_box = index + 1 >= chain.len();
                    if is_last_box
                        && (last_line || self.next_on_line_exists(id) || self.on_end_chain(node, end_object))
                    {
                        include_right = true;
                    }
                } else {
                    let prev_done = index == 0 || self.arena[chain[index - 1]].is_constructed();
                    if prev_done && (last_line || self.prev_on_line_exists(id) || self.on_end_chain(node, end_object)) {
                        include_left = true;
                    }
                }
            }
        }

        if let Some(flow) = self.arena[id].flow_mut() {
            flow.include_left_edge = include_left;
            flow.include_right_edge = include_right;
        }

        let children: Vec<BoxId> = self.arena.children(id).collect();
        for child in children {
            if self.arena[child].is_flow() {
                self.determine_spacing_for_flow_boxes(child, last_line, end_object);
            }
        }
    }

    fn next_on_line_exists(&self, id: BoxId) -> bool {
        let mut current = id;
        while let Some(parent) = self.arena[current].parent {
            if self.arena[current].next_on_line.is_some() {
                return true;
            }
            current = parent;
        }
        false
    }

    fn prev_on_line_exists(&self, id: BoxId) -> bool {
        let mut current = id;
        while let Some(parent) = self.arena[current].parent {
            if self.arena[current].prev_on_line.is_some() {
                return true;
            }
            current = parent;
        }
        false
    }

    /// The line ends right after `flow`: `end_object` is `flow` or is
    /// reached from it by last children only
    fn on_end_chain(&self, flow: NodeId, end_object: Option<NodeId>) -> bool {
        let Some(end) = end_object else {
            return false;
        };
        if end == flow {
            return true;
        }
        let mut current = end;
        while let Some(parent) = self.parent(current) {
            if self.is_block(parent) {
                break;
            }
            if self.last_child(parent) != Some(current) || parent == flow {
                return false;
            }
            current = parent;
        }
        true
    }

    /// Margin, border and padding on the sides a flow box includes, for
    /// it and every flow below it
    pub(crate) fn flow_spacing_width(&self, id: BoxId) -> i32 {
        let mut total = self.flow_edge_left(id) + self.flow_edge_right(id);
        for child in self.arena.children(id) {
            if self.arena[child].is_flow() {
                total += self.flow_spacing_width(child);
            }
        }
        total
    }

    /// Left margin + border + padding of a flow box, zero when the edge is open
    pub(crate) fn flow_edge_left(&self, id: BoxId) -> i32 {
        let inline_box = &self.arena[id];
        if inline_box.is_root() || !inline_box.include_left_edge() {
            return 0;
        }
        self.style(inline_box.node).left_bpm()
    }

    pub(crate) fn flow_edge_right(&self, id: BoxId) -> i32 {
        let inline_box = &self.arena[id];
        if inline_box.is_root() || !inline_box.include_right_edge() {
            return 0;
        }
        self.style(inline_box.node).right_bpm()
    }
}

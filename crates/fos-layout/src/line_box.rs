//! Inline Box Tree
//!
//! Line layout output. Each line is a root box owned by the block; flow
//! boxes nest under it for every inline element the line passes through,
//! and leaves carry text slices, line breaks, atomic content and
//! placeholders for positioned boxes. Children are kept in visual order.
//!
//! Boxes live in a slab and are addressed by `BoxId`. Besides its place
//! in a line, every box sits in the ordered chain of its render object
//! (`RenderNode::boxes`), which is how a flow knows whether a line holds
//! its first or last fragment.

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use fos_text::{BidiContext, BidiStatus, Level};

use crate::box_model::Point;
use crate::layout_tree::{NodeId, RenderTree};

/// Box ID in the inline box arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(pub usize);

/// Slab of inline boxes with slot reuse
#[derive(Debug, Default)]
pub struct BoxArena {
    slots: Vec<Option<InlineBox>>,
    free: Vec<usize>,
}

impl BoxArena {
    pub fn alloc(&mut self, inline_box: InlineBox) -> BoxId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(inline_box);
                BoxId(slot)
            }
            None => {
                self.slots.push(Some(inline_box));
                BoxId(self.slots.len() - 1)
            }
        }
    }

    pub fn release(&mut self, id: BoxId) -> Option<InlineBox> {
        let removed = self.slots.get_mut(id.0)?.take();
        if removed.is_some() {
            self.free.push(id.0);
        }
        removed
    }

    pub fn get(&self, id: BoxId) -> Option<&InlineBox> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut InlineBox> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    /// Live boxes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Children of a box in visual order
    pub fn children(&self, id: BoxId) -> BoxChildren<'_> {
        BoxChildren {
            arena: self,
            current: self.get(id).and_then(|b| b.first_child),
        }
    }
}

impl Index<BoxId> for BoxArena {
    type Output = InlineBox;

    fn index(&self, id: BoxId) -> &InlineBox {
        match self.slots.get(id.0) {
            Some(Some(inline_box)) => inline_box,
            _ => panic!("stale inline box {id:?}"),
        }
    }
}

impl IndexMut<BoxId> for BoxArena {
    fn index_mut(&mut self, id: BoxId) -> &mut InlineBox {
        match self.slots.get_mut(id.0) {
            Some(Some(inline_box)) => inline_box,
            _ => panic!("stale inline box {id:?}"),
        }
    }
}

/// Iterator over the children of a box
pub struct BoxChildren<'a> {
    arena: &'a BoxArena,
    current: Option<BoxId>,
}

impl Iterator for BoxChildren<'_> {
    type Item = BoxId;

    fn next(&mut self) -> Option<BoxId> {
        let current = self.current?;
        self.current = self.arena.get(current).and_then(|b| b.next_on_line);
        Some(current)
    }
}

/// How much of a text box survives ellipsis placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Truncation {
    #[default]
    None,
    /// The first `kept` characters are shown
    Partial { kept: usize },
    /// Hidden behind the ellipsis
    Full,
}

/// Slice of a text node placed on a line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextSlice {
    pub start: usize,
    pub len: usize,
    /// Extra pixels from justification, included in the box width
    pub space_add: i32,
    pub truncation: Truncation,
}

impl TextSlice {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// State shared by root and inline flow boxes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowData {
    pub include_left_edge: bool,
    pub include_right_edge: bool,
    pub has_text_children: bool,
    pub has_text_descendant: bool,
    pub(crate) constructed: bool,
}

/// Where the next line starts, captured when a line is finished
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineBreakInfo {
    pub obj: Option<NodeId>,
    pub pos: usize,
    pub status: BidiStatus,
    pub context: Option<Rc<BidiContext>>,
}

/// The ellipsis drawn on a truncated line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EllipsisBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub baseline: i32,
}

/// Root box of one line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootLine {
    pub flow: FlowData,
    pub line_break: LineBreakInfo,
    pub ends_with_break: bool,
    pub after_page_break: bool,
    /// Block height once this line was placed
    pub block_height: i32,
    pub top_overflow: i32,
    pub bottom_overflow: i32,
    pub ellipsis: Option<EllipsisBox>,
}

/// What a box holds
#[derive(Debug, Clone, PartialEq)]
pub enum BoxKind {
    Root(Box<RootLine>),
    Flow(FlowData),
    Text(TextSlice),
    LineBreak,
    Replaced,
    /// Static position of an absolutely positioned box
    Placeholder,
}

/// A box on a line
#[derive(Debug, Clone)]
pub struct InlineBox {
    pub node: NodeId,
    pub kind: BoxKind,
    pub level: Level,

    pub parent: Option<BoxId>,
    pub first_child: Option<BoxId>,
    pub last_child: Option<BoxId>,
    pub next_on_line: Option<BoxId>,
    pub prev_on_line: Option<BoxId>,

    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub baseline: i32,

    pub(crate) dirty: bool,
    pub(crate) extracted: bool,
}

impl InlineBox {
    pub fn new(node: NodeId, kind: BoxKind) -> Self {
        Self {
            node,
            kind,
            level: Level::LTR,
            parent: None,
            first_child: None,
            last_child: None,
            next_on_line: None,
            prev_on_line: None,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            baseline: 0,
            dirty: false,
            extracted: false,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, BoxKind::Root(_))
    }

    /// Root or inline flow
    pub fn is_flow(&self) -> bool {
        matches!(self.kind, BoxKind::Root(_) | BoxKind::Flow(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, BoxKind::Text(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, BoxKind::Placeholder)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn flow(&self) -> Option<&FlowData> {
        match &self.kind {
            BoxKind::Root(root) => Some(&root.flow),
            BoxKind::Flow(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn flow_mut(&mut self) -> Option<&mut FlowData> {
        match &mut self.kind {
            BoxKind::Root(root) => Some(&mut root.flow),
            BoxKind::Flow(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn root(&self) -> Option<&RootLine> {
        match &self.kind {
            BoxKind::Root(root) => Some(root),
            _ => None,
        }
    }

    pub fn root_mut(&mut self) -> Option<&mut RootLine> {
        match &mut self.kind {
            BoxKind::Root(root) => Some(root),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&TextSlice> {
        match &self.kind {
            BoxKind::Text(slice) => Some(slice),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextSlice> {
        match &mut self.kind {
            BoxKind::Text(slice) => Some(slice),
            _ => None,
        }
    }

    /// Leaves always count as text for vertical alignment
    pub fn has_text_children(&self) -> bool {
        self.flow().is_none_or(|f| f.has_text_children)
    }

    pub fn has_text_descendant(&self) -> bool {
        self.flow().is_none_or(|f| f.has_text_descendant)
    }

    pub fn is_constructed(&self) -> bool {
        self.flow().is_some_and(|f| f.constructed)
    }

    /// Text and line breaks, which are aligned with font metrics
    pub(crate) fn is_text_like(&self) -> bool {
        matches!(self.kind, BoxKind::Text(_) | BoxKind::LineBreak)
    }

    pub fn include_left_edge(&self) -> bool {
        self.flow().is_some_and(|f| f.include_left_edge)
    }

    pub fn include_right_edge(&self) -> bool {
        self.flow().is_some_and(|f| f.include_right_edge)
    }
}

impl RenderTree {
    /// Allocate a box for `node` at the end of its chain
    pub(crate) fn create_box(&mut self, node: NodeId, kind: BoxKind) -> BoxId {
        let id = self.arena.alloc(InlineBox::new(node, kind));
        self.node_mut(node).boxes.push(id);
        id
    }

    /// Append `child` to the children of `parent`
    pub(crate) fn add_to_line(&mut self, parent: BoxId, child: BoxId) {
        let last = self.arena[parent].last_child;
        {
            let child_box = &mut self.arena[child];
            child_box.parent = Some(parent);
            child_box.prev_on_line = last;
            child_box.next_on_line = None;
        }
        match last {
            Some(last) => self.arena[last].next_on_line = Some(child),
            None => self.arena[parent].first_child = Some(child),
        }
        self.arena[parent].last_child = Some(child);

        if self.arena[child].is_text_like() {
            if let Some(flow) = self.arena[parent].flow_mut() {
                flow.has_text_children = true;
            }
            self.set_has_text_descendant(parent);
        } else if self.arena[child].flow().is_some_and(|f| f.has_text_descendant) {
            self.set_has_text_descendant(parent);
        }
    }

    fn set_has_text_descendant(&mut self, from: BoxId) {
        let mut current = Some(from);
        while let Some(id) = current {
            match self.arena[id].flow_mut() {
                Some(flow) if !flow.has_text_descendant => flow.has_text_descendant = true,
                _ => break,
            }
            current = self.arena[id].parent;
        }
    }

    /// Mark a box and its ancestors dirty
    pub(crate) fn dirty_line_boxes(&mut self, id: BoxId) {
        let mut current = Some(id);
        while let Some(box_id) = current {
            let inline_box = &mut self.arena[box_id];
            inline_box.dirty = true;
            current = inline_box.parent;
        }
    }

    /// Dirty every line holding a box of `node`
    pub(crate) fn dirty_node_boxes(&mut self, node: NodeId) {
        let boxes = self.node(node).boxes.clone();
        for id in boxes {
            self.dirty_line_boxes(id);
        }
    }

    /// Record that `removed` chars at `offset` of a text node were replaced
    /// by `inserted` chars. Lines holding the edited span are dirtied and
    /// the slices and breaks after it are moved so the clean lines can be
    /// matched again.
    pub(crate) fn dirty_text_range(&mut self, node: NodeId, offset: usize, removed: usize, inserted: usize) {
        let end = offset + removed;
        let moved = |pos: usize| match pos {
            p if p <= offset => p,
            p if p >= end => p + inserted - removed,
            _ => offset,
        };

        let boxes = self.node(node).boxes.clone();
        let mut touched = None;
        let mut reaches_past = false;
        let mut before: Option<(usize, BoxId)> = None;
        let mut after: Option<(usize, BoxId)> = None;
        for &id in &boxes {
            let BoxKind::Text(slice) = &mut self.arena[id].kind else {
                continue;
            };
            let (start, slice_end) = (slice.start, slice.end());
            if start > offset {
                slice.start = moved(start);
            }
            if start <= end && slice_end >= offset {
                touched = Some(id);
                reaches_past |= slice_end > end;
                self.dirty_line_boxes(id);
            } else if slice_end < offset {
                if before.is_none_or(|(e, _)| slice_end > e) {
                    before = Some((slice_end, id));
                }
            } else if after.is_none_or(|(s, _)| start < s) {
                after = Some((start, id));
            }
        }

        let Some(anchor) = touched.or(before.map(|(_, id)| id)).or(after.map(|(_, id)| id)) else {
            self.mark_needs_layout(node);
            return;
        };
        // Collapsed whitespace before a box belongs to its line
        if touched.is_none() {
            if let Some((_, id)) = before {
                self.dirty_line_boxes(id);
            }
        }

        let Some(anchor_root) = self.line_root(anchor) else {
            return;
        };
        let block = self.arena[anchor_root].node;
        let lines = self.node(block).boxes.clone();

        // Text inserted where the next line begins belongs to that line
        if !reaches_past {
            match after {
                Some((_, id)) => self.dirty_line_boxes(id),
                None if !self.arena[anchor_root].root().is_some_and(|l| l.ends_with_break) => {
                    let next = lines.iter().position(|&l| l == anchor_root).and_then(|i| lines.get(i + 1));
                    if let Some(&next) = next {
                        self.dirty_line_boxes(next);
                    }
                }
                None => {}
            }
        }

        for root in lines {
            match self.arena[root].root_mut() {
                Some(line) if line.line_break.obj == Some(node) => line.line_break.pos = moved(line.line_break.pos),
                _ => {}
            }
        }
    }

    /// The root box of the line holding `id`
    fn line_root(&self, id: BoxId) -> Option<BoxId> {
        let mut current = id;
        while let Some(parent) = self.arena[current].parent {
            current = parent;
        }
        self.arena[current].is_root().then_some(current)
    }

    /// Finish a line: flows on it no longer accept new children
    pub(crate) fn set_constructed(&mut self, id: BoxId) {
        if let Some(flow) = self.arena[id].flow_mut() {
            flow.constructed = true;
        }
        let children: Vec<BoxId> = self.arena.children(id).collect();
        for child in children {
            if self.arena[child].is_flow() {
                self.set_constructed(child);
            }
        }
    }

    /// Every box of a line, root first, depth-first in visual order
    pub(crate) fn line_box_ids(&self, root: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children: Vec<BoxId> = self.arena.children(id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Leaf boxes of a line in visual order
    pub fn leaf_boxes(&self, root: BoxId) -> Vec<BoxId> {
        self.line_box_ids(root)
            .into_iter()
            .filter(|&id| !self.arena[id].is_flow() || self.arena[id].first_child.is_none() && !self.arena[id].is_root())
            .collect()
    }

    /// Take a line out of the object chains, keeping its boxes alive
    pub(crate) fn extract_line(&mut self, root: BoxId) {
        for id in self.line_box_ids(root) {
            let node = self.arena[id].node;
            self.arena[id].extracted = true;
            self.node_mut(node).boxes.retain(|&b| b != id);
        }
    }

    /// Put an extracted line back at the end of the object chains
    pub(crate) fn attach_line(&mut self, root: BoxId) {
        for id in self.line_box_ids(root) {
            let node = self.arena[id].node;
            self.arena[id].extracted = false;
            self.node_mut(node).boxes.push(id);
        }
    }

    /// Destroy a line and all its boxes
    pub(crate) fn delete_line(&mut self, root: BoxId) {
        for id in self.line_box_ids(root) {
            let node = self.arena[id].node;
            if !self.arena[id].extracted {
                self.node_mut(node).boxes.retain(|&b| b != id);
            }
            self.arena.release(id);
        }
    }

    /// Destroy every line of a block
    pub(crate) fn delete_lines(&mut self, block: NodeId) {
        for root in self.node(block).boxes.clone() {
            self.delete_line(root);
        }
    }

    /// Move a whole line, including the objects positioned from it
    pub(crate) fn shift_line(&mut self, root: BoxId, dx: i32, dy: i32) {
        for id in self.line_box_ids(root) {
            let (node, x, y) = {
                let inline_box = &mut self.arena[id];
                inline_box.x += dx;
                inline_box.y += dy;
                if let BoxKind::Root(line) = &mut inline_box.kind {
                    line.top_overflow += dy;
                    line.bottom_overflow += dy;
                    line.block_height += dy;
                    if let Some(ellipsis) = &mut line.ellipsis {
                        ellipsis.x += dx;
                        ellipsis.y += dy;
                    }
                }
                (inline_box.node, inline_box.x, inline_box.y)
            };

            match self.arena[id].kind {
                BoxKind::Replaced | BoxKind::LineBreak => {
                    self.node_mut(node).position = Point::new(x, y);
                }
                BoxKind::Placeholder => {
                    let node = self.node_mut(node);
                    node.static_x = node.static_x.map(|sx| sx + dx);
                    node.static_y = node.static_y.map(|sy| sy + dy);
                }
                _ => {}
            }
        }
    }
}

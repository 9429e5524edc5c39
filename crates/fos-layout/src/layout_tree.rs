//! Render Tree
//!
//! Arena of the render objects inline layout walks: block containers,
//! inline flows, text, line breaks and atomic content. Nodes are linked
//! parent / first_child / last_child / next_sibling / prev_sibling and are
//! addressed by `NodeId`. Every node owns the ordered chain of inline boxes
//! built for it; the boxes themselves live in the `BoxArena` next to the
//! nodes.

use std::ops::Range;

use fos_css::{ComputedStyle, Float};

use crate::box_model::Point;
use crate::inline::BlockFlow;
use crate::line_box::{BoxArena, BoxId, InlineBox};
use crate::{LayoutError, Result};

/// Node ID in the render tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// What a render object is
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Block container holding a paragraph of inline content
    Block,
    /// Inline flow (`<span>`, `<a>`, ...)
    Inline,
    /// Inline flow that always offers a break (`<wbr>`)
    WordBreak,
    /// Character data
    Text(Vec<char>),
    /// Forced line break (`<br>`)
    LineBreak,
    /// Atomic inline content (images, inline-blocks)
    Replaced { width: i32, height: i32 },
    /// Floated box
    Float { width: i32, height: i32 },
    /// Absolutely positioned box, laid out at its static position
    Positioned { width: i32, height: i32 },
}

impl NodeKind {
    pub fn can_have_children(&self) -> bool {
        matches!(self, NodeKind::Block | NodeKind::Inline | NodeKind::WordBreak)
    }
}

/// A render object
#[derive(Debug)]
pub struct RenderNode {
    pub kind: NodeKind,
    style: ComputedStyle,

    // Tree links
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,

    pub(crate) needs_layout: bool,
    pub(crate) boxes: Vec<BoxId>,
    pub(crate) position: Point,
    pub(crate) static_x: Option<i32>,
    pub(crate) static_y: Option<i32>,
    pub(crate) flow: Option<Box<BlockFlow>>,
}

impl RenderNode {
    fn new(kind: NodeKind, style: ComputedStyle) -> Self {
        Self {
            kind,
            style,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
            needs_layout: true,
            boxes: Vec::new(),
            position: Point::default(),
            static_x: None,
            static_y: None,
            flow: None,
        }
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }
}

/// Render tree - arena of render objects and their inline boxes
#[derive(Debug, Default)]
pub struct RenderTree {
    nodes: Vec<RenderNode>,
    pub(crate) arena: BoxArena,
}

impl RenderTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(64),
            arena: BoxArena::default(),
        }
    }

    /// Create a new node and return its id
    pub fn create_node(&mut self, kind: NodeKind, style: ComputedStyle) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(RenderNode::new(kind, style));
        id
    }

    pub fn create_block(&mut self, style: ComputedStyle) -> NodeId {
        self.create_node(NodeKind::Block, style)
    }

    pub fn create_inline(&mut self, style: ComputedStyle) -> NodeId {
        self.create_node(NodeKind::Inline, style)
    }

    pub fn create_word_break(&mut self) -> NodeId {
        self.create_node(NodeKind::WordBreak, ComputedStyle::default())
    }

    /// Text nodes read their parent's style
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create_node(NodeKind::Text(text.chars().collect()), ComputedStyle::default())
    }

    pub fn create_line_break(&mut self, style: ComputedStyle) -> NodeId {
        self.create_node(NodeKind::LineBreak, style)
    }

    pub fn create_replaced(&mut self, width: i32, height: i32, style: ComputedStyle) -> NodeId {
        self.create_node(NodeKind::Replaced { width, height }, style)
    }

    /// Floated box; a style without a `float` side floats left
    pub fn create_float(&mut self, width: i32, height: i32, mut style: ComputedStyle) -> NodeId {
        if style.float == Float::None {
            style.float = Float::Left;
        }
        self.create_node(NodeKind::Float { width, height }, style)
    }

    pub fn create_positioned(&mut self, width: i32, height: i32, style: ComputedStyle) -> NodeId {
        self.create_node(NodeKind::Positioned { width, height }, style)
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node(&self, id: NodeId) -> &RenderNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut RenderNode {
        &mut self.nodes[id.0]
    }

    fn check(&self, id: NodeId) -> Result<&RenderNode> {
        self.nodes.get(id.0).ok_or(LayoutError::InvalidNode(id))
    }

    /// Append a child to a block or inline flow
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        let parent = self.check(parent_id)?;
        if !parent.kind.can_have_children() {
            return Err(LayoutError::NotAContainer(parent_id));
        }
        let child = self.check(child_id)?;
        if child.kind == NodeKind::Block || child.parent.is_some() || child_id == parent_id {
            return Err(LayoutError::InvalidChild {
                parent: parent_id,
                child: child_id,
            });
        }

        let last_child = self.nodes[parent_id.0].last_child;
        {
            let child = &mut self.nodes[child_id.0];
            child.parent = Some(parent_id);
            child.prev_sibling = last_child;
        }
        match last_child {
            Some(last_id) => self.nodes[last_id.0].next_sibling = Some(child_id),
            None => self.nodes[parent_id.0].first_child = Some(child_id),
        }
        self.nodes[parent_id.0].last_child = Some(child_id);

        // Structural changes are laid out from scratch
        if let Some(block) = self.containing_block(child_id) {
            self.nodes[block.0].needs_layout = true;
        }
        Ok(())
    }

    /// Iterate over children of a node
    pub fn children(&self, parent_id: NodeId) -> ChildIterator<'_> {
        let first = self.get(parent_id).and_then(|n| n.first_child);
        ChildIterator {
            tree: self,
            current: first,
        }
    }

    /// Nearest block ancestor
    pub fn containing_block(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.parent;
        while let Some(node) = current {
            if self.node(node).kind == NodeKind::Block {
                return Some(node);
            }
            current = self.node(node).parent;
        }
        None
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Replace the characters of a text node
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        let new: Vec<char> = text.chars().collect();
        let chars = self.text_mut(id)?;
        // Only the span between the common prefix and suffix changed
        let prefix = chars.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let max_suffix = chars.len().min(new.len()) - prefix;
        let suffix = chars
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        let removed = chars.len() - prefix - suffix;
        let inserted = new.len() - prefix - suffix;
        *chars = new;
        if removed != 0 || inserted != 0 {
            self.dirty_text_range(id, prefix, removed, inserted);
        }
        Ok(())
    }

    /// Insert characters at a char offset
    pub fn insert_text(&mut self, id: NodeId, offset: usize, text: &str) -> Result<()> {
        let chars = self.text_mut(id)?;
        if offset > chars.len() {
            return Err(LayoutError::InvalidOffset {
                offset,
                len: chars.len(),
            });
        }
        let before = chars.len();
        chars.splice(offset..offset, text.chars());
        let inserted = chars.len() - before;
        self.dirty_text_range(id, offset, 0, inserted);
        Ok(())
    }

    /// Remove a char range
    pub fn delete_text(&mut self, id: NodeId, range: Range<usize>) -> Result<()> {
        let chars = self.text_mut(id)?;
        if range.start > range.end || range.end > chars.len() {
            return Err(LayoutError::InvalidOffset {
                offset: range.end,
                len: chars.len(),
            });
        }
        let removed = range.len();
        chars.drain(range.clone());
        self.dirty_text_range(id, range.start, removed, 0);
        Ok(())
    }

    fn text_mut(&mut self, id: NodeId) -> Result<&mut Vec<char>> {
        match self.nodes.get_mut(id.0) {
            Some(RenderNode {
                kind: NodeKind::Text(chars),
                ..
            }) => Ok(chars),
            Some(_) => Err(LayoutError::NotText(id)),
            None => Err(LayoutError::InvalidNode(id)),
        }
    }

    /// Replace a node's style
    pub fn set_style(&mut self, id: NodeId, style: ComputedStyle) -> Result<()> {
        self.check(id)?;
        if self.is_text(id) {
            return Err(LayoutError::StyleOnText(id));
        }
        self.nodes[id.0].style = style;
        self.mark_needs_layout(id);
        Ok(())
    }

    /// Resize atomic content
    pub fn set_size(&mut self, id: NodeId, new_width: i32, new_height: i32) -> Result<()> {
        match &mut self.nodes.get_mut(id.0).ok_or(LayoutError::InvalidNode(id))?.kind {
            NodeKind::Replaced { width, height }
            | NodeKind::Float { width, height }
            | NodeKind::Positioned { width, height } => {
                *width = new_width;
                *height = new_height;
            }
            _ => return Err(LayoutError::NotAtomic(id)),
        }
        self.mark_needs_layout(id);
        Ok(())
    }

    /// Flag a node for layout; its line boxes are dirtied by the next pass
    pub fn mark_needs_layout(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.needs_layout = true;
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Style of a node; text reads its parent's
    pub fn style(&self, id: NodeId) -> &ComputedStyle {
        let node = self.node(id);
        match (&node.kind, node.parent) {
            (NodeKind::Text(_), Some(parent)) => &self.node(parent).style,
            _ => &node.style,
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Block)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    pub fn is_br(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::LineBreak)
    }

    pub fn is_inline_flow(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Inline | NodeKind::WordBreak)
    }

    pub fn is_word_break(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::WordBreak)
    }

    pub fn is_replaced(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Replaced { .. })
    }

    pub fn is_floating(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Float { .. })
    }

    pub fn is_positioned(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Positioned { .. })
    }

    pub fn is_floating_or_positioned(&self, id: NodeId) -> bool {
        self.is_floating(id) || self.is_positioned(id)
    }

    /// `left` and `right` are both `auto`
    pub fn has_static_x(&self, id: NodeId) -> bool {
        let inset = &self.node(id).style.inset;
        inset.left.is_none() && inset.right.is_none()
    }

    /// `top` and `bottom` are both `auto`
    pub fn has_static_y(&self, id: NodeId) -> bool {
        let inset = &self.node(id).style.inset;
        inset.top.is_none() && inset.bottom.is_none()
    }

    /// Positioned box whose x or y comes from the normal flow
    pub fn is_pos_with_static_dim(&self, id: NodeId) -> bool {
        self.is_positioned(id) && (self.has_static_x(id) || self.has_static_y(id))
    }

    /// Characters of a text node, empty for anything else
    pub fn text(&self, id: NodeId) -> &[char] {
        match &self.node(id).kind {
            NodeKind::Text(chars) => chars,
            _ => &[],
        }
    }

    /// Character count for text, 1 for every other object
    pub fn length(&self, id: NodeId) -> usize {
        match &self.node(id).kind {
            NodeKind::Text(chars) => chars.len(),
            _ => 1,
        }
    }

    pub fn char_at(&self, id: NodeId, pos: usize) -> Option<char> {
        self.text(id).get(pos).copied()
    }

    /// Width and height of atomic content, zero for the rest
    pub fn intrinsic_size(&self, id: NodeId) -> (i32, i32) {
        match self.node(id).kind {
            NodeKind::Replaced { width, height }
            | NodeKind::Float { width, height }
            | NodeKind::Positioned { width, height } => (width, height),
            _ => (0, 0),
        }
    }

    // ------------------------------------------------------------------
    // Layout output
    // ------------------------------------------------------------------

    /// Inline boxes built for a node, in line order. For a block these
    /// are its root line boxes.
    pub fn boxes(&self, id: NodeId) -> &[BoxId] {
        self.get(id).map(|n| n.boxes.as_slice()).unwrap_or(&[])
    }

    /// Root line boxes of a block
    pub fn lines(&self, block: NodeId) -> &[BoxId] {
        self.boxes(block)
    }

    pub fn inline_box(&self, id: BoxId) -> Option<&InlineBox> {
        self.arena.get(id)
    }

    /// Position of replaced content and floats
    pub fn position(&self, id: NodeId) -> Point {
        self.node(id).position
    }

    pub fn static_x(&self, id: NodeId) -> Option<i32> {
        self.node(id).static_x
    }

    pub fn static_y(&self, id: NodeId) -> Option<i32> {
        self.node(id).static_y
    }

    /// Persistent inline layout state of a block
    pub fn block_flow(&self, block: NodeId) -> Option<&BlockFlow> {
        self.get(block).and_then(|n| n.flow.as_deref())
    }

    pub(crate) fn take_flow(&mut self, block: NodeId) -> Box<BlockFlow> {
        self.node_mut(block).flow.take().unwrap_or_default()
    }

    pub(crate) fn restore_flow(&mut self, block: NodeId, flow: Box<BlockFlow>) {
        self.node_mut(block).flow = Some(flow);
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Iterator over child nodes
pub struct ChildIterator<'a> {
    tree: &'a RenderTree,
    current: Option<NodeId>,
}

impl Iterator for ChildIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.get(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

//! Inline Content Iteration
//!
//! Depth-first walks over the inline content of one block. `next_object`
//! is the bidi walk: it stops at text, line breaks, atomic content,
//! floats, positioned boxes and (unless inlines are skipped) inline flows,
//! reports the embedding changes implied by `unicode-bidi` on the flows it
//! enters and leaves, and can report the end of an inline flow as a
//! separate stop. `BidiIterator` is a (object, offset) position built on
//! it. `InlineWalker` is the simpler walk the line breaker uses.

use fos_css::{Direction, UnicodeBidi};
use fos_text::BidiClass;

use crate::layout_tree::{NodeId, RenderTree};

/// Explicit embedding implied by entering `flow`, if any
fn embedding_for(tree: &RenderTree, flow: NodeId) -> Option<BidiClass> {
    if !tree.is_inline_flow(flow) {
        return None;
    }
    let style = tree.style(flow);
    let rtl = style.direction == Direction::Rtl;
    match style.unicode_bidi {
        UnicodeBidi::Normal => None,
        UnicodeBidi::Embed => Some(if rtl { BidiClass::RLE } else { BidiClass::LRE }),
        UnicodeBidi::BidiOverride => Some(if rtl { BidiClass::RLO } else { BidiClass::LRO }),
    }
}

/// Objects a walk always stops at
fn is_stop(tree: &RenderTree, node: NodeId) -> bool {
    tree.is_text(node) || tree.is_br(node) || tree.is_replaced(node) || tree.is_floating_or_positioned(node)
}

/// Next object after `current` inside `block`.
///
/// With `end_of_inline` given and inlines not skipped, an inline flow is
/// returned a second time with the flag set once its children are done.
/// Embeddings for entered flows and `PDF` for left ones are pushed onto
/// `embeds` in walk order.
pub fn next_object(
    tree: &RenderTree,
    block: NodeId,
    current: Option<NodeId>,
    skip_inlines: bool,
    mut end_of_inline: Option<&mut bool>,
    mut embeds: Option<&mut Vec<BidiClass>>,
) -> Option<NodeId> {
    let old_end_of_inline = end_of_inline.as_deref().copied().unwrap_or(false);
    if let Some(flag) = end_of_inline.as_deref_mut() {
        *flag = false;
    }

    let mut current = current;
    let mut next = None;
    while let Some(cur) = current {
        next = None;
        if !old_end_of_inline && !tree.is_floating_or_positioned(cur) && !tree.is_replaced(cur) {
            next = tree.first_child(cur);
            if let (Some(child), Some(out)) = (next, embeds.as_deref_mut()) {
                out.extend(embedding_for(tree, child));
            }
        }

        if next.is_none() {
            if !skip_inlines && !old_end_of_inline && tree.is_inline_flow(cur) {
                if let Some(flag) = end_of_inline.as_deref_mut() {
                    *flag = true;
                    next = Some(cur);
                    break;
                }
            }

            let mut climbing = Some(cur);
            while let Some(up) = climbing {
                if up == block {
                    break;
                }
                if let Some(out) = embeds.as_deref_mut() {
                    if embedding_for(tree, up).is_some() {
                        out.push(BidiClass::PDF);
                    }
                }
                next = tree.next_sibling(up);
                if let Some(sibling) = next {
                    if let Some(out) = embeds.as_deref_mut() {
                        out.extend(embedding_for(tree, sibling));
                    }
                    break;
                }

                climbing = tree.parent(up);
                if let Some(parent) = climbing {
                    if !skip_inlines && parent != block && tree.is_inline_flow(parent) {
                        if let Some(flag) = end_of_inline.as_deref_mut() {
                            next = Some(parent);
                            *flag = true;
                            break;
                        }
                    }
                }
            }
        }

        let Some(candidate) = next else {
            break;
        };
        if is_stop(tree, candidate)
            || (tree.is_inline_flow(candidate) && (!skip_inlines || tree.first_child(candidate).is_none()))
        {
            break;
        }
        current = Some(candidate);
    }
    next
}

/// First object of a block's inline content
pub fn first_object(
    tree: &RenderTree,
    block: NodeId,
    skip_inlines: bool,
    mut embeds: Option<&mut Vec<BidiClass>>,
) -> Option<NodeId> {
    let first = tree.first_child(block)?;
    if let Some(out) = embeds.as_deref_mut() {
        out.extend(embedding_for(tree, first));
    }

    let mut obj = Some(first);
    if tree.is_inline_flow(first) {
        if skip_inlines && tree.first_child(first).is_some() {
            obj = next_object(tree, block, obj, skip_inlines, None, embeds.as_deref_mut());
        } else {
            return obj;
        }
    }

    match obj {
        Some(node) if !is_stop(tree, node) => next_object(tree, block, Some(node), skip_inlines, None, embeds),
        other => other,
    }
}

/// A position in the inline content of a block.
///
/// For text `pos` is a character offset; every other object has the
/// single position 0. `obj == None` is the end of the paragraph.
#[derive(Debug, Clone, Copy)]
pub struct BidiIterator {
    pub block: NodeId,
    pub obj: Option<NodeId>,
    pub pos: usize,
    pub end_of_inline: bool,
}

impl PartialEq for BidiIterator {
    fn eq(&self, other: &Self) -> bool {
        self.obj == other.obj && self.pos == other.pos
    }
}

impl Eq for BidiIterator {}

impl BidiIterator {
    pub fn new(block: NodeId, obj: Option<NodeId>, pos: usize) -> Self {
        Self {
            block,
            obj,
            pos,
            end_of_inline: false,
        }
    }

    pub fn with_end_of_inline(mut self, end_of_inline: bool) -> Self {
        self.end_of_inline = end_of_inline;
        self
    }

    /// Iterator at the first object of `block`
    pub fn first(tree: &RenderTree, block: NodeId, embeds: Option<&mut Vec<BidiClass>>) -> Self {
        Self::new(block, first_object(tree, block, false, embeds), 0)
    }

    pub fn at_end(&self) -> bool {
        self.obj.is_none()
    }

    /// Step one character (text) or one object (anything else)
    pub fn increment(&mut self, tree: &RenderTree, embeds: Option<&mut Vec<BidiClass>>, skip_inlines: bool) {
        let Some(obj) = self.obj else {
            return;
        };
        if tree.is_text(obj) {
            self.pos += 1;
            if self.pos >= tree.length(obj) {
                self.obj = next_object(tree, self.block, Some(obj), skip_inlines, None, embeds);
                self.pos = 0;
            }
        } else {
            let mut end_of_inline = self.end_of_inline;
            self.obj = next_object(tree, self.block, Some(obj), skip_inlines, Some(&mut end_of_inline), embeds);
            self.end_of_inline = end_of_inline;
            self.pos = 0;
        }
    }

    /// Character under the iterator. A `<br>` reads as a newline and
    /// anything else off text as a no-break space.
    pub fn current(&self, tree: &RenderTree) -> char {
        match self.obj {
            Some(obj) if tree.is_br(obj) => '\n',
            Some(obj) => tree.char_at(obj, self.pos).unwrap_or('\u{a0}'),
            None => '\u{a0}',
        }
    }

    /// Bidi class of the character under the iterator.
    ///
    /// Line breaks are `B`; other non-text objects are `ON`.
    pub fn direction(&self, tree: &RenderTree) -> BidiClass {
        let Some(obj) = self.obj else {
            return BidiClass::ON;
        };
        if tree.is_br(obj) {
            return BidiClass::B;
        }
        if !tree.is_text(obj) {
            return BidiClass::ON;
        }
        tree.char_at(obj, self.pos)
            .map(|c| BidiClass::of(c).resolved())
            .unwrap_or(BidiClass::ON)
    }
}

/// Walk used by the line breaker.
///
/// Visits every node below the block once, in document order, and also
/// stops at the end of each inline flow. Reports no embeddings.
#[derive(Debug, Clone, Copy)]
pub struct InlineWalker {
    pub block: NodeId,
    pub current: Option<NodeId>,
    pub end_of_inline: bool,
    pub skip_positioned: bool,
}

impl InlineWalker {
    pub fn new(block: NodeId, current: Option<NodeId>, end_of_inline: bool, skip_positioned: bool) -> Self {
        Self {
            block,
            current,
            end_of_inline,
            skip_positioned,
        }
    }

    pub fn next(&mut self, tree: &RenderTree) -> Option<NodeId> {
        let old_end_of_inline = self.end_of_inline;
        self.end_of_inline = false;

        let mut result = None;
        while let Some(mut current) = self.current {
            if !old_end_of_inline
                && (current == self.block || (!tree.is_floating_or_positioned(current) && !tree.is_replaced(current)))
            {
                result = tree.first_child(current);
            }

            if result.is_none() {
                // Empty inline flow: report its end right away
                if !old_end_of_inline && tree.is_inline_flow(current) {
                    result = Some(current);
                    self.end_of_inline = true;
                    break;
                }
                while current != self.block {
                    result = tree.next_sibling(current);
                    if result.is_some() {
                        break;
                    }
                    let Some(parent) = tree.parent(current) else {
                        break;
                    };
                    current = parent;
                    if current != self.block && tree.is_inline_flow(current) {
                        result = Some(current);
                        self.end_of_inline = true;
                        break;
                    }
                }
            }

            let Some(candidate) = result else {
                break;
            };
            if !self.skip_positioned || !tree.is_positioned(candidate) {
                break;
            }
            self.current = Some(candidate);
            result = None;
        }

        self.current = result;
        result
    }
}

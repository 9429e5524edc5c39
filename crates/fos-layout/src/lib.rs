//! fOS Layout Engine - Inline Layout
//!
//! Lays out the inline content of block containers into line boxes:
//! - Render tree of blocks, inline flows, text and atomic objects
//! - Bidi run resolution and visual reordering (UAX #9)
//! - Line breaking with whitespace collapsing, floats and `<br>`
//! - Line box construction, alignment, justification and `text-overflow`
//! - Vertical alignment, paged media and incremental relayout

mod box_model;
mod config;
mod construct;
mod error;
mod float;
mod incremental;
mod inline;
mod iterator;
mod layout_tree;
mod line_box;
mod line_break;
mod midpoint;
mod pagination;
mod position;
mod resolver;
mod vertical;

pub use box_model::{Point, Rect};
pub use config::{LayoutConfig, Pagination};
pub use error::{LayoutError, Result};
pub use float::FloatingObject;
pub use inline::{
    inline_child_needs_line_box, layout_inline_children, BlockFlow, InlineFormattingContext, LayoutOutcome,
    LayoutStats,
};
pub use iterator::{first_object, next_object, BidiIterator, InlineWalker};
pub use layout_tree::{ChildIterator, NodeId, NodeKind, RenderNode, RenderTree};
pub use line_box::{
    BoxArena, BoxId, BoxKind, EllipsisBox, FlowData, InlineBox, LineBreakInfo, RootLine, TextSlice, Truncation,
};
pub use line_break::{border_padding_margin, requires_line_box, text_width, LineBreakResult, StaticPosition};
pub use midpoint::{Midpoint, Midpoints, EXCLUDE_OBJECT};
pub use pagination::WidowsRetry;
pub use position::ELLIPSIS;
pub use resolver::{reorder_line, reorder_visually, BidiRun, BidiState, ResolvedLine};
pub use vertical::VerticalHint;

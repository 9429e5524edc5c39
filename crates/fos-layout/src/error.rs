//! Layout errors
//!
//! Line layout itself never fails: extreme input is clamped. These errors
//! only report misuse of the render tree API.

use crate::NodeId;

/// Layout error types
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Invalid node: {0:?}")]
    InvalidNode(NodeId),

    #[error("Node {0:?} cannot have children")]
    NotAContainer(NodeId),

    #[error("Node {child:?} cannot be placed inside {parent:?}")]
    InvalidChild { parent: NodeId, child: NodeId },

    #[error("Node {0:?} is not a block container")]
    NotABlock(NodeId),

    #[error("Node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("Offset {offset} out of range for text of length {len}")]
    InvalidOffset { offset: usize, len: usize },

    #[error("Text node {0:?} takes its style from its parent")]
    StyleOnText(NodeId),

    #[error("Node {0:?} has no intrinsic size")]
    NotAtomic(NodeId),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

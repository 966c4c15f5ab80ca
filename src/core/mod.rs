//! core
//!
//! Strong domain types shared by every layer.
//!
//! Navigation deals in opaque handles and small value types: screen units,
//! popover anchors, branch tags, presentation metadata, and stack
//! snapshots. They live here so the wireframe, host, and dispatch layers
//! can agree on vocabulary without depending on each other.

pub mod types;

pub use types::{
    AnchorRect, AnchorTarget, ArrowDirections, BranchTag, PresentationStyle, ScreenUnit,
    StackSnapshot, TagError, TransitionStyle,
};

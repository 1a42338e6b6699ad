//! Rendering collaborator consulted and updated during a drag.

use crate::model::node::NodeId;
use crate::reorder::geometry::{DropPosition, Point, VerticalExtent};

/// Node found under the pointer together with its on-screen span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetHit {
    pub node_id: NodeId,
    pub extent: VerticalExtent,
}

/// Surface that renders the forest and shows drag feedback.
///
/// Implementations live outside the core (DOM, TUI, test doubles).
pub trait RenderSurface {
    /// Resolves the node under `point`, if any.
    fn resolve_target_at(&mut self, point: Point) -> Option<TargetHit>;
    /// Places the drop indicator on `node_id`.
    fn show_drop_indicator(&mut self, node_id: NodeId, position: DropPosition);
    /// Marks `node_id` as a target the dragged node cannot land on.
    fn mark_invalid_target(&mut self, node_id: NodeId);
    /// Removes every indicator and invalid marking.
    fn clear_drag_feedback(&mut self);
}

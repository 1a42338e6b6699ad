//! Pointer-driven drag state machine.
//!
//! # Responsibility
//! - Tell a click from a drag using the configured threshold.
//! - Track the current drop target and its descendant-check status.
//! - Keep surface feedback consistent with the latest accepted verdict.
//!
//! # Invariants
//! - States move `Idle -> Armed -> Dragging -> Idle` only.
//! - A check verdict is applied only while its ticket names the current target.
//! - A drop is produced only for a target whose check returned `Ok(false)`.
//! - Every exit from `Dragging` clears surface feedback.

use crate::model::node::NodeId;
use crate::reorder::geometry::{DragConfig, DropPosition, Point, VerticalExtent};
use crate::reorder::plan::DropRequest;
use crate::reorder::surface::{RenderSurface, TargetHit};
use crate::repo::node_store::StoreError;
use log::{debug, warn};

/// Identifies one issued descendant check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckTicket(u64);

/// Descendant check the driver must run: is `target_id` below `dragged_id`?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleCheck {
    pub ticket: CheckTicket,
    pub dragged_id: NodeId,
    pub target_id: NodeId,
}

/// Validation state of the current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Check issued, verdict not yet applied.
    Pending(CheckTicket),
    Valid(DropPosition),
    Invalid,
}

/// Current drop target as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTarget {
    pub node_id: NodeId,
    pub extent: VerticalExtent,
    pub status: TargetStatus,
}

/// Result of feeding one pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No press in progress, or still within the click threshold.
    Ignored,
    /// Dragging with nothing under the pointer.
    NoTarget,
    /// Target unchanged, or rejected without a store round trip.
    Updated,
    /// New target; the driver must run this check and report back.
    CheckRequired(CycleCheck),
}

/// Result of applying one check verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Valid(DropPosition),
    Invalid,
    /// Ticket no longer matches the current target; nothing changed.
    Stale,
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Press ended before the threshold was crossed.
    Click(NodeId),
    /// Release over a validated target.
    Drop(DropRequest),
    /// Drag ended without a valid target; nothing to commit.
    Cancelled,
    Ignored,
}

#[derive(Debug, Clone)]
struct DragSession {
    dragged_id: NodeId,
    last_point: Point,
    target: Option<DragTarget>,
}

#[derive(Debug, Clone)]
enum DragState {
    Idle,
    Armed { node_id: NodeId, origin: Point },
    Dragging(DragSession),
}

/// Sans-IO reorder state machine.
///
/// Feed pointer events in; run each [`CycleCheck`] against the store and hand
/// the verdict back through [`resolve_check`](ReorderEngine::resolve_check).
#[derive(Debug, Clone)]
pub struct ReorderEngine {
    config: DragConfig,
    state: DragState,
    next_ticket: u64,
}

impl Default for ReorderEngine {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}

impl ReorderEngine {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            state: DragState::Idle,
            next_ticket: 0,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Node being pressed or dragged, if any.
    pub fn active_node(&self) -> Option<NodeId> {
        match &self.state {
            DragState::Idle => None,
            DragState::Armed { node_id, .. } => Some(*node_id),
            DragState::Dragging(session) => Some(session.dragged_id),
        }
    }

    pub fn target(&self) -> Option<DragTarget> {
        match &self.state {
            DragState::Dragging(session) => session.target,
            _ => None,
        }
    }

    /// Arms a press on `node_id`. Ignored while a drag is in progress.
    pub fn pointer_down(&mut self, node_id: NodeId, point: Point) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.state = DragState::Armed {
            node_id,
            origin: point,
        };
        true
    }

    pub fn pointer_move(&mut self, point: Point, surface: &mut dyn RenderSurface) -> MoveOutcome {
        if let DragState::Armed { node_id, origin } = self.state {
            if !point.moved_past(origin, self.config.drag_threshold) {
                return MoveOutcome::Ignored;
            }
            debug!("event=drag_start module=reorder status=ok node_id={node_id}");
            self.state = DragState::Dragging(DragSession {
                dragged_id: node_id,
                last_point: point,
                target: None,
            });
        }

        let DragState::Dragging(session) = &mut self.state else {
            return MoveOutcome::Ignored;
        };
        session.last_point = point;

        let Some(hit) = surface.resolve_target_at(point) else {
            if session.target.take().is_some() {
                surface.clear_drag_feedback();
            }
            return MoveOutcome::NoTarget;
        };

        if let Some(current) = session.target.as_mut() {
            if current.node_id == hit.node_id {
                current.extent = hit.extent;
                if let TargetStatus::Valid(previous) = current.status {
                    let position =
                        DropPosition::from_pointer(point.y, hit.extent, &self.config);
                    if position != previous {
                        current.status = TargetStatus::Valid(position);
                        surface.show_drop_indicator(hit.node_id, position);
                    }
                }
                return MoveOutcome::Updated;
            }
        }

        if session.target.is_some() {
            surface.clear_drag_feedback();
        }

        if hit.node_id == session.dragged_id {
            session.target = Some(DragTarget {
                node_id: hit.node_id,
                extent: hit.extent,
                status: TargetStatus::Invalid,
            });
            surface.mark_invalid_target(hit.node_id);
            return MoveOutcome::Updated;
        }

        let dragged_id = session.dragged_id;
        let ticket = CheckTicket(self.next_ticket);
        self.next_ticket += 1;
        session.target = Some(DragTarget {
            node_id: hit.node_id,
            extent: hit.extent,
            status: TargetStatus::Pending(ticket),
        });
        surface.show_drop_indicator(hit.node_id, self.position_for(point, hit));

        MoveOutcome::CheckRequired(CycleCheck {
            ticket,
            dragged_id,
            target_id: hit.node_id,
        })
    }

    /// Applies the verdict of `ticket`.
    ///
    /// `Ok(true)` (target is a descendant) and any error both reject the target.
    pub fn resolve_check(
        &mut self,
        ticket: CheckTicket,
        verdict: Result<bool, StoreError>,
        surface: &mut dyn RenderSurface,
    ) -> CheckOutcome {
        let config = self.config;
        let DragState::Dragging(session) = &mut self.state else {
            debug!("event=drag_check_stale module=reorder status=skip reason=not_dragging");
            return CheckOutcome::Stale;
        };
        let Some(target) = session
            .target
            .as_mut()
            .filter(|target| target.status == TargetStatus::Pending(ticket))
        else {
            debug!("event=drag_check_stale module=reorder status=skip reason=target_changed");
            return CheckOutcome::Stale;
        };

        match verdict {
            Ok(false) => {
                let position =
                    DropPosition::from_pointer(session.last_point.y, target.extent, &config);
                target.status = TargetStatus::Valid(position);
                surface.show_drop_indicator(target.node_id, position);
                CheckOutcome::Valid(position)
            }
            Ok(true) => {
                target.status = TargetStatus::Invalid;
                surface.clear_drag_feedback();
                surface.mark_invalid_target(target.node_id);
                CheckOutcome::Invalid
            }
            Err(err) => {
                warn!(
                    "event=drag_check module=reorder status=error target_id={} error={}",
                    target.node_id, err
                );
                target.status = TargetStatus::Invalid;
                surface.clear_drag_feedback();
                surface.mark_invalid_target(target.node_id);
                CheckOutcome::Invalid
            }
        }
    }

    /// Aborts an in-progress drag. Returns whether one was aborted.
    pub fn cancel(&mut self, surface: &mut dyn RenderSurface) -> bool {
        if !self.is_dragging() {
            return false;
        }
        self.state = DragState::Idle;
        surface.clear_drag_feedback();
        debug!("event=drag_cancel module=reorder status=ok");
        true
    }

    pub fn pointer_up(&mut self, surface: &mut dyn RenderSurface) -> ReleaseOutcome {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => ReleaseOutcome::Ignored,
            DragState::Armed { node_id, .. } => ReleaseOutcome::Click(node_id),
            DragState::Dragging(session) => {
                surface.clear_drag_feedback();
                match session.target {
                    Some(DragTarget {
                        node_id,
                        status: TargetStatus::Valid(position),
                        ..
                    }) => ReleaseOutcome::Drop(DropRequest {
                        dragged_id: session.dragged_id,
                        target_id: node_id,
                        position,
                    }),
                    _ => ReleaseOutcome::Cancelled,
                }
            }
        }
    }

    fn position_for(&self, point: Point, hit: TargetHit) -> DropPosition {
        DropPosition::from_pointer(point.y, hit.extent, &self.config)
    }
}

//! Drag session bound to a live store.

use crate::model::node::NodeId;
use crate::reorder::engine::{DragTarget, MoveOutcome, ReleaseOutcome, ReorderEngine};
use crate::reorder::geometry::{DragConfig, Point};
use crate::reorder::plan::{commit_drop, DropRequest};
use crate::reorder::surface::RenderSurface;
use crate::repo::node_store::{NodeStore, StoreError};
use log::error;

/// What a pointer release ended up doing.
#[derive(Debug)]
pub enum DropOutcome {
    Click(NodeId),
    Committed { request: DropRequest, applied: usize },
    Cancelled,
    Ignored,
    /// The batch was rejected; the store is unchanged.
    Failed { request: DropRequest, error: StoreError },
}

/// Context object owning one drag session and the store it mutates.
///
/// Descendant checks run synchronously against the store as soon as the
/// engine asks for them.
pub struct DragController<'s, S: NodeStore + ?Sized> {
    store: &'s S,
    engine: ReorderEngine,
}

impl<'s, S: NodeStore + ?Sized> DragController<'s, S> {
    pub fn new(store: &'s S, config: DragConfig) -> Self {
        Self {
            store,
            engine: ReorderEngine::new(config),
        }
    }

    pub fn engine(&self) -> &ReorderEngine {
        &self.engine
    }

    pub fn pointer_down(&mut self, node_id: NodeId, point: Point) -> bool {
        self.engine.pointer_down(node_id, point)
    }

    /// Feeds a move and resolves any check it triggers.
    ///
    /// Returns the current target after the move.
    pub fn pointer_move(
        &mut self,
        point: Point,
        surface: &mut dyn RenderSurface,
    ) -> Option<DragTarget> {
        if let MoveOutcome::CheckRequired(check) = self.engine.pointer_move(point, surface) {
            let verdict = self.store.is_descendant(check.dragged_id, check.target_id);
            self.engine.resolve_check(check.ticket, verdict, surface);
        }
        self.engine.target()
    }

    pub fn cancel(&mut self, surface: &mut dyn RenderSurface) -> bool {
        self.engine.cancel(surface)
    }

    pub fn pointer_up(&mut self, surface: &mut dyn RenderSurface) -> DropOutcome {
        match self.engine.pointer_up(surface) {
            ReleaseOutcome::Click(node_id) => DropOutcome::Click(node_id),
            ReleaseOutcome::Cancelled => DropOutcome::Cancelled,
            ReleaseOutcome::Ignored => DropOutcome::Ignored,
            ReleaseOutcome::Drop(request) => match commit_drop(self.store, &request) {
                Ok(applied) => DropOutcome::Committed { request, applied },
                Err(err) => {
                    error!(
                        "event=drag_commit module=reorder status=error node_id={} target_id={} error={}",
                        request.dragged_id, request.target_id, err
                    );
                    DropOutcome::Failed {
                        request,
                        error: err,
                    }
                }
            },
        }
    }
}

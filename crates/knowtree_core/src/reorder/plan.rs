//! Commit planning for a validated drop.
//!
//! # Invariants
//! - The dragged node's own move is the last entry of the plan.
//! - Dragged and target nodes belong to the same tree.
//! - Sibling entries are emitted only when their order actually changes.

use crate::model::node::{NodeBatchUpdate, NodeId};
use crate::reorder::geometry::DropPosition;
use crate::repo::node_store::{NodeStore, StoreError, StoreResult};
use log::info;

/// Drop accepted by the engine, ready to be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropRequest {
    pub dragged_id: NodeId,
    pub target_id: NodeId,
    pub position: DropPosition,
}

/// Computes the batch that realizes `request` against current store state.
pub fn plan_drop<S: NodeStore + ?Sized>(
    store: &S,
    request: &DropRequest,
) -> StoreResult<Vec<NodeBatchUpdate>> {
    let dragged_id = request.dragged_id;
    if dragged_id == request.target_id {
        return Err(StoreError::CycleDetected {
            node_id: dragged_id,
            parent_id: request.target_id,
        });
    }
    let dragged = store
        .get_node(dragged_id)?
        .ok_or(StoreError::NodeNotFound(dragged_id))?;
    let target = store
        .get_node(request.target_id)?
        .ok_or(StoreError::NodeNotFound(request.target_id))?;
    if dragged.tree_id != target.tree_id {
        return Err(StoreError::InvalidParent {
            node_tree: dragged.tree_id,
            parent_id: target.id,
        });
    }

    if request.position == DropPosition::Inside {
        let children = store.children(target.id)?;
        let after_last = children
            .iter()
            .filter(|child| child.id != dragged_id)
            .map(|child| child.order + 1)
            .max()
            .unwrap_or(0);
        let new_order = (children.len() as i64).max(after_last);
        return Ok(vec![NodeBatchUpdate::move_to(
            dragged_id,
            Some(target.id),
            new_order,
        )]);
    }

    let mut siblings = match target.parent_id {
        Some(parent_id) => store.children(parent_id)?,
        None => store.root_nodes(target.tree_id)?,
    };
    siblings.retain(|sibling| sibling.id != dragged_id);

    let target_index = siblings
        .iter()
        .position(|sibling| sibling.id == target.id)
        .ok_or_else(|| {
            StoreError::InvalidData(format!(
                "target {} missing from its own sibling group",
                target.id
            ))
        })?;
    let new_order = match request.position {
        DropPosition::Before => target_index,
        _ => target_index + 1,
    };

    let mut plan = Vec::with_capacity(siblings.len() + 1);
    for (index, sibling) in siblings.iter().enumerate() {
        let wanted = if index >= new_order { index + 1 } else { index };
        let wanted = wanted as i64;
        if sibling.order != wanted {
            plan.push(NodeBatchUpdate::reorder(sibling.id, wanted));
        }
    }
    plan.push(NodeBatchUpdate::move_to(
        dragged_id,
        target.parent_id,
        new_order as i64,
    ));
    Ok(plan)
}

/// Plans `request` and submits the result as one atomic batch.
///
/// Returns the number of entries applied.
pub fn commit_drop<S: NodeStore + ?Sized>(store: &S, request: &DropRequest) -> StoreResult<usize> {
    let plan = plan_drop(store, request)?;
    let applied = store.update_nodes_batch(&plan)?;
    info!(
        "event=drag_commit module=reorder status=ok node_id={} target_id={} position={} entries={}",
        request.dragged_id,
        request.target_id,
        request.position.as_str(),
        applied
    );
    Ok(applied)
}

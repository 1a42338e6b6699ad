//! Drag-and-drop reordering of tree nodes.
//!
//! # Responsibility
//! - Track one pointer interaction from press to release (`engine`).
//! - Turn a validated drop into one atomic store batch (`plan`).
//! - Drive the engine against a live store (`controller`).
//!
//! # Invariants
//! - The engine never touches the store; descendant checks are handed out as
//!   tickets and only the verdict for the current target is applied.
//! - A drop is committed with a single `update_nodes_batch` call or not at all.

pub mod controller;
pub mod engine;
pub mod geometry;
pub mod plan;
pub mod surface;

pub use controller::{DragController, DropOutcome};
pub use engine::{
    CheckOutcome, CheckTicket, CycleCheck, DragTarget, MoveOutcome, ReleaseOutcome,
    ReorderEngine, TargetStatus,
};
pub use geometry::{DragConfig, DropPosition, Point, VerticalExtent};
pub use plan::{commit_drop, plan_drop, DropRequest};
pub use surface::{RenderSurface, TargetHit};

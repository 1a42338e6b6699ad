//! Core library for KnowTree: an ordered forest of notes captured from a
//! conversation and reorganized by drag-and-drop.
//! This crate is the single source of truth for forest invariants.

pub mod capture;
pub mod db;
pub mod logging;
pub mod model;
pub mod reorder;
pub mod repo;
pub mod search;
pub mod service;
pub mod sync;

pub use capture::{
    CaptureConfig, CaptureListener, CaptureReconciler, CaptureReport, ContentSource,
    NoopListener, Snippet, StaticSource,
};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::node::{NewNode, Node, NodeBatchUpdate, NodeId, NodeKind, NodePatch, NodeRole};
pub use model::tree::{NewTree, Tree, TreeId};
pub use reorder::{
    commit_drop, plan_drop, DragConfig, DragController, DropOutcome, DropPosition, DropRequest,
    Point, RenderSurface, ReorderEngine, TargetHit, VerticalExtent,
};
pub use repo::node_store::{NodeStore, SqliteNodeStore, StoreError, StoreResult};
pub use repo::settings_repo::{SettingsError, SettingsRepository};
pub use search::node_search::{search_nodes, NodeSearchHit, NodeSearchQuery, SearchError};
pub use service::transfer::{
    export_library, export_tree, import_tree, import_tree_json, ImportPayload, ImportedTree,
    LibraryExport, TreeExport,
};
pub use service::tree_service::{ForestNode, TreeService, TreeServiceError};
pub use sync::{ConversationRef, ConversationSync, SyncGuard, SyncOutcome, SyncReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

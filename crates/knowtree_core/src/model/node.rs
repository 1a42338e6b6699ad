//! Node domain model.
//!
//! # Responsibility
//! - Define the persisted node record and its kind/role enums.
//! - Define write requests: single create, partial patch, batch entry.
//!
//! # Invariants
//! - `parent_id`, when set, names a node in the same tree.
//! - Following `parent_id` links never revisits a node.
//! - `order` is only meaningful relative to siblings.

use crate::model::tree::TreeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable node identifier.
pub type NodeId = Uuid;

/// Title given to nodes created without one.
pub const DEFAULT_NODE_TITLE: &str = "New node";

/// Structural role of a node inside its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Top-level topic, usually one captured conversation turn.
    Main,
    /// Refinement placed under another node.
    Child,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Child => "child",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "main" => Some(Self::Main),
            "child" => Some(Self::Child),
            _ => None,
        }
    }
}

/// Which side of the conversation produced the node text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    User,
    #[serde(alias = "ai")]
    Assistant,
}

impl NodeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" | "ai" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// Persisted node record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub tree_id: TreeId,
    /// `None` means the node is a root of its tree.
    pub parent_id: Option<NodeId>,
    /// Short display label, capped at 50 characters for captured text.
    pub title: String,
    /// Full text; empty for hand-made nodes.
    pub content: String,
    #[serde(alias = "type")]
    pub kind: NodeKind,
    pub role: NodeRole,
    pub order: i64,
    pub collapsed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Request to create one node. Only `tree_id` is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub tree_id: TreeId,
    pub parent_id: Option<NodeId>,
    /// Blank or missing titles default to [`DEFAULT_NODE_TITLE`].
    pub title: Option<String>,
    pub content: String,
    pub kind: NodeKind,
    pub role: NodeRole,
    pub order: i64,
    pub collapsed: bool,
}

impl NewNode {
    pub fn new(tree_id: TreeId) -> Self {
        Self {
            tree_id,
            parent_id: None,
            title: None,
            content: String::new(),
            kind: NodeKind::Child,
            role: NodeRole::User,
            order: 0,
            collapsed: false,
        }
    }

    pub fn with_parent(mut self, parent_id: Option<NodeId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn resolved_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(DEFAULT_NODE_TITLE)
            .to_string()
    }
}

/// Partial update for one node. `None` leaves a field untouched.
///
/// `parent_id` is doubly optional: `Some(None)` detaches the node to root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub parent_id: Option<Option<NodeId>>,
    pub order: Option<i64>,
    pub collapsed: Option<bool>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.parent_id.is_none()
            && self.order.is_none()
            && self.collapsed.is_none()
    }
}

/// One entry of an atomic multi-node update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBatchUpdate {
    pub id: NodeId,
    pub parent_id: Option<Option<NodeId>>,
    pub order: Option<i64>,
    pub collapsed: Option<bool>,
}

impl NodeBatchUpdate {
    /// Changes only the sibling order.
    pub fn reorder(id: NodeId, order: i64) -> Self {
        Self {
            id,
            parent_id: None,
            order: Some(order),
            collapsed: None,
        }
    }

    /// Re-parents the node and places it at `order` under the new parent.
    pub fn move_to(id: NodeId, parent_id: Option<NodeId>, order: i64) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
            order: Some(order),
            collapsed: None,
        }
    }

    pub fn collapse(id: NodeId, collapsed: bool) -> Self {
        Self {
            id,
            parent_id: None,
            order: None,
            collapsed: Some(collapsed),
        }
    }
}

//! Tree (forest container) domain model.
//!
//! # Invariants
//! - `node_count` equals the number of live nodes whose `tree_id` is this tree.
//! - `external_session_id`, when set, links the tree to one conversation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable tree identifier.
pub type TreeId = Uuid;

/// Default name for trees created without one.
pub const DEFAULT_TREE_NAME: &str = "New tree";

/// Default provenance tag for trees created by hand.
pub const MANUAL_SOURCE_TAG: &str = "manual";

/// Persisted forest of nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub id: TreeId,
    pub name: String,
    /// Provenance label, `manual` or a capture origin such as `auto`.
    pub source_tag: String,
    #[serde(default)]
    pub external_session_id: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds. Bumped by every structural write inside the tree.
    pub updated_at: i64,
    #[serde(default)]
    pub node_count: i64,
}

/// Request to create one tree.
///
/// Replaces the shape-polymorphic constructor: every optional field has a
/// documented default applied by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTree {
    /// Blank or missing names default to [`DEFAULT_TREE_NAME`].
    pub name: Option<String>,
    /// Missing tags default to [`MANUAL_SOURCE_TAG`].
    pub source_tag: Option<String>,
    pub external_session_id: Option<String>,
}

impl NewTree {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builds a request for a tree bound to one external conversation.
    pub fn for_session(
        name: impl Into<String>,
        session_id: impl Into<String>,
        source_tag: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            source_tag: Some(source_tag.into()),
            external_session_id: Some(session_id.into()),
        }
    }

    pub(crate) fn resolved_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_TREE_NAME)
            .to_string()
    }

    pub(crate) fn resolved_source_tag(&self) -> String {
        self.source_tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .unwrap_or(MANUAL_SOURCE_TAG)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{NewTree, DEFAULT_TREE_NAME, MANUAL_SOURCE_TAG};

    #[test]
    fn blank_request_uses_defaults() {
        let request = NewTree {
            name: Some("   ".to_string()),
            ..NewTree::default()
        };
        assert_eq!(request.resolved_name(), DEFAULT_TREE_NAME);
        assert_eq!(request.resolved_source_tag(), MANUAL_SOURCE_TAG);
    }

    #[test]
    fn session_request_keeps_fields() {
        let request = NewTree::for_session("Chat", "conv-1", "auto");
        assert_eq!(request.resolved_name(), "Chat");
        assert_eq!(request.resolved_source_tag(), "auto");
        assert_eq!(request.external_session_id.as_deref(), Some("conv-1"));
    }
}

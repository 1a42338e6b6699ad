//! Tree editing use-case service.
//!
//! # Responsibility
//! - Provide the user actions of the tree view: add, rename, edit, fold, delete.
//! - Build the nested forest a renderer walks.
//!
//! # Invariants
//! - New nodes are appended after their last sibling.
//! - Renames never store a blank title.

use crate::model::node::{NewNode, Node, NodeBatchUpdate, NodeId, NodeKind, NodePatch};
use crate::model::tree::{NewTree, Tree, TreeId};
use crate::repo::node_store::{NodeStore, StoreError};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from tree service operations.
#[derive(Debug)]
pub enum TreeServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Store-level failure.
    Store(StoreError),
}

impl Display for TreeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "node title must not be blank"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TreeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTitle => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for TreeServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type TreeServiceResult<T> = Result<T, TreeServiceError>;

/// One node with its ordered children, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestNode {
    pub node: Node,
    pub children: Vec<ForestNode>,
}

impl ForestNode {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(ForestNode::size).sum::<usize>()
    }
}

/// Tree editing facade.
pub struct TreeService<S: NodeStore> {
    store: S,
}

impl<S: NodeStore> TreeService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store, for drag and capture collaborators.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create_tree(&self, name: Option<&str>) -> TreeServiceResult<Tree> {
        let request = NewTree {
            name: name.map(str::to_string),
            ..NewTree::default()
        };
        Ok(self.store.create_tree(&request)?)
    }

    /// Appends a `main` node after the last root of `tree_id`.
    pub fn add_main_node(&self, tree_id: TreeId, title: Option<&str>) -> TreeServiceResult<Node> {
        let roots = self.store.root_nodes(tree_id)?;
        let request = NewNode::new(tree_id)
            .with_kind(NodeKind::Main)
            .with_order(next_order(&roots));
        Ok(self.store.create_node(&with_optional_title(request, title))?)
    }

    /// Appends a `child` node as the last child of `parent_id`.
    pub fn add_child_node(
        &self,
        parent_id: NodeId,
        title: Option<&str>,
    ) -> TreeServiceResult<Node> {
        let parent = self
            .store
            .get_node(parent_id)?
            .ok_or(StoreError::NodeNotFound(parent_id))?;
        let siblings = self.store.children(parent_id)?;
        let request = NewNode::new(parent.tree_id)
            .with_parent(Some(parent_id))
            .with_kind(NodeKind::Child)
            .with_order(next_order(&siblings));
        Ok(self.store.create_node(&with_optional_title(request, title))?)
    }

    pub fn rename_node(&self, node_id: NodeId, title: &str) -> TreeServiceResult<Node> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TreeServiceError::InvalidTitle);
        }
        let patch = NodePatch {
            title: Some(title.to_string()),
            ..NodePatch::default()
        };
        Ok(self.store.update_node(node_id, &patch)?)
    }

    pub fn edit_content(&self, node_id: NodeId, content: &str) -> TreeServiceResult<Node> {
        let patch = NodePatch {
            content: Some(content.to_string()),
            ..NodePatch::default()
        };
        Ok(self.store.update_node(node_id, &patch)?)
    }

    pub fn toggle_collapsed(&self, node_id: NodeId) -> TreeServiceResult<Node> {
        let node = self
            .store
            .get_node(node_id)?
            .ok_or(StoreError::NodeNotFound(node_id))?;
        let patch = NodePatch {
            collapsed: Some(!node.collapsed),
            ..NodePatch::default()
        };
        Ok(self.store.update_node(node_id, &patch)?)
    }

    /// Expands or collapses every node of a tree in one batch.
    pub fn set_all_collapsed(&self, tree_id: TreeId, collapsed: bool) -> TreeServiceResult<usize> {
        let updates: Vec<NodeBatchUpdate> = self
            .store
            .nodes_by_tree(tree_id)?
            .into_iter()
            .filter(|node| node.collapsed != collapsed)
            .map(|node| NodeBatchUpdate::collapse(node.id, collapsed))
            .collect();
        Ok(self.store.update_nodes_batch(&updates)?)
    }

    /// Deletes a node with its subtree. Returns the removed count.
    pub fn delete_node(&self, node_id: NodeId) -> TreeServiceResult<usize> {
        Ok(self.store.delete_node(node_id)?)
    }

    pub fn clear_tree(&self, tree_id: TreeId) -> TreeServiceResult<usize> {
        Ok(self.store.clear_tree(tree_id)?)
    }

    /// Nested view of `tree_id`.
    ///
    /// Nodes whose parent is missing are shown as roots. Children follow
    /// sibling order.
    pub fn forest(&self, tree_id: TreeId) -> TreeServiceResult<Vec<ForestNode>> {
        let nodes = self.store.nodes_by_tree(tree_id)?;
        Ok(build_forest(nodes))
    }
}

fn next_order(siblings: &[Node]) -> i64 {
    siblings
        .iter()
        .map(|node| node.order + 1)
        .max()
        .unwrap_or(0)
        .max(siblings.len() as i64)
}

fn with_optional_title(request: NewNode, title: Option<&str>) -> NewNode {
    match title {
        Some(title) => request.with_title(title),
        None => request,
    }
}

/// Builds the nested forest from a flat node list ordered by sibling order.
pub fn build_forest(nodes: Vec<Node>) -> Vec<ForestNode> {
    let ids: HashSet<NodeId> = nodes.iter().map(|node| node.id).collect();
    let mut by_parent: HashMap<Option<NodeId>, Vec<Node>> = HashMap::new();
    for node in nodes {
        let parent = node.parent_id.filter(|parent| ids.contains(parent));
        by_parent.entry(parent).or_default().push(node);
    }
    for group in by_parent.values_mut() {
        group.sort_by(|left, right| {
            left.order
                .cmp(&right.order)
                .then(left.created_at.cmp(&right.created_at))
                .then(left.id.cmp(&right.id))
        });
    }
    let mut visited = HashSet::new();
    attach_children(None, &mut by_parent, &mut visited)
}

fn attach_children(
    parent: Option<NodeId>,
    by_parent: &mut HashMap<Option<NodeId>, Vec<Node>>,
    visited: &mut HashSet<NodeId>,
) -> Vec<ForestNode> {
    let Some(group) = by_parent.remove(&parent) else {
        return Vec::new();
    };
    let mut forest = Vec::with_capacity(group.len());
    for node in group {
        if !visited.insert(node.id) {
            continue;
        }
        let children = attach_children(Some(node.id), by_parent, visited);
        forest.push(ForestNode { node, children });
    }
    forest
}

#[cfg(test)]
mod tests {
    use super::{build_forest, next_order};
    use crate::model::node::{Node, NodeKind, NodeRole};
    use uuid::Uuid;

    fn node(parent_id: Option<Uuid>, order: i64) -> Node {
        Node {
            id: Uuid::new_v4(),
            tree_id: Uuid::nil(),
            parent_id,
            title: format!("n{order}"),
            content: String::new(),
            kind: NodeKind::Child,
            role: NodeRole::User,
            order,
            collapsed: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn forest_nests_and_sorts_children() {
        let root = node(None, 0);
        let late = node(Some(root.id), 5);
        let early = node(Some(root.id), 1);
        let forest = build_forest(vec![late.clone(), root.clone(), early.clone()]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].node.id, root.id);
        let child_ids: Vec<_> = forest[0].children.iter().map(|c| c.node.id).collect();
        assert_eq!(child_ids, vec![early.id, late.id]);
        assert_eq!(forest[0].size(), 3);
    }

    #[test]
    fn orphans_become_roots() {
        let orphan = node(Some(Uuid::new_v4()), 0);
        let forest = build_forest(vec![orphan.clone()]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].node.id, orphan.id);
    }

    #[test]
    fn next_order_appends_after_gaps() {
        assert_eq!(next_order(&[]), 0);
        assert_eq!(next_order(&[node(None, 0), node(None, 7)]), 8);
    }
}

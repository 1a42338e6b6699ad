//! Export and import of tree snapshots.
//!
//! # Responsibility
//! - Serialize one tree (or the whole library) with all nodes.
//! - Import a snapshot under fresh ids, remapping parent links.
//!
//! # Invariants
//! - Imported trees share no ids with the snapshot they came from.
//! - An import inserts everything or nothing.
//! - A payload without `tree` is rejected before any write.

use crate::db::now_epoch_ms;
use crate::model::node::{Node, NodeId, NodeKind, NodeRole, DEFAULT_NODE_TITLE};
use crate::model::tree::{Tree, TreeId, DEFAULT_TREE_NAME, MANUAL_SOURCE_TAG};
use crate::repo::node_store::{NodeStore, StoreError, StoreResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Snapshot format version written by this crate.
pub const EXPORT_VERSION: &str = "1.0";

/// Snapshot of one tree with all its nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeExport {
    pub version: String,
    pub exported_at: i64,
    pub tree: Tree,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeBundle {
    pub tree: Tree,
    pub nodes: Vec<Node>,
}

/// Snapshot of every tree in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryExport {
    pub version: String,
    pub exported_at: i64,
    pub trees: Vec<TreeBundle>,
}

/// Loosely typed import document.
///
/// Ids are plain strings because they are replaced on import; snapshots
/// from other tools may use non-uuid ids.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tree: Option<ImportTree>,
    #[serde(default)]
    pub nodes: Vec<ImportNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTree {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "source")]
    pub source_tag: Option<String>,
    #[serde(default, alias = "conversationId")]
    pub external_session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportNode {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: Option<NodeKind>,
    #[serde(default)]
    pub role: Option<NodeRole>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub collapsed: Option<bool>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Tree and nodes as stored by an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTree {
    pub tree: Tree,
    pub nodes: Vec<Node>,
}

pub fn export_tree<S: NodeStore + ?Sized>(store: &S, tree_id: TreeId) -> StoreResult<TreeExport> {
    let tree = store
        .get_tree(tree_id)?
        .ok_or(StoreError::TreeNotFound(tree_id))?;
    let nodes = store.nodes_by_tree(tree_id)?;
    Ok(TreeExport {
        version: EXPORT_VERSION.to_string(),
        exported_at: now_epoch_ms(),
        tree,
        nodes,
    })
}

pub fn export_library<S: NodeStore + ?Sized>(store: &S) -> StoreResult<LibraryExport> {
    let mut trees = Vec::new();
    for tree in store.list_trees()? {
        let nodes = store.nodes_by_tree(tree.id)?;
        trees.push(TreeBundle { tree, nodes });
    }
    Ok(LibraryExport {
        version: EXPORT_VERSION.to_string(),
        exported_at: now_epoch_ms(),
        trees,
    })
}

/// Parses `json` and imports it. Unparsable text is an invalid payload.
pub fn import_tree_json<S: NodeStore + ?Sized>(store: &S, json: &str) -> StoreResult<ImportedTree> {
    let payload: ImportPayload = serde_json::from_str(json)
        .map_err(|err| StoreError::InvalidPayload(format!("malformed JSON: {err}")))?;
    import_tree(store, payload)
}

/// Imports one snapshot under fresh ids.
pub fn import_tree<S: NodeStore + ?Sized>(
    store: &S,
    payload: ImportPayload,
) -> StoreResult<ImportedTree> {
    let Some(source_tree) = payload.tree else {
        return Err(StoreError::InvalidPayload("missing `tree`".to_string()));
    };

    let mut id_map: HashMap<&str, NodeId> = HashMap::with_capacity(payload.nodes.len());
    for node in &payload.nodes {
        if id_map.insert(node.id.as_str(), Uuid::new_v4()).is_some() {
            return Err(StoreError::InvalidPayload(format!(
                "duplicate node id `{}`",
                node.id
            )));
        }
    }

    let now = now_epoch_ms();
    let tree_id = Uuid::new_v4();
    let mut dangling = 0usize;
    let mut nodes = Vec::with_capacity(payload.nodes.len());
    for source in &payload.nodes {
        let parent_id = match source.parent_id.as_deref() {
            Some(old_parent) => match id_map.get(old_parent) {
                Some(new_parent) => Some(*new_parent),
                None => {
                    dangling += 1;
                    None
                }
            },
            None => None,
        };
        nodes.push(Node {
            id: id_map[source.id.as_str()],
            tree_id,
            parent_id,
            title: non_blank(source.title.as_deref(), DEFAULT_NODE_TITLE),
            content: source.content.clone().unwrap_or_default(),
            kind: source.kind.unwrap_or(NodeKind::Child),
            role: source.role.unwrap_or(NodeRole::User),
            order: source.order.unwrap_or(0),
            collapsed: source.collapsed.unwrap_or(false),
            created_at: source.created_at.unwrap_or(now),
            updated_at: now,
        });
    }
    if dangling > 0 {
        warn!(
            "event=tree_import module=transfer status=warn dangling_parents={dangling} action=reroot"
        );
    }
    ensure_acyclic(&nodes)?;

    let tree = Tree {
        id: tree_id,
        name: non_blank(source_tree.name.as_deref(), DEFAULT_TREE_NAME),
        source_tag: non_blank(source_tree.source_tag.as_deref(), MANUAL_SOURCE_TAG),
        external_session_id: source_tree.external_session_id,
        created_at: now,
        updated_at: now,
        node_count: nodes.len() as i64,
    };
    store.insert_snapshot(&tree, &nodes)?;
    info!(
        "event=tree_import module=transfer status=ok tree_id={} nodes={}",
        tree.id,
        nodes.len()
    );

    Ok(ImportedTree { tree, nodes })
}

fn non_blank(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Rejects payloads whose parent links loop.
fn ensure_acyclic(nodes: &[Node]) -> StoreResult<()> {
    let parents: HashMap<NodeId, Option<NodeId>> =
        nodes.iter().map(|node| (node.id, node.parent_id)).collect();
    let mut settled: HashSet<NodeId> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        let mut path = HashSet::new();
        let mut cursor = Some(node.id);
        while let Some(current) = cursor {
            if settled.contains(&current) {
                break;
            }
            if !path.insert(current) {
                return Err(StoreError::InvalidPayload(
                    "node parent links form a cycle".to_string(),
                ));
            }
            cursor = parents.get(&current).copied().flatten();
        }
        settled.extend(path);
    }
    Ok(())
}

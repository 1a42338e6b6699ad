//! Tree/node store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist trees and nodes, keeping `node_count` in step with live nodes.
//! - Provide the descendant query used for drag validation.
//! - Apply cascading deletes and batched structural updates atomically.
//!
//! # Invariants
//! - Sibling listing is deterministic: `sort_order ASC, created_at ASC, id ASC`.
//! - A parent must exist in the same tree as its child at write time.
//! - No write may make a node its own ancestor.
//! - `update_nodes_batch` applies every entry or none of them.

use crate::db::migrations::latest_version;
use crate::db::{now_epoch_ms, DbError};
use crate::model::node::{NewNode, Node, NodeBatchUpdate, NodeId, NodeKind, NodePatch, NodeRole};
use crate::model::tree::{NewTree, Tree, TreeId};
use crate::repo::{table_exists, table_has_column};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from tree/node store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    TreeNotFound(TreeId),
    NodeNotFound(NodeId),
    /// Parent does not exist or belongs to another tree.
    InvalidParent {
        node_tree: TreeId,
        parent_id: NodeId,
    },
    /// Re-parenting `node_id` under `parent_id` would close a loop.
    CycleDetected {
        node_id: NodeId,
        parent_id: NodeId,
    },
    /// Import payload or snapshot is malformed.
    InvalidPayload(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::TreeNotFound(id) => write!(f, "tree not found: {id}"),
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::InvalidParent {
                node_tree,
                parent_id,
            } => write!(f, "parent {parent_id} is not a node of tree {node_tree}"),
            Self::CycleDetected { node_id, parent_id } => write!(
                f,
                "moving node {node_id} under {parent_id} would create a cycle"
            ),
            Self::InvalidPayload(message) => write!(f, "invalid import payload: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "node store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "node store requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "node store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid tree data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistent store for trees and their nodes.
pub trait NodeStore {
    /// Creates one tree with defaults applied to missing fields.
    fn create_tree(&self, request: &NewTree) -> StoreResult<Tree>;
    fn get_tree(&self, tree_id: TreeId) -> StoreResult<Option<Tree>>;
    /// Lists trees, most recently updated first.
    fn list_trees(&self) -> StoreResult<Vec<Tree>>;
    /// Finds the tree linked to one external conversation.
    fn find_tree_by_session(&self, session_id: &str) -> StoreResult<Option<Tree>>;
    fn rename_tree(&self, tree_id: TreeId, name: &str) -> StoreResult<Tree>;
    /// Deletes a tree and all its nodes. Returns the removed node count.
    fn delete_tree(&self, tree_id: TreeId) -> StoreResult<usize>;
    /// Removes every node of a tree but keeps the tree.
    fn clear_tree(&self, tree_id: TreeId) -> StoreResult<usize>;
    /// Inserts one node and bumps the owning tree's `node_count`.
    fn create_node(&self, request: &NewNode) -> StoreResult<Node>;
    fn get_node(&self, node_id: NodeId) -> StoreResult<Option<Node>>;
    fn nodes_by_tree(&self, tree_id: TreeId) -> StoreResult<Vec<Node>>;
    fn children(&self, parent_id: NodeId) -> StoreResult<Vec<Node>>;
    fn root_nodes(&self, tree_id: TreeId) -> StoreResult<Vec<Node>>;
    fn update_node(&self, node_id: NodeId, patch: &NodePatch) -> StoreResult<Node>;
    /// Applies all entries in one transaction. Unknown ids are skipped.
    /// Returns how many entries were applied.
    fn update_nodes_batch(&self, updates: &[NodeBatchUpdate]) -> StoreResult<usize>;
    /// Deletes a node with its whole subtree. Returns the removed count.
    fn delete_node(&self, node_id: NodeId) -> StoreResult<usize>;
    /// Transitive children of `node_id`, excluding the node itself.
    fn descendant_ids(&self, node_id: NodeId) -> StoreResult<HashSet<NodeId>>;
    /// True when `candidate` lies strictly below `ancestor`.
    fn is_descendant(&self, ancestor: NodeId, candidate: NodeId) -> StoreResult<bool>;
    /// Inserts a prepared tree with its nodes in one transaction.
    fn insert_snapshot(&self, tree: &Tree, nodes: &[Node]) -> StoreResult<()>;
    /// Wipes trees, nodes and settings.
    fn clear_all(&self) -> StoreResult<()>;
}

/// SQLite-backed node store borrowing one migrated connection.
pub struct SqliteNodeStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNodeStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> StoreResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

const TREE_COLUMNS: &str =
    "id, name, source_tag, external_session_id, node_count, created_at, updated_at";

const NODE_COLUMNS: &str = "id, tree_id, parent_id, title, content, kind, role, sort_order, \
     collapsed, created_at, updated_at";

impl NodeStore for SqliteNodeStore<'_> {
    fn create_tree(&self, request: &NewTree) -> StoreResult<Tree> {
        let tree_id = Uuid::new_v4();
        let now = now_epoch_ms();
        self.conn.execute(
            "INSERT INTO trees (
                id,
                name,
                source_tag,
                external_session_id,
                node_count,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5);",
            params![
                tree_id.to_string(),
                request.resolved_name(),
                request.resolved_source_tag(),
                request.external_session_id,
                now,
            ],
        )?;
        info!(
            "event=tree_create module=store status=ok tree_id={} linked={}",
            tree_id,
            request.external_session_id.is_some()
        );
        load_required_tree(self.conn, tree_id)
    }

    fn get_tree(&self, tree_id: TreeId) -> StoreResult<Option<Tree>> {
        load_tree(self.conn, tree_id)
    }

    fn list_trees(&self) -> StoreResult<Vec<Tree>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TREE_COLUMNS}
             FROM trees
             ORDER BY updated_at DESC, created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut trees = Vec::new();
        while let Some(row) = rows.next()? {
            trees.push(parse_tree_row(row)?);
        }
        Ok(trees)
    }

    fn find_tree_by_session(&self, session_id: &str) -> StoreResult<Option<Tree>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TREE_COLUMNS}
             FROM trees
             WHERE external_session_id = ?1
             ORDER BY updated_at DESC, id ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([session_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_tree_row(row)?)),
            None => Ok(None),
        }
    }

    fn rename_tree(&self, tree_id: TreeId, name: &str) -> StoreResult<Tree> {
        let changed = self.conn.execute(
            "UPDATE trees SET name = ?2, updated_at = ?3 WHERE id = ?1;",
            params![tree_id.to_string(), name, now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(StoreError::TreeNotFound(tree_id));
        }
        load_required_tree(self.conn, tree_id)
    }

    fn delete_tree(&self, tree_id: TreeId) -> StoreResult<usize> {
        let tx = self.begin()?;
        ensure_tree_exists(&tx, tree_id)?;
        let removed = tx.execute(
            "DELETE FROM nodes WHERE tree_id = ?1;",
            [tree_id.to_string()],
        )?;
        tx.execute("DELETE FROM trees WHERE id = ?1;", [tree_id.to_string()])?;
        tx.commit()?;
        info!("event=tree_delete module=store status=ok tree_id={tree_id} removed_nodes={removed}");
        Ok(removed)
    }

    fn clear_tree(&self, tree_id: TreeId) -> StoreResult<usize> {
        let tx = self.begin()?;
        ensure_tree_exists(&tx, tree_id)?;
        let removed = tx.execute(
            "DELETE FROM nodes WHERE tree_id = ?1;",
            [tree_id.to_string()],
        )?;
        tx.execute(
            "UPDATE trees SET node_count = 0, updated_at = ?2 WHERE id = ?1;",
            params![tree_id.to_string(), now_epoch_ms()],
        )?;
        tx.commit()?;
        info!("event=tree_clear module=store status=ok tree_id={tree_id} removed_nodes={removed}");
        Ok(removed)
    }

    fn create_node(&self, request: &NewNode) -> StoreResult<Node> {
        let node_id = Uuid::new_v4();
        let now = now_epoch_ms();

        let tx = self.begin()?;
        ensure_tree_exists(&tx, request.tree_id)?;
        if let Some(parent_id) = request.parent_id {
            ensure_parent_in_tree(&tx, request.tree_id, parent_id)?;
        }
        tx.execute(
            "INSERT INTO nodes (
                id,
                tree_id,
                parent_id,
                title,
                content,
                kind,
                role,
                sort_order,
                collapsed,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10);",
            params![
                node_id.to_string(),
                request.tree_id.to_string(),
                request.parent_id.map(|value| value.to_string()),
                request.resolved_title(),
                request.content,
                request.kind.as_str(),
                request.role.as_str(),
                request.order,
                request.collapsed,
                now,
            ],
        )?;
        tx.execute(
            "UPDATE trees
             SET node_count = node_count + 1,
                 updated_at = ?2
             WHERE id = ?1;",
            params![request.tree_id.to_string(), now],
        )?;
        tx.commit()?;

        load_required_node(self.conn, node_id)
    }

    fn get_node(&self, node_id: NodeId) -> StoreResult<Option<Node>> {
        load_node(self.conn, node_id)
    }

    fn nodes_by_tree(&self, tree_id: TreeId) -> StoreResult<Vec<Node>> {
        query_nodes(
            self.conn,
            &format!(
                "SELECT {NODE_COLUMNS}
                 FROM nodes
                 WHERE tree_id = ?1
                 ORDER BY sort_order ASC, created_at ASC, id ASC;"
            ),
            &tree_id.to_string(),
        )
    }

    fn children(&self, parent_id: NodeId) -> StoreResult<Vec<Node>> {
        query_nodes(
            self.conn,
            &format!(
                "SELECT {NODE_COLUMNS}
                 FROM nodes
                 WHERE parent_id = ?1
                 ORDER BY sort_order ASC, created_at ASC, id ASC;"
            ),
            &parent_id.to_string(),
        )
    }

    fn root_nodes(&self, tree_id: TreeId) -> StoreResult<Vec<Node>> {
        query_nodes(
            self.conn,
            &format!(
                "SELECT {NODE_COLUMNS}
                 FROM nodes
                 WHERE tree_id = ?1
                   AND parent_id IS NULL
                 ORDER BY sort_order ASC, created_at ASC, id ASC;"
            ),
            &tree_id.to_string(),
        )
    }

    fn update_node(&self, node_id: NodeId, patch: &NodePatch) -> StoreResult<Node> {
        let tx = self.begin()?;
        let current = load_node(&tx, node_id)?.ok_or(StoreError::NodeNotFound(node_id))?;
        if patch.is_empty() {
            return Ok(current);
        }

        let parent_id = match patch.parent_id {
            Some(new_parent) => {
                ensure_valid_reparent(&tx, &current, new_parent)?;
                new_parent
            }
            None => current.parent_id,
        };
        let now = now_epoch_ms();
        tx.execute(
            "UPDATE nodes
             SET title = ?2,
                 content = ?3,
                 parent_id = ?4,
                 sort_order = ?5,
                 collapsed = ?6,
                 updated_at = ?7
             WHERE id = ?1;",
            params![
                node_id.to_string(),
                patch.title.as_deref().unwrap_or(&current.title),
                patch.content.as_deref().unwrap_or(&current.content),
                parent_id.map(|value| value.to_string()),
                patch.order.unwrap_or(current.order),
                patch.collapsed.unwrap_or(current.collapsed),
                now,
            ],
        )?;
        touch_tree(&tx, current.tree_id, now)?;
        tx.commit()?;

        load_required_node(self.conn, node_id)
    }

    fn update_nodes_batch(&self, updates: &[NodeBatchUpdate]) -> StoreResult<usize> {
        if updates.is_empty() {
            return Ok(0);
        }

        let now = now_epoch_ms();
        let tx = self.begin()?;
        let mut applied = 0usize;
        let mut touched_trees = BTreeSet::new();
        for update in updates {
            let Some(current) = load_node(&tx, update.id)? else {
                continue;
            };
            let parent_id = match update.parent_id {
                Some(new_parent) => {
                    ensure_valid_reparent(&tx, &current, new_parent)?;
                    new_parent
                }
                None => current.parent_id,
            };
            tx.execute(
                "UPDATE nodes
                 SET parent_id = ?2,
                     sort_order = ?3,
                     collapsed = ?4,
                     updated_at = ?5
                 WHERE id = ?1;",
                params![
                    update.id.to_string(),
                    parent_id.map(|value| value.to_string()),
                    update.order.unwrap_or(current.order),
                    update.collapsed.unwrap_or(current.collapsed),
                    now,
                ],
            )?;
            touched_trees.insert(current.tree_id);
            applied += 1;
        }
        for tree_id in touched_trees {
            touch_tree(&tx, tree_id, now)?;
        }
        tx.commit()?;

        info!(
            "event=nodes_batch_update module=store status=ok requested={} applied={}",
            updates.len(),
            applied
        );
        Ok(applied)
    }

    fn delete_node(&self, node_id: NodeId) -> StoreResult<usize> {
        let node = load_node(self.conn, node_id)?.ok_or(StoreError::NodeNotFound(node_id))?;

        let tx = self.begin()?;
        let mut doomed: Vec<NodeId> = collect_descendants(&tx, node_id)?.into_iter().collect();
        doomed.push(node_id);
        let mut removed = 0usize;
        for id in &doomed {
            removed += tx.execute("DELETE FROM nodes WHERE id = ?1;", [id.to_string()])?;
        }
        tx.execute(
            "UPDATE trees
             SET node_count = MAX(0, node_count - ?2),
                 updated_at = ?3
             WHERE id = ?1;",
            params![node.tree_id.to_string(), removed as i64, now_epoch_ms()],
        )?;
        tx.commit()?;

        info!(
            "event=node_delete module=store status=ok tree_id={} node_id={} removed={}",
            node.tree_id, node_id, removed
        );
        Ok(removed)
    }

    fn descendant_ids(&self, node_id: NodeId) -> StoreResult<HashSet<NodeId>> {
        collect_descendants(self.conn, node_id)
    }

    fn is_descendant(&self, ancestor: NodeId, candidate: NodeId) -> StoreResult<bool> {
        if ancestor == candidate {
            return Ok(false);
        }
        Ok(collect_descendants(self.conn, ancestor)?.contains(&candidate))
    }

    fn insert_snapshot(&self, tree: &Tree, nodes: &[Node]) -> StoreResult<()> {
        if let Some(stray) = nodes.iter().find(|node| node.tree_id != tree.id) {
            return Err(StoreError::InvalidPayload(format!(
                "node {} does not belong to tree {}",
                stray.id, tree.id
            )));
        }

        let tx = self.begin()?;
        tx.execute(
            "INSERT INTO trees (
                id,
                name,
                source_tag,
                external_session_id,
                node_count,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                tree.id.to_string(),
                tree.name,
                tree.source_tag,
                tree.external_session_id,
                nodes.len() as i64,
                tree.created_at,
                tree.updated_at,
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO nodes (
                    id,
                    tree_id,
                    parent_id,
                    title,
                    content,
                    kind,
                    role,
                    sort_order,
                    collapsed,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            )?;
            for node in nodes {
                stmt.execute(params![
                    node.id.to_string(),
                    node.tree_id.to_string(),
                    node.parent_id.map(|value| value.to_string()),
                    node.title,
                    node.content,
                    node.kind.as_str(),
                    node.role.as_str(),
                    node.order,
                    node.collapsed,
                    node.created_at,
                    node.updated_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn clear_all(&self) -> StoreResult<()> {
        let tx = self.begin()?;
        tx.execute_batch(
            "DELETE FROM nodes;
             DELETE FROM trees;
             DELETE FROM settings;",
        )?;
        tx.commit()?;
        warn!("event=store_clear_all module=store status=ok");
        Ok(())
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["trees", "nodes"] {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }

    for column in [
        "id",
        "tree_id",
        "parent_id",
        "title",
        "content",
        "kind",
        "role",
        "sort_order",
        "collapsed",
    ] {
        if !table_has_column(conn, "nodes", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "nodes",
                column,
            });
        }
    }

    Ok(())
}

fn ensure_tree_exists(conn: &Connection, tree_id: TreeId) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM trees WHERE id = ?1);",
        [tree_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(StoreError::TreeNotFound(tree_id))
    }
}

fn ensure_parent_in_tree(conn: &Connection, tree_id: TreeId, parent_id: NodeId) -> StoreResult<()> {
    let parent_tree: Option<String> = conn
        .query_row(
            "SELECT tree_id FROM nodes WHERE id = ?1;",
            [parent_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    let same_tree = match parent_tree {
        Some(value) => parse_uuid(&value, "nodes.tree_id")? == tree_id,
        None => false,
    };
    if same_tree {
        Ok(())
    } else {
        Err(StoreError::InvalidParent {
            node_tree: tree_id,
            parent_id,
        })
    }
}

fn ensure_valid_reparent(
    conn: &Connection,
    node: &Node,
    new_parent: Option<NodeId>,
) -> StoreResult<()> {
    let Some(parent_id) = new_parent else {
        return Ok(());
    };
    if new_parent == node.parent_id {
        return Ok(());
    }
    if parent_id == node.id || collect_descendants(conn, node.id)?.contains(&parent_id) {
        return Err(StoreError::CycleDetected {
            node_id: node.id,
            parent_id,
        });
    }
    ensure_parent_in_tree(conn, node.tree_id, parent_id)
}

fn touch_tree(conn: &Connection, tree_id: TreeId, now: i64) -> StoreResult<()> {
    conn.execute(
        "UPDATE trees SET updated_at = ?2 WHERE id = ?1;",
        params![tree_id.to_string(), now],
    )?;
    Ok(())
}

/// Depth-first expansion over child lookups.
///
/// The visited set keeps the walk finite even if stored data already
/// contains a loop.
fn collect_descendants(conn: &Connection, root: NodeId) -> StoreResult<HashSet<NodeId>> {
    let mut stmt = conn.prepare_cached("SELECT id FROM nodes WHERE parent_id = ?1;")?;
    let mut found = HashSet::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        let mut rows = stmt.query([current.to_string()])?;
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            let child = parse_uuid(&text, "nodes.id")?;
            if child != root && found.insert(child) {
                stack.push(child);
            }
        }
    }
    Ok(found)
}

fn query_nodes(conn: &Connection, sql: &str, key: &str) -> StoreResult<Vec<Node>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    let mut nodes = Vec::new();
    while let Some(row) = rows.next()? {
        nodes.push(parse_node_row(row)?);
    }
    Ok(nodes)
}

fn load_tree(conn: &Connection, tree_id: TreeId) -> StoreResult<Option<Tree>> {
    let mut stmt = conn.prepare(&format!("SELECT {TREE_COLUMNS} FROM trees WHERE id = ?1;"))?;
    let mut rows = stmt.query([tree_id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_tree_row(row)?)),
        None => Ok(None),
    }
}

fn load_required_tree(conn: &Connection, tree_id: TreeId) -> StoreResult<Tree> {
    load_tree(conn, tree_id)?.ok_or(StoreError::TreeNotFound(tree_id))
}

fn load_node(conn: &Connection, node_id: NodeId) -> StoreResult<Option<Node>> {
    let mut stmt = conn.prepare(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1;"))?;
    let mut rows = stmt.query([node_id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_node_row(row)?)),
        None => Ok(None),
    }
}

fn load_required_node(conn: &Connection, node_id: NodeId) -> StoreResult<Node> {
    load_node(conn, node_id)?.ok_or(StoreError::NodeNotFound(node_id))
}

fn parse_tree_row(row: &Row<'_>) -> StoreResult<Tree> {
    let id_text: String = row.get("id")?;
    Ok(Tree {
        id: parse_uuid(&id_text, "trees.id")?,
        name: row.get("name")?,
        source_tag: row.get("source_tag")?,
        external_session_id: row.get("external_session_id")?,
        node_count: row.get("node_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_node_row(row: &Row<'_>) -> StoreResult<Node> {
    let id_text: String = row.get("id")?;
    let tree_text: String = row.get("tree_id")?;
    let parent_id = row
        .get::<_, Option<String>>("parent_id")?
        .map(|value| parse_uuid(&value, "nodes.parent_id"))
        .transpose()?;

    let kind_text: String = row.get("kind")?;
    let kind = NodeKind::parse(&kind_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid node kind `{kind_text}` in nodes.kind"))
    })?;
    let role_text: String = row.get("role")?;
    let role = NodeRole::parse(&role_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid node role `{role_text}` in nodes.role"))
    })?;
    let collapsed = match row.get::<_, i64>("collapsed")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid collapsed value `{other}` in nodes.collapsed"
            )));
        }
    };

    Ok(Node {
        id: parse_uuid(&id_text, "nodes.id")?,
        tree_id: parse_uuid(&tree_text, "nodes.tree_id")?,
        parent_id,
        title: row.get("title")?,
        content: row.get("content")?,
        kind,
        role,
        order: row.get("sort_order")?,
        collapsed,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str, field: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {field}")))
}

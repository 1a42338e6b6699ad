//! Title substring search.
//!
//! # Invariants
//! - Hits follow tree order: `sort_order ASC, created_at ASC, id ASC`.
//! - The query is a plain substring; no character acts as a wildcard.

use crate::db::DbError;
use crate::model::node::NodeId;
use crate::model::tree::TreeId;
use rusqlite::{params, Connection};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

#[derive(Debug, Clone)]
pub struct NodeSearchQuery {
    pub tree_id: TreeId,
    pub text: String,
    /// Maximum number of hits to return.
    pub limit: u32,
}

impl NodeSearchQuery {
    pub fn new(tree_id: TreeId, text: impl Into<String>) -> Self {
        Self {
            tree_id,
            text: text.into(),
            limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSearchHit {
    pub node_id: NodeId,
    pub title: String,
    /// Parent first, root last.
    pub ancestors: Vec<NodeId>,
}

/// Searches node titles of one tree. Blank queries return nothing.
///
/// Matching folds case with full Unicode rules, so `ÜBER` finds `Über`.
pub fn search_nodes(conn: &Connection, query: &NodeSearchQuery) -> SearchResult<Vec<NodeSearchHit>> {
    let needle = query.text.trim().to_lowercase();
    if needle.is_empty() || query.limit == 0 {
        return Ok(Vec::new());
    }
    let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

    let mut stmt = conn.prepare(
        "SELECT id, title
         FROM nodes
         WHERE tree_id = ?1
         ORDER BY sort_order ASC, created_at ASC, id ASC;",
    )?;
    let mut rows = stmt.query(params![query.tree_id.to_string()])?;
    let mut matches = Vec::new();
    while let Some(row) = rows.next()? {
        let title: String = row.get(1)?;
        if !title.to_lowercase().contains(&needle) {
            continue;
        }
        let id_text: String = row.get(0)?;
        matches.push((parse_node_id(&id_text)?, title));
        if matches.len() == limit {
            break;
        }
    }
    if matches.is_empty() {
        return Ok(Vec::new());
    }

    let parents = load_parent_links(conn, query.tree_id)?;
    Ok(matches
        .into_iter()
        .map(|(node_id, title)| NodeSearchHit {
            node_id,
            title,
            ancestors: ancestor_chain(&parents, node_id),
        })
        .collect())
}

fn load_parent_links(
    conn: &Connection,
    tree_id: TreeId,
) -> SearchResult<HashMap<NodeId, NodeId>> {
    let mut stmt = conn.prepare(
        "SELECT id, parent_id
         FROM nodes
         WHERE tree_id = ?1
           AND parent_id IS NOT NULL;",
    )?;
    let mut rows = stmt.query([tree_id.to_string()])?;
    let mut links = HashMap::new();
    while let Some(row) = rows.next()? {
        let child: String = row.get(0)?;
        let parent: String = row.get(1)?;
        links.insert(parse_node_id(&child)?, parse_node_id(&parent)?);
    }
    Ok(links)
}

fn ancestor_chain(parents: &HashMap<NodeId, NodeId>, node_id: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([node_id]);
    let mut cursor = parents.get(&node_id).copied();
    while let Some(parent) = cursor {
        if !seen.insert(parent) {
            break;
        }
        chain.push(parent);
        cursor = parents.get(&parent).copied();
    }
    chain
}

fn parse_node_id(value: &str) -> SearchResult<NodeId> {
    Uuid::parse_str(value)
        .map_err(|_| SearchError::InvalidData(format!("invalid uuid `{value}` in nodes.id")))
}

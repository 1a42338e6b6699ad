//! Merge of observed snippets into a tree's root level.
//!
//! # Responsibility
//! - Filter snippets that are empty, too long, or known UI chrome.
//! - Skip snippets whose content key already exists in the tree.
//! - Append the rest as root `main` nodes after the current last root.
//!
//! # Invariants
//! - Existing nodes are never modified.
//! - A failing create is logged and skipped; the batch continues.
//! - The listener is notified once, and only when nodes were created.

use crate::capture::normalize::{
    content_key, display_title, prefix_key, truncated_title_head, TITLE_MAX_CHARS,
};
use crate::capture::source::{CaptureListener, ContentSource, Snippet};
use crate::model::node::{NewNode, Node, NodeKind, NodeRole};
use crate::model::tree::TreeId;
use crate::repo::node_store::{NodeStore, StoreError, StoreResult};
use log::{info, warn};
use std::collections::HashSet;

/// Labels rendered by chat front ends that are never conversation content.
const DEFAULT_UI_LABELS: &[&str] = &[
    "复制成功",
    "编辑",
    "删除",
    "保存",
    "取消",
    "确定",
    "发送消息",
    "登录",
    "注册",
    "返回",
    "展开",
    "收起",
    "加载中",
    "正在生成",
    "新对话",
    "历史对话",
    "复制代码",
    "重新生成",
    "停止生成",
    "复制",
    "点赞",
    "分享",
    "收藏",
    "Copy",
    "Copied",
    "Copy code",
    "Edit",
    "Delete",
    "Save",
    "Cancel",
    "OK",
    "Send message",
    "Log in",
    "Sign up",
    "Back",
    "Expand",
    "Collapse",
    "Loading",
    "Generating",
    "New chat",
    "Regenerate",
    "Stop generating",
    "Like",
    "Share",
];

/// Filtering knobs for one reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Snippets longer than this many characters are dropped (default: 2000).
    pub max_snippet_chars: usize,
    /// Exact-match labels dropped after trimming.
    pub ui_labels: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_snippet_chars: 2000,
            ui_labels: DEFAULT_UI_LABELS.iter().map(|label| label.to_string()).collect(),
        }
    }
}

impl CaptureConfig {
    fn accepts(&self, text: &str) -> bool {
        !text.is_empty()
            && text.chars().count() <= self.max_snippet_chars
            && !self.ui_labels.iter().any(|label| label == text)
    }
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub tree_id: TreeId,
    /// Snippets handed in, before any filtering.
    pub candidates: usize,
    /// Snippets that survived filtering and deduplication.
    pub accepted: usize,
    pub created: Vec<Node>,
    /// Creates that failed and were skipped.
    pub failed: usize,
}

impl CaptureReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}

/// Deduplicating capture into one store.
pub struct CaptureReconciler<'s, S: NodeStore + ?Sized> {
    store: &'s S,
    config: CaptureConfig,
}

impl<'s, S: NodeStore + ?Sized> CaptureReconciler<'s, S> {
    pub fn new(store: &'s S, config: CaptureConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Extracts snippets from `source` and reconciles them into `tree_id`.
    pub fn capture(
        &self,
        tree_id: TreeId,
        source: &mut dyn ContentSource,
        listener: &mut dyn CaptureListener,
    ) -> StoreResult<CaptureReport> {
        let snippets = source.extract();
        self.reconcile(tree_id, &snippets, listener)
    }

    /// Appends every genuinely new snippet as a root node of `tree_id`.
    pub fn reconcile(
        &self,
        tree_id: TreeId,
        snippets: &[Snippet],
        listener: &mut dyn CaptureListener,
    ) -> StoreResult<CaptureReport> {
        if self.store.get_tree(tree_id)?.is_none() {
            return Err(StoreError::TreeNotFound(tree_id));
        }

        let mut seen = HashSet::new();
        let fresh: Vec<&str> = snippets
            .iter()
            .map(|snippet| snippet.text.trim())
            .filter(|text| self.config.accepts(text))
            .filter(|text| seen.insert(content_key(text)))
            .collect();

        let existing = self.store.nodes_by_tree(tree_id)?;
        let known = KnownKeys::from_nodes(&existing);
        let accepted: Vec<&str> = fresh
            .into_iter()
            .filter(|text| !known.contains(text))
            .collect();

        let mut next_order = existing
            .iter()
            .filter(|node| node.parent_id.is_none())
            .map(|node| node.order + 1)
            .max()
            .unwrap_or(0);

        let mut created = Vec::with_capacity(accepted.len());
        let mut failed = 0usize;
        for text in &accepted {
            let request = NewNode::new(tree_id)
                .with_title(display_title(text))
                .with_content(*text)
                .with_kind(NodeKind::Main)
                .with_role(NodeRole::User)
                .with_order(next_order);
            match self.store.create_node(&request) {
                Ok(node) => {
                    next_order += 1;
                    created.push(node);
                }
                Err(err) => {
                    failed += 1;
                    warn!(
                        "event=capture_node_failed module=capture status=error tree_id={tree_id} error={err}"
                    );
                }
            }
        }

        if !created.is_empty() {
            listener.nodes_captured(tree_id, created.len());
        }
        info!(
            "event=capture_reconcile module=capture status=ok tree_id={} candidates={} accepted={} created={} failed={}",
            tree_id,
            snippets.len(),
            accepted.len(),
            created.len(),
            failed
        );

        Ok(CaptureReport {
            tree_id,
            candidates: snippets.len(),
            accepted: accepted.len(),
            created,
            failed,
        })
    }
}

/// Content keys already present in a tree.
struct KnownKeys {
    full: HashSet<String>,
    /// Heads of truncated titles on nodes without content.
    prefixes: HashSet<String>,
}

impl KnownKeys {
    fn from_nodes(nodes: &[Node]) -> Self {
        let mut full = HashSet::with_capacity(nodes.len());
        let mut prefixes = HashSet::new();
        for node in nodes {
            if node.content.trim().is_empty() {
                full.insert(content_key(&node.title));
                if let Some(head) = truncated_title_head(&node.title) {
                    prefixes.insert(content_key(head));
                }
            } else {
                full.insert(content_key(&node.content));
            }
        }
        Self { full, prefixes }
    }

    fn contains(&self, text: &str) -> bool {
        if self.full.contains(&content_key(text)) {
            return true;
        }
        text.chars().count() > TITLE_MAX_CHARS && self.prefixes.contains(&prefix_key(text))
    }
}

//! Conversation-to-tree sync.

use crate::capture::reconciler::{CaptureConfig, CaptureReconciler, CaptureReport};
use crate::capture::source::{CaptureListener, ContentSource};
use crate::model::tree::{NewTree, Tree};
use crate::repo::node_store::{NodeStore, StoreResult};
use crate::sync::guard::SyncGuard;
use log::{debug, info};

/// Source tag stamped on trees created by sync.
pub const AUTO_SOURCE_TAG: &str = "auto";

/// Identity of the conversation being observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRef {
    /// Stable id assigned by the chat front end.
    pub session_id: String,
    /// Name for the tree if one has to be created.
    pub title: Option<String>,
    /// Provenance tag for a created tree; defaults to `auto`.
    pub source_tag: Option<String>,
}

impl ConversationRef {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            title: None,
            source_tag: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub tree: Tree,
    /// True when this sync created the tree.
    pub tree_created: bool,
    pub capture: CaptureReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another sync was in flight; this request was dropped.
    Skipped,
    Synced(SyncReport),
}

/// Context object owning the sync guard for one store.
pub struct ConversationSync<'s, S: NodeStore + ?Sized> {
    store: &'s S,
    reconciler: CaptureReconciler<'s, S>,
    guard: SyncGuard,
}

impl<'s, S: NodeStore + ?Sized> ConversationSync<'s, S> {
    pub fn new(store: &'s S, config: CaptureConfig) -> Self {
        Self {
            store,
            reconciler: CaptureReconciler::new(store, config),
            guard: SyncGuard::new(),
        }
    }

    pub fn guard(&self) -> &SyncGuard {
        &self.guard
    }

    /// Finds or creates the tree for `conversation`, then captures `source`.
    pub fn sync(
        &self,
        conversation: &ConversationRef,
        source: &mut dyn ContentSource,
        listener: &mut dyn CaptureListener,
    ) -> StoreResult<SyncOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            debug!("event=conversation_sync module=sync status=skip reason=in_flight");
            return Ok(SyncOutcome::Skipped);
        };

        let linked = self.store.find_tree_by_session(&conversation.session_id)?;
        let (tree, tree_created) = match linked {
            Some(tree) => (tree, false),
            None => {
                let request = NewTree {
                    name: conversation.title.clone(),
                    source_tag: Some(
                        conversation
                            .source_tag
                            .clone()
                            .unwrap_or_else(|| AUTO_SOURCE_TAG.to_string()),
                    ),
                    external_session_id: Some(conversation.session_id.clone()),
                };
                (self.store.create_tree(&request)?, true)
            }
        };

        let capture = self.reconciler.capture(tree.id, source, listener)?;
        let tree = self.store.get_tree(tree.id)?.unwrap_or(tree);
        info!(
            "event=conversation_sync module=sync status=ok tree_id={} tree_created={} created={}",
            tree.id,
            tree_created,
            capture.created_count()
        );

        Ok(SyncOutcome::Synced(SyncReport {
            tree,
            tree_created,
            capture,
        }))
    }
}

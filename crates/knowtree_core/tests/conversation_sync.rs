use knowtree_core::db::open_db_in_memory;
use knowtree_core::{
    CaptureConfig, ContentSource, ConversationRef, ConversationSync, NoopListener, NodeStore,
    Snippet, SqliteNodeStore, StaticSource, SyncOutcome,
};

/// Source whose extraction triggers another sync of the same conversation.
struct ReentrantSource<'a, 's, 'c> {
    sync: &'a ConversationSync<'s, SqliteNodeStore<'c>>,
    conversation: ConversationRef,
    nested: Option<SyncOutcome>,
}

impl ContentSource for ReentrantSource<'_, '_, '_> {
    fn extract(&mut self) -> Vec<Snippet> {
        let mut inner = StaticSource::new(["from the nested call"]);
        let outcome = self
            .sync
            .sync(&self.conversation, &mut inner, &mut NoopListener)
            .unwrap();
        self.nested = Some(outcome);
        vec![Snippet::from("from the outer call")]
    }
}

#[test]
fn first_sync_creates_linked_tree_and_later_syncs_reuse_it() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let sync = ConversationSync::new(&store, CaptureConfig::default());
    let conversation = ConversationRef::new("conv-1").with_title("Rust questions");

    let mut source = StaticSource::new(["What is a lifetime?"]);
    let SyncOutcome::Synced(first) = sync
        .sync(&conversation, &mut source, &mut NoopListener)
        .unwrap()
    else {
        panic!("first sync must run");
    };
    assert!(first.tree_created);
    assert_eq!(first.tree.name, "Rust questions");
    assert_eq!(first.tree.source_tag, "auto");
    assert_eq!(first.tree.external_session_id.as_deref(), Some("conv-1"));
    assert_eq!(first.capture.created_count(), 1);
    assert_eq!(first.tree.node_count, 1);

    let mut source = StaticSource::new(["What is a lifetime?", "And a borrow?"]);
    let SyncOutcome::Synced(second) = sync
        .sync(&conversation, &mut source, &mut NoopListener)
        .unwrap()
    else {
        panic!("second sync must run");
    };
    assert!(!second.tree_created);
    assert_eq!(second.tree.id, first.tree.id);
    assert_eq!(second.capture.created_count(), 1);
    assert_eq!(store.list_trees().unwrap().len(), 1);
}

#[test]
fn sync_while_in_flight_is_skipped() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let sync = ConversationSync::new(&store, CaptureConfig::default());
    let conversation = ConversationRef::new("conv-2");
    let mut source = StaticSource::new(["anything"]);

    let held = sync.guard().try_acquire().unwrap();
    let outcome = sync
        .sync(&conversation, &mut source, &mut NoopListener)
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Skipped);
    assert!(store.list_trees().unwrap().is_empty());

    drop(held);
    let outcome = sync
        .sync(&conversation, &mut source, &mut NoopListener)
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::Synced(_)));
    assert!(!sync.guard().is_busy());
}

#[test]
fn sync_started_from_inside_extraction_is_skipped() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let sync = ConversationSync::new(&store, CaptureConfig::default());
    let conversation = ConversationRef::new("conv-4");
    let mut source = ReentrantSource {
        sync: &sync,
        conversation: conversation.clone(),
        nested: None,
    };

    let SyncOutcome::Synced(report) = sync
        .sync(&conversation, &mut source, &mut NoopListener)
        .unwrap()
    else {
        panic!("outer sync must run");
    };
    assert_eq!(source.nested, Some(SyncOutcome::Skipped));
    assert_eq!(report.capture.created_count(), 1);
    assert_eq!(report.capture.created[0].title, "from the outer call");
    assert_eq!(store.nodes_by_tree(report.tree.id).unwrap().len(), 1);
    assert!(!sync.guard().is_busy());
}

#[test]
fn untitled_conversation_gets_default_name() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let sync = ConversationSync::new(&store, CaptureConfig::default());
    let mut source = StaticSource::default();

    let SyncOutcome::Synced(report) = sync
        .sync(&ConversationRef::new("conv-3"), &mut source, &mut NoopListener)
        .unwrap()
    else {
        panic!("sync must run");
    };
    assert_eq!(report.tree.name, "New tree");
    assert_eq!(report.capture.created_count(), 0);
}

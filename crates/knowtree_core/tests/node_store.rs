use knowtree_core::db::open_db_in_memory;
use knowtree_core::{
    NewNode, NewTree, NodeBatchUpdate, NodeKind, NodePatch, NodeRole, NodeStore,
    SqliteNodeStore, StoreError,
};
use uuid::Uuid;

#[test]
fn create_tree_applies_defaults() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();

    let tree = store.create_tree(&NewTree::default()).unwrap();
    assert_eq!(tree.name, "New tree");
    assert_eq!(tree.source_tag, "manual");
    assert_eq!(tree.external_session_id, None);
    assert_eq!(tree.node_count, 0);
}

#[test]
fn create_node_applies_defaults_and_bumps_count() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::named("Notes")).unwrap();

    let node = store.create_node(&NewNode::new(tree.id)).unwrap();
    assert_eq!(node.title, "New node");
    assert_eq!(node.content, "");
    assert_eq!(node.kind, NodeKind::Child);
    assert_eq!(node.role, NodeRole::User);
    assert_eq!(node.order, 0);
    assert!(!node.collapsed);
    assert_eq!(node.parent_id, None);

    let tree = store.get_tree(tree.id).unwrap().unwrap();
    assert_eq!(tree.node_count, 1);
}

#[test]
fn create_node_in_unknown_tree_fails() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    match store.create_node(&NewNode::new(missing)) {
        Err(StoreError::TreeNotFound(id)) => assert_eq!(id, missing),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn parent_from_another_tree_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let first = store.create_tree(&NewTree::named("first")).unwrap();
    let second = store.create_tree(&NewTree::named("second")).unwrap();
    let foreign = store.create_node(&NewNode::new(first.id)).unwrap();

    let request = NewNode::new(second.id).with_parent(Some(foreign.id));
    assert!(matches!(
        store.create_node(&request),
        Err(StoreError::InvalidParent { .. })
    ));
    assert_eq!(store.get_tree(second.id).unwrap().unwrap().node_count, 0);
}

#[test]
fn listings_follow_sibling_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();

    let late = store
        .create_node(&NewNode::new(tree.id).with_title("late").with_order(9))
        .unwrap();
    let early = store
        .create_node(&NewNode::new(tree.id).with_title("early").with_order(1))
        .unwrap();
    let child = store
        .create_node(&NewNode::new(tree.id).with_parent(Some(early.id)))
        .unwrap();

    let roots: Vec<_> = store.root_nodes(tree.id).unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(roots, vec![early.id, late.id]);
    let children: Vec<_> = store.children(early.id).unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(children, vec![child.id]);
    assert_eq!(store.nodes_by_tree(tree.id).unwrap().len(), 3);
}

#[test]
fn list_trees_puts_recently_touched_first() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let older = store.create_tree(&NewTree::named("older")).unwrap();
    let newer = store.create_tree(&NewTree::named("newer")).unwrap();
    conn.execute(
        "UPDATE trees SET updated_at = 1 WHERE id = ?1;",
        [older.id.to_string()],
    )
    .unwrap();

    let names: Vec<_> = store.list_trees().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec![newer.name, older.name]);
}

#[test]
fn find_tree_by_session_matches_linked_tree() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let linked = store
        .create_tree(&NewTree::for_session("Chat", "conv-42", "auto"))
        .unwrap();
    store.create_tree(&NewTree::named("other")).unwrap();

    let found = store.find_tree_by_session("conv-42").unwrap().unwrap();
    assert_eq!(found.id, linked.id);
    assert!(store.find_tree_by_session("conv-missing").unwrap().is_none());
}

#[test]
fn update_node_applies_partial_patch() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let node = store
        .create_node(&NewNode::new(tree.id).with_title("before").with_content("body"))
        .unwrap();

    let patch = NodePatch {
        title: Some("after".to_string()),
        collapsed: Some(true),
        ..NodePatch::default()
    };
    let updated = store.update_node(node.id, &patch).unwrap();
    assert_eq!(updated.title, "after");
    assert_eq!(updated.content, "body");
    assert!(updated.collapsed);

    assert!(matches!(
        store.update_node(Uuid::new_v4(), &patch),
        Err(StoreError::NodeNotFound(_))
    ));
}

#[test]
fn reparenting_under_own_descendant_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let a = store.create_node(&NewNode::new(tree.id)).unwrap();
    let b = store
        .create_node(&NewNode::new(tree.id).with_parent(Some(a.id)))
        .unwrap();

    let patch = NodePatch {
        parent_id: Some(Some(b.id)),
        ..NodePatch::default()
    };
    assert!(matches!(
        store.update_node(a.id, &patch),
        Err(StoreError::CycleDetected { .. })
    ));
    let self_patch = NodePatch {
        parent_id: Some(Some(a.id)),
        ..NodePatch::default()
    };
    assert!(matches!(
        store.update_node(a.id, &self_patch),
        Err(StoreError::CycleDetected { .. })
    ));
    assert_eq!(store.get_node(a.id).unwrap().unwrap().parent_id, None);
}

#[test]
fn delete_cascades_through_subtree() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let a = store.create_node(&NewNode::new(tree.id).with_title("A")).unwrap();
    let c = store
        .create_node(&NewNode::new(tree.id).with_parent(Some(a.id)).with_order(0))
        .unwrap();
    let d = store
        .create_node(&NewNode::new(tree.id).with_parent(Some(a.id)).with_order(1))
        .unwrap();
    let keep = store.create_node(&NewNode::new(tree.id).with_order(1)).unwrap();
    assert_eq!(store.get_tree(tree.id).unwrap().unwrap().node_count, 4);

    let removed = store.delete_node(a.id).unwrap();

    assert_eq!(removed, 3);
    for id in [a.id, c.id, d.id] {
        assert!(store.get_node(id).unwrap().is_none());
    }
    assert!(store.get_node(keep.id).unwrap().is_some());
    assert_eq!(store.get_tree(tree.id).unwrap().unwrap().node_count, 1);
}

#[test]
fn cascade_count_matches_descendants_plus_one() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let root = store.create_node(&NewNode::new(tree.id)).unwrap();
    let mut parent = root.id;
    for depth in 0..5 {
        let node = store
            .create_node(&NewNode::new(tree.id).with_parent(Some(parent)))
            .unwrap();
        store
            .create_node(&NewNode::new(tree.id).with_parent(Some(parent)).with_order(depth + 1))
            .unwrap();
        parent = node.id;
    }

    let descendants = store.descendant_ids(root.id).unwrap();
    assert_eq!(descendants.len(), 10);
    let before = store.get_tree(tree.id).unwrap().unwrap().node_count;
    let removed = store.delete_node(root.id).unwrap();
    assert_eq!(removed, descendants.len() + 1);
    let after = store.get_tree(tree.id).unwrap().unwrap().node_count;
    assert_eq!(before - after, removed as i64);
}

#[test]
fn delete_unknown_node_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    assert!(matches!(
        store.delete_node(Uuid::new_v4()),
        Err(StoreError::NodeNotFound(_))
    ));
}

#[test]
fn is_descendant_is_strict() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let x = store.create_node(&NewNode::new(tree.id)).unwrap();
    let y = store
        .create_node(&NewNode::new(tree.id).with_parent(Some(x.id)))
        .unwrap();
    let z = store
        .create_node(&NewNode::new(tree.id).with_parent(Some(y.id)))
        .unwrap();

    assert!(store.is_descendant(x.id, z.id).unwrap());
    assert!(!store.is_descendant(z.id, x.id).unwrap());
    assert!(!store.is_descendant(x.id, x.id).unwrap());
}

#[test]
fn batch_skips_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let node = store.create_node(&NewNode::new(tree.id)).unwrap();

    let applied = store
        .update_nodes_batch(&[
            NodeBatchUpdate::reorder(Uuid::new_v4(), 3),
            NodeBatchUpdate::reorder(node.id, 7),
        ])
        .unwrap();

    assert_eq!(applied, 1);
    assert_eq!(store.get_node(node.id).unwrap().unwrap().order, 7);
}

#[test]
fn batch_with_cycle_rolls_back_every_entry() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let a = store.create_node(&NewNode::new(tree.id)).unwrap();
    let b = store
        .create_node(&NewNode::new(tree.id).with_parent(Some(a.id)))
        .unwrap();
    let c = store.create_node(&NewNode::new(tree.id).with_order(1)).unwrap();

    let result = store.update_nodes_batch(&[
        NodeBatchUpdate::reorder(c.id, 5),
        NodeBatchUpdate::move_to(a.id, Some(b.id), 0),
    ]);

    assert!(matches!(result, Err(StoreError::CycleDetected { .. })));
    assert_eq!(store.get_node(c.id).unwrap().unwrap().order, 1);
    assert_eq!(store.get_node(a.id).unwrap().unwrap().parent_id, None);
}

#[test]
fn clear_and_delete_tree_remove_nodes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    for order in 0..3 {
        store
            .create_node(&NewNode::new(tree.id).with_order(order))
            .unwrap();
    }

    assert_eq!(store.clear_tree(tree.id).unwrap(), 3);
    let cleared = store.get_tree(tree.id).unwrap().unwrap();
    assert_eq!(cleared.node_count, 0);
    assert!(store.nodes_by_tree(tree.id).unwrap().is_empty());

    store.create_node(&NewNode::new(tree.id)).unwrap();
    assert_eq!(store.delete_tree(tree.id).unwrap(), 1);
    assert!(store.get_tree(tree.id).unwrap().is_none());
    assert!(matches!(
        store.delete_tree(tree.id),
        Err(StoreError::TreeNotFound(_))
    ));
}

#[test]
fn rename_tree_updates_name() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::named("draft")).unwrap();

    let renamed = store.rename_tree(tree.id, "final").unwrap();
    assert_eq!(renamed.name, "final");
    assert!(matches!(
        store.rename_tree(Uuid::new_v4(), "x"),
        Err(StoreError::TreeNotFound(_))
    ));
}

#[test]
fn clear_all_wipes_library() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    store.create_node(&NewNode::new(tree.id)).unwrap();

    store.clear_all().unwrap();

    assert!(store.list_trees().unwrap().is_empty());
}

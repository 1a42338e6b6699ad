use knowtree_core::db::open_db_in_memory;
use knowtree_core::{search_nodes, NewNode, NewTree, NodeSearchQuery, NodeStore, SqliteNodeStore};

#[test]
fn matches_titles_case_insensitively_with_ancestors() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let root = store
        .create_node(&NewNode::new(tree.id).with_title("Ownership"))
        .unwrap();
    let mid = store
        .create_node(&NewNode::new(tree.id).with_title("Moves").with_parent(Some(root.id)))
        .unwrap();
    let leaf = store
        .create_node(
            &NewNode::new(tree.id)
                .with_title("Borrow checker errors")
                .with_parent(Some(mid.id)),
        )
        .unwrap();
    store
        .create_node(&NewNode::new(tree.id).with_title("Unrelated").with_order(1))
        .unwrap();

    let hits = search_nodes(&conn, &NodeSearchQuery::new(tree.id, "borrow")).unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].node_id, leaf.id);
    assert_eq!(hits[0].ancestors, vec![mid.id, root.id]);
}

#[test]
fn search_is_scoped_to_one_tree() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let first = store.create_tree(&NewTree::named("first")).unwrap();
    let second = store.create_tree(&NewTree::named("second")).unwrap();
    store
        .create_node(&NewNode::new(first.id).with_title("shared word"))
        .unwrap();
    store
        .create_node(&NewNode::new(second.id).with_title("shared word"))
        .unwrap();

    let hits = search_nodes(&conn, &NodeSearchQuery::new(first.id, "SHARED")).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].ancestors.is_empty());
}

#[test]
fn blank_query_and_wildcards_match_nothing_extra() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    store
        .create_node(&NewNode::new(tree.id).with_title("plain title"))
        .unwrap();

    assert!(search_nodes(&conn, &NodeSearchQuery::new(tree.id, "   "))
        .unwrap()
        .is_empty());
    assert!(search_nodes(&conn, &NodeSearchQuery::new(tree.id, "%"))
        .unwrap()
        .is_empty());
}

#[test]
fn case_folding_covers_non_ascii_titles() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let node = store
        .create_node(&NewNode::new(tree.id).with_title("Über Lebensdauer"))
        .unwrap();

    for text in ["über", "ÜBER", "lebensdauer"] {
        let hits = search_nodes(&conn, &NodeSearchQuery::new(tree.id, text)).unwrap();
        assert_eq!(hits.len(), 1, "query {text:?}");
        assert_eq!(hits[0].node_id, node.id);
    }
}

#[test]
fn limit_caps_hits_in_tree_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNodeStore::try_new(&conn).unwrap();
    let tree = store.create_tree(&NewTree::default()).unwrap();
    let first = store
        .create_node(&NewNode::new(tree.id).with_title("note one").with_order(0))
        .unwrap();
    store
        .create_node(&NewNode::new(tree.id).with_title("note two").with_order(1))
        .unwrap();

    let mut query = NodeSearchQuery::new(tree.id, "note");
    query.limit = 1;
    let hits = search_nodes(&conn, &query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].node_id, first.id);
}

use breadboard::protocol::Update;

/// Count `{node, action}` pairs in a recorded update list.
#[allow(dead_code)]
pub fn count_actions(updates: &[Update], node_id: &str, action: &str) -> usize {
    updates
        .iter()
        .filter(|u| u.node_id() == Some(node_id) && u.action() == Some(action))
        .count()
}

#[allow(dead_code)]
pub fn assert_no_updates_for(updates: &[Update], node_id: &str) {
    let stray: Vec<_> = updates
        .iter()
        .filter(|u| u.node_id() == Some(node_id))
        .collect();
    assert!(
        stray.is_empty(),
        "expected no updates for '{node_id}', got: {stray:?}"
    );
}

/// Every traversal update in the list, as `(edge_id, action)` pairs.
#[allow(dead_code)]
pub fn traversals(updates: &[Update]) -> Vec<(String, String)> {
    updates
        .iter()
        .filter_map(|u| match u {
            Update::Node(n) => n
                .edge_id
                .as_ref()
                .map(|edge| (edge.clone(), n.action.clone())),
            _ => None,
        })
        .collect()
}

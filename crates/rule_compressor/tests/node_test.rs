use rule_compressor::node::TrieNode;
use rule_compressor::rules::Condition;

#[test]
fn root_node_is_empty() {
    let root = TrieNode::root();
    assert!(root.is_root());
    assert_eq!(root.depth, 0);
    assert!(root.parent.is_none());
    assert!(!root.is_leaf());
}

#[test]
fn leaf_requires_result_and_no_children() {
    let mut node = TrieNode::new(2, Some(1));
    assert!(!node.is_root());
    assert!(!node.is_leaf());

    node.result = Some(1);
    assert!(node.is_leaf());

    node.children.push(("a <= 1".parse().unwrap(), 3));
    assert!(!node.is_leaf());
}

#[test]
fn child_lookup_uses_condition_equality() {
    let mut node = TrieNode::root();
    node.children = vec![
        ("a <= 1".parse().unwrap(), 1),
        ("a > 1".parse().unwrap(), 2),
        ("b == 0".parse().unwrap(), 3),
    ];

    let near: Condition = "a > 1.0000001".parse().unwrap();
    assert_eq!(node.child(&near), Some(2));
    assert_eq!(node.child(&"b == 0".parse().unwrap()), Some(3));
    assert_eq!(node.child(&"b == 1".parse().unwrap()), None);
    assert_eq!(node.child(&"a <= 2".parse().unwrap()), None);
}

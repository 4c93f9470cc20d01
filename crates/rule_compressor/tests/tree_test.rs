use rule_compressor::canonicalize::canonicalize;
use rule_compressor::rules::{BinaryFeatureSet, Label, RuleSet};
use rule_compressor::tree::RuleTrie;
use rule_compressor::CompressError;

fn rule_set(paths: &[(Vec<&str>, Label)]) -> RuleSet {
    RuleSet::from_paths(paths).unwrap()
}

fn paths(set: &RuleSet) -> Vec<(Vec<String>, Label)> {
    set.to_paths()
}

fn owned(path: &[&str]) -> Vec<String> {
    path.iter().map(|s| s.to_string()).collect()
}

// ---------------------------
// Build
// ---------------------------

#[test]
fn build_shares_common_prefixes() {
    let rules = rule_set(&[
        (vec!["a <= 1", "b <= 2"], 0),
        (vec!["a <= 1", "b > 2"], 1),
        (vec!["a > 1"], 1),
    ]);
    let trie = RuleTrie::build(&rules).unwrap();

    let root = trie.root();
    assert!(root.is_root());
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].0.to_string(), "a <= 1");
    assert_eq!(root.children[1].0.to_string(), "a > 1");

    let left = trie.get_node(root.children[0].1).unwrap();
    assert_eq!(left.depth, 1);
    assert_eq!(left.children.len(), 2);
    assert!(left.result.is_none());

    let right = trie.get_node(root.children[1].1).unwrap();
    assert!(right.is_leaf());
    assert_eq!(right.result, Some(1));

    let deep = left.children[1].1;
    assert_eq!(trie.get_node(deep).unwrap().depth, 2);
    let path: Vec<String> = trie.path_to(deep).iter().map(|c| c.to_string()).collect();
    assert_eq!(path, vec!["a <= 1", "b > 2"]);

    assert_eq!(trie.num_nodes(), 5);
    assert_eq!(trie.num_leaves(), 3);
    assert_eq!(trie.max_depth(), 2);
}

#[test]
fn build_orders_siblings_independently_of_input_order() {
    let forward = rule_set(&[(vec!["a <= 1"], 0), (vec!["a > 1"], 1), (vec!["a == 5"], 1)]);
    let backward = rule_set(&[(vec!["a == 5"], 1), (vec!["a > 1"], 1), (vec!["a <= 1"], 0)]);

    let f = RuleTrie::build(&forward).unwrap().flatten();
    let b = RuleTrie::build(&backward).unwrap().flatten();
    assert_eq!(paths(&f), paths(&b));
    assert_eq!(
        paths(&f),
        vec![
            (owned(&["a <= 1"]), 0),
            (owned(&["a > 1"]), 1),
            (owned(&["a == 5"]), 1)
        ]
    );
}

#[test]
fn build_merges_thresholds_within_epsilon() {
    let rules = rule_set(&[
        (vec!["x <= 0.5", "y <= 1"], 0),
        (vec!["x <= 0.5000001", "y > 1"], 1),
    ]);
    let trie = RuleTrie::build(&rules).unwrap();
    assert_eq!(trie.root().children.len(), 1);
    assert_eq!(trie.num_leaves(), 2);
}

#[test]
fn build_rejects_same_path_with_different_labels() {
    // Distinct until canonicalization maps both splits to `s == 0`.
    let rules = rule_set(&[(vec!["s <= 0.2"], 0), (vec!["s <= 0.7"], 1)]);
    let binary: BinaryFeatureSet = ["s"].into_iter().collect();
    let canonical = canonicalize(&rules, &binary);

    let err = RuleTrie::build(&canonical).unwrap_err();
    assert!(matches!(err, CompressError::InconsistentRules(_)));
}

#[test]
fn build_merges_same_path_with_same_label() {
    let rules = rule_set(&[(vec!["s <= 0.2"], 1), (vec!["s <= 0.7"], 1)]);
    let binary: BinaryFeatureSet = ["s"].into_iter().collect();
    let trie = RuleTrie::build(&canonicalize(&rules, &binary)).unwrap();

    assert_eq!(paths(&trie.flatten()), vec![(owned(&["s == 0"]), 1)]);
}

#[test]
fn build_rejects_rule_that_is_a_prefix_of_another() {
    let short_first = rule_set(&[(vec!["a <= 1"], 0), (vec!["a <= 1", "b > 2"], 1)]);
    let long_first = rule_set(&[(vec!["a <= 1", "b > 2"], 1), (vec!["a <= 1"], 0)]);

    for rules in [short_first, long_first] {
        let err = RuleTrie::build(&rules).unwrap_err();
        assert!(matches!(err, CompressError::InconsistentRules(_)));
    }
}

#[test]
fn build_empty_rule_set() {
    let mut trie = RuleTrie::build(&RuleSet::default()).unwrap();
    assert_eq!(trie.num_nodes(), 1);
    assert_eq!(trie.simplify(), 0);
    assert!(trie.flatten().is_empty());
}

// ---------------------------
// Simplify
// ---------------------------

#[test]
fn simplify_collapses_uniform_leaves() {
    let rules = rule_set(&[
        (vec!["a <= 1", "b <= 2"], 0),
        (vec!["a <= 1", "b > 2"], 0),
        (vec!["a > 1"], 1),
    ]);
    let mut trie = RuleTrie::build(&rules).unwrap();
    assert_eq!(trie.simplify(), 1);
    assert_eq!(
        paths(&trie.flatten()),
        vec![(owned(&["a <= 1"]), 0), (owned(&["a > 1"]), 1)]
    );
}

#[test]
fn simplify_cascades_to_the_root() {
    let rules = rule_set(&[
        (vec!["a <= 1", "b <= 2"], 0),
        (vec!["a <= 1", "b > 2"], 0),
        (vec!["a > 1", "c <= 3"], 0),
        (vec!["a > 1", "c > 3", "d <= 4"], 0),
        (vec!["a > 1", "c > 3", "d > 4"], 0),
    ]);
    let mut trie = RuleTrie::build(&rules).unwrap();
    assert_eq!(trie.simplify(), 4);

    let flat = trie.flatten();
    assert_eq!(flat.len(), 1);
    assert!(flat.rules()[0].conditions.is_empty());
    assert_eq!(flat.rules()[0].label, 0);
}

#[test]
fn simplify_leaves_mixed_children_alone() {
    let rules = rule_set(&[
        (vec!["a <= 1", "b <= 2"], 0),
        (vec!["a <= 1", "b > 2"], 1),
        (vec!["a > 1", "c <= 3"], 1),
        (vec!["a > 1", "c > 3"], 1),
    ]);
    let mut trie = RuleTrie::build(&rules).unwrap();
    assert_eq!(trie.simplify(), 1);
    assert_eq!(
        paths(&trie.flatten()),
        vec![
            (owned(&["a <= 1", "b <= 2"]), 0),
            (owned(&["a <= 1", "b > 2"]), 1),
            (owned(&["a > 1"]), 1),
        ]
    );
}

#[test]
fn simplify_keeps_single_child_chains() {
    let rules = rule_set(&[(vec!["a <= 1", "b <= 2"], 0)]);
    let mut trie = RuleTrie::build(&rules).unwrap();
    assert_eq!(trie.simplify(), 0);
    assert_eq!(paths(&trie.flatten()), vec![(owned(&["a <= 1", "b <= 2"]), 0)]);
}

#[test]
fn simplify_ignores_uniform_children_that_are_not_leaves() {
    // Both children of the root lead to label 1 only through deeper mixed nodes.
    let rules = rule_set(&[
        (vec!["a <= 1", "b <= 2"], 1),
        (vec!["a <= 1", "b > 2"], 0),
        (vec!["a > 1", "b <= 2"], 1),
        (vec!["a > 1", "b > 2"], 0),
    ]);
    let mut trie = RuleTrie::build(&rules).unwrap();
    assert_eq!(trie.simplify(), 0);
    assert_eq!(trie.flatten().len(), 4);
}

// ---------------------------
// Flatten
// ---------------------------

#[test]
fn flatten_without_simplify_reproduces_distinct_input() {
    let rules = rule_set(&[
        (vec!["a > 1"], 1),
        (vec!["a <= 1", "b > 2"], 1),
        (vec!["a <= 1", "b <= 2"], 0),
    ]);
    let flat = RuleTrie::build(&rules).unwrap().flatten();
    assert_eq!(
        paths(&flat),
        vec![
            (owned(&["a <= 1", "b <= 2"]), 0),
            (owned(&["a <= 1", "b > 2"]), 1),
            (owned(&["a > 1"]), 1),
        ]
    );
}

#[test]
fn flatten_single_unconditional_rule() {
    let rules = RuleSet::new(vec![rule_compressor::Rule::new(Vec::new(), 3)]).unwrap();
    let trie = RuleTrie::build(&rules).unwrap();
    assert!(trie.root().is_leaf());
    let flat = trie.flatten();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat.rules()[0].label, 3);
}

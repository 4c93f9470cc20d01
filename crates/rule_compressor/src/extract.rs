use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conf::{EXTRACTED_THRESHOLD_PRECISION, TREE_LEAF};
use crate::error::{CompressError, Result};
use crate::rules::{Condition, Label, Rule, RuleSet};

/// Flat split representation of a fitted classification tree.
///
/// All vectors are indexed by node id and node 0 is the root. Leaves have
/// both children set to [`TREE_LEAF`]; `value` holds per-class weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTree {
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub value: Vec<Vec<f64>>,
}

impl FittedTree {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CompressError::MalformedTree(e.to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == TREE_LEAF && self.children_right[node] == TREE_LEAF
    }

    fn validate(&self) -> Result<()> {
        let n = self.node_count();
        let lengths = [
            ("feature", self.feature.len()),
            ("threshold", self.threshold.len()),
            ("children_right", self.children_right.len()),
            ("value", self.value.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(CompressError::MalformedTree(format!(
                    "'{}' has {} entries, expected {}",
                    name, len, n
                )));
            }
        }
        Ok(())
    }

    fn child(&self, node: usize, raw: i64) -> Result<usize> {
        usize::try_from(raw)
            .ok()
            .filter(|&child| child < self.node_count())
            .ok_or_else(|| {
                CompressError::MalformedTree(format!(
                    "node {} points to invalid child {}",
                    node, raw
                ))
            })
    }

    /// Index of the largest class weight, first one on ties.
    fn majority_class(&self, node: usize) -> Result<Label> {
        let mut best: Option<(usize, f64)> = None;
        for (class, &weight) in self.value[node].iter().enumerate() {
            if best.map_or(true, |(_, top)| weight > top) {
                best = Some((class, weight));
            }
        }
        let (class, _) = best.ok_or_else(|| {
            CompressError::MalformedTree(format!("leaf {} has no class values", node))
        })?;
        Label::try_from(class)
            .map_err(|_| CompressError::MalformedTree(format!("class index {} overflows", class)))
    }
}

/// Emits one decision path per leaf of a [`FittedTree`], left branch first.
pub struct RuleExtractor<'a> {
    tree: &'a FittedTree,
    feature_names: &'a [String],
}

impl<'a> RuleExtractor<'a> {
    pub fn new(tree: &'a FittedTree, feature_names: &'a [String]) -> Self {
        Self {
            tree,
            feature_names,
        }
    }

    pub fn extract(&self) -> Result<RuleSet> {
        let tree = self.tree;
        tree.validate()?;
        if tree.node_count() == 0 {
            return Ok(RuleSet::default());
        }

        let mut visited = vec![false; tree.node_count()];
        let mut rules = Vec::new();
        let mut stack: Vec<(usize, Vec<Condition>)> = vec![(0, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if std::mem::replace(&mut visited[node], true) {
                return Err(CompressError::MalformedTree(format!(
                    "node {} is reachable more than once",
                    node
                )));
            }
            if tree.is_leaf(node) {
                rules.push(Rule::new(path, tree.majority_class(node)?));
                continue;
            }

            let name = self.feature_name(node)?;
            let threshold = tree.threshold[node];
            if !threshold.is_finite() {
                return Err(CompressError::MalformedTree(format!(
                    "node {} has non-finite threshold {}",
                    node, threshold
                )));
            }
            let left = tree.child(node, tree.children_left[node])?;
            let right = tree.child(node, tree.children_right[node])?;

            let mut right_path = path.clone();
            right_path.push(split_condition(name, ">", threshold)?);
            let mut left_path = path;
            left_path.push(split_condition(name, "<=", threshold)?);

            stack.push((right, right_path));
            stack.push((left, left_path));
        }

        debug!(
            nodes = tree.node_count(),
            leaves = rules.len(),
            "extracted decision paths"
        );
        RuleSet::new(rules)
    }

    fn feature_name(&self, node: usize) -> Result<&'a str> {
        let names: &'a [String] = self.feature_names;
        let raw = self.tree.feature[node];
        usize::try_from(raw)
            .ok()
            .and_then(|idx| names.get(idx))
            .map(String::as_str)
            .ok_or_else(|| {
                CompressError::MalformedTree(format!(
                    "node {} splits on unknown feature {}",
                    node, raw
                ))
            })
    }
}

// Paths go through the text grammar so thresholds carry the fixed precision.
fn split_condition(name: &str, operator: &str, threshold: f64) -> Result<Condition> {
    format!(
        "{} {} {:.*}",
        name, operator, EXTRACTED_THRESHOLD_PRECISION, threshold
    )
    .parse()
}

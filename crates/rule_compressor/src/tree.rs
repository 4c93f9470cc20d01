use itertools::Itertools;
use tracing::debug;

use crate::error::{CompressError, Result};
use crate::node::{NodeId, TrieNode};
use crate::rules::{Condition, Label, Rule, RuleSet};

const ROOT: NodeId = 0;

/// Decision trie over rule paths: rules sharing leading conditions share
/// nodes. Nodes live in an arena and refer to their children by index.
#[derive(Clone, Debug)]
pub struct RuleTrie {
    nodes: Vec<TrieNode>,
}

impl Default for RuleTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTrie {
    /// Empty trie: a root without children or result.
    pub fn new() -> Self {
        RuleTrie {
            nodes: vec![TrieNode::root()],
        }
    }

    /// Group the rules by shared condition prefixes.
    ///
    /// Fails with [`CompressError::InconsistentRules`] when two rules follow
    /// the same path to different labels, or when one rule's path is a
    /// strict prefix of another's.
    pub fn build(rules: &RuleSet) -> Result<Self> {
        let mut trie = RuleTrie::new();
        for rule in rules {
            trie.insert(rule)?;
        }
        debug!(
            rules = rules.len(),
            nodes = trie.num_nodes(),
            "built rule trie"
        );
        Ok(trie)
    }

    fn insert(&mut self, rule: &Rule) -> Result<()> {
        let mut current = ROOT;
        for condition in &rule.conditions {
            if let Some(label) = self.nodes[current].result {
                return Err(self.prefix_conflict(current, label, rule));
            }
            current = match self.nodes[current].child(condition) {
                Some(child) => child,
                None => {
                    let id = self.nodes.len();
                    let depth = self.nodes[current].depth + 1;
                    self.nodes.push(TrieNode::new(depth, Some(current)));
                    self.nodes[current].attach(condition.clone(), id);
                    id
                }
            };
        }

        if !self.nodes[current].children.is_empty() {
            return Err(CompressError::InconsistentRules(format!(
                "rule {} ends where other rules continue",
                rule
            )));
        }
        match self.nodes[current].result {
            Some(existing) if existing != rule.label => {
                Err(CompressError::InconsistentRules(format!(
                    "path [{}] predicts both {} and {}",
                    rule.conditions.iter().join(", "),
                    existing,
                    rule.label
                )))
            }
            Some(_) => Ok(()),
            None => {
                self.nodes[current].result = Some(rule.label);
                Ok(())
            }
        }
    }

    fn prefix_conflict(&self, node: NodeId, label: Label, rule: &Rule) -> CompressError {
        CompressError::InconsistentRules(format!(
            "rule [{}] -> {} is a prefix of {}",
            self.path_to(node).iter().join(", "),
            label,
            rule
        ))
    }

    /// Collapse every node whose children are all leaves with one shared
    /// label into a single leaf, bottom-up, so collapses cascade towards the
    /// root. Returns the number of collapsed nodes.
    pub fn simplify(&mut self) -> usize {
        let order = self.preorder();
        let mut collapsed = 0;
        // Reverse pre-order visits every node after all of its descendants.
        for &id in order.iter().rev() {
            if let Some(label) = self.uniform_leaf_label(id) {
                debug!(
                    depth = self.nodes[id].depth,
                    dropped_edges = self.nodes[id].children.len(),
                    label,
                    "collapsed uniform subtree"
                );
                self.nodes[id].collapse_into(label);
                collapsed += 1;
            }
        }
        collapsed
    }

    fn uniform_leaf_label(&self, id: NodeId) -> Option<Label> {
        let node = &self.nodes[id];
        if node.children.len() < 2 {
            return None;
        }
        let mut labels = node.children.iter().map(|(_, child)| {
            let child = &self.nodes[*child];
            if child.is_leaf() {
                child.result
            } else {
                None
            }
        });
        let first = labels.next().flatten()?;
        labels.all(|label| label == Some(first)).then_some(first)
    }

    /// One rule per reachable leaf, siblings visited in condition order.
    pub fn flatten(&self) -> RuleSet {
        let mut rules = Vec::new();
        let mut stack: Vec<(NodeId, Vec<Condition>)> = vec![(ROOT, Vec::new())];
        while let Some((id, path)) = stack.pop() {
            let node = &self.nodes[id];
            if let Some(label) = node.result {
                rules.push(Rule::new(path, label));
                continue;
            }
            for (condition, child) in node.children.iter().rev() {
                let mut next = path.clone();
                next.push(condition.clone());
                stack.push((*child, next));
            }
        }
        // Trie paths are distinct by construction.
        RuleSet::from_unchecked(rules)
    }

    /// Reachable node ids, each parent before its descendants.
    fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev().map(|(_, child)| *child));
        }
        order
    }

    /// Conditions on the edges from the root down to `id`.
    pub fn path_to(&self, id: NodeId) -> Vec<Condition> {
        let mut path = Vec::with_capacity(self.nodes[id].depth);
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if let Some((condition, _)) = self.nodes[parent]
                .children
                .iter()
                .find(|(_, child)| *child == current)
            {
                path.push(condition.clone());
            }
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn root(&self) -> &TrieNode {
        &self.nodes[ROOT]
    }

    pub fn get_node(&self, id: NodeId) -> Option<&TrieNode> {
        self.nodes.get(id)
    }

    /// Nodes allocated in the arena, including ones detached by collapses.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.preorder()
            .into_iter()
            .filter(|&id| self.nodes[id].is_leaf())
            .count()
    }

    pub fn max_depth(&self) -> usize {
        self.preorder()
            .into_iter()
            .map(|id| self.nodes[id].depth)
            .max()
            .unwrap_or(0)
    }
}

use crate::rules::{Condition, Label};

/// Index of a node inside a [`crate::tree::RuleTrie`] arena.
pub type NodeId = usize;

#[derive(Clone, Debug)]
pub struct TrieNode {
    /// Outgoing edges sorted by the condition order, one per distinct condition.
    pub children: Vec<(Condition, NodeId)>,
    pub result: Option<Label>,
    pub depth: usize,
    // Diagnostics only; ownership flows parent -> child through `children`.
    pub parent: Option<NodeId>,
}

impl TrieNode {
    pub fn new(depth: usize, parent: Option<NodeId>) -> Self {
        Self {
            children: Vec::new(),
            result: None,
            depth,
            parent,
        }
    }

    pub fn root() -> Self {
        Self::new(0, None)
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.result.is_some()
    }

    /// Child reached through an edge equal to `condition`.
    pub fn child(&self, condition: &Condition) -> Option<NodeId> {
        self.children
            .binary_search_by(|(edge, _)| edge.cmp(condition))
            .ok()
            .map(|pos| self.children[pos].1)
    }

    /// Insert an edge keeping siblings ordered. The caller ensures no equal
    /// edge exists yet.
    pub(crate) fn attach(&mut self, condition: Condition, child: NodeId) {
        let pos = self
            .children
            .binary_search_by(|(edge, _)| edge.cmp(&condition))
            .unwrap_or_else(|pos| pos);
        self.children.insert(pos, (condition, child));
    }

    /// Turn the node into a leaf, dropping its edges.
    pub(crate) fn collapse_into(&mut self, label: Label) {
        self.children.clear();
        self.result = Some(label);
    }
}

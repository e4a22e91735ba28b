//! Namespace tree of free functions, so each namespace object is registered once no matter how many files
//! contribute functions to it.

use std::fmt::Debug;

#[derive(Clone, PartialEq, Eq, Default)]
pub struct BridgeNode {
    /// Namespace segment, empty for the root
    pub name: String,
    /// Indices into [`crate::BindingModel::functions`], in insertion order
    pub functions: Vec<usize>,
    /// Child namespaces in order of first appearance
    pub children: Vec<BridgeNode>,
}

impl BridgeNode {
    fn new(name: &str) -> BridgeNode {
        BridgeNode {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn child_mut(&mut self, name: &str) -> &mut BridgeNode {
        let idx = match self.children.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.children.push(BridgeNode::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.children.iter().all(|c| c.is_empty())
    }

    fn pretty_print(&self, depth: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        if depth > 0 {
            writeln!(f, "{indent}{}: {:?}", self.name, self.functions)?;
        } else {
            writeln!(f, "<root>: {:?}", self.functions)?;
        }
        for child in &self.children {
            child.pretty_print(depth + 1, f)?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Default)]
pub struct BridgeTree {
    pub root: BridgeNode,
}

impl BridgeTree {
    pub fn new() -> BridgeTree {
        BridgeTree::default()
    }

    /// Add function `index` under namespace `path`, creating intermediate nodes as needed
    pub fn insert(&mut self, path: &[String], index: usize) {
        let mut node = &mut self.root;
        for segment in path {
            node = node.child_mut(segment);
        }
        node.functions.push(index);
    }

    pub fn find(&self, path: &[&str]) -> Option<&BridgeNode> {
        let mut node = &self.root;
        for segment in path {
            node = node.children.iter().find(|c| c.name == *segment)?;
        }
        Some(node)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

impl Debug for BridgeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.root.pretty_print(0, f)
    }
}

use std::{fmt, ops::Range};

use super::RuleId;

/// A completed derivation of a rule.
pub struct ParseTree<'i, S, T> {
    pub rule: RuleId,
    /// The tag of the alternative that matched. For list rules, the tag of the alternative that
    /// matched the first element.
    pub tag: T,
    /// The indices of the input symbols covered by this tree.
    pub range: Range<usize>,
    pub children: Vec<ParseNode<'i, S, T>>,
}

pub enum ParseNode<'i, S, T> {
    Leaf(&'i S),
    Tree(ParseTree<'i, S, T>),
}

impl<'i, S, T> ParseNode<'i, S, T> {
    pub fn as_tree(&self) -> Option<&ParseTree<'i, S, T>> {
        match self {
            ParseNode::Tree(tree) => Some(tree),
            ParseNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&'i S> {
        match self {
            ParseNode::Leaf(leaf) => Some(*leaf),
            ParseNode::Tree(_) => None,
        }
    }
}

impl<'i, S, T> ParseTree<'i, S, T> {
    /// The `index`-th child, if it is a tree.
    pub fn tree(&self, index: usize) -> Option<&ParseTree<'i, S, T>> {
        self.children.get(index)?.as_tree()
    }

    /// The `index`-th child, if it is a leaf.
    pub fn leaf(&self, index: usize) -> Option<&'i S> {
        self.children.get(index)?.as_leaf()
    }

    /// The children that are trees, in order.
    pub fn trees(&self) -> impl Iterator<Item = &ParseTree<'i, S, T>> + '_ {
        self.children.iter().filter_map(ParseNode::as_tree)
    }

    /// Every input symbol covered by this tree, in order.
    pub fn leaves(&self) -> Vec<&'i S> {
        let mut leaves = Vec::with_capacity(self.range.len());
        let mut stack = vec![self.children.iter()];
        while let Some(children) = stack.last_mut() {
            match children.next() {
                Some(ParseNode::Leaf(leaf)) => leaves.push(*leaf),
                Some(ParseNode::Tree(tree)) => stack.push(tree.children.iter()),
                None => {
                    stack.pop();
                }
            }
        }
        leaves
    }
}

impl<S, T> Drop for ParseTree<'_, S, T> {
    /// Deep trees are taken apart one level at a time.
    fn drop(&mut self) {
        let mut nodes = std::mem::take(&mut self.children);
        while let Some(node) = nodes.pop() {
            if let ParseNode::Tree(mut tree) = node {
                nodes.append(&mut tree.children);
            }
        }
    }
}

impl<S: fmt::Debug, T: fmt::Debug> fmt::Debug for ParseTree<'_, S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseTree")
            .field("tag", &self.tag)
            .field("range", &self.range)
            .field("children", &self.children)
            .finish()
    }
}

impl<S: fmt::Debug, T: fmt::Debug> fmt::Debug for ParseNode<'_, S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseNode::Leaf(leaf) => fmt::Debug::fmt(leaf, f),
            ParseNode::Tree(tree) => fmt::Debug::fmt(tree, f),
        }
    }
}

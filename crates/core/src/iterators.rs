//! Restartable iterators over tree nodes and leaves.
//!
//! Both keep an explicit stack instead of recursing, so they can be stopped
//! and restarted freely by callers that only need a prefix.

use crate::tree::{NodeId, Tree};

/// Pre-order traversal of every node, descending into children and layer
/// chains alike.
pub struct Nodes<'t> {
  tree: &'t Tree,
  stack: Vec<NodeId>,
}

impl<'t> Nodes<'t> {
  pub fn new(tree: &'t Tree) -> Self {
    Self {
      tree,
      stack: tree.root().into_iter().collect(),
    }
  }
}

impl Iterator for Nodes<'_> {
  type Item = NodeId;

  fn next(&mut self) -> Option<Self::Item> {
    let id = self.stack.pop()?;
    let node = self.tree.node(id);
    if let Some(next) = node.next {
      self.stack.push(next);
    }
    for &child in node.children.iter().rev() {
      self.stack.push(child);
    }
    Some(id)
  }
}

/// Iterates tokens in source order, descending through layer chains to the
/// bottom. Yields `(token, anchor)` where the anchor is the comparison-layer
/// node the token belongs to: the token itself, or the chain head when the
/// token sits below a leaf node's fine-grained expansion.
pub struct Leaves<'t> {
  tree: &'t Tree,
  stack: Vec<(NodeId, Option<NodeId>)>,
}

impl<'t> Leaves<'t> {
  pub fn new(tree: &'t Tree) -> Self {
    Self {
      tree,
      stack: tree.root().map(|r| (r, None)).into_iter().collect(),
    }
  }
}

impl Iterator for Leaves<'_> {
  type Item = (NodeId, NodeId);

  fn next(&mut self) -> Option<Self::Item> {
    while let Some((id, head)) = self.stack.pop() {
      let node = self.tree.node(id);

      if let Some(next) = node.next {
        // Entering the expansion of a leaf makes that leaf the anchor for
        // everything below; outer proxies of inner layers do not, as the
        // inner layer was compared on its own.
        let head = head.or(if node.leaf { Some(id) } else { None });
        self.stack.push((next, head));
        continue;
      }

      for &child in node.children.iter().rev() {
        self.stack.push((child, head));
      }

      if node.leaf && node.children.is_empty() {
        return Some((id, head.unwrap_or(id)));
      }
    }
    None
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::testutil::tree_from;

  #[test]
  fn leaves_come_out_in_source_order() {
    let tree = tree_from(&["a b", "c"]);
    let labels: Vec<_> = Leaves::new(&tree)
      .map(|(id, _)| tree.label(id).to_owned())
      .collect();
    assert_eq!(labels, ["a", "b", "c"]);
  }

  #[test]
  fn nodes_cover_the_whole_tree() {
    let tree = tree_from(&["a b", "c"]);
    // root + 2 statements + 3 tokens
    assert_eq!(Nodes::new(&tree).count(), 6);
  }

  #[test]
  fn iteration_is_restartable() {
    let tree = tree_from(&["a b c d"]);
    let first: Vec<_> = Leaves::new(&tree).take(2).collect();
    let again: Vec<_> = Leaves::new(&tree).take(2).collect();
    assert_eq!(first, again);
  }
}

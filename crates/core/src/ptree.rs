//! Parse tree: raw front-end output.
//!
//! A `PNode` keeps every token of the source together with its position and a
//! language-specific structural tag. Front-ends feed nodes through a
//! [`TreeBuilder`], which also handles postponed tokens (comments, directives
//! and the like that a grammar cannot place at their original position) and
//! contracts single-child scaffolding chains.

use crate::arena::Span;
use crate::types::SType;

/// Index of a parse-tree node inside its owning [`TreeBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PNodeId(u32);

impl PNodeId {
  fn idx(self) -> usize {
    self.0 as usize
  }
}

/// Token payload of a parse-tree node: byte range in the source plus the
/// language-specific token id.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text {
  pub from: u32,
  pub len: u32,
  pub token: u16,
}

/// Source position of a token; (0, 0) marks non-terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Location {
  pub line: u32,
  pub col: u32,
}

#[derive(Debug, Default)]
pub struct PNode {
  pub value: Text,
  pub children: Vec<PNodeId>,
  pub line: u32,
  pub col: u32,
  pub postponed: bool,
  pub stype: SType,
  /// Whole-subtree label, filled in by pre-stringification.
  pub label: Span,
  /// Leading children that were lifted to an ancestor and await dropping.
  moved_children: usize,
}

impl PNode {
  fn empty(&self) -> bool {
    self.value.from == 0 && self.value.len == 0 && self.stype.is_none()
  }

  pub fn is_leaf(&self) -> bool {
    self.line != 0 && self.col != 0
  }
}

struct Postponed {
  value: Text,
  loc: Location,
  stype: SType,
}

/// Owner of all parse-tree nodes of one file.
#[derive(Default)]
pub struct TreeBuilder {
  nodes: Vec<PNode>,
  root: Option<PNodeId>,
  postponed: Vec<Postponed>,
  attached_postponed: usize,
  failed: bool,
}

impl TreeBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn node(&self, id: PNodeId) -> &PNode {
    &self.nodes[id.idx()]
  }

  pub fn node_mut(&mut self, id: PNodeId) -> &mut PNode {
    &mut self.nodes[id.idx()]
  }

  pub fn root(&self) -> Option<PNodeId> {
    self.root
  }

  pub fn set_root(&mut self, root: PNodeId) {
    self.root = Some(root);
  }

  pub fn has_failed(&self) -> bool {
    self.failed
  }

  fn make(&mut self, node: PNode) -> PNodeId {
    let id = PNodeId(self.nodes.len() as u32);
    self.nodes.push(node);
    id
  }

  /// Adds a token node. Postponed tokens recorded since the previous one are
  /// attached as preceding synthetic leaves, wrapped together with the token
  /// into an unmarked container.
  pub fn add_leaf(&mut self, value: Text, loc: Location, stype: SType) -> PNodeId {
    let leaf = self.make_token(value, loc, stype, false);
    if self.attached_postponed == self.postponed.len() {
      return leaf;
    }

    let mut children = Vec::with_capacity(self.postponed.len() - self.attached_postponed + 1);
    while self.attached_postponed < self.postponed.len() {
      let Postponed { value, loc, stype } = self.postponed[self.attached_postponed];
      let child = self.make_token(value, loc, stype, true);
      children.push(child);
      self.attached_postponed += 1;
    }
    children.push(leaf);
    self.make(PNode {
      children,
      ..PNode::default()
    })
  }

  fn make_token(&mut self, value: Text, loc: Location, stype: SType, postponed: bool) -> PNodeId {
    self.make(PNode {
      value,
      line: loc.line,
      col: loc.col,
      postponed,
      stype,
      ..PNode::default()
    })
  }

  /// Adds a non-terminal over already built children. Postponed leading
  /// children are lifted next to their future siblings, and unmarked
  /// single-child nodes are contracted away instead of being created.
  pub fn add_inner(&mut self, children: Vec<PNodeId>, stype: SType) -> PNodeId {
    let mut children = children;
    let mut i = children.len();
    while i > 0 {
      self.move_postponed(&mut children, i - 1);
      i -= 1;
    }

    if stype.is_none() && children.len() == 1 {
      return self.contract(children[0]);
    }

    for child in &mut children {
      *child = self.contract(*child);
    }
    self.make(PNode {
      children,
      stype,
      ..PNode::default()
    })
  }

  pub fn append(&mut self, node: PNodeId, child: PNodeId) -> PNodeId {
    let mut taken = std::mem::take(&mut self.nodes[node.idx()].children);
    let at = taken.len();
    taken.push(child);
    self.move_postponed(&mut taken, at);
    self.nodes[node.idx()].children = taken;
    node
  }

  pub fn prepend(&mut self, node: PNodeId, child: PNodeId) -> PNodeId {
    let mut taken = std::mem::take(&mut self.nodes[node.idx()].children);
    taken.insert(0, child);
    self.move_postponed(&mut taken, 0);
    self.nodes[node.idx()].children = taken;
    node
  }

  /// Records a token that cannot be placed in the structural tree at its
  /// original position; it is re-attached before the next token or, at the
  /// end of input, to the root.
  pub fn add_postponed(&mut self, value: Text, loc: Location, stype: SType) {
    self.postponed.push(Postponed { value, loc, stype });
  }

  /// Finalizes the tree: contracts scaffolding, drops lifted children and
  /// attaches trailing postponed tokens to the root.
  pub fn finish(&mut self, failed: bool) {
    if failed {
      self.failed = true;
      return;
    }

    if let Some(root) = self.root {
      let root = self.shrink(root);
      self.root = Some(root);

      while self.attached_postponed < self.postponed.len() {
        let Postponed { value, loc, stype } = self.postponed[self.attached_postponed];
        let child = self.make_token(value, loc, stype, true);
        self.nodes[root.idx()].children.push(child);
        self.attached_postponed += 1;
      }
    }
  }

  /// Descends to the first token of the subtree.
  pub fn leftmost_leaf(&self, id: PNodeId) -> PNodeId {
    let mut id = id;
    while let Some(&first) = self.node(id).children.first() {
      id = first;
    }
    id
  }

  // Lifts postponed leading children of `nodes[at]` right before it; the
  // lifted children stay in place and are dropped later by shrink().
  fn move_postponed(&mut self, nodes: &mut Vec<PNodeId>, at: usize) {
    let id = nodes[at];
    let split = {
      let node = &self.nodes[id.idx()];
      node
        .children
        .iter()
        .position(|&c| !self.nodes[c.idx()].postponed)
        .unwrap_or(node.children.len())
    };
    if split == 0 {
      return;
    }

    self.nodes[id.idx()].moved_children = split;
    let lifted: Vec<PNodeId> = self.nodes[id.idx()].children[..split].to_vec();
    nodes[at] = self.contract(id);
    nodes.splice(at..at, lifted);
  }

  fn contract(&self, id: PNodeId) -> PNodeId {
    let node = &self.nodes[id.idx()];
    if node.empty() && node.children.len() - node.moved_children == 1 {
      return self.contract(node.children[node.moved_children]);
    }
    id
  }

  // Drops children that were lifted to ancestors and contracts what remains.
  fn shrink(&mut self, id: PNodeId) -> PNodeId {
    let moved = self.nodes[id.idx()].moved_children;
    let mut children = std::mem::take(&mut self.nodes[id.idx()].children);
    children.drain(..moved);
    for child in &mut children {
      *child = self.shrink(*child);
    }
    let node = &mut self.nodes[id.idx()];
    node.children = children;
    node.moved_children = 0;
    self.contract(id)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn text(from: u32, len: u32) -> Text {
    Text { from, len, token: 0 }
  }

  fn loc(line: u32, col: u32) -> Location {
    Location { line, col }
  }

  const TAGGED: SType = SType(1);

  #[test]
  fn unmarked_single_child_chains_contract() {
    let mut tb = TreeBuilder::new();
    let leaf = tb.add_leaf(text(0, 2), loc(1, 1), TAGGED);
    let inner = tb.add_inner(vec![leaf], SType::NONE);
    assert_eq!(inner, leaf);

    let kept = tb.add_inner(vec![leaf], TAGGED);
    assert_ne!(kept, leaf);
    assert_eq!(tb.node(kept).children, vec![leaf]);
  }

  #[test]
  fn postponed_tokens_attach_before_next_leaf() {
    let mut tb = TreeBuilder::new();
    tb.add_postponed(text(0, 4), loc(1, 1), TAGGED);
    let wrapped = tb.add_leaf(text(5, 2), loc(2, 1), SType::NONE);

    let children = &tb.node(wrapped).children;
    assert_eq!(children.len(), 2);
    assert!(tb.node(children[0]).postponed);
    assert!(!tb.node(children[1]).postponed);
  }

  #[test]
  fn trailing_postponed_tokens_land_on_root() {
    let mut tb = TreeBuilder::new();
    let leaf = tb.add_leaf(text(0, 2), loc(1, 1), SType::NONE);
    let root = tb.add_inner(vec![leaf], TAGGED);
    tb.set_root(root);
    tb.add_postponed(text(3, 4), loc(2, 1), TAGGED);
    tb.finish(false);

    let root = tb.root().unwrap();
    let children = &tb.node(root).children;
    assert_eq!(children.len(), 2);
    assert!(tb.node(children[1]).postponed);
  }

  #[test]
  fn postponed_children_are_lifted_to_siblings() {
    let mut tb = TreeBuilder::new();
    tb.add_postponed(text(0, 3), loc(1, 1), TAGGED);
    let a = tb.add_leaf(text(4, 1), loc(2, 1), SType::NONE);
    let b = tb.add_leaf(text(6, 1), loc(2, 3), SType::NONE);
    let parent = tb.add_inner(vec![a, b], TAGGED);
    tb.set_root(parent);
    tb.finish(false);

    // The wrapper around `a` dissolves: postponed comment, then both tokens.
    let root = tb.root().unwrap();
    let children = &tb.node(root).children;
    assert_eq!(children.len(), 3);
    assert!(tb.node(children[0]).postponed);
    assert!(tb.node(children[1]).is_leaf());
    assert_eq!(children[2], b);
  }

  #[test]
  fn failed_parse_is_reported() {
    let mut tb = TreeBuilder::new();
    tb.finish(true);
    assert!(tb.has_failed());
  }
}

//! Structural tree: first reduction of a parse tree.
//!
//! Only nodes carrying a structural tag survive; unmarked scaffolding between
//! a tagged node and its tagged descendants is discarded, except for the
//! tokens it carries, which re-attach to the nearest surviving ancestor.

use crate::language::Language;
use crate::ptree::{PNodeId, TreeBuilder};
use std::io::Write;

/// Index of a structural node inside its owning [`STree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SNodeId(u32);

impl SNodeId {
  fn idx(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug)]
pub struct SNode {
  pub value: PNodeId,
  pub children: Vec<SNodeId>,
}

/// Structural tree over a finished parse tree, which it takes ownership of.
pub struct STree {
  ptree: TreeBuilder,
  nodes: Vec<SNode>,
  root: SNodeId,
}

impl STree {
  pub fn new(ptree: TreeBuilder) -> STree {
    let mut stree = STree {
      ptree,
      nodes: Vec::new(),
      root: SNodeId(0),
    };

    let proot = stree.ptree.root().expect("parse tree has no root");
    stree.root = match find_seed(&stree.ptree, proot) {
      Some(seed) => stree.build(seed),
      // Trees without a single tagged node reduce to a root wrapper.
      None => stree.make(proot),
    };
    stree
  }

  pub fn root(&self) -> SNodeId {
    self.root
  }

  pub fn node(&self, id: SNodeId) -> &SNode {
    &self.nodes[id.idx()]
  }

  pub fn ptree(&self) -> &TreeBuilder {
    &self.ptree
  }

  pub fn ptree_mut(&mut self) -> &mut TreeBuilder {
    &mut self.ptree
  }

  fn make(&mut self, value: PNodeId) -> SNodeId {
    let id = SNodeId(self.nodes.len() as u32);
    self.nodes.push(SNode {
      value,
      children: Vec::new(),
    });
    id
  }

  fn build(&mut self, pnode: PNodeId) -> SNodeId {
    let snode = self.make(pnode);

    let children = self.ptree.node(pnode).children.clone();
    // If none of the children leads to a tagged node, this is a leaf.
    if !children.iter().any(|&c| find_seed(&self.ptree, c).is_some()) {
      return snode;
    }

    let mut built = Vec::with_capacity(children.len());
    for child in children {
      match find_seed(&self.ptree, child) {
        Some(seed) => built.push(self.build(seed)),
        // Tokens between tagged nodes survive as synthetic leaves.
        None => built.push(self.make(child)),
      }
    }
    self.nodes[snode.idx()].children = built;
    snode
  }

  /// Dumps the structural tree for debugging.
  pub fn dump<L: Language + ?Sized>(
    &self,
    w: &mut dyn Write,
    contents: &str,
    lang: &L,
  ) -> std::io::Result<()> {
    self.dump_node(w, contents, lang, self.root, 0)
  }

  fn dump_node<L: Language + ?Sized>(
    &self,
    w: &mut dyn Write,
    contents: &str,
    lang: &L,
    id: SNodeId,
    depth: usize,
  ) -> std::io::Result<()> {
    let node = self.node(id);
    let pnode = self.ptree.node(node.value);
    let from = pnode.value.from as usize;
    let to = from + pnode.value.len as usize;
    writeln!(
      w,
      "{:indent$}`{}`, {}",
      "",
      contents.get(from..to).unwrap_or(""),
      lang.stype_name(pnode.stype),
      indent = depth * 4
    )?;
    for &child in &node.children {
      self.dump_node(w, contents, lang, child, depth + 1)?;
    }
    Ok(())
  }
}

// Descends through unmarked single-child chains to the nearest tagged node.
fn find_seed(ptree: &TreeBuilder, id: PNodeId) -> Option<PNodeId> {
  let node = ptree.node(id);
  if !node.stype.is_none() {
    return Some(id);
  }
  match node.children.as_slice() {
    [only] => find_seed(ptree, *only),
    _ => None,
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::ptree::{Location, Text};
  use crate::types::SType;

  const TAGGED: SType = SType(1);

  fn leaf(tb: &mut TreeBuilder, from: u32, stype: SType) -> PNodeId {
    tb.add_leaf(
      Text {
        from,
        len: 1,
        token: 0,
      },
      Location { line: 1, col: from + 1 },
      stype,
    )
  }

  #[test]
  fn untagged_tokens_survive_as_synthetic_leaves() {
    let mut tb = TreeBuilder::new();
    let a = leaf(&mut tb, 0, TAGGED);
    let b = leaf(&mut tb, 2, SType::NONE);
    let root = tb.add_inner(vec![a, b], TAGGED);
    tb.set_root(root);
    tb.finish(false);

    let stree = STree::new(tb);
    let children = stree.node(stree.root()).children.clone();
    assert_eq!(children.len(), 2);
    assert_eq!(stree.ptree().node(stree.node(children[0]).value).stype, TAGGED);
    assert!(stree.ptree().node(stree.node(children[1]).value).stype.is_none());
  }

  #[test]
  fn fully_untagged_tree_reduces_to_wrapper() {
    let mut tb = TreeBuilder::new();
    let a = leaf(&mut tb, 0, SType::NONE);
    let b = leaf(&mut tb, 2, SType::NONE);
    let root = tb.add_inner(vec![a, b], SType::NONE);
    tb.set_root(root);
    tb.finish(false);

    let stree = STree::new(tb);
    assert!(stree.node(stree.root()).children.is_empty());
  }
}

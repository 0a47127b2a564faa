//! The comparison pipeline.
//!
//! Layers are compared outside-in: the edit distance and the distiller run on
//! one layer, matched pairs with a deeper layer recurse, and a final global
//! pass turns verbatim-relocated subtrees into moves. States and moved flags
//! then propagate into satellites and across layers.

use crate::distill;
use crate::ted;
use crate::tree::{reduce_trees_coarse, NodeId, Tree};
use crate::types::State;

/// Compares two trees in place, annotating every node with its state, its
/// peer in the other tree and the moved flag.
pub fn compare(t1: &mut Tree, t2: &mut Tree, coarse: bool, skip_refine: bool) {
  let (Some(r1), Some(r2)) = (t1.root(), t2.root()) else {
    return;
  };

  if coarse {
    reduce_trees_coarse(t1, t2);
  }

  diff_subtrees(t1, r1, t2, r2, skip_refine);
  distill::match_moved_subtrees(t1, t2);

  t1.propagate_states();
  t2.propagate_states();
}

fn diff_subtrees(t1: &mut Tree, r1: NodeId, t2: &mut Tree, r2: NodeId, skip_refine: bool) {
  let mut pairs = ted::ted(t1, r1, t2, r2);
  if !skip_refine {
    pairs.extend(distill::refine(t1, r1, t2, r2));
  }

  detect_moves(t1, t2, &pairs);

  // Matched nodes with an independently comparable inner layer recurse; the
  // bottom (fine-grained) layer is painted by propagation instead.
  for (x, y) in pairs {
    let (Some(xn), Some(yn)) = (t1.node(x).next, t2.node(y).next) else {
      continue;
    };
    if t1.node(xn).last || t2.node(yn).last {
      continue;
    }
    ted::wire_pair(t1, xn, t2, yn);
    diff_subtrees(t1, xn, t2, yn, skip_refine);
  }
}

// A matched child sitting at a different rank among its parent's matched
// children than its peer has been reordered.
fn detect_moves(t1: &mut Tree, t2: &mut Tree, pairs: &[(NodeId, NodeId)]) {
  for &(p, q) in pairs {
    let cs2: Vec<NodeId> = t2
      .node(q)
      .children
      .iter()
      .copied()
      .filter(|&y| {
        t2.node(y)
          .relative
          .map(|x| t1.node(p).children.contains(&x))
          .unwrap_or(false)
      })
      .collect();
    if cs2.len() < 2 {
      continue;
    }

    let cs1: Vec<NodeId> = t1
      .node(p)
      .children
      .iter()
      .copied()
      .filter(|&x| {
        t1.node(x)
          .relative
          .map(|y| t2.node(q).children.contains(&y))
          .unwrap_or(false)
      })
      .collect();

    for (i, &x) in cs1.iter().enumerate() {
      let y = t1.node(x).relative.expect("filtered on relative");
      let j = cs2.iter().position(|&c| c == y).expect("peer is ranked");
      if i != j && t1.node(x).state == State::Unchanged {
        t1.mark_tree_as_moved(x);
        t2.mark_tree_as_moved(y);
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::iterators::Leaves;
  use crate::testutil::tree_from;

  fn leaf_states(tree: &Tree) -> Vec<(String, State, bool)> {
    Leaves::new(tree)
      .map(|(id, _)| {
        let n = tree.node(id);
        (tree.label(id).to_owned(), n.state, n.moved)
      })
      .collect()
  }

  #[test]
  fn comparing_equal_trees_changes_nothing() {
    let mut t1 = tree_from(&["int a ;", "return a ;"]);
    let mut t2 = tree_from(&["int a ;", "return a ;"]);
    compare(&mut t1, &mut t2, true, false);

    for (label, state, moved) in leaf_states(&t1).into_iter().chain(leaf_states(&t2)) {
      assert_eq!(state, State::Unchanged, "{label}");
      assert!(!moved, "{label}");
    }
  }

  #[test]
  fn reordered_statements_are_moves_not_edits() {
    let mut t1 = tree_from(&["include a", "include b", "include c"]);
    let mut t2 = tree_from(&["include b", "include a", "include c"]);
    compare(&mut t1, &mut t2, true, false);

    let s1 = leaf_states(&t1);
    for (label, state, _) in &s1 {
      assert_eq!(*state, State::Unchanged, "{label}");
    }
    let moved: Vec<bool> = s1.iter().map(|(_, _, m)| *m).collect();
    // a and b moved (tokens of the first two statements), c did not.
    assert_eq!(moved, [true, true, true, true, false, false]);
  }

  #[test]
  fn update_does_not_leak_into_siblings() {
    let mut t1 = tree_from(&["if c :", "a2 ( )"]);
    let mut t2 = tree_from(&["if c :", "a3 ( )", "else b ( )"]);
    compare(&mut t1, &mut t2, true, false);

    let s2 = leaf_states(&t2);
    let else_tokens: Vec<_> = s2.iter().filter(|(l, _, _)| ["else", "b"].contains(&l.as_str())).collect();
    for (label, state, _) in &else_tokens {
      assert_eq!(*state, State::Inserted, "{label}");
    }
    let if_tokens: Vec<_> = s2
      .iter()
      .filter(|(l, _, _)| ["if", "c", ":"].contains(&l.as_str()))
      .collect();
    for (label, state, _) in &if_tokens {
      assert_eq!(*state, State::Unchanged, "{label}");
    }
  }

  #[test]
  fn relatives_stay_symmetric() {
    let mut t1 = tree_from(&["int a = 1 ;", "return a ;"]);
    let mut t2 = tree_from(&["int a = 2 ;", "return a ;", "int b ;"]);
    compare(&mut t1, &mut t2, true, false);

    for (i, node) in t1.nodes.iter().enumerate() {
      if let Some(rel) = node.relative {
        let back = t2.node(rel).relative;
        assert_eq!(back, Some(crate::tree::NodeId(i as u32)));
      }
    }
  }

  #[test]
  fn moved_flags_only_appear_on_unchanged_nodes() {
    let mut t1 = tree_from(&["x = 1 ;", "y = 2 ;"]);
    let mut t2 = tree_from(&["y = 2 ;", "x = 3 ;"]);
    compare(&mut t1, &mut t2, true, false);

    for tree in [&t1, &t2] {
      for node in &tree.nodes {
        if node.moved {
          assert_eq!(node.state, State::Unchanged);
        }
      }
    }
  }
}

//! Change-distilling refinement of the edit-distance mapping.
//!
//! The edit distance pairs structure, not meaning: renamed or rewritten
//! containers come out as delete plus insert. This pass matches leftover
//! internal nodes by similarity (shared leaves plus label trigrams), re-runs
//! a scoped fine distance on accepted pairs, promotes stray leaves that have
//! an identical unmatched peer, and finally pairs whole deleted subtrees with
//! identical inserted ones as moves.

use crate::mtypes::MType;
use crate::ted;
use crate::tree::{hash_node, match_whole, NodeId, Tree};
use crate::types::{State, Type};

/// Similarity threshold for pairing two internal nodes. Functions are paired
/// more liberally because their bodies dominate the score.
const SIM_THRESHOLD: f64 = 0.6;
const SIM_THRESHOLD_FUNC: f64 = 0.4;

const LEAF_WEIGHT: f64 = 0.6;
const LABEL_WEIGHT: f64 = 0.4;

/// Refines the mapping inside one comparison scope. Returns newly matched
/// pairs so the caller can descend into their layers.
pub fn refine(t1: &mut Tree, r1: NodeId, t2: &mut Tree, r2: NodeId) -> Vec<(NodeId, NodeId)> {
  let cand1 = candidates(t1, r1);
  let cand2 = candidates(t2, r2);

  let mut scored = Vec::new();
  for (xi, &x) in cand1.iter().enumerate() {
    let x_class = t1.lang().classify(t1.node(x).stype);
    let x_leaves = leaf_tokens(t1, x);
    for (yi, &y) in cand2.iter().enumerate() {
      if t2.lang().classify(t2.node(y).stype) != x_class {
        continue;
      }
      let sim = similarity(t1, x, &x_leaves, t2, y);
      let threshold = if x_class == MType::Function {
        SIM_THRESHOLD_FUNC
      } else {
        SIM_THRESHOLD
      };
      if sim >= threshold {
        scored.push((sim, xi, yi));
      }
    }
  }
  scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

  let mut used1 = vec![false; cand1.len()];
  let mut used2 = vec![false; cand2.len()];
  let mut new_pairs = Vec::new();
  for (_, xi, yi) in scored {
    if used1[xi] || used2[yi] {
      continue;
    }
    let (x, y) = (cand1[xi], cand2[yi]);
    if let Some(pairs) = attempt(t1, x, t2, y) {
      used1[xi] = true;
      used2[yi] = true;
      new_pairs.extend(pairs);
    }
  }

  promote_stray_leaves(t1, r1, t2);
  new_pairs
}

// Unmatched internal nodes of the scope, excluding satellites and the scope
// root itself.
fn candidates(tree: &Tree, root: NodeId) -> Vec<NodeId> {
  let mut out = Vec::new();
  collect_scope(tree, root, &mut out);
  out.retain(|&id| {
    let node = tree.node(id);
    id != root && !node.leaf && !node.satellite && node.relative.is_none()
  });
  out
}

fn collect_scope(tree: &Tree, id: NodeId, out: &mut Vec<NodeId>) {
  out.push(id);
  for &child in &tree.node(id).children {
    collect_scope(tree, child, out);
  }
}

// Matches a candidate pair: snapshot, wire, fine distance, and roll
// everything back (including satellite flips the fine pass may have done)
// when the pair produces no agreement below itself.
fn attempt(t1: &mut Tree, x: NodeId, t2: &mut Tree, y: NodeId) -> Option<Vec<(NodeId, NodeId)>> {
  // Outer proxies carry no children of their own; wiring them is enough, the
  // caller then descends into their inner layer like for any matched pair.
  let x_inner = t1.node(x).next.filter(|&n| !t1.node(n).last);
  let y_inner = t2.node(y).next.filter(|&n| !t2.node(n).last);
  if x_inner.is_some() && y_inner.is_some() {
    ted::wire_pair(t1, x, t2, y);
    return Some(vec![(x, y)]);
  }

  let snap1 = Snapshot::take(t1, x);
  let snap2 = Snapshot::take(t2, y);

  ted::wire_pair(t1, x, t2, y);
  let pairs = ted::ted(t1, x, t2, y);

  // The scope roots always pair with each other; anything beyond that means
  // the refinement stuck.
  if pairs.len() <= 1 {
    snap1.restore(t1);
    snap2.restore(t2);
    return None;
  }
  Some(pairs)
}

fn similarity(t1: &Tree, x: NodeId, x_leaves: &[(String, Type)], t2: &Tree, y: NodeId) -> f64 {
  let y_leaves = leaf_tokens(t2, y);
  let leaf_sim = overlap(x_leaves, &y_leaves);

  let x_label = t1.label(x);
  let y_label = t2.label(y);
  if x_label.is_empty() || y_label.is_empty() {
    return leaf_sim;
  }
  LEAF_WEIGHT * leaf_sim + LABEL_WEIGHT * dice(x_label, y_label)
}

// Fraction of leaves shared between the subtrees, label and type both
// agreeing, against the larger of the two.
fn overlap(xs: &[(String, Type)], ys: &[(String, Type)]) -> f64 {
  if xs.is_empty() && ys.is_empty() {
    return 0.0;
  }
  let mut ys_left: Vec<Option<&(String, Type)>> = ys.iter().map(Some).collect();
  let mut common = 0usize;
  for x in xs {
    if let Some(slot) = ys_left
      .iter_mut()
      .find(|slot| slot.map(|y| y == x).unwrap_or(false))
    {
      *slot = None;
      common += 1;
    }
  }
  common as f64 / xs.len().max(ys.len()) as f64
}

fn leaf_tokens(tree: &Tree, id: NodeId) -> Vec<(String, Type)> {
  let mut out = Vec::new();
  collect_leaf_tokens(tree, id, &mut out);
  out
}

fn collect_leaf_tokens(tree: &Tree, id: NodeId, out: &mut Vec<(String, Type)>) {
  let node = tree.node(id);
  if let Some(next) = node.next {
    return collect_leaf_tokens(tree, next, out);
  }
  if node.leaf && node.children.is_empty() {
    out.push((tree.label(id).to_owned(), node.ty));
    return;
  }
  for &child in &node.children {
    collect_leaf_tokens(tree, child, out);
  }
}

// Dice coefficient on character trigrams; labels shorter than a trigram
// count as a single gram.
fn dice(a: &str, b: &str) -> f64 {
  let grams_a = trigrams(a);
  let grams_b = trigrams(b);
  if grams_a.is_empty() || grams_b.is_empty() {
    return 0.0;
  }
  let mut b_left: Vec<Option<&String>> = grams_b.iter().map(Some).collect();
  let mut common = 0usize;
  for g in &grams_a {
    if let Some(slot) = b_left
      .iter_mut()
      .find(|slot| slot.map(|h| h == g).unwrap_or(false))
    {
      *slot = None;
      common += 1;
    }
  }
  2.0 * common as f64 / (grams_a.len() + grams_b.len()) as f64
}

fn trigrams(s: &str) -> Vec<String> {
  let chars: Vec<char> = s.chars().collect();
  if chars.len() < 3 {
    return vec![s.to_owned()];
  }
  chars.windows(3).map(|w| w.iter().collect()).collect()
}

// A leaf that stayed unmatched but has an identical unmatched peer under the
// parent's relative is adopted; a differing position makes it a move.
fn promote_stray_leaves(t1: &mut Tree, r1: NodeId, t2: &mut Tree) {
  let mut scope = Vec::new();
  collect_scope(t1, r1, &mut scope);

  for p in scope {
    let Some(q) = t1.node(p).relative else {
      continue;
    };
    if t1.node(p).leaf {
      continue;
    }

    let p_children = t1.node(p).children.clone();
    for (i, &x) in p_children.iter().enumerate() {
      let xn = t1.node(x);
      if !xn.leaf || xn.satellite || xn.relative.is_some() {
        continue;
      }

      let q_children = t2.node(q).children.clone();
      let peer = q_children.iter().enumerate().find(|&(_, &y)| {
        let yn = t2.node(y);
        yn.leaf
          && !yn.satellite
          && yn.relative.is_none()
          && yn.ty == t1.node(x).ty
          && t2.label(y) == t1.label(x)
      });
      if let Some((j, &y)) = peer {
        ted::wire_pair(t1, x, t2, y);
        if i != j {
          t1.node_mut(x).moved = true;
          t2.node_mut(y).moved = true;
        }
      }
    }
  }
}

/// Final cross-layer pass: a deleted subtree that reappears verbatim on the
/// other side is a move, not a delete plus insert.
pub fn match_moved_subtrees(t1: &mut Tree, t2: &mut Tree) {
  let deleted = orphan_subtrees(t1, State::Deleted);
  let inserted = orphan_subtrees(t2, State::Inserted);
  if deleted.is_empty() || inserted.is_empty() {
    return;
  }

  let inserted: Vec<(NodeId, u64)> = inserted
    .into_iter()
    .map(|id| (id, hash_node(t2, id)))
    .collect();

  for x in deleted {
    if t1.node(x).relative.is_some() {
      continue;
    }
    let hash = hash_node(t1, x);
    let candidate = inserted.iter().find(|&&(y, h)| {
      h == hash && t2.node(y).relative.is_none() && t2.node(y).stype == t1.node(x).stype
    });
    if let Some(&(y, _)) = candidate {
      match_whole(t1, x, t2, y);
      t1.mark_tree_as_moved(x);
      t2.mark_tree_as_moved(y);
    }
  }
}

// Internal orphans whose whole subtree is unmatched, in source order.
fn orphan_subtrees(tree: &Tree, state: State) -> Vec<NodeId> {
  let mut out = Vec::new();
  let Some(root) = tree.root() else {
    return out;
  };
  collect_orphans(tree, root, state, &mut out);
  out
}

fn collect_orphans(tree: &Tree, id: NodeId, state: State, out: &mut Vec<NodeId>) {
  let node = tree.node(id);
  if !node.leaf && node.state == state && node.relative.is_none() && subtree_unmatched(tree, id) {
    out.push(id);
    return;
  }
  for &child in &node.children {
    collect_orphans(tree, child, state, out);
  }
  if let Some(next) = node.next {
    collect_orphans(tree, next, state, out);
  }
}

fn subtree_unmatched(tree: &Tree, id: NodeId) -> bool {
  let node = tree.node(id);
  if node.relative.is_some() {
    return false;
  }
  let children_ok = node.children.iter().all(|&c| subtree_unmatched(tree, c));
  let next_ok = node.next.map(|n| subtree_unmatched(tree, n)).unwrap_or(true);
  children_ok && next_ok
}

// Saved comparison-relevant flags of one subtree, for rolling back a failed
// refinement attempt.
struct Snapshot {
  entries: Vec<(NodeId, bool, State, Option<NodeId>, bool)>,
}

impl Snapshot {
  fn take(tree: &Tree, root: NodeId) -> Snapshot {
    let mut scope = Vec::new();
    collect_scope(tree, root, &mut scope);
    let entries = scope
      .into_iter()
      .map(|id| {
        let n = tree.node(id);
        (id, n.satellite, n.state, n.relative, n.moved)
      })
      .collect();
    Snapshot { entries }
  }

  fn restore(&self, tree: &mut Tree) {
    for &(id, satellite, state, relative, moved) in &self.entries {
      let n = tree.node_mut(id);
      n.satellite = satellite;
      n.state = state;
      n.relative = relative;
      n.moved = moved;
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::testutil::tree_from;

  #[test]
  fn dice_measures_trigram_overlap() {
    assert_eq!(dice("rename", "rename"), 1.0);
    assert!(dice("rename-tag", "rename-in-scope") > 0.2);
    assert_eq!(dice("abc", "xyz"), 0.0);
  }

  #[test]
  fn overlap_is_a_multiset_ratio() {
    let xs = vec![
      ("a".to_owned(), Type::Identifiers),
      ("a".to_owned(), Type::Identifiers),
      ("b".to_owned(), Type::Identifiers),
    ];
    let ys = vec![
      ("a".to_owned(), Type::Identifiers),
      ("b".to_owned(), Type::Identifiers),
    ];
    assert!((overlap(&xs, &ys) - 2.0 / 3.0).abs() < 1e-9);
  }

  #[test]
  fn identical_deleted_and_inserted_statements_become_moves() {
    let mut t1 = tree_from(&["int i = 3 ;", "return i ;"]);
    let mut t2 = tree_from(&["return i ;", "int i = 3 ;"]);
    // Pretend the per-layer diff orphaned the declaration on both sides.
    let r1 = t1.root().unwrap();
    let r2 = t2.root().unwrap();
    let decl1 = t1.node(r1).children[0];
    let decl2 = t2.node(r2).children[1];
    mark_subtree(&mut t1, decl1, State::Deleted);
    mark_subtree(&mut t2, decl2, State::Inserted);

    match_moved_subtrees(&mut t1, &mut t2);

    assert_eq!(t1.node(decl1).relative, Some(decl2));
    assert_eq!(t1.node(decl1).state, State::Unchanged);
    assert!(t1.node(decl1).moved);
    assert!(t2.node(decl2).moved);
  }

  fn mark_subtree(tree: &mut Tree, id: NodeId, state: State) {
    tree.node_mut(id).state = state;
    for child in tree.node(id).children.clone() {
      mark_subtree(tree, child, state);
    }
  }
}

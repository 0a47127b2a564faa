//! Zhang–Shasha tree edit distance over one layer of two trees.
//!
//! Operates on the post-order flattening of the non-satellite nodes of two
//! subtrees. Relabels are unit-cost and only allowed between interchangeable
//! tokens; incompatible nodes can only be deleted and re-inserted. The
//! traceback wires matched pairs through `relative` and derives their states.

use crate::tree::{can_force_leaf_match, post_order, NodeId, Tree};
use crate::types::State;

// Effectively forbids a substitution without risking overflow in path sums.
const NO_MATCH: u64 = 1_000_000;

/// Runs the edit distance between the subtrees rooted at `r1` and `r2` and
/// applies the resulting mapping. Returns the matched pairs.
pub fn ted(t1: &mut Tree, r1: NodeId, t2: &mut Tree, r2: NodeId) -> Vec<(NodeId, NodeId)> {
  let po1 = post_order(t1, r1);
  let po2 = post_order(t2, r2);
  if po1.is_empty() || po2.is_empty() {
    return Vec::new();
  }

  let l1 = leftmost_leaves(t1, &po1);
  let l2 = leftmost_leaves(t2, &po2);
  let pos1 = payload_positions(t1, &po1);
  let pos2 = payload_positions(t2, &po2);
  let mut engine = Engine {
    t1,
    t2,
    po1,
    po2,
    l1,
    l2,
    pos1,
    pos2,
    td: Vec::new(),
    matched: Vec::new(),
  };
  engine.run();

  let Engine {
    t1, t2, po1, po2, matched, ..
  } = engine;

  for &(x, y) in &matched {
    wire_pair(t1, x, t2, y);
  }
  for &x in &po1 {
    if t1.node(x).relative.is_none() {
      t1.node_mut(x).state = State::Deleted;
    }
  }
  for &y in &po2 {
    if t2.node(y).relative.is_none() {
      t2.node_mut(y).state = State::Inserted;
    }
  }
  matched
}

/// Wires a matched pair and derives its state: terminal nodes whose labels
/// differ are updates, anything else is unchanged (differences of inner
/// nodes live in their children or deeper layers).
pub(crate) fn wire_pair(t1: &mut Tree, x: NodeId, t2: &mut Tree, y: NodeId) {
  t1.node_mut(x).relative = Some(y);
  t2.node_mut(y).relative = Some(x);

  let terminal = is_terminal(t1, x) && is_terminal(t2, y);
  let state = if terminal && t1.label(x) != t2.label(y) {
    State::Updated
  } else {
    State::Unchanged
  };
  t1.node_mut(x).state = state;
  t2.node_mut(y).state = state;
}

// A node whose comparison ends here: no payload children and no separately
// compared inner layer.
fn is_terminal(tree: &Tree, id: NodeId) -> bool {
  let node = tree.node(id);
  let has_payload = node.children.iter().any(|&c| !tree.node(c).satellite);
  let has_inner = node
    .next
    .map(|n| !tree.node(n).last)
    .unwrap_or(false);
  !has_payload && !has_inner
}

fn payload_leaf(tree: &Tree, id: NodeId) -> bool {
  let node = tree.node(id);
  !node.children.iter().any(|&c| !tree.node(c).satellite)
}

// Post-order index of the leftmost leaf descendant of every node.
fn leftmost_leaves(tree: &Tree, po: &[NodeId]) -> Vec<usize> {
  let mut l = vec![0; po.len()];
  for (i, &id) in po.iter().enumerate() {
    let first_payload = tree
      .node(id)
      .children
      .iter()
      .find(|&&c| !tree.node(c).satellite);
    l[i] = match first_payload {
      Some(&c) => l[tree.node(c).po_id.expect("child must be flattened")],
      None => i,
    };
  }
  l
}

// Index of every node among the payload children of its parent; satellites
// and travelling nodes are not payload and do not shift positions.
fn payload_positions(tree: &Tree, po: &[NodeId]) -> Vec<Option<usize>> {
  po.iter()
    .map(|&id| {
      let parent = tree.node(id).parent?;
      if parent == id {
        return None;
      }
      tree
        .node(parent)
        .children
        .iter()
        .filter(|&&c| tree.lang().is_payload_of_fixed(tree.view(c)))
        .position(|&c| c == id)
    })
    .collect()
}

struct Engine<'t> {
  t1: &'t mut Tree,
  t2: &'t mut Tree,
  po1: Vec<NodeId>,
  po2: Vec<NodeId>,
  l1: Vec<usize>,
  l2: Vec<usize>,
  pos1: Vec<Option<usize>>,
  pos2: Vec<Option<usize>>,
  td: Vec<Vec<u64>>,
  matched: Vec<(NodeId, NodeId)>,
}

impl Engine<'_> {
  fn run(&mut self) {
    let n1 = self.po1.len();
    let n2 = self.po2.len();
    self.td = vec![vec![0; n2]; n1];

    let kr1 = keyroots(&self.l1);
    let kr2 = keyroots(&self.l2);
    for &i in &kr1 {
      for &j in &kr2 {
        self.forest_dist(i, j, true);
      }
    }

    self.trace(n1 - 1, n2 - 1);
  }

  // Forest distance for the subtree pair (i, j); optionally records tree
  // distances of contained leftmost-path pairs.
  fn forest_dist(&mut self, i: usize, j: usize, record: bool) -> Vec<Vec<u64>> {
    let li = self.l1[i];
    let lj = self.l2[j];
    let m = i - li + 1;
    let n = j - lj + 1;

    let mut fd = vec![vec![0u64; n + 1]; m + 1];
    for di in 1..=m {
      fd[di][0] = fd[di - 1][0] + 1;
    }
    for dj in 1..=n {
      fd[0][dj] = fd[0][dj - 1] + 1;
    }

    for di in 1..=m {
      let xi = li + di - 1;
      for dj in 1..=n {
        let yj = lj + dj - 1;
        let deletion = fd[di - 1][dj] + 1;
        let insertion = fd[di][dj - 1] + 1;
        if self.l1[xi] == li && self.l2[yj] == lj {
          let relabel = fd[di - 1][dj - 1] + self.update_cost(xi, yj);
          fd[di][dj] = deletion.min(insertion).min(relabel);
          if record {
            self.td[xi][yj] = fd[di][dj];
          }
        } else {
          let lx = self.l1[xi] - li;
          let ly = self.l2[yj] - lj;
          let split = fd[lx][ly] + self.td[xi][yj];
          fd[di][dj] = deletion.min(insertion).min(split);
        }
      }
    }
    fd
  }

  // Walks the optimal script backwards, preferring kept matches over
  // relabels and relabels over orphaning.
  fn trace(&mut self, i: usize, j: usize) {
    let li = self.l1[i] as i64;
    let lj = self.l2[j] as i64;
    let fd = self.forest_dist(i, j, false);

    let mut pending = Vec::new();
    let mut di = i as i64;
    let mut dj = j as i64;
    loop {
      let row = (di - li + 1) as usize;
      let col = (dj - lj + 1) as usize;
      if row == 0 && col == 0 {
        break;
      }

      let tree_cell = row > 0
        && col > 0
        && self.l1[di as usize] as i64 == li
        && self.l2[dj as usize] as i64 == lj;

      if tree_cell {
        let cost = self.update_cost(di as usize, dj as usize);
        if cost == 0 && fd[row - 1][col - 1] == fd[row][col] {
          self.matched.push((self.po1[di as usize], self.po2[dj as usize]));
          di -= 1;
          dj -= 1;
          continue;
        }
      }
      if row > 0 && fd[row - 1][col] + 1 == fd[row][col] {
        di -= 1;
        continue;
      }
      if col > 0 && fd[row][col - 1] + 1 == fd[row][col] {
        dj -= 1;
        continue;
      }
      if tree_cell {
        self.matched.push((self.po1[di as usize], self.po2[dj as usize]));
        di -= 1;
        dj -= 1;
        continue;
      }

      // Both forests end in subtrees that are not leftmost paths of this
      // scope; their mapping is recovered by a nested walk.
      pending.push((di as usize, dj as usize));
      di = self.l1[di as usize] as i64 - 1;
      dj = self.l2[dj as usize] as i64 - 1;
    }

    for (pi, pj) in pending {
      self.trace(pi, pj);
    }
  }

  fn update_cost(&self, xi: usize, yj: usize) -> u64 {
    let x = self.po1[xi];
    let y = self.po2[yj];
    let t1 = &*self.t1;
    let t2 = &*self.t2;

    if t1.lang().always_matches(t1.view(x)) && t2.lang().always_matches(t2.view(y)) {
      return 0;
    }

    // Children of matched fixed-structure parents pair positionally.
    if let Some(fixed) = self.fixed_parents(x, y) {
      if fixed && self.pos1[xi] != self.pos2[yj] {
        return NO_MATCH;
      }
    }

    match (payload_leaf(t1, x), payload_leaf(t2, y)) {
      (false, false) => {
        if t1.node(x).stype == t2.node(y).stype {
          0
        } else {
          NO_MATCH
        }
      }
      (true, true) => {
        if t1.label(x) == t2.label(y) {
          0
        } else if can_force_leaf_match(t1, x, t2, y) {
          if self.parents_matched(x, y) {
            0
          } else {
            1
          }
        } else {
          NO_MATCH
        }
      }
      _ => NO_MATCH,
    }
  }

  // Some(true) when both parents are known to correspond and have fixed
  // structure; None when correspondence is not established yet.
  fn fixed_parents(&self, x: NodeId, y: NodeId) -> Option<bool> {
    let px = self.t1.node(x).parent?;
    let py = self.t2.node(y).parent?;
    if self.t1.node(px).relative != Some(py) {
      return None;
    }
    Some(
      self.t1.lang().has_fixed_structure(self.t1.view(px))
        && self.t2.lang().has_fixed_structure(self.t2.view(py)),
    )
  }

  fn parents_matched(&self, x: NodeId, y: NodeId) -> bool {
    let (Some(px), Some(py)) = (self.t1.node(x).parent, self.t2.node(y).parent) else {
      return false;
    };
    self.t1.node(px).relative == Some(py)
  }
}

// A keyroot is the highest node of each leftmost path: for every distinct
// leftmost leaf, the largest post-order index sharing it.
fn keyroots(l: &[usize]) -> Vec<usize> {
  let mut best = std::collections::HashMap::new();
  for (i, &li) in l.iter().enumerate() {
    best.insert(li, i);
  }
  let mut roots: Vec<usize> = best.into_values().collect();
  roots.sort_unstable();
  roots
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::testutil::tree_from;
  use crate::types::State;

  fn states_of(tree: &Tree) -> Vec<(String, State)> {
    crate::iterators::Leaves::new(tree)
      .map(|(id, _)| (tree.label(id).to_owned(), tree.node(id).state))
      .collect()
  }

  #[test]
  fn identical_trees_match_completely() {
    let mut t1 = tree_from(&["int a ;", "return a ;"]);
    let mut t2 = tree_from(&["int a ;", "return a ;"]);
    let r1 = t1.root().unwrap();
    let r2 = t2.root().unwrap();
    let matched = ted(&mut t1, r1, &mut t2, r2);

    assert!(!matched.is_empty());
    for (label, state) in states_of(&t1) {
      assert_eq!(state, State::Unchanged, "{label} should be unchanged");
    }
    for (label, state) in states_of(&t2) {
      assert_eq!(state, State::Unchanged, "{label} should be unchanged");
    }
  }

  #[test]
  fn single_constant_change_is_one_update() {
    let mut t1 = tree_from(&["int a = 1 ;"]);
    let mut t2 = tree_from(&["int a = 2 ;"]);
    let r1 = t1.root().unwrap();
    let r2 = t2.root().unwrap();
    ted(&mut t1, r1, &mut t2, r2);

    let updated: Vec<_> = states_of(&t1)
      .into_iter()
      .filter(|(_, s)| *s == State::Updated)
      .collect();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].0, "1");
    let updated: Vec<_> = states_of(&t2)
      .into_iter()
      .filter(|(_, s)| *s == State::Updated)
      .collect();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].0, "2");
  }

  #[test]
  fn equal_labels_win_over_forced_relabels() {
    // Deleting the first element must keep the second one unchanged instead
    // of relabeling "a" into "b".
    let mut t1 = tree_from(&[r#"x = "a" ;"#, r#"x = "b" ;"#]);
    let mut t2 = tree_from(&[r#"x = "b" ;"#]);
    let r1 = t1.root().unwrap();
    let r2 = t2.root().unwrap();
    ted(&mut t1, r1, &mut t2, r2);

    let s1 = states_of(&t1);
    let a = s1.iter().find(|(l, _)| l == "\"a\"").unwrap();
    let b = s1.iter().find(|(l, _)| l == "\"b\"").unwrap();
    assert_eq!(a.1, State::Deleted);
    assert_eq!(b.1, State::Unchanged);
  }

  #[test]
  fn addition_only_inserts() {
    let mut t1 = tree_from(&["return a ;"]);
    let mut t2 = tree_from(&["int b ;", "return a ;"]);
    let r1 = t1.root().unwrap();
    let r2 = t2.root().unwrap();
    ted(&mut t1, r1, &mut t2, r2);

    for (label, state) in states_of(&t1) {
      assert_eq!(state, State::Unchanged, "{label}");
    }
    // The whole new statement is inserted, including its semicolon; the old
    // statement survives untouched.
    let s2 = states_of(&t2);
    let expected = [
      ("int", State::Inserted),
      ("b", State::Inserted),
      (";", State::Inserted),
      ("return", State::Unchanged),
      ("a", State::Unchanged),
      (";", State::Unchanged),
    ];
    for ((label, state), (want_label, want_state)) in s2.iter().zip(expected) {
      assert_eq!(label, want_label);
      assert_eq!(*state, want_state, "{label}");
    }
  }

  #[test]
  fn incompatible_tokens_never_relabel() {
    let mut t1 = tree_from(&["x 1"]);
    let mut t2 = tree_from(&[r#"x "s""#]);
    let r1 = t1.root().unwrap();
    let r2 = t2.root().unwrap();
    ted(&mut t1, r1, &mut t2, r2);

    let s1 = states_of(&t1);
    assert_eq!(s1.iter().find(|(l, _)| l == "1").unwrap().1, State::Deleted);
    let s2 = states_of(&t2);
    assert_eq!(
      s2.iter().find(|(l, _)| l == "\"s\"").unwrap().1,
      State::Inserted
    );
  }
}

//! Semantic tree: the canonical structure the comparison operates on.
//!
//! Built from a structural tree (or straight from a parse tree in fine-only
//! mode). Nodes of one tree are owned by that tree's arena; `children`,
//! `next` and `parent` are indices into the owning tree, `relative` is an
//! index into the peer tree established by matching.

use crate::arena::{Interner, Span};
use crate::language::{Language, NodeView};
use crate::ptree::{PNodeId, TreeBuilder};
use crate::stree::{SNodeId, STree};
use crate::types::{canonize_type, SType, State, Type};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;

/// Index of a node inside its owning [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
  fn idx(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug, Default)]
pub struct Node {
  /// Canonical text used for matching (whitespace-normalized).
  pub label: Span,
  /// Display text (tabs expanded, leading whitespace kept).
  pub spelling: Span,
  pub children: Vec<NodeId>,
  /// Peer in the other tree after matching.
  pub relative: Option<NodeId>,
  /// Back edge, set during post-order flattening.
  pub parent: Option<NodeId>,
  /// Next layer of this node, if any.
  pub next: Option<NodeId>,
  /// Index of the child that owns this node's label.
  pub value_child: Option<usize>,
  /// Post-order index within the current comparison scope.
  pub po_id: Option<usize>,
  pub line: u32,
  pub col: u32,
  pub ty: Type,
  pub stype: SType,
  pub state: State,
  pub satellite: bool,
  pub moved: bool,
  /// Last element of a layer chain.
  pub last: bool,
  /// Carries a concrete source position.
  pub leaf: bool,
}

impl Node {
  pub fn has_value(&self) -> bool {
    self.value_child.is_some()
  }
}

pub struct Tree {
  pub(crate) lang: Box<dyn Language>,
  pub(crate) nodes: Vec<Node>,
  pub(crate) pool: Interner,
  pub(crate) root: Option<NodeId>,
}

impl Tree {
  /// Materializes the structural tree; the usual construction path.
  pub fn from_stree(
    lang: Box<dyn Language>,
    tab_width: usize,
    contents: &str,
    stree: &mut STree,
  ) -> Tree {
    let mut pool = Interner::with_capacity(max_stringified_size(contents, tab_width));
    pre_stringify(stree.ptree_mut(), contents, tab_width, &*lang, &mut pool);

    let mut nodes = Vec::new();
    let root = {
      let mut asm = Assembler {
        lang: &*lang,
        nodes: &mut nodes,
        pool: &mut pool,
        contents,
        tab_width,
      };
      asm.snode(stree, stree.root(), SType::NONE)
    };

    Tree {
      lang,
      nodes,
      pool,
      root: Some(root),
    }
  }

  /// Materializes the parse tree directly (`--fine-only`).
  pub fn from_ptree(
    lang: Box<dyn Language>,
    tab_width: usize,
    contents: &str,
    ptree: &mut TreeBuilder,
  ) -> Tree {
    let mut pool = Interner::with_capacity(max_stringified_size(contents, tab_width));
    pre_stringify(ptree, contents, tab_width, &*lang, &mut pool);

    let proot = ptree.root().expect("parse tree has no root");
    let mut nodes = Vec::new();
    let root = {
      let mut asm = Assembler {
        lang: &*lang,
        nodes: &mut nodes,
        pool: &mut pool,
        contents,
        tab_width,
      };
      asm.pnode(ptree, proot)
    };

    Tree {
      lang,
      nodes,
      pool,
      root: Some(root),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.root.is_none()
  }

  pub fn root(&self) -> Option<NodeId> {
    self.root
  }

  pub fn lang(&self) -> &dyn Language {
    &*self.lang
  }

  pub fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.idx()]
  }

  pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.idx()]
  }

  pub fn label(&self, id: NodeId) -> &str {
    self.pool.resolve(self.node(id).label)
  }

  pub fn spelling(&self, id: NodeId) -> &str {
    self.pool.resolve(self.node(id).spelling)
  }

  pub fn view(&self, id: NodeId) -> NodeView<'_> {
    let node = self.node(id);
    NodeView {
      label: self.pool.resolve(node.label),
      ty: node.ty,
      stype: node.stype,
    }
  }

  /// Marks all movable nodes of the subtree as moved if that makes sense for
  /// its root.
  pub fn mark_tree_as_moved(&mut self, id: NodeId) {
    if self.lang.has_moveable_items(self.view(id)) {
      self.mark_as_moved(id);
    }
  }

  fn mark_as_moved(&mut self, id: NodeId) {
    // Only unchanged nodes can meaningfully carry the flag; edits inside a
    // relocated subtree keep their own state unannotated.
    let movable =
      !self.lang.is_unmovable(self.view(id)) && self.node(id).state == State::Unchanged;
    self.node_mut(id).moved = movable;
    let children = self.node(id).children.clone();
    for child in children {
      self.mark_as_moved(child);
    }
  }

  /// Propagates states and moved flags across layers and into satellites:
  /// a changed outer node paints its whole inner layer, an unchanged one
  /// leaves the independently compared inner diff alone.
  pub fn propagate_states(&mut self) {
    if let Some(root) = self.root {
      self.propagate(root);
    }
  }

  fn propagate(&mut self, id: NodeId) {
    let children = self.node(id).children.clone();
    let state = self.node(id).state;
    for &child in &children {
      if self.node(child).satellite {
        self.node_mut(child).state = state;
      }
    }

    if let Some(next) = self.node(id).next {
      if state != State::Unchanged {
        self.paint(next, state);
      }
      if self.node(id).moved {
        self.mark_tree_as_moved(next);
      }
      return self.propagate(next);
    }

    for child in children {
      self.propagate(child);
    }
  }

  fn paint(&mut self, id: NodeId, state: State) {
    self.node_mut(id).state = state;
    let children = self.node(id).children.clone();
    for child in children {
      self.paint(child, state);
    }
  }

  /// Dumps the tree for debugging.
  pub fn dump(&self, w: &mut dyn Write) -> std::io::Result<()> {
    if let Some(root) = self.root {
      let mut trace = Vec::new();
      self.dump_subtree(w, root, &mut trace, 0)?;
    }
    Ok(())
  }

  fn dump_subtree(
    &self,
    w: &mut dyn Write,
    id: NodeId,
    trace: &mut Vec<bool>,
    depth: usize,
  ) -> std::io::Result<()> {
    write!(w, "{}", if trace.is_empty() { "--- " } else { "    " })?;
    for (i, &last) in trace.iter().enumerate() {
      let glyph = match (last, i == trace.len() - 1) {
        (true, true) => "`-- ",
        (true, false) => "    ",
        (false, true) => "|-- ",
        (false, false) => "|   ",
      };
      write!(w, "{glyph}")?;
    }
    write!(w, "{depth} | ")?;
    self.dump_node(w, id)?;

    let node = self.node(id);
    let n = node.children.len();
    trace.push(false);
    for (i, &child) in node.children.iter().enumerate() {
      *trace.last_mut().unwrap() = i == n - 1;
      self.dump_subtree(w, child, trace, depth)?;

      if let Some(next) = self.node(child).next {
        if !self.node(next).last {
          trace.push(true);
          self.dump_subtree(w, next, trace, depth + 1)?;
          trace.pop();
        }
      }
    }
    trace.pop();
    Ok(())
  }

  fn dump_node(&self, w: &mut dyn Write, id: NodeId) -> std::io::Result<()> {
    let node = self.node(id);
    if node.moved {
      write!(w, "!")?;
    }
    match node.state {
      State::Unchanged => {}
      State::Deleted => write!(w, "-")?,
      State::Inserted => write!(w, "+")?,
      State::Updated => write!(w, "~")?,
    }
    let label = self.label(id).replace('\n', "<NL>");
    write!(w, "`{label}`")?;
    if let Some(po) = node.po_id {
      write!(w, " #{po}")?;
    }
    if node.satellite {
      write!(w, ", Satellite")?;
    }
    write!(w, ", Type::{}, {}", node.ty, self.lang.stype_name(node.stype))?;
    if let Some(relative) = node.relative {
      write!(w, " -> #{}", relative.0)?;
    }
    writeln!(w)
  }
}

struct Assembler<'a> {
  lang: &'a dyn Language,
  nodes: &'a mut Vec<Node>,
  pool: &'a mut Interner,
  contents: &'a str,
  tab_width: usize,
}

impl Assembler<'_> {
  fn make(&mut self) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    self.nodes.push(Node::default());
    id
  }

  fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.idx()]
  }

  fn node_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.idx()]
  }

  fn view(&self, id: NodeId) -> NodeView<'_> {
    let node = &self.nodes[id.idx()];
    NodeView {
      label: self.pool.resolve(node.label),
      ty: node.ty,
      stype: node.stype,
    }
  }

  fn snode(&mut self, stree: &STree, id: SNodeId, parent_stype: SType) -> NodeId {
    let ptree = stree.ptree();
    let snode = stree.node(id);
    let pvalue = ptree.node(snode.value);
    let stype = pvalue.stype;

    let n = self.make();
    self.node_mut(n).stype = stype;
    self.node_mut(n).satellite = self.lang.is_satellite(stype);

    if snode.children.is_empty() {
      let leftmost = ptree.node(ptree.leftmost_leaf(snode.value));
      let next = self.pnode(ptree, snode.value);
      self.node_mut(next).last = true;
      let ty = self.node(next).ty;

      let node = self.node_mut(n);
      node.label = pvalue.label;
      node.line = leftmost.line;
      node.col = leftmost.col;
      node.next = Some(next);
      node.ty = ty;
      node.leaf = node.line != 0 && node.col != 0;
      return n;
    }

    for &child in &snode.children {
      let materialized = self.snode(stree, child, stype);
      self.put_node_child(n, materialized);
    }

    // Splicing may have decided to add no children at all.
    if let Some(&first) = self.node(n).children.first() {
      let (line, col) = (self.node(first).line, self.node(first).col);
      self.node_mut(n).line = line;
      self.node_mut(n).col = col;
    }

    let value_child = snode
      .children
      .iter()
      .position(|&c| self.lang.is_value_node(ptree.node(stree.node(c).value).stype));
    if let Some(idx) = value_child {
      let value_label = ptree.node(stree.node(snode.children[idx]).value).label;
      self.node_mut(n).label = value_label;
      self.node_mut(n).value_child = Some(idx);
    }

    // Certain nodes move onto the next layer behind an outer proxy.
    if self.lang.is_layer_break(parent_stype, stype) {
      let outer = self.make();
      let (line, col) = (self.node(n).line, self.node(n).col);
      let label = if self.node(n).label.is_empty() {
        let text = self.print_subtree(n, false, pvalue.label.len());
        self.pool.intern(&text)
      } else {
        self.node(n).label
      };
      let node = self.node_mut(outer);
      node.next = Some(n);
      node.stype = stype;
      node.line = line;
      node.col = col;
      node.label = label;
      return outer;
    }

    n
  }

  // Adds the child or, when it is spliced, its children to the parent.
  fn put_node_child(&mut self, parent: NodeId, child: NodeId) {
    let parent_stype = self.node(parent).stype;
    if !self.lang.should_splice(parent_stype, self.view(child)) {
      self.node_mut(parent).children.push(child);
      return;
    }

    let mut child = child;
    if let Some(next) = self.node(child).next {
      // Make sure the last layer is not spliced, unless it is empty.
      if self.node(next).last {
        if !self.node(next).children.is_empty() || !self.node(next).label.is_empty() {
          self.node_mut(parent).children.push(child);
        }
        return;
      }
      child = next;
    }

    for grandchild in self.node(child).children.clone() {
      self.put_node_child(parent, grandchild);
    }
  }

  fn pnode(&mut self, ptree: &TreeBuilder, id: PNodeId) -> NodeId {
    let pnode = ptree.node(id);
    let ty = self.lang.map_token(pnode.value.token);

    if ty == Type::Virtual && pnode.children.len() == 1 {
      return self.pnode(ptree, pnode.children[0]);
    }

    let n = self.make();
    let spelling = if self.lang.should_drop_leading_ws(pnode.stype) {
      let text = stringify_spelling(self.contents, pnode.value.from, pnode.value.len, pnode.col, self.tab_width);
      self.pool.intern(&text)
    } else {
      pnode.label
    };
    {
      let node = self.node_mut(n);
      node.label = pnode.label;
      node.spelling = spelling;
      node.line = pnode.line;
      node.col = pnode.col;
      node.ty = ty;
      node.stype = pnode.stype;
      node.leaf = node.line != 0 && node.col != 0;
    }

    for child in ptree.node(id).children.clone() {
      let materialized = self.pnode(ptree, child);
      self.node_mut(n).children.push(materialized);
    }
    n
  }

  // Reassembles subtree text from its leaves, optionally without comments.
  fn print_subtree(&self, id: NodeId, with_comments: bool, size_hint: usize) -> String {
    let mut out = String::with_capacity(size_hint);
    self.collect_subtree(id, with_comments, &mut out);
    out
  }

  fn collect_subtree(&self, id: NodeId, with_comments: bool, out: &mut String) {
    let node = self.node(id);
    if let Some(next) = node.next {
      return self.collect_subtree(next, with_comments, out);
    }
    if node.leaf && (node.ty != Type::Comments || with_comments) {
      out.push_str(self.pool.resolve(node.label));
    }
    for &child in &node.children {
      self.collect_subtree(child, with_comments, out);
    }
  }
}

// Labels for the whole parse tree are computed in a single pass; each node
// stores the span of its subtree's text.
fn pre_stringify(
  ptree: &mut TreeBuilder,
  contents: &str,
  tab_width: usize,
  lang: &dyn Language,
  pool: &mut Interner,
) {
  if let Some(root) = ptree.root() {
    pre_stringify_node(ptree, root, contents, tab_width, lang, pool);
  }
}

fn pre_stringify_node(
  ptree: &mut TreeBuilder,
  id: PNodeId,
  contents: &str,
  tab_width: usize,
  lang: &dyn Language,
  pool: &mut Interner,
) {
  let mark = pool.mark();

  let node = ptree.node(id);
  if node.is_leaf() {
    let drop_ws = lang.should_drop_leading_ws(node.stype);
    stringify_token(
      contents,
      node.value.from,
      node.value.len,
      node.col,
      tab_width,
      drop_ws,
      pool,
    );
  }

  for child in ptree.node(id).children.clone() {
    pre_stringify_node(ptree, child, contents, tab_width, lang, pool);
  }

  ptree.node_mut(id).label = pool.span_from(mark);
}

// Expands tabs with column awareness and optionally suppresses whitespace
// that follows an inner newline (so reindented multi-line tokens still
// match).
fn stringify_token(
  contents: &str,
  from: u32,
  len: u32,
  start_col: u32,
  tab_width: usize,
  drop_leading_ws: bool,
  pool: &mut Interner,
) {
  let text = &contents[from as usize..(from + len) as usize];
  let mut col = start_col as usize;
  let mut leading_ws = false;
  for c in text.chars() {
    match c {
      '\n' => {
        col = 1;
        pool.push('\n');
        leading_ws = drop_leading_ws;
      }
      '\t' => {
        let width = tab_width - (col - 1) % tab_width;
        col += width;
        if !leading_ws {
          pool.push_repeated(' ', width);
        }
      }
      ' ' => {
        col += 1;
        if !leading_ws {
          pool.push(' ');
        }
      }
      c => {
        col += 1;
        pool.push(c);
        leading_ws = false;
      }
    }
  }
}

// Spelling of a token: tabs expanded, nothing dropped.
fn stringify_spelling(
  contents: &str,
  from: u32,
  len: u32,
  start_col: u32,
  tab_width: usize,
) -> String {
  let text = &contents[from as usize..(from + len) as usize];
  let mut out = String::with_capacity(text.len());
  let mut col = start_col as usize;
  for c in text.chars() {
    match c {
      '\n' => {
        col = 1;
        out.push('\n');
      }
      '\t' => {
        let width = tab_width - (col - 1) % tab_width;
        col += width;
        out.extend(std::iter::repeat(' ').take(width));
      }
      c => {
        col += 1;
        out.push(c);
      }
    }
  }
  out
}

fn max_stringified_size(contents: &str, tab_width: usize) -> usize {
  let tabs = contents.bytes().filter(|&b| b == b'\t').count();
  contents.len() + tabs * tab_width.saturating_sub(1)
}

/// Post-order flattening of the non-satellite nodes of a subtree; assigns
/// post-order ids and parent back-edges. The scope root becomes its own
/// parent so that every flattened node has one.
pub fn post_order(tree: &mut Tree, root: NodeId) -> Vec<NodeId> {
  let mut order = Vec::new();
  tree.node_mut(root).parent = Some(root);
  post_order_visit(tree, root, &mut order);
  order
}

fn post_order_visit(tree: &mut Tree, id: NodeId, order: &mut Vec<NodeId>) {
  if tree.node(id).satellite {
    return;
  }
  for child in tree.node(id).children.clone() {
    tree.node_mut(child).parent = Some(id);
    post_order_visit(tree, child, order);
  }
  tree.node_mut(id).po_id = Some(order.len());
  order.push(id);
}

/// Cheap pre-pass: top-level children with identical subtree hashes match as
/// a whole and drop out of the edit-distance computation.
pub fn reduce_trees_coarse(t1: &mut Tree, t2: &mut Tree) {
  let (Some(r1), Some(r2)) = (t1.root(), t2.root()) else {
    return;
  };

  let hashes1: Vec<u64> = t1.node(r1).children.iter().map(|&c| hash_node(t1, c)).collect();
  let hashes2: Vec<u64> = t2.node(r2).children.iter().map(|&c| hash_node(t2, c)).collect();

  for (i, &hash1) in hashes1.iter().enumerate() {
    for (j, &hash2) in hashes2.iter().enumerate() {
      let y = t2.node(r2).children[j];
      if t2.node(y).satellite {
        continue;
      }
      if hash1 == hash2 {
        let x = t1.node(r1).children[i];
        match_whole(t1, x, t2, y);
        t1.node_mut(x).satellite = true;
        t2.node_mut(y).satellite = true;
        break;
      }
    }
  }
}

// Matched subtrees are assumed to have exactly the same structure.
pub(crate) fn match_whole(t1: &mut Tree, x: NodeId, t2: &mut Tree, y: NodeId) {
  t1.node_mut(x).state = State::Unchanged;
  t2.node_mut(y).state = State::Unchanged;
  t1.node_mut(x).relative = Some(y);
  t2.node_mut(y).relative = Some(x);

  let xc = t1.node(x).children.clone();
  let yc = t2.node(y).children.clone();
  for (&l, &r) in xc.iter().zip(yc.iter()) {
    match_whole(t1, l, t2, r);
  }

  if let (Some(xn), Some(yn)) = (t1.node(x).next, t2.node(y).next) {
    if !t1.node(xn).last && !t2.node(yn).last {
      match_whole(t1, xn, t2, yn);
    }
  }
}

// Hashes all descendants of the node together; layer chains reduce to the
// hash of the chain's tail.
pub(crate) fn hash_node(tree: &Tree, id: NodeId) -> u64 {
  if let Some(next) = tree.node(id).next {
    return hash_node(tree, next);
  }

  let mut hasher = DefaultHasher::new();
  tree.label(id).hash(&mut hasher);
  for &child in &tree.node(id).children {
    hash_node(tree, child).hash(&mut hasher);
  }
  hasher.finish()
}

/// Whether two leaves may be paired despite different labels.
pub fn can_force_leaf_match(t1: &Tree, x: NodeId, t2: &Tree, y: NodeId) -> bool {
  let xn = t1.node(x);
  let yn = t2.node(y);
  if !xn.children.is_empty() || !yn.children.is_empty() {
    return false;
  }

  let x_type = canonize_type(xn.ty);
  let y_type = canonize_type(yn.ty);
  x_type == y_type
    && x_type != Type::Virtual
    && x_type != Type::Comments
    && x_type != Type::Identifiers
    && x_type != Type::Directives
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::testutil::{leaf, parse_one, tree_from, TestLang};

  #[test]
  fn identical_top_level_children_reduce_away() {
    let mut t1 = tree_from(&["int a ;", "int b ;"]);
    let mut t2 = tree_from(&["int a ;", "int c ;"]);
    reduce_trees_coarse(&mut t1, &mut t2);

    let r1 = t1.root().unwrap();
    let r2 = t2.root().unwrap();
    let first1 = t1.node(r1).children[0];
    let first2 = t2.node(r2).children[0];
    assert!(t1.node(first1).satellite);
    assert_eq!(t1.node(first1).relative, Some(first2));
    assert_eq!(t2.node(first2).relative, Some(first1));

    let second1 = t1.node(r1).children[1];
    assert!(!t1.node(second1).satellite);
    assert_eq!(t1.node(second1).relative, None);
  }

  #[test]
  fn post_order_skips_satellites_and_sets_parents() {
    let mut tree = tree_from(&["a b", "c"]);
    let root = tree.root().unwrap();
    let first = tree.node(root).children[0];
    tree.node_mut(first).satellite = true;

    let order = post_order(&mut tree, root);
    // Satellite subtree is gone: c leaf, its statement, the root.
    assert_eq!(order.len(), 3);
    assert_eq!(order.last(), Some(&root));
    assert_eq!(tree.node(root).parent, Some(root));
    for (po, &id) in order.iter().enumerate() {
      assert_eq!(tree.node(id).po_id, Some(po));
    }
  }

  #[test]
  fn round_trip_reproduces_source_tokens() {
    let src = "int a ;\nint bb ;";
    let tree = parse_one(src);
    let mut collected = Vec::new();
    for (id, _) in crate::iterators::Leaves::new(&tree) {
      collected.push(tree.spelling(id).to_owned());
    }
    let rebuilt = collected.join(" ");
    assert_eq!(rebuilt.replace('\n', " "), src.replace('\n', " "));
  }

  #[test]
  fn forced_leaf_match_respects_type_canonization() {
    let mut t1 = Tree {
      lang: Box::new(TestLang),
      nodes: Vec::new(),
      pool: Interner::default(),
      root: None,
    };
    let mut t2 = Tree {
      lang: Box::new(TestLang),
      nodes: Vec::new(),
      pool: Interner::default(),
      root: None,
    };
    let a = leaf(&mut t1, "1", Type::IntConstants);
    let b = leaf(&mut t2, "2", Type::IntConstants);
    let id1 = leaf(&mut t1, "x", Type::Identifiers);
    let id2 = leaf(&mut t2, "y", Type::Identifiers);
    let ut = leaf(&mut t1, "pid_t", Type::UserTypes);
    let bt = leaf(&mut t2, "int", Type::Types);

    assert!(can_force_leaf_match(&t1, a, &t2, b));
    assert!(!can_force_leaf_match(&t1, id1, &t2, id2));
    assert!(can_force_leaf_match(&t1, ut, &t2, bt));
  }
}

//! Shared helpers for core tests: a tiny whitespace-token language and
//! builders for synthetic trees.

use crate::arena::Interner;
use crate::language::{Language, NodeView, Result};
use crate::mtypes::MType;
use crate::ptree::{Location, Text, TreeBuilder};
use crate::stree::STree;
use crate::tree::{Node, NodeId, Tree};
use crate::types::{SType, Type};

pub const ROOT: SType = SType(1);
pub const STMT: SType = SType(2);

/// Whitespace tokenizer: every line becomes a statement of space-separated
/// tokens. Enough structure to exercise the pipeline without a real grammar.
pub struct TestLang;

impl Language for TestLang {
  fn parse(
    &self,
    contents: &str,
    _path: &str,
    _tab_width: usize,
    _debug: bool,
  ) -> Result<TreeBuilder> {
    let mut tb = TreeBuilder::new();
    let mut stmts = Vec::new();
    let mut offset = 0u32;
    for (lineno, line) in contents.lines().enumerate() {
      let mut tokens = Vec::new();
      let mut col = 1u32;
      for word in line.split(' ') {
        if !word.is_empty() {
          let text = Text {
            from: offset + col - 1,
            len: word.len() as u32,
            token: infer_type(word) as u16,
          };
          let loc = Location {
            line: lineno as u32 + 1,
            col,
          };
          tokens.push(tb.add_leaf(text, loc, SType::NONE));
        }
        col += word.len() as u32 + 1;
      }
      offset += line.len() as u32 + 1;
      if !tokens.is_empty() {
        stmts.push(tb.add_inner(tokens, STMT));
      }
    }
    let root = tb.add_inner(stmts, ROOT);
    tb.set_root(root);
    tb.finish(false);
    Ok(tb)
  }

  fn classify(&self, stype: SType) -> MType {
    match stype {
      STMT => MType::Statement,
      _ => MType::Other,
    }
  }

  fn stype_name(&self, stype: SType) -> &'static str {
    match stype {
      ROOT => "Root",
      STMT => "Statement",
      _ => "None",
    }
  }

  fn always_matches(&self, node: NodeView) -> bool {
    node.stype == ROOT
  }
}

pub fn infer_type(word: &str) -> Type {
  if word.chars().all(|c| c.is_ascii_digit()) {
    Type::IntConstants
  } else if word.starts_with('"') {
    Type::StrConstants
  } else if matches!(word, "int" | "if" | "else" | "return" | "while") {
    Type::Keywords
  } else if word.chars().all(|c| !c.is_alphanumeric()) {
    Type::Other
  } else {
    Type::Identifiers
  }
}

/// Runs the full pipeline of [`TestLang`] over `src`.
pub fn parse_one(src: &str) -> Tree {
  let tb = TestLang.parse(src, "test", 4, false).unwrap();
  let mut stree = STree::new(tb);
  Tree::from_stree(Box::new(TestLang), 4, src, &mut stree)
}

/// Builds a semantic tree directly: a root with one non-leaf child per
/// statement string, whose children are the space-separated tokens.
pub fn tree_from(stmts: &[&str]) -> Tree {
  let mut tree = Tree {
    lang: Box::new(TestLang),
    nodes: Vec::new(),
    pool: Interner::default(),
    root: None,
  };

  let mut children = Vec::new();
  for (i, stmt) in stmts.iter().enumerate() {
    let line = i as u32 + 1;
    let mut col = 1u32;
    let mut tokens = Vec::new();
    for word in stmt.split(' ') {
      let id = token(&mut tree, word, infer_type(word), line, col);
      tokens.push(id);
      col += word.len() as u32 + 1;
    }
    let label = tree.pool.intern(&stmt.split(' ').collect::<String>());
    let id = push_node(
      &mut tree,
      Node {
        label,
        spelling: label,
        children: tokens,
        line,
        col: 1,
        stype: STMT,
        ..Node::default()
      },
    );
    children.push(id);
  }

  let root = push_node(
    &mut tree,
    Node {
      children,
      stype: ROOT,
      ..Node::default()
    },
  );
  tree.root = Some(root);
  tree
}

/// Appends a free-standing leaf to the tree, for predicate-level tests.
pub fn leaf(tree: &mut Tree, label: &str, ty: Type) -> NodeId {
  token(tree, label, ty, 1, 1)
}

fn token(tree: &mut Tree, label: &str, ty: Type, line: u32, col: u32) -> NodeId {
  let span = tree.pool.intern(label);
  push_node(
    tree,
    Node {
      label: span,
      spelling: span,
      line,
      col,
      ty,
      leaf: true,
      ..Node::default()
    },
  )
}

fn push_node(tree: &mut Tree, node: Node) -> NodeId {
  tree.nodes.push(node);
  NodeId(tree.nodes.len() as u32 - 1)
}

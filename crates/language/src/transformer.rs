//! Turns a tree-sitter parse into the core's parse tree.
//!
//! The walk keeps a running line/column position over the raw bytes so every
//! token lands with its 1-based source coordinates. Node kinds translate
//! through per-language tables; kinds missing from them are collected and
//! reported as warnings in debug mode only.

use std::collections::{BTreeSet, HashMap, HashSet};

use tree_sitter::{Language as TSLanguage, Node, Parser};
use zograscope_core::{Error, Location, Result, SType, Text, TreeBuilder, Type};

pub(crate) struct Transformer<'a> {
  contents: &'a str,
  ts_language: TSLanguage,
  stypes: &'a HashMap<&'static str, SType>,
  types: &'a HashMap<&'static str, Type>,
  bad_nodes: &'a HashSet<&'static str>,
  tab_width: usize,
  debug: bool,
  tb: TreeBuilder,
  line: u32,
  col: u32,
  position: usize,
  bad_stypes: BTreeSet<String>,
  bad_types: BTreeSet<String>,
}

impl<'a> Transformer<'a> {
  pub(crate) fn new(
    contents: &'a str,
    ts_language: TSLanguage,
    stypes: &'a HashMap<&'static str, SType>,
    types: &'a HashMap<&'static str, Type>,
    bad_nodes: &'a HashSet<&'static str>,
    tab_width: usize,
    debug: bool,
  ) -> Self {
    Self {
      contents,
      ts_language,
      stypes,
      types,
      bad_nodes,
      tab_width,
      debug,
      tb: TreeBuilder::new(),
      line: 1,
      col: 1,
      position: 0,
      bad_stypes: BTreeSet::new(),
      bad_types: BTreeSet::new(),
    }
  }

  pub(crate) fn transform(mut self, path: &str) -> Result<TreeBuilder> {
    let mut parser = Parser::new();
    parser
      .set_language(&self.ts_language)
      .map_err(|e| Error::parse(path, 0, 0, e.to_string()))?;
    let Some(tree) = parser.parse(self.contents, None) else {
      return Err(Error::parse(path, 0, 0, "failed to build a tree"));
    };

    let root = self.visit(tree.root_node(), Type::Other);
    self.tb.set_root(root);
    self.tb.finish(false);

    if self.debug {
      for kind in &self.bad_stypes {
        tracing::warn!("no SType for: {kind}");
      }
      for kind in &self.bad_types {
        tracing::warn!("no Type for: {kind}");
      }
    }

    Ok(self.tb)
  }

  fn visit(&mut self, node: Node<'_>, mut def_type: Type) -> zograscope_core::PNodeId {
    let kind = node.kind();
    let stype = match self.stypes.get(kind) {
      Some(&stype) => stype,
      None => {
        if self.debug {
          self.bad_stypes.insert(kind.to_owned());
        }
        SType::NONE
      }
    };

    if let Some(&ty) = self.types.get(kind) {
      def_type = ty;
    }

    let pnode = self.tb.add_inner(Vec::new(), stype);
    for i in 0..node.child_count() {
      let child = node.child(i).expect("child index within count");
      if child.child_count() == 0 {
        let leaf_stype = self.stypes.get(child.kind()).copied().unwrap_or(SType::NONE);
        self.visit_leaf(leaf_stype, pnode, child, def_type);
      } else {
        let built = self.visit(child, def_type);
        self.tb.append(pnode, built);
      }
    }
    pnode
  }

  fn visit_leaf(
    &mut self,
    stype: SType,
    pnode: zograscope_core::PNodeId,
    leaf: Node<'_>,
    def_type: Type,
  ) {
    if self.bad_nodes.contains(leaf.kind()) {
      return;
    }

    let from = leaf.start_byte();
    let to = leaf.end_byte();

    let skipped = &self.contents[self.position..from];
    self.update_position(skipped);

    let mut ty = self.determine_type(leaf);
    if ty == Type::Other {
      ty = def_type;
    }

    let mut stype = stype;
    if stype.is_none() && is_separator(ty) {
      stype = self.stypes["separator"];
    }

    let text = Text {
      from: from as u32,
      len: (to - from) as u32,
      token: ty as u16,
    };
    let loc = Location {
      line: self.line,
      col: self.col,
    };
    let leaf_node = self.tb.add_leaf(text, loc, stype);
    self.tb.append(pnode, leaf_node);

    let value = &self.contents[from..to];
    self.update_position(value);
    self.position = to;
  }

  fn determine_type(&mut self, node: Node<'_>) -> Type {
    let kind = node.kind();
    match self.types.get(kind) {
      Some(&ty) => ty,
      None => {
        if self.debug {
          self.bad_types.insert(kind.to_owned());
        }
        Type::Other
      }
    }
  }

  fn update_position(&mut self, text: &str) {
    for c in text.chars() {
      match c {
        '\n' => {
          self.line += 1;
          self.col = 1;
        }
        '\t' => {
          let width = self.tab_width - (self.col as usize - 1) % self.tab_width;
          self.col += width as u32;
        }
        _ => self.col += 1,
      }
    }
  }
}

// Separator tokens track the state of the node they punctuate.
fn is_separator(ty: Type) -> bool {
  matches!(
    ty,
    Type::Jumps
      | Type::Types
      | Type::LeftBrackets
      | Type::RightBrackets
      | Type::Comparisons
      | Type::Operators
      | Type::LogicalOperators
      | Type::Assignments
      | Type::Keywords
      | Type::Other
  )
}

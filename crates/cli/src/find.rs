//! The `find` subcommand: lists nodes selected by a matcher chain.
//!
//! Arguments are paths followed by `:`-separated matchers; a matcher is
//! either a meta-type name (`decl`, `stmt`, `func`, `call`, `param`,
//! `comment`, `dir`, `block`) or `/regex/` applied to node labels. Each
//! matcher binds a node nested somewhere under the previous one's match.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Args;
use regex::Regex;

use zograscope_core::{MType, NodeId, Tree};
use zograscope_language::Lang;

use crate::args::{self, CommonArgs};

#[derive(Args)]
pub struct FindArg {
  #[clap(flatten)]
  pub common: CommonArgs,

  /// Only print the number of matches per file.
  #[clap(long)]
  pub count: bool,

  /// Paths, then `:`, then matchers.
  #[clap(value_name = "ARGS", required = true)]
  pub args: Vec<String>,
}

enum Matcher {
  Meta(MType),
  Label(Regex),
}

impl FromStr for Matcher {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    let mtype = match s {
      "decl" => Some(MType::Declaration),
      "stmt" => Some(MType::Statement),
      "func" => Some(MType::Function),
      "call" => Some(MType::Call),
      "param" => Some(MType::Parameter),
      "comment" => Some(MType::Comment),
      "dir" => Some(MType::Directive),
      "block" => Some(MType::Block),
      _ => None,
    };
    if let Some(mtype) = mtype {
      return Ok(Matcher::Meta(mtype));
    }
    if let Some(pattern) = s.strip_prefix('/').and_then(|s| s.strip_suffix('/')) {
      let re = Regex::new(pattern).with_context(|| format!("bad pattern: {s}"))?;
      return Ok(Matcher::Label(re));
    }
    bail!("unknown matcher: {s}");
  }
}

impl Matcher {
  fn accepts(&self, tree: &Tree, id: NodeId) -> bool {
    match self {
      Matcher::Meta(mtype) => tree.lang().classify(tree.node(id).stype) == *mtype,
      Matcher::Label(re) => re.is_match(tree.label(id)),
    }
  }
}

pub fn run(arg: FindArg) -> Result<()> {
  let split = arg.args.iter().position(|a| a == ":");
  let Some(split) = split else {
    bail!("expected `paths... : matchers...`");
  };
  let (paths, rest) = arg.args.split_at(split);
  let matchers: Vec<Matcher> = rest[1..]
    .iter()
    .map(|s| s.parse())
    .collect::<Result<_>>()?;
  if matchers.is_empty() {
    bail!("expected at least one matcher");
  }
  let paths: Vec<PathBuf> = if paths.is_empty() {
    vec![PathBuf::from(".")]
  } else {
    paths.iter().map(PathBuf::from).collect()
  };

  let mut total = 0usize;
  for path in paths {
    for file in files_under(&path) {
      total += grep_file(&file, &matchers, &arg)?;
    }
  }
  if arg.count {
    println!("total: {total}");
  }
  Ok(())
}

fn files_under(path: &Path) -> Vec<PathBuf> {
  if path.is_file() {
    return vec![path.to_path_buf()];
  }
  ignore::Walk::new(path)
    .filter_map(|entry| entry.ok())
    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
    .map(|e| e.into_path())
    .filter(|p| Lang::detect(p).is_some())
    .collect()
}

fn grep_file(path: &Path, matchers: &[Matcher], arg: &FindArg) -> Result<usize> {
  let name = path.display().to_string();
  let contents =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {name}"))?;
  let Some(tree) = args::build_tree(&name, &contents, &arg.common)? else {
    bail!("failed to parse: {name}");
  };

  let mut matched = Vec::new();
  if let Some(root) = tree.root() {
    search(&tree, root, matchers, &mut matched);
  }

  if arg.count {
    if !matched.is_empty() {
      println!("{name}: {}", matched.len());
    }
  } else {
    for id in &matched {
      let node = tree.node(*id);
      let label = tree.label(*id);
      let first_line = label.lines().next().unwrap_or("");
      println!("{name}:{}:{}: {first_line}", node.line, node.col);
    }
  }
  Ok(matched.len())
}

// Walks the subtree looking for a nested chain of nodes accepted by the
// matchers; the node bound to the last matcher is reported.
fn search(tree: &Tree, id: NodeId, matchers: &[Matcher], out: &mut Vec<NodeId>) {
  if matchers[0].accepts(tree, id) {
    if matchers.len() == 1 {
      out.push(id);
    } else {
      for_descendants(tree, id, &mut |child| {
        search(tree, child, &matchers[1..], out);
      });
    }
    return;
  }
  for_descendants(tree, id, &mut |child| {
    search(tree, child, matchers, out);
  });
}

fn for_descendants(tree: &Tree, id: NodeId, f: &mut dyn FnMut(NodeId)) {
  let node = tree.node(id);
  for &child in &node.children {
    f(child);
  }
  if let Some(next) = node.next {
    f(next);
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn matcher_names_parse() {
    assert!(matches!("func".parse(), Ok(Matcher::Meta(MType::Function))));
    assert!(matches!("dir".parse(), Ok(Matcher::Meta(MType::Directive))));
    assert!(matches!("/ab+c/".parse(), Ok(Matcher::Label(_))));
    assert!("bogus".parse::<Matcher>().is_err());
  }
}

//! The `stats` subcommand: line-content buckets and function statistics.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use zograscope_core::{Leaves, MType, NodeId, Nodes, Tree, Type};
use zograscope_language::Lang;

use crate::args::{self, CommonArgs};

#[derive(Args)]
pub struct StatsArg {
  #[clap(flatten)]
  pub common: CommonArgs,

  /// Paths to analyze.
  #[clap(value_name = "PATHS", default_value = ".")]
  pub paths: Vec<PathBuf>,
}

#[derive(Default)]
struct LineStats {
  blank: usize,
  comment: usize,
  structural: usize,
  code: usize,
}

impl LineStats {
  fn add(&mut self, other: &LineStats) {
    self.blank += other.blank;
    self.comment += other.comment;
    self.structural += other.structural;
    self.code += other.code;
  }
}

#[derive(Default)]
struct FuncStats {
  count: usize,
  total_lines: usize,
  max_lines: usize,
  total_params: usize,
}

pub fn run(arg: StatsArg) -> Result<()> {
  let mut lines = LineStats::default();
  let mut funcs = FuncStats::default();
  let mut files = 0usize;

  for path in &arg.paths {
    for file in files_under(path) {
      let name = file.display().to_string();
      let contents =
        std::fs::read_to_string(&file).with_context(|| format!("failed to read {name}"))?;
      let Some(tree) = args::build_tree(&name, &contents, &arg.common)? else {
        bail!("failed to parse: {name}");
      };

      files += 1;
      lines.add(&line_buckets(&tree, &contents));
      collect_functions(&tree, &mut funcs);
    }
  }

  println!("files:      {files}");
  println!("blank:      {}", lines.blank);
  println!("comments:   {}", lines.comment);
  println!("structural: {}", lines.structural);
  println!("code:       {}", lines.code);
  println!("functions:  {}", funcs.count);
  if funcs.count > 0 {
    println!(
      "  longest:     {} lines",
      funcs.max_lines
    );
    println!(
      "  mean length: {:.1} lines",
      funcs.total_lines as f64 / funcs.count as f64
    );
    println!(
      "  mean params: {:.1}",
      funcs.total_params as f64 / funcs.count as f64
    );
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

// Buckets each physical line by what kind of tokens it carries.
fn line_buckets(tree: &Tree, contents: &str) -> LineStats {
  let total = contents.lines().count();

  #[derive(Default, Clone, Copy)]
  struct LineKind {
    comment: bool,
    structural: bool,
    code: bool,
  }
  let mut kinds = vec![LineKind::default(); total + 1];

  for (id, _) in Leaves::new(tree) {
    let node = tree.node(id);
    let span = tree.spelling(id).lines().count().max(1);
    for line in node.line as usize..(node.line as usize + span).min(total + 1) {
      let Some(kind) = kinds.get_mut(line) else {
        continue;
      };
      if node.ty == Type::Comments {
        kind.comment = true;
      } else if tree.lang().is_structural(tree.view(id))
        || tree.lang().is_eol_continuation(tree.view(id))
      {
        kind.structural = true;
      } else {
        kind.code = true;
      }
    }
  }

  let mut stats = LineStats::default();
  for kind in &kinds[1..] {
    if kind.code {
      stats.code += 1;
    } else if kind.comment {
      stats.comment += 1;
    } else if kind.structural {
      stats.structural += 1;
    } else {
      stats.blank += 1;
    }
  }
  stats
}

fn collect_functions(tree: &Tree, funcs: &mut FuncStats) {
  for id in Nodes::new(tree) {
    if tree.lang().classify(tree.node(id).stype) != MType::Function {
      continue;
    }
    // Outer proxies delegate to their inner layer, which holds the body.
    if tree
      .node(id)
      .next
      .map(|n| !tree.node(n).last)
      .unwrap_or(false)
    {
      continue;
    }

    funcs.count += 1;
    let (first, last) = line_range(tree, id);
    funcs.total_lines += last.saturating_sub(first) + 1;
    funcs.max_lines = funcs.max_lines.max(last.saturating_sub(first) + 1);
    funcs.total_params += count_params(tree, id);
  }
}

fn line_range(tree: &Tree, id: NodeId) -> (usize, usize) {
  let mut first = usize::MAX;
  let mut last = 0;
  visit_leaves(tree, id, &mut |leaf| {
    let line = tree.node(leaf).line as usize;
    first = first.min(line);
    let span = tree.spelling(leaf).lines().count().max(1);
    last = last.max(line + span - 1);
  });
  if first == usize::MAX {
    (0, 0)
  } else {
    (first, last)
  }
}

fn count_params(tree: &Tree, id: NodeId) -> usize {
  let mut count = 0;
  visit_all(tree, id, &mut |node| {
    if tree.lang().classify(tree.node(node).stype) == MType::Parameter
      && !tree.lang().is_pseudo_parameter(tree.view(node))
    {
      count += 1;
    }
  });
  count
}

fn visit_all(tree: &Tree, id: NodeId, f: &mut dyn FnMut(NodeId)) {
  f(id);
  for &child in &tree.node(id).children {
    visit_all(tree, child, f);
  }
  if let Some(next) = tree.node(id).next {
    visit_all(tree, next, f);
  }
}

fn visit_leaves(tree: &Tree, id: NodeId, f: &mut dyn FnMut(NodeId)) {
  let node = tree.node(id);
  if let Some(next) = node.next {
    return visit_leaves(tree, next, f);
  }
  if node.leaf && node.children.is_empty() {
    f(id);
    return;
  }
  for &child in &node.children {
    visit_leaves(tree, child, f);
  }
}

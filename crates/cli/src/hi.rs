//! The `hi` subcommand: type-keyed syntax highlighting of one file.

use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::Args;

use zograscope_core::{Leaves, Tree};

use crate::args::{self, should_use_color, CommonArgs};
use crate::print::highlight_style;

#[derive(Args)]
pub struct HiArg {
  #[clap(flatten)]
  pub common: CommonArgs,

  /// File to highlight; `-` reads standard input.
  #[clap(value_name = "FILE", default_value = "-")]
  pub file: String,
}

pub fn run(arg: HiArg) -> Result<()> {
  let (name, contents) = if arg.file == "-" {
    let mut contents = String::new();
    std::io::stdin()
      .read_to_string(&mut contents)
      .context("failed to read standard input")?;
    // Stdin has no extension; language detection needs --lang or defaults.
    ("stdin".to_owned(), contents)
  } else {
    let contents = std::fs::read_to_string(&arg.file)
      .with_context(|| format!("failed to read {}", arg.file))?;
    (arg.file.clone(), contents)
  };

  let Some(tree) = args::build_tree(&name, &contents, &arg.common)? else {
    bail!("failed to parse: {name}");
  };

  if arg.common.dry_run {
    args::dump_tree(&arg.common, &tree, "Tree")?;
    return Ok(());
  }

  print_highlighted(&tree, should_use_color(arg.common.color));
  Ok(())
}

// Reassembles the source from its leaves, padding up to each token's
// position, with a style per token category.
fn print_highlighted(tree: &Tree, use_color: bool) {
  let mut line = 1;
  let mut col = 1;
  let mut out = String::new();

  for (id, _) in Leaves::new(tree) {
    let node = tree.node(id);
    while (node.line as usize) > line {
      out.push('\n');
      line += 1;
      col = 1;
    }
    while (node.col as usize) > col {
      out.push(' ');
      col += 1;
    }

    let spelling = tree.spelling(id);
    let style = highlight_style(use_color, node.ty);
    out.push_str(&style.paint(spelling).to_string());

    let newlines = spelling.matches('\n').count();
    line += newlines;
    col = if newlines > 0 {
      spelling.rsplit('\n').next().unwrap_or("").chars().count() + 1
    } else {
      col + spelling.chars().count()
    };
  }

  if col != 1 {
    out.push('\n');
  }
  print!("{out}");
}

//! The `diff` subcommand: side-by-side syntax-aware comparison.
//!
//! Accepts either two paths or the 7/9 positional arguments git passes to an
//! external diff program. When a front-end gives up on one of the inputs and
//! we were invoked by git, the driver prints the header and delegates to
//! `git diff` so the user still sees something.

use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Args;

use zograscope_core::{compare, Tree};

use crate::args::{self, should_use_color, CommonArgs};
use crate::print::{DiffPrinter, DiffStyles};
use crate::utils::TimeReport;

#[derive(Args)]
pub struct DiffArg {
  #[clap(flatten)]
  pub common: CommonArgs,

  /// Don't fold identical regions.
  #[clap(long = "no-fold")]
  pub no_fold: bool,

  /// Fold identical runs longer than this many lines.
  #[clap(long = "fold-threshold", default_value = "8", value_name = "N")]
  pub fold_threshold: usize,

  /// OLD and NEW files, or the 7 or 9 arguments of a git invocation.
  #[clap(value_name = "ARGS", required = true)]
  pub paths: Vec<String>,
}

struct Invocation {
  git_diff: bool,
  git_rename: bool,
  rename_only: bool,
}

impl Invocation {
  fn classify(paths: &[String]) -> Self {
    let git_diff =
      paths.len() == 7 || (paths.len() == 9 && paths[2] != paths[5]);
    let git_rename = paths.len() == 9;
    Self {
      git_diff,
      git_rename,
      rename_only: git_rename && paths[2] == paths[5],
    }
  }
}

pub fn run(arg: DiffArg) -> Result<()> {
  let paths = &arg.paths;
  let inv = Invocation::classify(paths);
  let styles = DiffStyles::new(should_use_color(arg.common.color));

  if inv.rename_only {
    println!("{}", styles.header.paint("{ renamed without changes }"));
    println!("{}", styles.header.paint(format!("  old name: {}", paths[0])));
    println!("{}", styles.header.paint(format!("  new name: {}", paths[7])));
    return Ok(());
  }

  if paths.len() != 2 && !inv.git_diff {
    bail!("expected 2 positional arguments (cli) or 7 or 9 (git)");
  }

  // Unchanged blobs need no comparison; git-style header is all there is.
  if paths.len() == 7 && paths[2] == paths[5] {
    let mut printer = DiffPrinter::new(None, None, styles);
    add_headers(&mut printer, &inv, paths);
    printer.print(&mut std::io::stdout().lock())?;
    return Ok(());
  }

  let old_file = if inv.git_diff { &paths[1] } else { &paths[0] };
  let new_file = if inv.git_diff { &paths[4] } else { &paths[1] };

  let mut tr = TimeReport::default();
  let trees = tr.measure("parsing", |_| parse_both(&arg.common, old_file, new_file));
  let (old_tree, new_tree) = trees?;

  let (Some(mut old_tree), Some(mut new_tree)) = (old_tree, new_tree) else {
    if inv.git_diff {
      return git_fallback(&inv, paths, &styles);
    }
    bail!("failed to parse: {old_file} or {new_file}");
  };

  if arg.common.dry_run {
    args::dump_tree(&arg.common, &old_tree, "Old tree")?;
    args::dump_tree(&arg.common, &new_tree, "New tree")?;
    return Ok(());
  }

  tr.measure("comparing", |_| {
    compare(
      &mut old_tree,
      &mut new_tree,
      !arg.common.fine_only,
      false,
    );
  });

  args::dump_tree(&arg.common, &old_tree, "Old tree")?;
  args::dump_tree(&arg.common, &new_tree, "New tree")?;

  let mut printer = DiffPrinter::new(Some(&old_tree), Some(&new_tree), styles);
  if inv.git_diff {
    add_headers(&mut printer, &inv, paths);
  } else {
    printer.add_header(old_file.clone(), new_file.clone());
  }
  printer.fold_threshold(if arg.no_fold {
    None
  } else {
    Some(arg.fold_threshold)
  });

  tr.measure("printing", |_| printer.print(&mut std::io::stdout().lock()))?;

  if arg.common.time_report {
    print!("{tr}");
  }
  Ok(())
}

fn add_headers(printer: &mut DiffPrinter<'_>, inv: &Invocation, paths: &[String]) {
  let new_name_idx = if inv.git_rename { 7 } else { 0 };
  printer.add_header(paths[3].clone(), paths[6].clone());
  printer.add_header(
    format!("a/{}", paths[0]),
    format!("b/{}", paths[new_name_idx]),
  );
}

// The only concurrency in a comparison: the two inputs parse on their own
// threads, each building an independently owned tree.
fn parse_both(
  common: &CommonArgs,
  old_file: &str,
  new_file: &str,
) -> Result<(Option<Tree>, Option<Tree>)> {
  let old_contents =
    std::fs::read_to_string(old_file).with_context(|| format!("failed to read {old_file}"))?;
  let new_contents =
    std::fs::read_to_string(new_file).with_context(|| format!("failed to read {new_file}"))?;

  std::thread::scope(|scope| {
    let new_tree = scope.spawn(|| args::build_tree(new_file, &new_contents, common));
    let old_tree = args::build_tree(old_file, &old_contents, common);
    let new_tree = new_tree.join().expect("parser thread panicked");
    Ok((old_tree?, new_tree?))
  })
}

fn git_fallback(inv: &Invocation, paths: &[String], styles: &DiffStyles) -> Result<()> {
  let mut printer = DiffPrinter::new(None, None, styles.clone());
  add_headers(&mut printer, inv, paths);
  printer.print(&mut std::io::stdout().lock())?;
  println!("Parsing has failed, falling back to `git diff`");

  // At least older versions of git pass 40 zeroes for missing blobs.
  let is_valid = |hash: &str| hash != "." && hash.chars().any(|c| c != '0');

  let status = if is_valid(&paths[2]) && is_valid(&paths[5]) {
    Command::new("git")
      .args(["diff", "--no-ext-diff", &paths[2], &paths[5], "--"])
      .status()
  } else {
    Command::new("git")
      .args(["diff", "--no-ext-diff", "--", &paths[1], &paths[4]])
      .status()
  };

  match status {
    // git diff exits non-zero for differences; only a missing binary is an
    // actual failure here.
    Ok(_) => Ok(()),
    Err(err) => bail!("failed to run git: {err}"),
  }
}

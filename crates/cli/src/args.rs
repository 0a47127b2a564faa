//! Common command-line arguments and tree building shared by the tools.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use zograscope_core::{STree, Tree};
use zograscope_language::Lang;

/// Flags every subcommand understands.
#[derive(Args)]
pub struct CommonArgs {
  /// Force specific language (c, cxx, lua, bash).
  #[clap(long, value_name = "LANG")]
  pub lang: Option<String>,

  /// Use only the fine-grained tree.
  #[clap(long = "fine-only")]
  pub fine_only: bool,

  /// Display semantic trees for debugging.
  #[clap(long = "dump-tree")]
  pub dump_tree: bool,

  /// Display structural trees for debugging.
  #[clap(long = "dump-stree")]
  pub dump_stree: bool,

  /// Exit after parsing.
  #[clap(long = "dry-run")]
  pub dry_run: bool,

  /// Report time spent on different activities.
  #[clap(long = "time-report")]
  pub time_report: bool,

  /// Print front-end warnings about unmapped node kinds.
  #[clap(long)]
  pub debug: bool,

  /// Tabulation width.
  #[clap(long = "tab-width", default_value = "4", value_name = "N")]
  pub tab_width: usize,

  /// Controls colorization of the output.
  #[clap(long, value_enum, default_value = "auto")]
  pub color: ColorChoice,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
  Auto,
  Always,
  Never,
}

/// Returns true if we should attempt to write colored output.
pub fn should_use_color(color: ColorChoice) -> bool {
  match color {
    ColorChoice::Always => true,
    ColorChoice::Never => false,
    ColorChoice::Auto => atty::is(atty::Stream::Stdout) && env_allows_color(),
  }
}

fn env_allows_color() -> bool {
  match env::var_os("TERM") {
    None => return false,
    Some(k) => {
      if k == "dumb" {
        return false;
      }
    }
  }
  env::var_os("NO_COLOR").is_none()
}

/// Parses a file into its semantic tree. `Ok(None)` means the front-end gave
/// up on the input; the caller decides whether that is fatal.
pub fn build_tree(path: &str, contents: &str, args: &CommonArgs) -> Result<Option<Tree>> {
  let lang = Lang::for_file(Path::new(path), args.lang.as_deref())?;
  let policy = lang.create();

  let mut ptree = policy
    .parse(contents, path, args.tab_width, args.debug)
    .with_context(|| format!("failed to parse {path}"))?;
  if ptree.has_failed() {
    return Ok(None);
  }

  let tree = if args.fine_only {
    Tree::from_ptree(policy, args.tab_width, contents, &mut ptree)
  } else {
    let mut stree = STree::new(ptree);
    if args.dump_stree {
      let mut stdout = std::io::stdout().lock();
      let lang = lang.create();
      stree.dump(&mut stdout, contents, &*lang)?;
    }
    Tree::from_stree(policy, args.tab_width, contents, &mut stree)
  };

  Ok(Some(tree))
}

/// Dumps a tree when `--dump-tree` is set.
pub fn dump_tree(args: &CommonArgs, tree: &Tree, title: &str) -> Result<()> {
  if args.dump_tree && !tree.is_empty() {
    println!("{title}:");
    let mut stdout = std::io::stdout().lock();
    tree.dump(&mut stdout)?;
  }
  Ok(())
}

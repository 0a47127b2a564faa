mod args;
mod diff;
mod find;
mod hi;
mod print;
mod stats;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(author, version, about = "Syntax-aware diff and code analysis tools", long_about = None)]
struct App {
  #[clap(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compare two versions of a file on their syntax trees. (default command)
  #[clap(display_order = 1)]
  Diff(diff::DiffArg),
  /// List nodes of parsed files selected by a matcher chain
  #[clap(display_order = 2)]
  Find(find::FindArg),
  /// Report line-content buckets and function statistics
  #[clap(display_order = 3)]
  Stats(stats::StatsArg),
  /// Print a file with syntax highlighting
  #[clap(display_order = 4)]
  Hi(hi::HiArg),
}

fn main() -> Result<()> {
  utils::init_tracing();
  let app = App::parse();
  match app.command {
    Commands::Diff(arg) => diff::run(arg),
    Commands::Find(arg) => find::run(arg),
    Commands::Stats(arg) => stats::run(arg),
    Commands::Hi(arg) => hi::run(arg),
  }
}

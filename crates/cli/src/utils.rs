//! Small shared helpers: tracing setup and the `--time-report` keeper.

use std::fmt;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

/// Routes front-end warnings to stderr; `RUST_LOG` filters them the usual
/// way.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

struct Frame {
  label: String,
  depth: usize,
  elapsed: Duration,
}

/// Collects a tree of timed activities and prints it on request.
#[derive(Default)]
pub struct TimeReport {
  frames: Vec<Frame>,
  depth: usize,
}

impl TimeReport {
  pub fn measure<T>(&mut self, label: &str, f: impl FnOnce(&mut TimeReport) -> T) -> T {
    let idx = self.frames.len();
    self.frames.push(Frame {
      label: label.to_owned(),
      depth: self.depth,
      elapsed: Duration::ZERO,
    });

    self.depth += 1;
    let started = Instant::now();
    let result = f(self);
    let elapsed = started.elapsed();
    self.depth -= 1;

    self.frames[idx].elapsed = elapsed;
    result
  }
}

impl fmt::Display for TimeReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Time report:")?;
    for frame in &self.frames {
      writeln!(
        f,
        "{:indent$}{}: {:.3}ms",
        "",
        frame.label,
        frame.elapsed.as_secs_f64() * 1000.0,
        indent = frame.depth * 2
      )?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn nested_measures_keep_their_order() {
    let mut tr = TimeReport::default();
    tr.measure("outer", |tr| {
      tr.measure("inner", |_| {});
    });
    tr.measure("after", |_| {});

    let report = tr.to_string();
    let outer = report.find("outer").unwrap();
    let inner = report.find("  inner").unwrap();
    let after = report.find("after").unwrap();
    assert!(outer < inner && inner < after);
  }
}

//! Two-column aligned rendering of compared trees.
//!
//! Tokens are laid out at their source positions with edit markup (`{+…+}`
//! inserted, `{-…-}` deleted, `{~…~}`/`{#…#}` the two sides of an update,
//! `{:…:}` moved). Lines whose tokens are matched anchor the two columns to
//! each other; unmatched lines float between anchors, and long runs of
//! identical rows fold away.

mod styles;

pub use styles::{highlight_style, DiffStyles};

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use similar::{ChangeTag, TextDiff};

use zograscope_core::{Leaves, State, Tree};

#[derive(Clone, Copy)]
enum Side {
  Old,
  New,
}

struct Piece {
  line: usize,
  col: usize,
  text: String,
  state: State,
  moved: bool,
  diffable: bool,
  peer: Option<String>,
  anchor: Option<usize>,
}

#[derive(Default)]
struct Line {
  plain: String,
  colored: String,
  changed: bool,
  anchor: Option<usize>,
}

struct Row {
  left: Option<usize>,
  right: Option<usize>,
}

pub struct DiffPrinter<'t> {
  left: Option<&'t Tree>,
  right: Option<&'t Tree>,
  headers: Vec<(String, String)>,
  styles: DiffStyles,
  fold_threshold: Option<usize>,
}

/// Rows kept on each side of a folded run.
const FOLD_CONTEXT: usize = 2;

impl<'t> DiffPrinter<'t> {
  pub fn new(left: Option<&'t Tree>, right: Option<&'t Tree>, styles: DiffStyles) -> Self {
    Self {
      left,
      right,
      headers: Vec::new(),
      styles,
      fold_threshold: Some(8),
    }
  }

  pub fn add_header(&mut self, left: impl Into<String>, right: impl Into<String>) {
    self.headers.push((left.into(), right.into()));
  }

  pub fn fold_threshold(&mut self, threshold: Option<usize>) {
    self.fold_threshold = threshold;
  }

  pub fn print(&self, w: &mut dyn Write) -> Result<()> {
    let lines_l = self
      .left
      .map(|t| layout(collect(t, self.right, Side::Old), &self.styles, Side::Old))
      .unwrap_or_default();
    let lines_r = self
      .right
      .map(|t| layout(collect(t, self.left, Side::New), &self.styles, Side::New))
      .unwrap_or_default();

    let lw = digits(lines_l.len());
    let rw = digits(lines_r.len());
    let tw = lines_l
      .iter()
      .map(|l| l.plain.chars().count())
      .max()
      .unwrap_or(0)
      .max(1);
    let rtw = lines_r
      .iter()
      .map(|l| l.plain.chars().count())
      .max()
      .unwrap_or(0)
      .max(1);
    let left_width = 1 + lw + 2 + tw + 1;
    let right_width = 2 + rw + 2 + rtw;

    for (l, r) in &self.headers {
      let row = format!(
        "{}!{}",
        header_cell(l, left_width),
        header_cell(r, right_width)
      );
      writeln!(w, "{}", self.styles.header.paint(row))?;
    }

    let rows = self.make_rows(&lines_l, &lines_r);
    let folded = self.fold(rows, &lines_l, &lines_r);

    for item in folded {
      match item {
        RowItem::Fold(n) => {
          let msg = format!(" @@ folded {n} identical lines @@ ");
          let width = left_width + 1 + right_width;
          writeln!(w, "{msg:.^width$}")?;
        }
        RowItem::Row(row) => {
          let sep = self.separator(&row, &lines_l, &lines_r);
          let lnum = format!(
            "{:>lw$}",
            row.left.map(|n| n.to_string()).unwrap_or_else(|| "-".into())
          );
          let rnum = format!(
            "{:>rw$}",
            row.right.map(|n| n.to_string()).unwrap_or_else(|| "-".into())
          );
          let ltext = row
            .left
            .map(|n| lines_l[n - 1].colored.clone())
            .unwrap_or_default();
          let lplain_width = row
            .left
            .map(|n| lines_l[n - 1].plain.chars().count())
            .unwrap_or(0);
          let rtext = row
            .right
            .map(|n| lines_r[n - 1].colored.clone())
            .unwrap_or_default();

          let pad = tw.saturating_sub(lplain_width);
          let line = format!(
            " {}  {}{} {}  {}  {}",
            self.styles.line_num.paint(lnum),
            ltext,
            " ".repeat(pad),
            sep,
            self.styles.line_num.paint(rnum),
            rtext,
          );
          writeln!(w, "{}", line.trim_end())?;
        }
      }
    }
    Ok(())
  }

  fn make_rows(&self, lines_l: &[Line], lines_r: &[Line]) -> Vec<Row> {
    // Monotonic anchor chain: a left line binds to the line its first
    // matched token lives on, later anchors never step backwards.
    let mut anchors = Vec::new();
    let mut last_r = 0;
    for (i, line) in lines_l.iter().enumerate() {
      if let Some(a) = line.anchor {
        if a > last_r {
          anchors.push((i + 1, a));
          last_r = a;
        }
      }
    }
    anchors.push((lines_l.len() + 1, lines_r.len() + 1));

    let mut rows = Vec::new();
    let mut li = 1;
    let mut ri = 1;
    for (al, ar) in anchors {
      // Unanchored lines float between anchors, paired while both sides
      // have some.
      while li < al && ri < ar {
        rows.push(Row {
          left: Some(li),
          right: Some(ri),
        });
        li += 1;
        ri += 1;
      }
      while li < al {
        rows.push(Row {
          left: Some(li),
          right: None,
        });
        li += 1;
      }
      while ri < ar {
        rows.push(Row {
          left: None,
          right: Some(ri),
        });
        ri += 1;
      }
      if al <= lines_l.len() {
        rows.push(Row {
          left: Some(al),
          right: Some(ar),
        });
        li = al + 1;
        ri = ar + 1;
      }
    }
    rows
  }

  fn separator(&self, row: &Row, lines_l: &[Line], lines_r: &[Line]) -> char {
    match (row.left, row.right) {
      (Some(l), Some(r)) => {
        let left = &lines_l[l - 1];
        let right = &lines_r[r - 1];
        if !left.changed && !right.changed && left.plain == right.plain {
          '|'
        } else {
          '~'
        }
      }
      (Some(_), None) => '<',
      (None, Some(_)) => '>',
      (None, None) => '|',
    }
  }

  fn fold(&self, rows: Vec<Row>, lines_l: &[Line], lines_r: &[Line]) -> Vec<RowItem> {
    let Some(threshold) = self.fold_threshold else {
      return rows.into_iter().map(RowItem::Row).collect();
    };

    let foldable: Vec<bool> = rows
      .iter()
      .map(|row| self.separator(row, lines_l, lines_r) == '|')
      .collect();

    let mut out = Vec::new();
    let mut i = 0;
    while i < rows.len() {
      if !foldable[i] {
        out.push(RowItem::Row(Row {
          left: rows[i].left,
          right: rows[i].right,
        }));
        i += 1;
        continue;
      }

      let mut j = i;
      while j < rows.len() && foldable[j] {
        j += 1;
      }
      let run = j - i;
      let tail = if j == rows.len() { 0 } else { FOLD_CONTEXT };
      if run > threshold && run > FOLD_CONTEXT + tail {
        let middle = run - FOLD_CONTEXT - tail;
        for row in &rows[i..i + FOLD_CONTEXT] {
          out.push(RowItem::Row(Row {
            left: row.left,
            right: row.right,
          }));
        }
        out.push(RowItem::Fold(middle));
        for row in &rows[j - tail..j] {
          out.push(RowItem::Row(Row {
            left: row.left,
            right: row.right,
          }));
        }
      } else {
        for row in &rows[i..j] {
          out.push(RowItem::Row(Row {
            left: row.left,
            right: row.right,
          }));
        }
      }
      i = j;
    }
    out
  }
}

enum RowItem {
  Row(Row),
  Fold(usize),
}

fn digits(n: usize) -> usize {
  n.max(1).to_string().len()
}

fn header_cell(path: &str, width: usize) -> String {
  if path.is_empty() {
    "~".repeat(width)
  } else {
    format!("{:~^width$}", format!(" {path} "))
  }
}

// Walks the leaves of the tree and produces positioned text fragments with
// their annotations; multi-line tokens split into one fragment per line.
fn collect(tree: &Tree, other: Option<&Tree>, _side: Side) -> Vec<Piece> {
  let toks: Vec<_> = Leaves::new(tree).collect();
  let mut per_head: HashMap<_, usize> = HashMap::new();
  for &(_, head) in &toks {
    *per_head.entry(head).or_insert(0) += 1;
  }

  let mut pieces = Vec::new();
  for (id, head) in toks {
    let node = tree.node(id);
    let head_node = tree.node(head);
    let spelling = tree.spelling(id);

    let anchor = match (head_node.relative, other) {
      (Some(rel), Some(other)) if head_node.state != State::Deleted => {
        Some(other.node(rel).line as usize)
      }
      _ => None,
    };

    let single = per_head[&head] == 1 && !spelling.contains('\n');
    let peer = match (node.state, head_node.relative, other) {
      (State::Updated, Some(rel), Some(other)) if single => Some(other.label(rel).to_owned()),
      _ => None,
    };
    let diffable = tree.lang().is_diffable(tree.view(id)) && single;

    for (i, segment) in spelling.split('\n').enumerate() {
      pieces.push(Piece {
        line: node.line as usize + i,
        col: if i == 0 { node.col as usize } else { 1 },
        text: segment.to_owned(),
        state: node.state,
        moved: node.moved,
        diffable,
        peer: if i == 0 { peer.clone() } else { None },
        anchor: if i == 0 { anchor } else { None },
      });
    }
  }
  pieces
}

fn layout(pieces: Vec<Piece>, styles: &DiffStyles, side: Side) -> Vec<Line> {
  let max_line = pieces.iter().map(|p| p.line).max().unwrap_or(0);
  let mut lines: Vec<Vec<&Piece>> = vec![Vec::new(); max_line];
  for piece in &pieces {
    lines[piece.line - 1].push(piece);
  }

  lines
    .into_iter()
    .map(|mut on_line| {
      on_line.sort_by_key(|p| p.col);
      let mut line = Line::default();
      let mut cursor = 1;
      for piece in on_line {
        let pad = piece.col.saturating_sub(cursor);
        line.plain.extend(std::iter::repeat(' ').take(pad));
        line.colored.extend(std::iter::repeat(' ').take(pad));
        let (plain, colored) = render(piece, side, styles);
        line.plain.push_str(&plain);
        line.colored.push_str(&colored);
        cursor = piece.col + piece.text.chars().count();

        line.changed |= piece.state != State::Unchanged || piece.moved;
        if line.anchor.is_none() {
          line.anchor = piece.anchor;
        }
      }
      line
    })
    .collect()
}

fn render(piece: &Piece, side: Side, styles: &DiffStyles) -> (String, String) {
  let text = &piece.text;
  match piece.state {
    State::Unchanged => {
      if piece.moved {
        let plain = format!("{{:{text}:}}");
        (plain.clone(), styles.moved.paint(plain).to_string())
      } else {
        (text.clone(), text.clone())
      }
    }
    State::Inserted => {
      let plain = format!("{{+{text}+}}");
      (plain.clone(), styles.insert.paint(plain).to_string())
    }
    State::Deleted => {
      let plain = format!("{{-{text}-}}");
      (plain.clone(), styles.delete.paint(plain).to_string())
    }
    State::Updated => match &piece.peer {
      Some(peer) if piece.diffable => inline_diff(text, peer, side, styles),
      _ => {
        let plain = match side {
          Side::Old => format!("{{~{text}~}}"),
          Side::New => format!("{{#{text}#}}"),
        };
        (plain.clone(), styles.update.paint(plain).to_string())
      }
    },
  }
}

// Character-level diff inside an updated diffable token: common parts print
// bare, differing parts use insert/delete markers.
fn inline_diff(text: &str, peer: &str, side: Side, styles: &DiffStyles) -> (String, String) {
  let (old, new) = match side {
    Side::Old => (text.to_owned(), peer.to_owned()),
    Side::New => (peer.to_owned(), text.to_owned()),
  };
  let diff = TextDiff::from_chars(old.as_str(), new.as_str());

  let mut runs: Vec<(ChangeTag, String)> = Vec::new();
  for change in diff.iter_all_changes() {
    let tag = change.tag();
    let value = change.value();
    match runs.last_mut() {
      Some((last, run)) if *last == tag => run.push_str(value),
      _ => runs.push((tag, value.to_owned())),
    }
  }

  let mut plain = String::new();
  let mut colored = String::new();
  for (tag, run) in runs {
    match (tag, side) {
      (ChangeTag::Equal, _) => {
        plain.push_str(&run);
        colored.push_str(&run);
      }
      (ChangeTag::Delete, Side::Old) => {
        let marked = format!("{{-{run}-}}");
        colored.push_str(&styles.delete.paint(marked.as_str()).to_string());
        plain.push_str(&marked);
      }
      (ChangeTag::Insert, Side::New) => {
        let marked = format!("{{+{run}+}}");
        colored.push_str(&styles.insert.paint(marked.as_str()).to_string());
        plain.push_str(&marked);
      }
      // The other side's exclusive text does not appear on this side.
      _ => {}
    }
  }
  (plain, colored)
}

#[cfg(test)]
mod test {
  use super::*;
  use zograscope_core::{
    compare, Language, Location, MType, NodeView, SType, STree, Text, TreeBuilder, Type,
  };

  const ROOT: SType = SType(1);
  const STMT: SType = SType(2);
  const TOKEN: SType = SType(3);

  // Whitespace tokenizer with structurally tagged tokens; statements per
  // line.
  struct MiniLang;

  impl Language for MiniLang {
    fn parse(
      &self,
      contents: &str,
      _path: &str,
      _tab_width: usize,
      _debug: bool,
    ) -> zograscope_core::Result<TreeBuilder> {
      let mut tb = TreeBuilder::new();
      let mut stmts = Vec::new();
      let mut offset = 0u32;
      for (lineno, line) in contents.lines().enumerate() {
        let mut tokens = Vec::new();
        let mut col = 1u32;
        for word in line.split(' ') {
          if !word.is_empty() {
            let ty = if word.chars().all(|c| c.is_ascii_digit()) {
              Type::IntConstants
            } else if word.starts_with('"') {
              Type::StrConstants
            } else {
              Type::Identifiers
            };
            let text = Text {
              from: offset + col - 1,
              len: word.len() as u32,
              token: ty as u16,
            };
            let loc = Location {
              line: lineno as u32 + 1,
              col,
            };
            tokens.push(tb.add_leaf(text, loc, TOKEN));
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
      if stype == STMT {
        MType::Statement
      } else {
        MType::Other
      }
    }

    fn stype_name(&self, _stype: SType) -> &'static str {
      "Mini"
    }

    fn always_matches(&self, node: NodeView) -> bool {
      node.stype == ROOT
    }
  }

  fn parse(src: &str) -> zograscope_core::Tree {
    let tb = MiniLang.parse(src, "test", 4, false).unwrap();
    let mut stree = STree::new(tb);
    zograscope_core::Tree::from_stree(Box::new(MiniLang), 4, src, &mut stree)
  }

  fn print_pair(old: &str, new: &str, fold: Option<usize>) -> String {
    let mut t1 = parse(old);
    let mut t2 = parse(new);
    compare(&mut t1, &mut t2, true, false);

    let mut printer = DiffPrinter::new(Some(&t1), Some(&t2), DiffStyles::no_color());
    printer.fold_threshold(fold);
    let mut out = Vec::new();
    printer.print(&mut out).unwrap();
    String::from_utf8(out).unwrap()
  }

  #[test]
  fn identical_lines_align_with_pipe() {
    let out = print_pair("a b", "a b", None);
    assert_eq!(out, " 1  a b |  1  a b\n");
  }

  #[test]
  fn updated_token_is_marked_on_both_sides() {
    let out = print_pair("x 1", "x 2", None);
    assert_eq!(out, " 1  x {~1~} ~  1  x {#2#}\n");
  }

  #[test]
  fn diffable_update_diffs_inside_the_token() {
    let out = print_pair("s \"abc\"", "s \"abd\"", None);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("\"ab{-c-}\""), "{out}");
    assert!(lines[0].contains("\"ab{+d+}\""), "{out}");
  }

  #[test]
  fn inserted_line_floats_before_its_anchor() {
    let out = print_pair("a a", "b b\na a", None);
    let expected = " -      >  1  {+b+} {+b+}\n 1  a a |  2  a a\n";
    assert_eq!(out, expected);
  }

  #[test]
  fn deleted_line_floats_before_its_anchor() {
    let out = print_pair("b b\na a", "a a", None);
    let expected = " 1  {-b-} {-b-} <  -\n 2  a a         |  1  a a\n";
    assert_eq!(out, expected);
  }

  #[test]
  fn long_identical_runs_fold() {
    let old = "x 1\na a\nb b\nc c\nd d\ne e\nf f";
    let new = "x 2\na a\nb b\nc c\nd d\ne e\nf f";
    let out = print_pair(old, new, Some(3));
    assert!(out.contains("@@ folded 4 identical lines @@"), "{out}");
    assert!(out.contains("a a"));
    assert!(out.contains("b b"));
    assert!(!out.contains("e e"), "folded rows must not be printed: {out}");
  }

  #[test]
  fn headers_use_the_bang_separator() {
    let t: Option<&zograscope_core::Tree> = None;
    let mut printer = DiffPrinter::new(t, None, DiffStyles::no_color());
    printer.add_header("hash-old", "hash-new");
    printer.add_header("a/f.c", "b/f.c");
    let mut out = Vec::new();
    printer.print(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(" hash-old ") && lines[0].contains('!'));
    assert!(lines[1].contains(" a/f.c ") && lines[1].contains(" b/f.c "));
  }

  #[test]
  fn missing_side_prints_the_present_one() {
    let tree = parse("a a\nb b");
    let printer = DiffPrinter::new(None, Some(&tree), DiffStyles::no_color());
    let mut out = Vec::new();
    printer.print(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().all(|l| l.contains('>')));
  }
}

//! Round-trip properties of the front-ends: reassembling the leaves of a
//! parsed tree at their source positions reproduces the input.

use std::path::Path;

use zograscope_core::{Language, Leaves, STree, Tree};
use zograscope_language::Lang;

fn parse(lang: Lang, src: &str) -> Tree {
  let policy = lang.create();
  let ptree = policy.parse(src, "test-input", 4, false).unwrap();
  assert!(!ptree.has_failed());
  let mut stree = STree::new(ptree);
  Tree::from_stree(policy, 4, src, &mut stree)
}

fn reconstruct(tree: &Tree) -> String {
  let mut out = String::new();
  let mut line = 1usize;
  let mut col = 1usize;
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
    out.push_str(spelling);
    let newlines = spelling.matches('\n').count();
    line += newlines;
    col = if newlines > 0 {
      spelling.rsplit('\n').next().unwrap_or("").chars().count() + 1
    } else {
      col + spelling.chars().count()
    };
  }
  out
}

fn assert_round_trip(lang: Lang, src: &str) {
  let tree = parse(lang, src);
  assert_eq!(reconstruct(&tree), src.trim_end(), "language: {lang}");
}

#[test]
fn c_round_trip() {
  assert_round_trip(
    Lang::C,
    "#include <stdio.h>\n\nint main(int argc, char *argv[]) {\n    printf(\"hi\");\n    return 0;\n}",
  );
}

#[test]
fn c_round_trip_with_comments() {
  assert_round_trip(
    Lang::C,
    "/* leading\n * comment */\nint x = 1; // trailing\nint y = 2;",
  );
}

#[test]
fn cpp_round_trip() {
  assert_round_trip(
    Lang::Cpp,
    "class A {\npublic:\n    int f() const { return x; }\nprivate:\n    int x;\n};",
  );
}

#[test]
fn lua_round_trip() {
  assert_round_trip(
    Lang::Lua,
    "local function add(a, b)\n    return a + b\nend\n\nprint(add(1, 2))",
  );
}

#[test]
fn bash_round_trip() {
  assert_round_trip(
    Lang::Bash,
    "#!/bin/bash\nfor f in *.c; do\n    echo \"$f\"\ndone",
  );
}

#[test]
fn fine_tree_round_trips_too() {
  let src = "int x = 1;\nint y = 2;";
  let policy = Lang::C.create();
  let mut ptree = policy.parse(src, "test-input", 4, false).unwrap();
  let tree = Tree::from_ptree(policy, 4, src, &mut ptree);
  assert_eq!(reconstruct(&tree), src);
}

#[test]
fn detection_is_stable_for_sources() {
  assert_eq!(Lang::detect(Path::new("x.c")), Some(Lang::C));
  assert_eq!(Lang::detect(Path::new("x.cc")), Some(Lang::Cpp));
}

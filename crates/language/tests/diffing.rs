//! End-to-end diffing scenarios over the C front-end.

use zograscope_core::{compare, Language, Leaves, STree, State, Tree};
use zograscope_language::Lang;

fn parse(lang: Lang, src: &str) -> Tree {
  let policy = lang.create();
  let ptree = policy.parse(src, "test-input", 4, false).unwrap();
  let mut stree = STree::new(ptree);
  Tree::from_stree(policy, 4, src, &mut stree)
}

fn diff(lang: Lang, old: &str, new: &str) -> (Tree, Tree) {
  let mut t1 = parse(lang, old);
  let mut t2 = parse(lang, new);
  compare(&mut t1, &mut t2, true, false);
  (t1, t2)
}

fn leaf_states(tree: &Tree) -> Vec<(String, State, bool)> {
  Leaves::new(tree)
    .map(|(id, _)| {
      let n = tree.node(id);
      (tree.label(id).to_owned(), n.state, n.moved)
    })
    .collect()
}

#[test]
fn comparing_a_file_with_itself_reports_nothing() {
  let src = "int add(int a, int b) {\n    return a + b;\n}\n";
  let (t1, t2) = diff(Lang::C, src, src);

  for (label, state, moved) in leaf_states(&t1).into_iter().chain(leaf_states(&t2)) {
    assert_eq!(state, State::Unchanged, "{label}");
    assert!(!moved, "{label}");
  }
}

#[test]
fn constant_change_updates_exactly_one_leaf() {
  let (t1, t2) = diff(Lang::C, "int x = 1;\n", "int x = 2;\n");

  let updated1: Vec<_> = leaf_states(&t1)
    .into_iter()
    .filter(|(_, s, _)| *s != State::Unchanged)
    .collect();
  assert_eq!(updated1.len(), 1, "{updated1:?}");
  assert_eq!(updated1[0].0, "1");
  assert_eq!(updated1[0].1, State::Updated);

  let updated2: Vec<_> = leaf_states(&t2)
    .into_iter()
    .filter(|(_, s, _)| *s != State::Unchanged)
    .collect();
  assert_eq!(updated2.len(), 1, "{updated2:?}");
  assert_eq!(updated2[0].0, "2");
  assert_eq!(updated2[0].1, State::Updated);
}

#[test]
fn added_statement_is_inserted_without_touching_the_rest() {
  let old = "void f(void) {\n    a();\n}\n";
  let new = "void f(void) {\n    a();\n    b();\n}\n";
  let (t1, t2) = diff(Lang::C, old, new);

  for (label, state, _) in leaf_states(&t1) {
    assert_eq!(state, State::Unchanged, "old side must be untouched: {label}");
  }

  let s2 = leaf_states(&t2);
  let inserted: Vec<_> = s2
    .iter()
    .filter(|(_, s, _)| *s == State::Inserted)
    .map(|(l, _, _)| l.clone())
    .collect();
  assert!(inserted.contains(&"b".to_owned()), "{s2:?}");
  for (label, state, _) in &s2 {
    if ["void", "f", "(", ")", "{", "}", "a"].contains(&label.as_str()) {
      assert_eq!(*state, State::Unchanged, "{label}");
    }
  }
}

#[test]
fn reordered_includes_are_moves() {
  let old = "#include \"a\"\n#include \"b\"\n#include \"c\"\n";
  let new = "#include \"b\"\n#include \"a\"\n#include \"c\"\n";
  let (t1, t2) = diff(Lang::C, old, new);

  for (label, state, _) in leaf_states(&t1).into_iter().chain(leaf_states(&t2)) {
    assert_eq!(state, State::Unchanged, "{label}");
  }

  // Tokens of the first two includes moved, the third stayed put.
  let per_line = |tree: &Tree| {
    let mut moved_lines = [false; 4];
    for (id, _) in Leaves::new(tree) {
      let node = tree.node(id);
      if node.moved {
        moved_lines[node.line as usize] = true;
      }
    }
    moved_lines
  };
  assert_eq!(per_line(&t1), [false, true, true, false]);
  assert_eq!(per_line(&t2), [false, true, true, false]);

  let unmoved_c = Leaves::new(&t1)
    .filter(|&(id, _)| t1.node(id).line == 3)
    .all(|(id, _)| !t1.node(id).moved);
  assert!(unmoved_c);
}

#[test]
fn trailing_blank_lines_do_not_change_states() {
  let old = "int x = 1;\n";
  let new = "int x = 1;\n\n\n";
  let (t1, t2) = diff(Lang::C, old, new);

  for (label, state, moved) in leaf_states(&t1).into_iter().chain(leaf_states(&t2)) {
    assert_eq!(state, State::Unchanged, "{label}");
    assert!(!moved, "{label}");
  }
}

#[test]
fn matching_stays_symmetric() {
  let old = "int x = 1;\nint y = 2;\n";
  let new = "int y = 2;\nint z = 3;\n";
  let (t1, t2) = diff(Lang::C, old, new);

  for (id, _) in Leaves::new(&t1) {
    if let Some(rel) = t1.node(id).relative {
      assert_eq!(t2.node(rel).relative, Some(id));
    }
  }
}

#[test]
fn lua_identity_compare_is_clean() {
  let src = "local x = 1\nprint(x)\n";
  let (t1, _) = diff(Lang::Lua, src, src);
  for (label, state, _) in leaf_states(&t1) {
    assert_eq!(state, State::Unchanged, "{label}");
  }
}

#[test]
fn bash_identity_compare_is_clean() {
  let src = "echo hello\nexit 0\n";
  let (t1, _) = diff(Lang::Bash, src, src);
  for (label, state, _) in leaf_states(&t1) {
    assert_eq!(state, State::Unchanged, "{label}");
  }
}

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
  let path = dir.path().join(name);
  std::fs::write(&path, contents).unwrap();
  path.display().to_string()
}

fn zs() -> Command {
  Command::cargo_bin("zs").unwrap()
}

#[test]
fn diff_of_identical_files_succeeds() {
  let dir = TempDir::new().unwrap();
  let old = write(&dir, "old.c", "int x = 1;\n");
  let new = write(&dir, "new.c", "int x = 1;\n");

  zs()
    .args(["diff", &old, &new])
    .assert()
    .success()
    .stdout(predicate::str::contains("old.c"))
    .stdout(predicate::str::contains("new.c"));
}

#[test]
fn changed_constant_is_marked_as_update() {
  let dir = TempDir::new().unwrap();
  let old = write(&dir, "old.c", "int x = 1;\n");
  let new = write(&dir, "new.c", "int x = 2;\n");

  zs()
    .args(["diff", &old, &new])
    .assert()
    .success()
    .stdout(predicate::str::contains("{~1~}"))
    .stdout(predicate::str::contains("{#2#}"));
}

#[test]
fn inserted_statement_is_marked() {
  let dir = TempDir::new().unwrap();
  let old = write(&dir, "old.c", "void f(void) {\n    a();\n}\n");
  let new = write(&dir, "new.c", "void f(void) {\n    a();\n    b();\n}\n");

  zs()
    .args(["diff", &old, &new])
    .assert()
    .success()
    .stdout(predicate::str::contains("{+b+}"));
}

#[test]
fn git_invocation_with_equal_blobs_prints_only_headers() {
  let dir = TempDir::new().unwrap();
  let old = write(&dir, "f.c", "int x;\n");

  let hash = "1111111111111111111111111111111111111111";
  let output = zs()
    .args(["diff", &old, &old, hash, "100644", &old, hash, "100644"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let text = String::from_utf8(output).unwrap();
  assert_eq!(text.lines().count(), 2, "{text}");
  assert!(text.contains('!'));
  assert!(text.contains("a/"));
  assert!(text.contains("b/"));
}

#[test]
fn git_rename_without_changes_prints_the_rename_header() {
  let dir = TempDir::new().unwrap();
  let old = write(&dir, "old.c", "int x;\n");
  let hash = "2222222222222222222222222222222222222222";

  zs()
    .args([
      "diff", &old, &old, hash, "100644", &old, hash, "100644", "new-name.c", "extra",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("renamed without changes"));
}

#[test]
fn wrong_number_of_positional_arguments_fails() {
  zs().args(["diff", "only-one.c"]).assert().failure();
}

#[test]
fn unknown_language_override_fails() {
  let dir = TempDir::new().unwrap();
  let old = write(&dir, "old.c", "int x;\n");
  let new = write(&dir, "new.c", "int y;\n");

  zs()
    .args(["diff", "--lang", "cobol", &old, &new])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown language"));
}

#[test]
fn hi_prints_the_source() {
  let dir = TempDir::new().unwrap();
  let file = write(&dir, "x.c", "int main(void) { return 0; }\n");

  zs()
    .args(["hi", &file])
    .assert()
    .success()
    .stdout(predicate::str::contains("int main(void) { return 0; }"));
}

#[test]
fn stats_reports_buckets_and_functions() {
  let dir = TempDir::new().unwrap();
  let file = write(
    &dir,
    "x.c",
    "/* comment */\n\nint add(int a, int b) {\n    return a + b;\n}\n",
  );

  zs()
    .args(["stats", &file])
    .assert()
    .success()
    .stdout(predicate::str::contains("files:      1"))
    .stdout(predicate::str::contains("functions:  1"));
}

#[test]
fn find_lists_matching_nodes() {
  let dir = TempDir::new().unwrap();
  let file = write(&dir, "x.c", "int add(int a, int b) {\n    return a + b;\n}\n");

  zs()
    .args(["find", &file, ":", "func"])
    .assert()
    .success()
    .stdout(predicate::str::contains("x.c:"));
}

#[test]
fn dry_run_exits_quietly() {
  let dir = TempDir::new().unwrap();
  let old = write(&dir, "old.c", "int x;\n");
  let new = write(&dir, "new.c", "int y;\n");

  zs()
    .args(["diff", "--dry-run", &old, &new])
    .assert()
    .success()
    .stdout(predicate::str::is_empty());
}

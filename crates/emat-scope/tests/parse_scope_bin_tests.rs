use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .expect("canonicalize repo root")
}

fn parse_scope_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_emat_parse_scope"))
}

fn run(args: &[&str]) -> Output {
    Command::new(parse_scope_bin())
        .args(args)
        .output()
        .expect("run emat_parse_scope")
}

#[test]
fn road_test_prints_ok_line() {
    let path = repo_root().join("scopes/road_test.yaml");
    let output = run(&[path.to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim_end(),
        "ok(scope): name=EMAT Road Test constants=2 uncertainties=7 levers=4 measures=7"
    );
}

#[test]
fn malformed_scope_exits_with_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.yaml");
    fs::write(
        &path,
        "scope:\n  name: Bad\ninputs:\n  x:\n    ptype: uncertainty\n    min: 2.0\n    max: 1.0\noutputs:\n  y:\n    kind: info\n",
    )
    .expect("write");

    let output = run(&[path.to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("inputs.x"), "stderr={stderr}");
}

#[test]
fn missing_argument_exits_with_two() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage"), "stderr={stderr}");

    let output = run(&["a.yaml", "b.yaml"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_file_exits_with_two() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.yaml");
    let output = run(&[path.to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.yaml"), "stderr={stderr}");
}

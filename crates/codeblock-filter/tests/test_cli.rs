/*
 * test_cli.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Runs the codeblock-filter binary with shell scripts standing in for
 * graphviz and python.
 */

#![cfg(unix)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::{Value, json};

const FAKE_DOT: &str = r#"for arg in "$@"; do case "$arg" in -o*) out="${arg#-o}";; esac; done
cat > "$out""#;

const BROKEN_DOT: &str = "cat > /dev/null; echo 'Error: syntax error in line 1' >&2; exit 1";

const FAKE_PYTHON: &str = "cat > /dev/null; echo 2; echo; echo done";

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn run_filter(workdir: &Path, args: &[&str], envs: &[(&str, &Path)], input: &Value) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_codeblock-filter"));
    cmd.args(args)
        .current_dir(workdir)
        .env_remove("PANDOCFILTER_CLEANUP")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        cmd.env(key, value);
    }
    let mut child = cmd.spawn().expect("failed to start codeblock-filter");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(&serde_json::to_vec(input).unwrap())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn document() -> Value {
    json!({
        "pandoc-api-version": [1, 23, 1],
        "meta": {},
        "blocks": [
            {"t": "CodeBlock", "c": [["g", ["graphviz"], []], "digraph{a->b}"]},
            {"t": "CodeBlock", "c": [["", ["python"], []], "print(1+1)\n"]}
        ]
    })
}

#[test]
fn test_filter_renders_and_runs() {
    let dir = tempfile::tempdir().unwrap();
    let dot = script(dir.path(), "dot", FAKE_DOT);
    let python = script(dir.path(), "python", FAKE_PYTHON);

    let output = run_filter(
        dir.path(),
        &["html"],
        &[
            ("CODEBLOCK_FILTER_DOT", dot.as_path()),
            ("CODEBLOCK_FILTER_PYTHON", python.as_path()),
        ],
        &document(),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let out: Value = serde_json::from_slice(&output.stdout).unwrap();
    let image_path = "graphviz-images/f60cf6f9ff0d3666e771e195e0466cee0568d92c.png";
    assert_eq!(
        out["blocks"],
        json!([
            {"t": "Para", "c": [{"t": "Image", "c": [["g", [], []], [], [image_path, ""]]}]},
            {"t": "CodeBlock", "c": [["", ["python"], []], "print(1+1)\n"]},
            {"t": "CodeBlock", "c": [["", [], []], "> 2\n> done"]}
        ])
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join(image_path)).unwrap(),
        "digraph{a->b}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Created directory graphviz-images"));
    assert!(stderr.contains(&format!("Created image {}", image_path)));

    // second run hits the cache
    let again = run_filter(
        dir.path(),
        &["html"],
        &[
            ("CODEBLOCK_FILTER_DOT", dot.as_path()),
            ("CODEBLOCK_FILTER_PYTHON", python.as_path()),
        ],
        &document(),
    );
    assert!(again.status.success());
    assert_eq!(again.stdout, output.stdout);
    assert!(!String::from_utf8_lossy(&again.stderr).contains("Created"));
}

#[test]
fn test_graphviz_failure_exits_nonzero_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let dot = script(dir.path(), "dot", BROKEN_DOT);
    let python = script(dir.path(), "python", FAKE_PYTHON);

    let output = run_filter(
        dir.path(),
        &["latex"],
        &[
            ("CODEBLOCK_FILTER_DOT", dot.as_path()),
            ("CODEBLOCK_FILTER_PYTHON", python.as_path()),
        ],
        &document(),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("syntax error"));
}

#[test]
fn test_missing_python_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = json!({
        "pandoc-api-version": [1, 23, 1],
        "meta": {},
        "blocks": [{"t": "CodeBlock", "c": [["", ["python"], []], "print(1)"]}]
    });
    let missing = dir.path().join("no-python-here");
    let output = run_filter(
        dir.path(),
        &[],
        &[("CODEBLOCK_FILTER_PYTHON", missing.as_path())],
        &input,
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Runtime not found"));
}

#[test]
fn test_invalid_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_filter(dir.path(), &["html"], &[], &json!({"blocks": []}));
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("pandoc-api-version"));
}

#[test]
fn test_cleanup_mode_keeps_working_directory_clean() {
    let dir = tempfile::tempdir().unwrap();
    let dot = script(dir.path(), "dot", FAKE_DOT);

    let output = run_filter(
        dir.path(),
        &["html", "--cleanup"],
        &[("CODEBLOCK_FILTER_DOT", dot.as_path())],
        &json!({
            "pandoc-api-version": [1, 23, 1],
            "meta": {},
            "blocks": [{"t": "CodeBlock", "c": [["", ["graphviz"], []], "graph{z}"]}]
        }),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(!dir.path().join("graphviz-images").exists());

    let out: Value = serde_json::from_slice(&output.stdout).unwrap();
    let target = PathBuf::from(out["blocks"][0]["c"][0]["c"][2][0].as_str().unwrap());
    assert!(target.is_file());
    let image_dir = target.parent().unwrap().to_path_buf();
    assert!(
        image_dir
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("graphviz"))
    );
    std::fs::remove_dir_all(image_dir).unwrap();
}

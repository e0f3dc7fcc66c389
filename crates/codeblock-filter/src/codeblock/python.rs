/*
 * codeblock/python.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Execution of `python` code blocks.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::errors::FilterError;

/// Runs a code block's text and returns what it printed.
pub trait CodeRunner {
    fn run(&self, code: &str) -> Result<String, FilterError>;
}

/// Runs code by piping it into a python interpreter.
///
/// Only stdout is captured. A non-zero exit status is not an error; whatever
/// the interpreter printed before failing is returned.
#[derive(Debug, Clone)]
pub struct PythonRunner {
    program: PathBuf,
}

impl PythonRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PythonRunner {
    fn default() -> Self {
        Self::new("python")
    }
}

impl CodeRunner for PythonRunner {
    fn run(&self, code: &str) -> Result<String, FilterError> {
        let python = which::which(&self.program).map_err(|_| {
            FilterError::runtime_not_found("python", self.program.display().to_string())
        })?;

        tracing::debug!(program = %python.display(), "running python code block");

        let mut child = Command::new(&python)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FilterError::spawn_failed(&python, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(code.as_bytes()) {
                tracing::debug!(error = %e, "python closed stdin early");
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| FilterError::spawn_failed(&python, e))?;

        if !output.status.success() {
            tracing::debug!(status = ?output.status.code(), "python exited unsuccessfully");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Quote interpreter output: one `"> "` line per non-empty output line.
///
/// `\n`, `\r\n` and a lone `\r` all end a line.
pub fn format_output(stdout: &str) -> String {
    stdout
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_output_quotes_lines() {
        assert_eq!(format_output("2\n"), "> 2");
        assert_eq!(format_output("a\nb\n"), "> a\n> b");
    }

    #[test]
    fn test_format_output_drops_empty_lines() {
        assert_eq!(format_output("\n\na\n\n\nb"), "> a\n> b");
        assert_eq!(format_output(""), "");
        assert_eq!(format_output("\n\n"), "");
    }

    #[test]
    fn test_format_output_keeps_whitespace_lines() {
        assert_eq!(format_output("  \n x"), ">   \n>  x");
    }

    #[test]
    fn test_format_output_normalizes_crlf() {
        assert_eq!(format_output("1\r\n2\r\n"), "> 1\n> 2");
    }

    #[test]
    fn test_format_output_splits_on_lone_cr() {
        assert_eq!(format_output("10%\r50%\r100%\n"), "> 10%\n> 50%\n> 100%");
    }

    #[test]
    fn test_missing_interpreter_is_runtime_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let runner = PythonRunner::new(dir.path().join("no-such-python"));
        assert!(matches!(
            runner.run("print(1)"),
            Err(FilterError::RuntimeNotFound { .. })
        ));
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("python");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_run_feeds_stdin_and_captures_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let python = script(dir.path(), "cat");
            let out = PythonRunner::new(python).run("print(1+1)\n").unwrap();
            assert_eq!(out, "print(1+1)\n");
        }

        #[test]
        fn test_stderr_and_exit_status_are_ignored() {
            let dir = tempfile::tempdir().unwrap();
            let python = script(
                dir.path(),
                "cat > /dev/null; echo partial; echo 'Traceback' >&2; exit 1",
            );
            let out = PythonRunner::new(python).run("raise SystemExit(1)").unwrap();
            assert_eq!(out, "partial\n");
        }

        #[test]
        fn test_invalid_utf8_is_replaced() {
            let dir = tempfile::tempdir().unwrap();
            let python = script(dir.path(), "cat > /dev/null; printf 'a\\377b'");
            let out = PythonRunner::new(python).run("").unwrap();
            assert_eq!(out, "a\u{FFFD}b");
        }
    }
}

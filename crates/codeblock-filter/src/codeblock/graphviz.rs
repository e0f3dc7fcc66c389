/*
 * codeblock/graphviz.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Graphviz rendering for `graphviz` code blocks.
 */

//! Rendering of graphviz code blocks to image files.
//!
//! The graph source is handed to the graphviz `dot` executable on stdin:
//!
//! ```text
//! dot -K<layout> -T<ext> -o<dest>
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::errors::FilterError;

/// Default graphviz layout engine.
pub const DEFAULT_LAYOUT: &str = "neato";

/// Image extension for an output format.
///
/// `latex` gets a vector `pdf`; every other format gets `png`.
pub fn image_extension(format: &str) -> &'static str {
    match format {
        "html" => "png",
        "latex" => "pdf",
        _ => "png",
    }
}

/// Renders diagram source into an image file.
pub trait DiagramRenderer {
    /// Render `source` as an `ext` image at `dest`.
    ///
    /// On success the file at `dest` exists.
    fn render(&self, source: &str, ext: &str, dest: &Path) -> Result<(), FilterError>;
}

/// Renders through the graphviz `dot` executable.
#[derive(Debug, Clone)]
pub struct DotRenderer {
    program: PathBuf,
    layout: String,
}

impl DotRenderer {
    pub fn new(program: impl Into<PathBuf>, layout: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            layout: layout.into(),
        }
    }

    fn find_program(&self) -> Result<PathBuf, FilterError> {
        which::which(&self.program).map_err(|_| {
            FilterError::runtime_not_found(
                "graphviz",
                format!("{} (install Graphviz from https://graphviz.org/)", self.program.display()),
            )
        })
    }
}

impl Default for DotRenderer {
    fn default() -> Self {
        Self::new("dot", DEFAULT_LAYOUT)
    }
}

impl DiagramRenderer for DotRenderer {
    fn render(&self, source: &str, ext: &str, dest: &Path) -> Result<(), FilterError> {
        let dot = self.find_program()?;

        let mut out_arg = OsString::from("-o");
        out_arg.push(dest);

        tracing::debug!(
            program = %dot.display(),
            layout = %self.layout,
            dest = %dest.display(),
            "rendering graphviz diagram"
        );

        let mut child = Command::new(&dot)
            .arg(format!("-K{}", self.layout))
            .arg(format!("-T{}", ext))
            .arg(out_arg)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FilterError::spawn_failed(&dot, e))?;

        // A malformed graph can make dot exit before reading all of stdin, so
        // a write failure is only reported if dot itself claims success.
        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(source.as_bytes()),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| FilterError::spawn_failed(&dot, e))?;

        if !output.status.success() {
            return Err(FilterError::RenderFailed {
                dest: dest.to_path_buf(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        write_result.map_err(|e| FilterError::spawn_failed(&dot, e))?;

        if !dest.is_file() {
            return Err(FilterError::MissingOutput(dest.to_path_buf()));
        }
        Ok(())
    }
}

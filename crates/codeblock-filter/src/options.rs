/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Runtime configuration for the code block filter.
 */

use std::path::PathBuf;

use crate::codeblock::graphviz::DEFAULT_LAYOUT;

/// External programs and cache placement used by a filter run.
///
/// The binary fills this from command-line flags and environment variables;
/// library code only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Interpreter for `python` code blocks, resolved on PATH.
    pub python: PathBuf,
    /// Graphviz executable for `graphviz` code blocks.
    pub dot: PathBuf,
    /// Graphviz layout engine (`-K`).
    pub layout: String,
    /// Directory under which `graphviz-images/` is created. Empty means the
    /// working directory, giving relative image paths.
    pub image_root: PathBuf,
    /// Render images into a fresh temporary directory. The directory is
    /// kept after exit so pandoc can read the images.
    pub cleanup: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python"),
            dot: PathBuf::from("dot"),
            layout: DEFAULT_LAYOUT.to_string(),
            image_root: PathBuf::new(),
            cleanup: false,
        }
    }
}

/*
 * errors.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for the code block filter.
 */

//! Error types for the code block filter.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a filter run.
///
/// Every variant is fatal: the document is not written when one of these
/// surfaces.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The program could not be located on PATH.
    #[error("Runtime not found: {engine} requires {runtime}")]
    RuntimeNotFound {
        /// The code block class that needed the runtime
        engine: String,
        /// The program that was not found
        runtime: String,
    },

    /// The program was found but could not be started or talked to.
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Graphviz rejected the graph or failed to write the image.
    #[error("Graphviz failed to render {dest} (status {status}): {stderr}")]
    RenderFailed {
        dest: PathBuf,
        status: i32,
        stderr: String,
    },

    /// Graphviz exited successfully but left no file behind.
    #[error("Graphviz reported success but {0} was not created")]
    MissingOutput(PathBuf),

    /// The image cache directory could not be prepared.
    #[error("Cache error at {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FilterError {
    pub fn runtime_not_found(engine: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self::RuntimeNotFound {
            engine: engine.into(),
            runtime: runtime.into(),
        }
    }

    pub fn spawn_failed(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source,
        }
    }

    pub fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Cache {
            path: path.into(),
            source,
        }
    }
}

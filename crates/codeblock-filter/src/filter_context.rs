/*
 * filter_context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Context for filter execution: the target format and the diagnostic
//! lines a run produces.

/// Context threaded through filter traversal.
///
/// Diagnostics are the user-facing stderr lines (`Created image ...`),
/// kept separate from `tracing` output so callers decide where they go.
pub struct FilterContext {
    /// Output format pandoc passed as the filter's first argument.
    pub format: String,
    diagnostics: Vec<String>,
}

impl FilterContext {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Record a diagnostic line.
    pub fn info(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Remove and return the diagnostics collected so far.
    pub fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::new("")
    }
}

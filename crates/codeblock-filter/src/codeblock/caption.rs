/*
 * codeblock/caption.rs
 * Copyright (c) 2025 Posit, PBC
 */

use codeblock_pandoc_types::{Inline, Inlines, Str};

/// Image title prefix that makes pandoc treat an image as a figure.
pub const FIGURE_TYPEF: &str = "fig:";

/// Split a `caption` attribute off a code block's key/value pairs.
///
/// Returns the caption inlines, the image title (`"fig:"` when a caption is
/// present, empty otherwise) and the remaining pairs in document order.
/// If `caption` repeats, the last one wins and all of them are removed.
pub fn get_caption(keyvals: Vec<(String, String)>) -> (Inlines, String, Vec<(String, String)>) {
    let mut caption = None;
    let mut rest = Vec::with_capacity(keyvals.len());
    for (key, value) in keyvals {
        if key == "caption" {
            caption = Some(value);
        } else {
            rest.push((key, value));
        }
    }
    match caption {
        Some(caption) => (
            vec![Inline::Str(Str::new(caption))],
            FIGURE_TYPEF.to_string(),
            rest,
        ),
        None => (Vec::new(), String::new(), rest),
    }
}

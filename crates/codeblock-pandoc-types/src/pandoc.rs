/*
 * pandoc.rs
 * Copyright (c) 2025 Posit, PBC
 */

pub use crate::block::Blocks;
pub use crate::meta::Meta;

/// The pandoc-types API version this crate models.
pub const PANDOC_API_VERSION: [u64; 3] = [1, 23, 1];

/*
 * A data structure that mimics Pandoc's `data Pandoc` type.
 */

#[derive(Debug, Clone, PartialEq)]
pub struct Pandoc {
    /// Version triple as read from the input; written back unchanged.
    pub api_version: Vec<u64>,
    pub meta: Meta,
    pub blocks: Blocks,
}

impl Default for Pandoc {
    fn default() -> Self {
        Pandoc {
            api_version: PANDOC_API_VERSION.to_vec(),
            meta: Meta::new(),
            blocks: vec![],
        }
    }
}

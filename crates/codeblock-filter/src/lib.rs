/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

pub mod cache;
pub mod codeblock;
pub mod errors;
pub mod filter_context;
pub mod filters;
pub mod options;
pub mod readers;
pub mod writers;

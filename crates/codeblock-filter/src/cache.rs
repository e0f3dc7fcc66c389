/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Content-addressed image cache.
 */

//! Content-addressed storage for rendered artifacts.
//!
//! A cache entry's path is derived from a namespace, the literal source text
//! and an extension:
//!
//! ```text
//! <root>/<namespace>-images/<sha1 of source>.<ext>
//! ```
//!
//! A file that exists at that path is assumed valid. Entries are never
//! invalidated or regenerated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::errors::FilterError;
use crate::filter_context::FilterContext;

/// Maps source text to the path its rendered artifact lives at.
pub trait ContentCache {
    /// Destination path for `content` rendered with extension `ext`.
    ///
    /// Creates the namespace directory on first use.
    fn get(
        &mut self,
        namespace: &str,
        content: &str,
        ext: &str,
        ctx: &mut FilterContext,
    ) -> Result<PathBuf, FilterError>;

    fn exists(&self, path: &Path) -> bool;
}

/// Hex-encoded SHA-1 of the UTF-8 bytes of `content`.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(content.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn file_name(content: &str, ext: &str) -> String {
    let hash = content_hash(content);
    if ext.is_empty() {
        hash
    } else {
        format!("{}.{}", hash, ext)
    }
}

/// Filesystem cache rooted at a directory.
///
/// In cleanup mode each namespace gets a fresh directory under the system
/// temporary directory instead, keeping the working directory clean. It is
/// left in place so the renderer can still read the images after the filter
/// exits.
pub struct ImageDirCache {
    root: PathBuf,
    cleanup: bool,
    temp_dirs: HashMap<String, PathBuf>,
}

impl ImageDirCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cleanup: false,
            temp_dirs: HashMap::new(),
        }
    }

    /// A cache whose directories are temporary.
    pub fn cleanup() -> Self {
        Self {
            root: std::env::temp_dir(),
            cleanup: true,
            temp_dirs: HashMap::new(),
        }
    }

    fn namespace_dir(
        &mut self,
        namespace: &str,
        ctx: &mut FilterContext,
    ) -> Result<PathBuf, FilterError> {
        if self.cleanup {
            if let Some(dir) = self.temp_dirs.get(namespace) {
                return Ok(dir.clone());
            }
            let dir = tempfile::Builder::new()
                .prefix(namespace)
                .tempdir()
                .map_err(|e| FilterError::cache(std::env::temp_dir(), e))?
                .keep();
            tracing::debug!(dir = %dir.display(), "created temporary image directory");
            self.temp_dirs.insert(namespace.to_string(), dir.clone());
            return Ok(dir);
        }

        let dir = self.root.join(format!("{}-images", namespace));
        if !dir.is_dir() {
            std::fs::create_dir_all(&dir).map_err(|e| FilterError::cache(&dir, e))?;
            ctx.info(format!("Created directory {}", dir.display()));
        }
        Ok(dir)
    }
}

impl ContentCache for ImageDirCache {
    fn get(
        &mut self,
        namespace: &str,
        content: &str,
        ext: &str,
        ctx: &mut FilterContext,
    ) -> Result<PathBuf, FilterError> {
        let dir = self.namespace_dir(namespace, ctx)?;
        Ok(dir.join(file_name(content, ext)))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_sha1_hex() {
        assert_eq!(content_hash(""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(content_hash("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_get_builds_namespaced_path() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = ImageDirCache::new(root.path());
        let mut ctx = FilterContext::default();
        let path = cache.get("graphviz", "digraph{a->b}", "png", &mut ctx).unwrap();
        assert_eq!(
            path,
            root.path()
                .join("graphviz-images")
                .join("f60cf6f9ff0d3666e771e195e0466cee0568d92c.png")
        );
        assert!(!cache.exists(&path));
    }

    #[test]
    fn test_directory_created_once_with_diagnostic() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = ImageDirCache::new(root.path());
        let mut ctx = FilterContext::default();
        cache.get("graphviz", "a", "png", &mut ctx).unwrap();
        cache.get("graphviz", "b", "pdf", &mut ctx).unwrap();
        let dir = root.path().join("graphviz-images");
        assert!(dir.is_dir());
        assert_eq!(
            ctx.diagnostics(),
            [format!("Created directory {}", dir.display())]
        );
    }

    #[test]
    fn test_same_content_same_path_different_ext_differs() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = ImageDirCache::new(root.path());
        let mut ctx = FilterContext::default();
        let a = cache.get("graphviz", "x", "png", &mut ctx).unwrap();
        let b = cache.get("graphviz", "x", "png", &mut ctx).unwrap();
        let c = cache.get("graphviz", "x", "pdf", &mut ctx).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_extension_has_no_dot() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = ImageDirCache::new(root.path());
        let mut ctx = FilterContext::default();
        let path = cache.get("graphviz", "", "", &mut ctx).unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("da39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }

    #[test]
    fn test_exists_sees_written_file() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = ImageDirCache::new(root.path());
        let mut ctx = FilterContext::default();
        let path = cache.get("graphviz", "x", "png", &mut ctx).unwrap();
        std::fs::write(&path, b"png").unwrap();
        assert!(cache.exists(&path));
    }

    #[test]
    fn test_cleanup_mode_uses_temp_dir() {
        let mut ctx = FilterContext::default();
        let mut cache = ImageDirCache::cleanup();
        let first = cache.get("graphviz", "x", "png", &mut ctx).unwrap();
        let second = cache.get("graphviz", "y", "png", &mut ctx).unwrap();
        let dir = first.parent().unwrap().to_path_buf();
        assert_eq!(Some(dir.as_path()), second.parent());
        assert!(dir.starts_with(std::env::temp_dir()));
        let name = dir.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("graphviz"));
        drop(cache);
        // outlives the cache so the renderer can read it
        assert!(dir.is_dir());
        assert!(ctx.diagnostics().is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_uncreatable_directory_is_cache_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let mut cache = ImageDirCache::new(&blocker);
        let mut ctx = FilterContext::default();
        let result = cache.get("graphviz", "x", "png", &mut ctx);
        assert!(matches!(result, Err(FilterError::Cache { .. })));
    }
}

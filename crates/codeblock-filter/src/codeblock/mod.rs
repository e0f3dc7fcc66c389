/*
 * codeblock/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Replacement of graphviz and python code blocks.
 */

//! The code block filter.
//!
//! Code blocks are dispatched on their classes:
//!
//! - `graphviz`: the graph is rendered to a cached image and the block
//!   becomes a paragraph holding that image.
//! - `python`: the code is run and the block becomes the code followed by a
//!   block of its quoted output.
//! - anything else is left alone.

pub mod caption;
pub mod graphviz;
pub mod python;

use codeblock_pandoc_types::{
    Block, Blocks, CodeBlock, Image, Inline, Pandoc, Paragraph, attr_with_classes, empty_attr,
};

use crate::cache::{ContentCache, ImageDirCache};
use crate::errors::FilterError;
use crate::filter_context::FilterContext;
use crate::filters::{Filter, FilterReturn, topdown_traverse};
use crate::options::FilterOptions;

use caption::get_caption;
use graphviz::{DiagramRenderer, DotRenderer, image_extension};
use python::{CodeRunner, PythonRunner, format_output};

/// Cache namespace for rendered diagrams.
pub const GRAPHVIZ_NAMESPACE: &str = "graphviz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeBlockKind {
    Graphviz,
    Python,
    Other,
}

impl CodeBlockKind {
    /// Classify by exact class membership. `graphviz` wins over `python`.
    pub fn classify(classes: &[String]) -> Self {
        if classes.iter().any(|c| c == "graphviz") {
            CodeBlockKind::Graphviz
        } else if classes.iter().any(|c| c == "python") {
            CodeBlockKind::Python
        } else {
            CodeBlockKind::Other
        }
    }
}

/// Replaces graphviz and python code blocks.
pub struct CodeBlockFilter {
    cache: Box<dyn ContentCache>,
    renderer: Box<dyn DiagramRenderer>,
    runner: Box<dyn CodeRunner>,
}

impl CodeBlockFilter {
    pub fn new(
        cache: Box<dyn ContentCache>,
        renderer: Box<dyn DiagramRenderer>,
        runner: Box<dyn CodeRunner>,
    ) -> Self {
        Self {
            cache,
            renderer,
            runner,
        }
    }

    /// Build a filter backed by the real `dot` and python executables.
    pub fn from_options(options: &FilterOptions) -> Self {
        let cache = if options.cleanup {
            ImageDirCache::cleanup()
        } else {
            ImageDirCache::new(&options.image_root)
        };
        Self::new(
            Box::new(cache),
            Box::new(DotRenderer::new(&options.dot, &options.layout)),
            Box::new(PythonRunner::new(&options.python)),
        )
    }

    /// Replacement blocks for `code_block`, or `None` when it is not handled.
    pub fn apply(
        &mut self,
        code_block: &CodeBlock,
        ctx: &mut FilterContext,
    ) -> Result<Option<Blocks>, FilterError> {
        match CodeBlockKind::classify(&code_block.attr.1) {
            CodeBlockKind::Graphviz => self.graphviz(code_block, ctx).map(Some),
            CodeBlockKind::Python => self.python(code_block).map(Some),
            CodeBlockKind::Other => Ok(None),
        }
    }

    fn graphviz(
        &mut self,
        code_block: &CodeBlock,
        ctx: &mut FilterContext,
    ) -> Result<Blocks, FilterError> {
        let (ident, _classes, keyvals) = code_block.attr.clone();
        let (caption, typef, keyvals) = get_caption(keyvals);
        let ext = image_extension(&ctx.format);
        let dest = self
            .cache
            .get(GRAPHVIZ_NAMESPACE, &code_block.text, ext, ctx)?;

        if self.cache.exists(&dest) {
            tracing::debug!(dest = %dest.display(), "graphviz image already cached");
        } else {
            self.renderer.render(&code_block.text, ext, &dest)?;
            ctx.info(format!("Created image {}", dest.display()));
        }

        let image = Image {
            attr: (ident, Vec::new(), keyvals),
            content: caption,
            target: (dest.to_string_lossy().into_owned(), typef),
        };
        Ok(vec![Block::Paragraph(Paragraph {
            content: vec![Inline::Image(image)],
        })])
    }

    fn python(&mut self, code_block: &CodeBlock) -> Result<Blocks, FilterError> {
        let stdout = self.runner.run(&code_block.text)?;
        Ok(vec![
            Block::CodeBlock(CodeBlock::new(
                attr_with_classes(["python"]),
                code_block.text.clone(),
            )),
            Block::CodeBlock(CodeBlock::new(empty_attr(), format_output(&stdout))),
        ])
    }

    /// Run the filter over a whole document.
    pub fn filter_document(
        &mut self,
        pandoc: Pandoc,
        ctx: &mut FilterContext,
    ) -> Result<Pandoc, FilterError> {
        let mut filter = Filter::new().with_code_block(|code_block, ctx| {
            Ok(match self.apply(&code_block, ctx)? {
                Some(blocks) => FilterReturn::FilterResult(blocks, true),
                None => FilterReturn::Unchanged(code_block),
            })
        });
        topdown_traverse(pandoc, &mut filter, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeblock_pandoc_types::Str;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    /// Writes the source into `dest` and records each call.
    struct FakeRenderer {
        calls: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl DiagramRenderer for FakeRenderer {
        fn render(&self, source: &str, ext: &str, dest: &Path) -> Result<(), FilterError> {
            self.calls
                .borrow_mut()
                .push((source.to_string(), ext.to_string()));
            std::fs::write(dest, source).map_err(|e| FilterError::cache(dest, e))
        }
    }

    struct FakeRunner(&'static str);

    impl CodeRunner for FakeRunner {
        fn run(&self, _code: &str) -> Result<String, FilterError> {
            Ok(self.0.to_string())
        }
    }

    fn fake_filter(
        root: &Path,
        stdout: &'static str,
    ) -> (CodeBlockFilter, Rc<RefCell<Vec<(String, String)>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let filter = CodeBlockFilter::new(
            Box::new(ImageDirCache::new(root)),
            Box::new(FakeRenderer {
                calls: calls.clone(),
            }),
            Box::new(FakeRunner(stdout)),
        );
        (filter, calls)
    }

    fn code(ident: &str, classes: &[&str], text: &str) -> CodeBlock {
        let attr = (
            ident.to_string(),
            classes.iter().map(|c| c.to_string()).collect(),
            Vec::new(),
        );
        CodeBlock::new(attr, text)
    }

    #[test]
    fn test_classify() {
        let classes = |cs: &[&str]| cs.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        assert_eq!(CodeBlockKind::classify(&classes(&["graphviz"])), CodeBlockKind::Graphviz);
        assert_eq!(CodeBlockKind::classify(&classes(&["python"])), CodeBlockKind::Python);
        assert_eq!(
            CodeBlockKind::classify(&classes(&["python", "graphviz"])),
            CodeBlockKind::Graphviz
        );
        assert_eq!(
            CodeBlockKind::classify(&classes(&["numberLines", "python"])),
            CodeBlockKind::Python
        );
        assert_eq!(CodeBlockKind::classify(&classes(&["Python"])), CodeBlockKind::Other);
        assert_eq!(CodeBlockKind::classify(&classes(&["py"])), CodeBlockKind::Other);
        assert_eq!(CodeBlockKind::classify(&[]), CodeBlockKind::Other);
    }

    #[test]
    fn test_other_blocks_are_not_handled() {
        let root = tempfile::tempdir().unwrap();
        let (mut filter, calls) = fake_filter(root.path(), "");
        let mut ctx = FilterContext::new("html");
        let result = filter.apply(&code("", &["rust"], "fn main() {}"), &mut ctx).unwrap();
        assert!(result.is_none());
        assert!(calls.borrow().is_empty());
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_python_block_becomes_code_and_output() {
        let root = tempfile::tempdir().unwrap();
        let (mut filter, _) = fake_filter(root.path(), "2\n");
        let mut ctx = FilterContext::new("html");
        let result = filter
            .apply(&code("", &["python"], "print(1+1)\n"), &mut ctx)
            .unwrap();
        assert_eq!(
            result,
            Some(vec![
                Block::CodeBlock(CodeBlock::new(attr_with_classes(["python"]), "print(1+1)\n")),
                Block::CodeBlock(CodeBlock::new(empty_attr(), "> 2")),
            ])
        );
    }

    #[test]
    fn test_python_replacement_drops_identifier_and_extra_classes() {
        let root = tempfile::tempdir().unwrap();
        let (mut filter, _) = fake_filter(root.path(), "");
        let mut ctx = FilterContext::default();
        let result = filter
            .apply(&code("snippet", &["python", "numberLines"], "pass\n"), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(
            result[0],
            Block::CodeBlock(CodeBlock::new(attr_with_classes(["python"]), "pass\n"))
        );
        assert_eq!(result[1], Block::CodeBlock(CodeBlock::new(empty_attr(), "")));
    }

    fn only_image(blocks: &Blocks) -> &Image {
        match blocks.as_slice() {
            [Block::Paragraph(Paragraph { content })] => match content.as_slice() {
                [Inline::Image(image)] => image,
                other => panic!("expected a single image, got {:?}", other),
            },
            other => panic!("expected a single paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_graphviz_latex_renders_pdf_once() {
        let root = tempfile::tempdir().unwrap();
        let (mut filter, calls) = fake_filter(root.path(), "");
        let mut ctx = FilterContext::new("latex");
        let block = code("fig1", &["graphviz"], "digraph{a->b}");

        let first = filter.apply(&block, &mut ctx).unwrap().unwrap();
        let image = only_image(&first);
        assert_eq!(image.attr.0, "fig1");
        assert!(image.attr.1.is_empty());
        assert!(image.content.is_empty());
        assert!(image.target.0.ends_with(".pdf"));
        assert_eq!(image.target.1, "");

        let dest = image.target.0.clone();
        let dir = root.path().join("graphviz-images");
        assert_eq!(
            ctx.take_diagnostics(),
            vec![
                format!("Created directory {}", dir.display()),
                format!("Created image {}", dest),
            ]
        );

        let second = filter.apply(&block, &mut ctx).unwrap().unwrap();
        assert_eq!(first, second);
        assert!(ctx.diagnostics().is_empty());
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(calls.borrow()[0], ("digraph{a->b}".to_string(), "pdf".to_string()));
    }

    #[test]
    fn test_graphviz_caption_and_attributes() {
        let root = tempfile::tempdir().unwrap();
        let (mut filter, _) = fake_filter(root.path(), "");
        let mut ctx = FilterContext::new("html");
        let mut block = code("", &["graphviz", "wide"], "graph{x}");
        block.attr.2 = vec![
            ("caption".to_string(), "Draft".to_string()),
            ("width".to_string(), "80%".to_string()),
            ("caption".to_string(), "My graph".to_string()),
        ];

        let blocks = filter.apply(&block, &mut ctx).unwrap().unwrap();
        let image = only_image(&blocks);
        assert!(image.attr.1.is_empty());
        assert_eq!(
            image.attr.2,
            vec![("width".to_string(), "80%".to_string())]
        );
        assert_eq!(image.content, vec![Inline::Str(Str::new("My graph"))]);
        assert_eq!(image.target.1, "fig:");
        assert!(image.target.0.ends_with(".png"));
    }

    #[test]
    fn test_render_failure_propagates() {
        struct Failing;
        impl DiagramRenderer for Failing {
            fn render(&self, _: &str, _: &str, dest: &Path) -> Result<(), FilterError> {
                Err(FilterError::RenderFailed {
                    dest: dest.to_path_buf(),
                    status: 1,
                    stderr: "syntax error".to_string(),
                })
            }
        }
        let root = tempfile::tempdir().unwrap();
        let mut filter = CodeBlockFilter::new(
            Box::new(ImageDirCache::new(root.path())),
            Box::new(Failing),
            Box::new(FakeRunner("")),
        );
        let mut ctx = FilterContext::new("html");
        let result = filter.apply(&code("", &["graphviz"], "digraph{"), &mut ctx);
        assert!(matches!(result, Err(FilterError::RenderFailed { .. })));
        assert!(
            !ctx.diagnostics()
                .iter()
                .any(|d| d.starts_with("Created image"))
        );
    }

    #[test]
    fn test_filter_document_leaves_other_blocks_alone() {
        let root = tempfile::tempdir().unwrap();
        let (mut filter, _) = fake_filter(root.path(), "out\n");
        let mut ctx = FilterContext::new("html");
        let untouched = Block::CodeBlock(code("", &["sh"], "ls"));
        let pandoc = Pandoc {
            blocks: vec![untouched.clone(), Block::CodeBlock(code("", &["python"], "x"))],
            ..Default::default()
        };
        let out = filter.filter_document(pandoc, &mut ctx).unwrap();
        assert_eq!(out.blocks.len(), 3);
        assert_eq!(out.blocks[0], untouched);
        assert_eq!(
            out.blocks[2],
            Block::CodeBlock(CodeBlock::new(empty_attr(), "> out"))
        );
    }
}

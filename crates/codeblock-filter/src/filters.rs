/*
 * filters.rs
 * Copyright (c) 2025 Posit, PBC
 */

use crate::errors::FilterError;
use crate::filter_context::FilterContext;
use codeblock_pandoc_types::{
    self as pandoc, Block, Blocks, Caption, Inline, Inlines, Meta, MetaValue, Pandoc, Row,
};

// filters are destructive and take ownership of the input

pub enum FilterReturn<T, U> {
    Unchanged(T),
    FilterResult(U, bool), // (new content, should recurse)
}

type Result<T> = std::result::Result<T, FilterError>;

type BlockFilterFn<'a, T> =
    Box<dyn FnMut(T, &mut FilterContext) -> Result<FilterReturn<T, Blocks>> + 'a>;
type BlockFilterField<'a, T> = Option<BlockFilterFn<'a, T>>;

/// Block-level hooks applied during a top-down walk.
///
/// A specific hook (`code_block`) takes precedence over the generic `block`
/// hook for the nodes it covers. When a hook returns
/// `FilterResult(blocks, true)` the walk descends into the *children* of the
/// returned blocks; the hooks are not applied to the returned blocks
/// themselves, so a hook may return a node of the kind it matches.
pub struct Filter<'a> {
    pub block: BlockFilterField<'a, Block>,
    pub code_block: BlockFilterField<'a, pandoc::CodeBlock>,
}

impl Default for Filter<'static> {
    fn default() -> Filter<'static> {
        Filter {
            block: None,
            code_block: None,
        }
    }
}

impl Filter<'static> {
    pub fn new() -> Filter<'static> {
        Self::default()
    }
}

impl<'a> Filter<'a> {
    pub fn with_block<F>(mut self, f: F) -> Filter<'a>
    where
        F: FnMut(Block, &mut FilterContext) -> Result<FilterReturn<Block, Blocks>> + 'a,
    {
        self.block = Some(Box::new(f));
        self
    }

    pub fn with_code_block<F>(mut self, f: F) -> Filter<'a>
    where
        F: FnMut(
                pandoc::CodeBlock,
                &mut FilterContext,
            ) -> Result<FilterReturn<pandoc::CodeBlock, Blocks>>
            + 'a,
    {
        self.code_block = Some(Box::new(f));
        self
    }
}

macro_rules! blocks_apply_and_maybe_recurse {
    ($item:expr, $filter_fn:expr, $wrap:expr, $filter:expr, $ctx:expr) => {
        match $filter_fn($item, $ctx)? {
            FilterReturn::Unchanged(node) => {
                Ok(vec![traverse_block_structure($wrap(node), $filter, $ctx)?])
            }
            FilterReturn::FilterResult(new_content, true) => new_content
                .into_iter()
                .map(|block| traverse_block_structure(block, $filter, $ctx))
                .collect(),
            FilterReturn::FilterResult(new_content, false) => Ok(new_content),
        }
    };
}

pub fn topdown_traverse(
    pandoc: Pandoc,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Pandoc> {
    // meta is walked before blocks, matching the key order of the JSON document
    let meta = topdown_traverse_meta(pandoc.meta, filter, ctx)?;
    let blocks = topdown_traverse_blocks(pandoc.blocks, filter, ctx)?;
    Ok(Pandoc {
        api_version: pandoc.api_version,
        meta,
        blocks,
    })
}

pub fn topdown_traverse_blocks(
    blocks: Blocks,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Blocks> {
    let mut result = Vec::with_capacity(blocks.len());
    for block in blocks {
        result.extend(topdown_traverse_block(block, filter, ctx)?);
    }
    Ok(result)
}

pub fn topdown_traverse_block(
    block: Block,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Blocks> {
    if let Block::CodeBlock(code) = block {
        if let Some(f) = &mut filter.code_block {
            return blocks_apply_and_maybe_recurse!(code, f, Block::CodeBlock, filter, ctx);
        }
        return apply_generic_block_filter(Block::CodeBlock(code), filter, ctx);
    }
    apply_generic_block_filter(block, filter, ctx)
}

fn apply_generic_block_filter(
    block: Block,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Blocks> {
    if let Some(f) = &mut filter.block {
        return blocks_apply_and_maybe_recurse!(block, f, std::convert::identity, filter, ctx);
    }
    Ok(vec![traverse_block_structure(block, filter, ctx)?])
}

fn traverse_blockss(
    blockss: Vec<Blocks>,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Vec<Blocks>> {
    blockss
        .into_iter()
        .map(|blocks| topdown_traverse_blocks(blocks, filter, ctx))
        .collect()
}

fn traverse_caption(
    caption: Caption,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Caption> {
    Ok(Caption {
        short: caption
            .short
            .map(|short| topdown_traverse_inlines(short, filter, ctx))
            .transpose()?,
        long: topdown_traverse_blocks(caption.long, filter, ctx)?,
    })
}

fn traverse_rows(rows: Vec<Row>, filter: &mut Filter, ctx: &mut FilterContext) -> Result<Vec<Row>> {
    rows.into_iter()
        .map(|row| {
            let cells = row
                .cells
                .into_iter()
                .map(|cell| {
                    Ok(pandoc::Cell {
                        content: topdown_traverse_blocks(cell.content, filter, ctx)?,
                        ..cell
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Row { cells, ..row })
        })
        .collect()
}

/// Walk the children of a block without applying hooks to the block itself.
fn traverse_block_structure(
    block: Block,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Block> {
    Ok(match block {
        Block::CodeBlock(_) | Block::RawBlock(_) | Block::HorizontalRule(_) => block,
        Block::Plain(plain) => Block::Plain(pandoc::Plain {
            content: topdown_traverse_inlines(plain.content, filter, ctx)?,
        }),
        Block::Paragraph(para) => Block::Paragraph(pandoc::Paragraph {
            content: topdown_traverse_inlines(para.content, filter, ctx)?,
        }),
        Block::LineBlock(lines) => Block::LineBlock(pandoc::LineBlock {
            content: lines
                .content
                .into_iter()
                .map(|inlines| topdown_traverse_inlines(inlines, filter, ctx))
                .collect::<Result<Vec<_>>>()?,
        }),
        Block::BlockQuote(quote) => Block::BlockQuote(pandoc::BlockQuote {
            content: topdown_traverse_blocks(quote.content, filter, ctx)?,
        }),
        Block::OrderedList(list) => Block::OrderedList(pandoc::OrderedList {
            content: traverse_blockss(list.content, filter, ctx)?,
            ..list
        }),
        Block::BulletList(list) => Block::BulletList(pandoc::BulletList {
            content: traverse_blockss(list.content, filter, ctx)?,
        }),
        Block::DefinitionList(deflist) => Block::DefinitionList(pandoc::DefinitionList {
            content: deflist
                .content
                .into_iter()
                .map(|(term, definitions)| {
                    Ok((
                        topdown_traverse_inlines(term, filter, ctx)?,
                        traverse_blockss(definitions, filter, ctx)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?,
        }),
        Block::Header(header) => Block::Header(pandoc::Header {
            content: topdown_traverse_inlines(header.content, filter, ctx)?,
            ..header
        }),
        Block::Table(table) => Block::Table(pandoc::Table {
            caption: traverse_caption(table.caption, filter, ctx)?,
            head: pandoc::TableHead {
                rows: traverse_rows(table.head.rows, filter, ctx)?,
                ..table.head
            },
            bodies: table
                .bodies
                .into_iter()
                .map(|body| {
                    Ok(pandoc::TableBody {
                        head: traverse_rows(body.head, filter, ctx)?,
                        body: traverse_rows(body.body, filter, ctx)?,
                        ..body
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            foot: pandoc::TableFoot {
                rows: traverse_rows(table.foot.rows, filter, ctx)?,
                ..table.foot
            },
            ..table
        }),
        Block::Figure(figure) => Block::Figure(pandoc::Figure {
            caption: traverse_caption(figure.caption, filter, ctx)?,
            content: topdown_traverse_blocks(figure.content, filter, ctx)?,
            ..figure
        }),
        Block::Div(div) => Block::Div(pandoc::Div {
            content: topdown_traverse_blocks(div.content, filter, ctx)?,
            ..div
        }),
    })
}

/// Walk inline content looking for block containers (notes).
pub fn topdown_traverse_inlines(
    inlines: Inlines,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Inlines> {
    inlines
        .into_iter()
        .map(|inline| traverse_inline_structure(inline, filter, ctx))
        .collect()
}

macro_rules! rebuild_simple_inline {
    ($variant:ident, $value:ident, $filter:expr, $ctx:expr) => {
        Inline::$variant(pandoc::$variant {
            content: topdown_traverse_inlines($value.content, $filter, $ctx)?,
        })
    };
}

fn traverse_inline_structure(
    inline: Inline,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Inline> {
    Ok(match inline {
        Inline::Str(_)
        | Inline::Code(_)
        | Inline::Space(_)
        | Inline::SoftBreak(_)
        | Inline::LineBreak(_)
        | Inline::Math(_)
        | Inline::RawInline(_) => inline,
        Inline::Emph(e) => rebuild_simple_inline!(Emph, e, filter, ctx),
        Inline::Underline(u) => rebuild_simple_inline!(Underline, u, filter, ctx),
        Inline::Strong(s) => rebuild_simple_inline!(Strong, s, filter, ctx),
        Inline::Strikeout(s) => rebuild_simple_inline!(Strikeout, s, filter, ctx),
        Inline::Superscript(s) => rebuild_simple_inline!(Superscript, s, filter, ctx),
        Inline::Subscript(s) => rebuild_simple_inline!(Subscript, s, filter, ctx),
        Inline::SmallCaps(s) => rebuild_simple_inline!(SmallCaps, s, filter, ctx),
        Inline::Quoted(q) => Inline::Quoted(pandoc::Quoted {
            content: topdown_traverse_inlines(q.content, filter, ctx)?,
            ..q
        }),
        Inline::Cite(c) => Inline::Cite(pandoc::Cite {
            citations: c
                .citations
                .into_iter()
                .map(|cit| {
                    Ok(pandoc::Citation {
                        prefix: topdown_traverse_inlines(cit.prefix, filter, ctx)?,
                        suffix: topdown_traverse_inlines(cit.suffix, filter, ctx)?,
                        ..cit
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            content: topdown_traverse_inlines(c.content, filter, ctx)?,
        }),
        Inline::Link(l) => Inline::Link(pandoc::Link {
            content: topdown_traverse_inlines(l.content, filter, ctx)?,
            ..l
        }),
        Inline::Image(i) => Inline::Image(pandoc::Image {
            content: topdown_traverse_inlines(i.content, filter, ctx)?,
            ..i
        }),
        Inline::Span(s) => Inline::Span(pandoc::Span {
            content: topdown_traverse_inlines(s.content, filter, ctx)?,
            ..s
        }),
        Inline::Note(note) => Inline::Note(pandoc::Note {
            content: topdown_traverse_blocks(note.content, filter, ctx)?,
        }),
    })
}

pub fn topdown_traverse_meta(
    meta: Meta,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<Meta> {
    let mut result = Meta::new();
    for (key, value) in meta {
        result.insert(key, topdown_traverse_meta_value(value, filter, ctx)?);
    }
    Ok(result)
}

fn topdown_traverse_meta_value(
    value: MetaValue,
    filter: &mut Filter,
    ctx: &mut FilterContext,
) -> Result<MetaValue> {
    Ok(match value {
        MetaValue::MetaString(_) | MetaValue::MetaBool(_) => value,
        MetaValue::MetaInlines(inlines) => {
            MetaValue::MetaInlines(topdown_traverse_inlines(inlines, filter, ctx)?)
        }
        MetaValue::MetaBlocks(blocks) => {
            MetaValue::MetaBlocks(topdown_traverse_blocks(blocks, filter, ctx)?)
        }
        MetaValue::MetaList(items) => MetaValue::MetaList(
            items
                .into_iter()
                .map(|item| topdown_traverse_meta_value(item, filter, ctx))
                .collect::<Result<Vec<_>>>()?,
        ),
        MetaValue::MetaMap(entries) => {
            MetaValue::MetaMap(topdown_traverse_meta(entries, filter, ctx)?)
        }
    })
}

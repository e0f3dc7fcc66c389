/*
 * json.rs
 * Copyright (c) 2025 Posit, PBC
 */

use codeblock_pandoc_types::{
    Alignment, Attr, Block, Caption, Cell, Citation, CitationMode, ColWidth, Inline, Inlines,
    ListAttributes, ListNumberDelim, ListNumberStyle, MathType, Meta, MetaValue, Pandoc,
    QuoteType, Row, TableBody, TableFoot, TableHead, Target,
};
use serde_json::{Map, Value, json};

#[derive(Debug, thiserror::Error)]
pub enum JsonWriteError {
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

fn write_attr(attr: &Attr) -> Value {
    json!([
        attr.0,
        attr.1,
        attr.2
            .iter()
            .map(|(k, v)| json!([k, v]))
            .collect::<Vec<_>>()
    ])
}

fn write_target(target: &Target) -> Value {
    json!([target.0, target.1])
}

fn write_citation_mode(mode: &CitationMode) -> Value {
    match mode {
        CitationMode::NormalCitation => json!({"t": "NormalCitation"}),
        CitationMode::AuthorInText => json!({"t": "AuthorInText"}),
        CitationMode::SuppressAuthor => json!({"t": "SuppressAuthor"}),
    }
}

fn write_citation(citation: &Citation) -> Value {
    json!({
        "citationId": citation.id,
        "citationPrefix": write_inlines(&citation.prefix),
        "citationSuffix": write_inlines(&citation.suffix),
        "citationMode": write_citation_mode(&citation.mode),
        "citationNoteNum": citation.note_num,
        "citationHash": citation.hash,
    })
}

fn write_inline(inline: &Inline) -> Value {
    match inline {
        Inline::Str(s) => json!({"t": "Str", "c": s.text}),
        Inline::Emph(e) => json!({"t": "Emph", "c": write_inlines(&e.content)}),
        Inline::Underline(u) => json!({"t": "Underline", "c": write_inlines(&u.content)}),
        Inline::Strong(s) => json!({"t": "Strong", "c": write_inlines(&s.content)}),
        Inline::Strikeout(s) => json!({"t": "Strikeout", "c": write_inlines(&s.content)}),
        Inline::Superscript(s) => json!({"t": "Superscript", "c": write_inlines(&s.content)}),
        Inline::Subscript(s) => json!({"t": "Subscript", "c": write_inlines(&s.content)}),
        Inline::SmallCaps(s) => json!({"t": "SmallCaps", "c": write_inlines(&s.content)}),
        Inline::Quoted(q) => {
            let quote_type = match q.quote_type {
                QuoteType::SingleQuote => json!({"t": "SingleQuote"}),
                QuoteType::DoubleQuote => json!({"t": "DoubleQuote"}),
            };
            json!({"t": "Quoted", "c": [quote_type, write_inlines(&q.content)]})
        }
        Inline::Cite(c) => json!({
            "t": "Cite",
            "c": [
                c.citations.iter().map(write_citation).collect::<Vec<_>>(),
                write_inlines(&c.content)
            ]
        }),
        Inline::Code(c) => json!({"t": "Code", "c": [write_attr(&c.attr), c.text]}),
        Inline::Space(_) => json!({"t": "Space"}),
        Inline::SoftBreak(_) => json!({"t": "SoftBreak"}),
        Inline::LineBreak(_) => json!({"t": "LineBreak"}),
        Inline::Math(m) => {
            let math_type = match m.math_type {
                MathType::InlineMath => json!({"t": "InlineMath"}),
                MathType::DisplayMath => json!({"t": "DisplayMath"}),
            };
            json!({"t": "Math", "c": [math_type, m.text]})
        }
        Inline::RawInline(r) => json!({"t": "RawInline", "c": [r.format, r.text]}),
        Inline::Link(l) => json!({
            "t": "Link",
            "c": [write_attr(&l.attr), write_inlines(&l.content), write_target(&l.target)]
        }),
        Inline::Image(i) => json!({
            "t": "Image",
            "c": [write_attr(&i.attr), write_inlines(&i.content), write_target(&i.target)]
        }),
        Inline::Note(n) => json!({"t": "Note", "c": write_blocks(&n.content)}),
        Inline::Span(s) => json!({
            "t": "Span",
            "c": [write_attr(&s.attr), write_inlines(&s.content)]
        }),
    }
}

fn write_inlines(inlines: &Inlines) -> Value {
    Value::Array(inlines.iter().map(write_inline).collect())
}

fn write_list_attributes(attr: &ListAttributes) -> Value {
    let style = match attr.1 {
        ListNumberStyle::Default => "DefaultStyle",
        ListNumberStyle::Example => "Example",
        ListNumberStyle::Decimal => "Decimal",
        ListNumberStyle::LowerRoman => "LowerRoman",
        ListNumberStyle::UpperRoman => "UpperRoman",
        ListNumberStyle::LowerAlpha => "LowerAlpha",
        ListNumberStyle::UpperAlpha => "UpperAlpha",
    };
    let delim = match attr.2 {
        ListNumberDelim::Default => "DefaultDelim",
        ListNumberDelim::Period => "Period",
        ListNumberDelim::OneParen => "OneParen",
        ListNumberDelim::TwoParens => "TwoParens",
    };
    json!([attr.0, {"t": style}, {"t": delim}])
}

fn write_blockss(blockss: &[Vec<Block>]) -> Value {
    Value::Array(blockss.iter().map(|blocks| write_blocks(blocks)).collect())
}

fn write_caption(caption: &Caption) -> Value {
    json!([
        caption.short.as_ref().map(write_inlines),
        write_blocks(&caption.long),
    ])
}

fn write_alignment(alignment: &Alignment) -> Value {
    match alignment {
        Alignment::Left => json!({"t": "AlignLeft"}),
        Alignment::Center => json!({"t": "AlignCenter"}),
        Alignment::Right => json!({"t": "AlignRight"}),
        Alignment::Default => json!({"t": "AlignDefault"}),
    }
}

fn write_colwidth(colwidth: &ColWidth) -> Value {
    match colwidth {
        ColWidth::Default => json!({"t": "ColWidthDefault"}),
        ColWidth::Percentage(p) => json!({"t": "ColWidth", "c": p}),
    }
}

fn write_cell(cell: &Cell) -> Value {
    json!([
        write_attr(&cell.attr),
        write_alignment(&cell.alignment),
        cell.row_span,
        cell.col_span,
        write_blocks(&cell.content)
    ])
}

fn write_row(row: &Row) -> Value {
    json!([
        write_attr(&row.attr),
        row.cells.iter().map(write_cell).collect::<Vec<_>>()
    ])
}

fn write_rows(rows: &[Row]) -> Value {
    Value::Array(rows.iter().map(write_row).collect())
}

fn write_table_head(head: &TableHead) -> Value {
    json!([write_attr(&head.attr), write_rows(&head.rows)])
}

fn write_table_body(body: &TableBody) -> Value {
    json!([
        write_attr(&body.attr),
        body.rowhead_columns,
        write_rows(&body.head),
        write_rows(&body.body)
    ])
}

fn write_table_foot(foot: &TableFoot) -> Value {
    json!([write_attr(&foot.attr), write_rows(&foot.rows)])
}

fn write_block(block: &Block) -> Value {
    match block {
        Block::Plain(plain) => json!({"t": "Plain", "c": write_inlines(&plain.content)}),
        Block::Paragraph(para) => json!({"t": "Para", "c": write_inlines(&para.content)}),
        Block::LineBlock(lines) => json!({
            "t": "LineBlock",
            "c": lines.content.iter().map(write_inlines).collect::<Vec<_>>()
        }),
        Block::CodeBlock(code) => json!({
            "t": "CodeBlock",
            "c": [write_attr(&code.attr), code.text]
        }),
        Block::RawBlock(raw) => json!({"t": "RawBlock", "c": [raw.format, raw.text]}),
        Block::BlockQuote(quote) => json!({"t": "BlockQuote", "c": write_blocks(&quote.content)}),
        Block::OrderedList(list) => json!({
            "t": "OrderedList",
            "c": [write_list_attributes(&list.attr), write_blockss(&list.content)]
        }),
        Block::BulletList(list) => json!({"t": "BulletList", "c": write_blockss(&list.content)}),
        Block::DefinitionList(deflist) => json!({
            "t": "DefinitionList",
            "c": deflist
                .content
                .iter()
                .map(|(term, definition)| json!([write_inlines(term), write_blockss(definition)]))
                .collect::<Vec<_>>()
        }),
        Block::Header(header) => json!({
            "t": "Header",
            "c": [header.level, write_attr(&header.attr), write_inlines(&header.content)]
        }),
        Block::HorizontalRule(_) => json!({"t": "HorizontalRule"}),
        Block::Table(table) => json!({
            "t": "Table",
            "c": [
                write_attr(&table.attr),
                write_caption(&table.caption),
                table
                    .colspec
                    .iter()
                    .map(|(align, width)| json!([write_alignment(align), write_colwidth(width)]))
                    .collect::<Vec<_>>(),
                write_table_head(&table.head),
                table.bodies.iter().map(write_table_body).collect::<Vec<_>>(),
                write_table_foot(&table.foot)
            ]
        }),
        Block::Figure(figure) => json!({
            "t": "Figure",
            "c": [
                write_attr(&figure.attr),
                write_caption(&figure.caption),
                write_blocks(&figure.content)
            ]
        }),
        Block::Div(div) => json!({
            "t": "Div",
            "c": [write_attr(&div.attr), write_blocks(&div.content)]
        }),
    }
}

fn write_blocks(blocks: &[Block]) -> Value {
    Value::Array(blocks.iter().map(write_block).collect())
}

fn write_meta_value(value: &MetaValue) -> Value {
    match value {
        MetaValue::MetaString(s) => json!({"t": "MetaString", "c": s}),
        MetaValue::MetaBool(b) => json!({"t": "MetaBool", "c": b}),
        MetaValue::MetaInlines(inlines) => json!({"t": "MetaInlines", "c": write_inlines(inlines)}),
        MetaValue::MetaBlocks(blocks) => json!({"t": "MetaBlocks", "c": write_blocks(blocks)}),
        MetaValue::MetaList(items) => json!({
            "t": "MetaList",
            "c": items.iter().map(write_meta_value).collect::<Vec<_>>()
        }),
        MetaValue::MetaMap(entries) => json!({"t": "MetaMap", "c": write_meta(entries)}),
    }
}

fn write_meta(meta: &Meta) -> Value {
    let mut map = Map::new();
    for (key, value) in meta {
        map.insert(key.clone(), write_meta_value(value));
    }
    Value::Object(map)
}

fn write_pandoc(pandoc: &Pandoc) -> Value {
    json!({
        "pandoc-api-version": pandoc.api_version,
        "meta": write_meta(&pandoc.meta),
        "blocks": write_blocks(&pandoc.blocks),
    })
}

pub fn write<W: std::io::Write>(pandoc: &Pandoc, writer: &mut W) -> Result<(), JsonWriteError> {
    serde_json::to_writer(&mut *writer, &write_pandoc(pandoc))?;
    writer.flush()?;
    Ok(())
}

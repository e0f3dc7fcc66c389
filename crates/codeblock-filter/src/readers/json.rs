/*
 * json.rs
 * Copyright (c) 2025 Posit, PBC
 */

use codeblock_pandoc_types::{
    Alignment, Attr, Block, BlockQuote, BulletList, Caption, Cell, Citation, CitationMode, Cite,
    Code, CodeBlock, ColSpec, ColWidth, DefinitionList, Div, Emph, Figure, Header, HorizontalRule,
    Image, Inline, Inlines, LineBlock, LineBreak, Link, ListAttributes, ListNumberDelim,
    ListNumberStyle, Math, MathType, Meta, MetaValue, Note, OrderedList, Pandoc, Paragraph, Plain,
    QuoteType, Quoted, RawBlock, RawInline, Row, SmallCaps, SoftBreak, Space, Span, Str,
    Strikeout, Strong, Subscript, Superscript, Table, TableBody, TableFoot, TableHead, Target,
    Underline,
};
use serde_json::{Map, Value};

#[derive(Debug)]
pub enum JsonReadError {
    InvalidJson(serde_json::Error),
    MissingField(String),
    InvalidType(String),
    UnsupportedVariant(String),
}

impl std::fmt::Display for JsonReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonReadError::InvalidJson(e) => write!(f, "Invalid JSON: {}", e),
            JsonReadError::MissingField(field) => write!(f, "Missing required field: {}", field),
            JsonReadError::InvalidType(msg) => write!(f, "Invalid type: {}", msg),
            JsonReadError::UnsupportedVariant(variant) => {
                write!(f, "Unsupported variant: {}", variant)
            }
        }
    }
}

impl std::error::Error for JsonReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JsonReadError::InvalidJson(e) => Some(e),
            _ => None,
        }
    }
}

type Result<T> = std::result::Result<T, JsonReadError>;

fn invalid<T>(msg: &str) -> Result<T> {
    Err(JsonReadError::InvalidType(msg.to_string()))
}

fn read_tag(value: &Value) -> Result<(&str, Option<&Value>)> {
    let obj = value
        .as_object()
        .ok_or_else(|| JsonReadError::InvalidType("Expected tagged object".to_string()))?;
    let t = obj
        .get("t")
        .and_then(|v| v.as_str())
        .ok_or_else(|| JsonReadError::MissingField("t".to_string()))?;
    Ok((t, obj.get("c")))
}

fn content(c: Option<&Value>) -> Result<&Value> {
    c.ok_or_else(|| JsonReadError::MissingField("c".to_string()))
}

/// Read `c` as an array of exactly `len` elements.
fn content_array<'a>(c: Option<&'a Value>, what: &str, len: usize) -> Result<&'a [Value]> {
    let arr = content(c)?
        .as_array()
        .ok_or_else(|| JsonReadError::InvalidType(format!("{} content must be array", what)))?;
    if arr.len() != len {
        return Err(JsonReadError::InvalidType(format!(
            "{} array must have {} elements",
            what, len
        )));
    }
    Ok(arr)
}

fn read_string(value: &Value, what: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| JsonReadError::InvalidType(format!("{} must be string", what)))
}

fn read_usize(value: &Value, what: &str) -> Result<usize> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| {
            JsonReadError::InvalidType(format!("{} must be a non-negative integer", what))
        })
}

fn read_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| JsonReadError::InvalidType(format!("{} must be array", what)))
}

fn read_attr(value: &Value) -> Result<Attr> {
    let arr = read_array(value, "Attr")?;
    if arr.len() != 3 {
        return invalid("Attr array must have 3 elements");
    }

    let id = read_string(&arr[0], "Attr id")?;

    let classes = read_array(&arr[1], "Attr classes")?
        .iter()
        .map(|v| read_string(v, "Class"))
        .collect::<Result<Vec<_>>>()?;

    let mut kvs = Vec::new();
    for kv in read_array(&arr[2], "Attr key-values")? {
        let kv_arr = read_array(kv, "Key-value pair")?;
        if kv_arr.len() != 2 {
            return invalid("Key-value pair must have 2 elements");
        }
        kvs.push((
            read_string(&kv_arr[0], "Key")?,
            read_string(&kv_arr[1], "Value")?,
        ));
    }

    Ok((id, classes, kvs))
}

fn read_target(value: &Value) -> Result<Target> {
    let arr = read_array(value, "Target")?;
    if arr.len() != 2 {
        return invalid("Target array must have 2 elements");
    }
    Ok((
        read_string(&arr[0], "Target url")?,
        read_string(&arr[1], "Target title")?,
    ))
}

fn read_citation_mode(value: &Value) -> Result<CitationMode> {
    let (t, _) = read_tag(value)?;
    match t {
        "NormalCitation" => Ok(CitationMode::NormalCitation),
        "AuthorInText" => Ok(CitationMode::AuthorInText),
        "SuppressAuthor" => Ok(CitationMode::SuppressAuthor),
        _ => Err(JsonReadError::UnsupportedVariant(format!(
            "CitationMode: {}",
            t
        ))),
    }
}

fn read_citation(value: &Value) -> Result<Citation> {
    let obj = value
        .as_object()
        .ok_or_else(|| JsonReadError::InvalidType("Expected object for Citation".to_string()))?;
    let field = |name: &str| {
        obj.get(name)
            .ok_or_else(|| JsonReadError::MissingField(name.to_string()))
    };
    Ok(Citation {
        id: read_string(field("citationId")?, "citationId")?,
        prefix: read_inlines(field("citationPrefix")?)?,
        suffix: read_inlines(field("citationSuffix")?)?,
        mode: read_citation_mode(field("citationMode")?)?,
        note_num: read_usize(field("citationNoteNum")?, "citationNoteNum")?,
        hash: read_usize(field("citationHash")?, "citationHash")?,
    })
}

fn read_quote_type(value: &Value) -> Result<QuoteType> {
    match read_tag(value)?.0 {
        "SingleQuote" => Ok(QuoteType::SingleQuote),
        "DoubleQuote" => Ok(QuoteType::DoubleQuote),
        t => Err(JsonReadError::UnsupportedVariant(format!("QuoteType: {}", t))),
    }
}

fn read_math_type(value: &Value) -> Result<MathType> {
    match read_tag(value)?.0 {
        "InlineMath" => Ok(MathType::InlineMath),
        "DisplayMath" => Ok(MathType::DisplayMath),
        t => Err(JsonReadError::UnsupportedVariant(format!("MathType: {}", t))),
    }
}

fn read_inline(value: &Value) -> Result<Inline> {
    let (t, c) = read_tag(value)?;

    macro_rules! simple {
        ($variant:ident) => {
            Ok(Inline::$variant($variant {
                content: read_inlines(content(c)?)?,
            }))
        };
    }

    match t {
        "Str" => Ok(Inline::Str(Str {
            text: read_string(content(c)?, "Str content")?,
        })),
        "Space" => Ok(Inline::Space(Space)),
        "SoftBreak" => Ok(Inline::SoftBreak(SoftBreak)),
        "LineBreak" => Ok(Inline::LineBreak(LineBreak)),
        "Emph" => simple!(Emph),
        "Underline" => simple!(Underline),
        "Strong" => simple!(Strong),
        "Strikeout" => simple!(Strikeout),
        "Superscript" => simple!(Superscript),
        "Subscript" => simple!(Subscript),
        "SmallCaps" => simple!(SmallCaps),
        "Quoted" => {
            let arr = content_array(c, "Quoted", 2)?;
            Ok(Inline::Quoted(Quoted {
                quote_type: read_quote_type(&arr[0])?,
                content: read_inlines(&arr[1])?,
            }))
        }
        "Cite" => {
            let arr = content_array(c, "Cite", 2)?;
            let citations = read_array(&arr[0], "Cite citations")?
                .iter()
                .map(read_citation)
                .collect::<Result<Vec<_>>>()?;
            Ok(Inline::Cite(Cite {
                citations,
                content: read_inlines(&arr[1])?,
            }))
        }
        "Code" => {
            let arr = content_array(c, "Code", 2)?;
            Ok(Inline::Code(Code {
                attr: read_attr(&arr[0])?,
                text: read_string(&arr[1], "Code text")?,
            }))
        }
        "Math" => {
            let arr = content_array(c, "Math", 2)?;
            Ok(Inline::Math(Math {
                math_type: read_math_type(&arr[0])?,
                text: read_string(&arr[1], "Math text")?,
            }))
        }
        "RawInline" => {
            let arr = content_array(c, "RawInline", 2)?;
            Ok(Inline::RawInline(RawInline {
                format: read_string(&arr[0], "RawInline format")?,
                text: read_string(&arr[1], "RawInline text")?,
            }))
        }
        "Link" => {
            let arr = content_array(c, "Link", 3)?;
            Ok(Inline::Link(Link {
                attr: read_attr(&arr[0])?,
                content: read_inlines(&arr[1])?,
                target: read_target(&arr[2])?,
            }))
        }
        "Image" => {
            let arr = content_array(c, "Image", 3)?;
            Ok(Inline::Image(Image {
                attr: read_attr(&arr[0])?,
                content: read_inlines(&arr[1])?,
                target: read_target(&arr[2])?,
            }))
        }
        "Note" => Ok(Inline::Note(Note {
            content: read_blocks(content(c)?)?,
        })),
        "Span" => {
            let arr = content_array(c, "Span", 2)?;
            Ok(Inline::Span(Span {
                attr: read_attr(&arr[0])?,
                content: read_inlines(&arr[1])?,
            }))
        }
        _ => Err(JsonReadError::UnsupportedVariant(format!("Inline: {}", t))),
    }
}

fn read_inlines(value: &Value) -> Result<Inlines> {
    read_array(value, "Inlines")?
        .iter()
        .map(read_inline)
        .collect()
}

pub fn read<R: std::io::Read>(reader: &mut R) -> Result<Pandoc> {
    let json: Value = serde_json::from_reader(reader).map_err(JsonReadError::InvalidJson)?;
    read_pandoc(&json)
}

fn read_pandoc(value: &Value) -> Result<Pandoc> {
    let obj = value
        .as_object()
        .ok_or_else(|| JsonReadError::InvalidType("Expected object for Pandoc".to_string()))?;

    let api_version = read_array(
        obj.get("pandoc-api-version")
            .ok_or_else(|| JsonReadError::MissingField("pandoc-api-version".to_string()))?,
        "pandoc-api-version",
    )?
    .iter()
    .map(|v| {
        v.as_u64().ok_or_else(|| {
            JsonReadError::InvalidType("pandoc-api-version entries must be integers".to_string())
        })
    })
    .collect::<Result<Vec<_>>>()?;

    let meta = read_meta(
        obj.get("meta")
            .ok_or_else(|| JsonReadError::MissingField("meta".to_string()))?,
    )?;
    let blocks = read_blocks(
        obj.get("blocks")
            .ok_or_else(|| JsonReadError::MissingField("blocks".to_string()))?,
    )?;

    Ok(Pandoc {
        api_version,
        meta,
        blocks,
    })
}

fn read_blockss(value: &Value) -> Result<Vec<Vec<Block>>> {
    read_array(value, "List items")?
        .iter()
        .map(read_blocks)
        .collect()
}

fn read_list_attributes(value: &Value) -> Result<ListAttributes> {
    let arr = read_array(value, "ListAttributes")?;
    if arr.len() != 3 {
        return invalid("ListAttributes array must have 3 elements");
    }

    let start = read_usize(&arr[0], "ListAttributes start")?;

    let style = match read_tag(&arr[1])?.0 {
        "DefaultStyle" => ListNumberStyle::Default,
        "Example" => ListNumberStyle::Example,
        "Decimal" => ListNumberStyle::Decimal,
        "LowerRoman" => ListNumberStyle::LowerRoman,
        "UpperRoman" => ListNumberStyle::UpperRoman,
        "LowerAlpha" => ListNumberStyle::LowerAlpha,
        "UpperAlpha" => ListNumberStyle::UpperAlpha,
        t => {
            return Err(JsonReadError::UnsupportedVariant(format!(
                "ListNumberStyle: {}",
                t
            )));
        }
    };

    let delim = match read_tag(&arr[2])?.0 {
        "DefaultDelim" => ListNumberDelim::Default,
        "Period" => ListNumberDelim::Period,
        "OneParen" => ListNumberDelim::OneParen,
        "TwoParens" => ListNumberDelim::TwoParens,
        t => {
            return Err(JsonReadError::UnsupportedVariant(format!(
                "ListNumberDelim: {}",
                t
            )));
        }
    };

    Ok((start, style, delim))
}

fn read_caption(value: &Value) -> Result<Caption> {
    let arr = read_array(value, "Caption")?;
    if arr.len() != 2 {
        return invalid("Caption array must have 2 elements");
    }
    let short = if arr[0].is_null() {
        None
    } else {
        Some(read_inlines(&arr[0])?)
    };
    Ok(Caption {
        short,
        long: read_blocks(&arr[1])?,
    })
}

fn read_blocks(value: &Value) -> Result<Vec<Block>> {
    read_array(value, "Blocks")?
        .iter()
        .map(read_block)
        .collect()
}

fn read_alignment(value: &Value) -> Result<Alignment> {
    match read_tag(value)?.0 {
        "AlignLeft" => Ok(Alignment::Left),
        "AlignCenter" => Ok(Alignment::Center),
        "AlignRight" => Ok(Alignment::Right),
        "AlignDefault" => Ok(Alignment::Default),
        t => Err(JsonReadError::UnsupportedVariant(format!("Alignment: {}", t))),
    }
}

fn read_colwidth(value: &Value) -> Result<ColWidth> {
    let (t, c) = read_tag(value)?;
    match t {
        "ColWidthDefault" => Ok(ColWidth::Default),
        "ColWidth" => {
            let width = content(c)?.as_f64().ok_or_else(|| {
                JsonReadError::InvalidType("ColWidth must be a number".to_string())
            })?;
            Ok(ColWidth::Percentage(width))
        }
        _ => Err(JsonReadError::UnsupportedVariant(format!("ColWidth: {}", t))),
    }
}

fn read_colspec(value: &Value) -> Result<ColSpec> {
    let arr = read_array(value, "ColSpec")?;
    if arr.len() != 2 {
        return invalid("ColSpec array must have 2 elements");
    }
    Ok((read_alignment(&arr[0])?, read_colwidth(&arr[1])?))
}

fn read_cell(value: &Value) -> Result<Cell> {
    let arr = read_array(value, "Cell")?;
    if arr.len() != 5 {
        return invalid("Cell array must have 5 elements");
    }
    Ok(Cell {
        attr: read_attr(&arr[0])?,
        alignment: read_alignment(&arr[1])?,
        row_span: read_usize(&arr[2], "Cell row span")?,
        col_span: read_usize(&arr[3], "Cell col span")?,
        content: read_blocks(&arr[4])?,
    })
}

fn read_row(value: &Value) -> Result<Row> {
    let arr = read_array(value, "Row")?;
    if arr.len() != 2 {
        return invalid("Row array must have 2 elements");
    }
    Ok(Row {
        attr: read_attr(&arr[0])?,
        cells: read_array(&arr[1], "Row cells")?
            .iter()
            .map(read_cell)
            .collect::<Result<Vec<_>>>()?,
    })
}

fn read_rows(value: &Value) -> Result<Vec<Row>> {
    read_array(value, "Rows")?.iter().map(read_row).collect()
}

fn read_table_head(value: &Value) -> Result<TableHead> {
    let arr = read_array(value, "TableHead")?;
    if arr.len() != 2 {
        return invalid("TableHead array must have 2 elements");
    }
    Ok(TableHead {
        attr: read_attr(&arr[0])?,
        rows: read_rows(&arr[1])?,
    })
}

fn read_table_body(value: &Value) -> Result<TableBody> {
    let arr = read_array(value, "TableBody")?;
    if arr.len() != 4 {
        return invalid("TableBody array must have 4 elements");
    }
    Ok(TableBody {
        attr: read_attr(&arr[0])?,
        rowhead_columns: read_usize(&arr[1], "TableBody row head columns")?,
        head: read_rows(&arr[2])?,
        body: read_rows(&arr[3])?,
    })
}

fn read_table_foot(value: &Value) -> Result<TableFoot> {
    let arr = read_array(value, "TableFoot")?;
    if arr.len() != 2 {
        return invalid("TableFoot array must have 2 elements");
    }
    Ok(TableFoot {
        attr: read_attr(&arr[0])?,
        rows: read_rows(&arr[1])?,
    })
}

fn read_block(value: &Value) -> Result<Block> {
    let (t, c) = read_tag(value)?;

    match t {
        "Plain" => Ok(Block::Plain(Plain {
            content: read_inlines(content(c)?)?,
        })),
        "Para" => Ok(Block::Paragraph(Paragraph {
            content: read_inlines(content(c)?)?,
        })),
        "LineBlock" => Ok(Block::LineBlock(LineBlock {
            content: read_array(content(c)?, "LineBlock content")?
                .iter()
                .map(read_inlines)
                .collect::<Result<Vec<_>>>()?,
        })),
        "CodeBlock" => {
            let arr = content_array(c, "CodeBlock", 2)?;
            Ok(Block::CodeBlock(CodeBlock {
                attr: read_attr(&arr[0])?,
                text: read_string(&arr[1], "CodeBlock text")?,
            }))
        }
        "RawBlock" => {
            let arr = content_array(c, "RawBlock", 2)?;
            Ok(Block::RawBlock(RawBlock {
                format: read_string(&arr[0], "RawBlock format")?,
                text: read_string(&arr[1], "RawBlock text")?,
            }))
        }
        "BlockQuote" => Ok(Block::BlockQuote(BlockQuote {
            content: read_blocks(content(c)?)?,
        })),
        "OrderedList" => {
            let arr = content_array(c, "OrderedList", 2)?;
            Ok(Block::OrderedList(OrderedList {
                attr: read_list_attributes(&arr[0])?,
                content: read_blockss(&arr[1])?,
            }))
        }
        "BulletList" => Ok(Block::BulletList(BulletList {
            content: read_blockss(content(c)?)?,
        })),
        "DefinitionList" => {
            let items = read_array(content(c)?, "DefinitionList content")?
                .iter()
                .map(|item| {
                    let pair = read_array(item, "DefinitionList item")?;
                    if pair.len() != 2 {
                        return invalid("DefinitionList item must have 2 elements");
                    }
                    Ok((read_inlines(&pair[0])?, read_blockss(&pair[1])?))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Block::DefinitionList(DefinitionList { content: items }))
        }
        "Header" => {
            let arr = content_array(c, "Header", 3)?;
            Ok(Block::Header(Header {
                level: read_usize(&arr[0], "Header level")?,
                attr: read_attr(&arr[1])?,
                content: read_inlines(&arr[2])?,
            }))
        }
        "HorizontalRule" => Ok(Block::HorizontalRule(HorizontalRule)),
        "Table" => {
            let arr = content_array(c, "Table", 6)?;
            Ok(Block::Table(Table {
                attr: read_attr(&arr[0])?,
                caption: read_caption(&arr[1])?,
                colspec: read_array(&arr[2], "Table colspecs")?
                    .iter()
                    .map(read_colspec)
                    .collect::<Result<Vec<_>>>()?,
                head: read_table_head(&arr[3])?,
                bodies: read_array(&arr[4], "Table bodies")?
                    .iter()
                    .map(read_table_body)
                    .collect::<Result<Vec<_>>>()?,
                foot: read_table_foot(&arr[5])?,
            }))
        }
        "Figure" => {
            let arr = content_array(c, "Figure", 3)?;
            Ok(Block::Figure(Figure {
                attr: read_attr(&arr[0])?,
                caption: read_caption(&arr[1])?,
                content: read_blocks(&arr[2])?,
            }))
        }
        "Div" => {
            let arr = content_array(c, "Div", 2)?;
            Ok(Block::Div(Div {
                attr: read_attr(&arr[0])?,
                content: read_blocks(&arr[1])?,
            }))
        }
        _ => Err(JsonReadError::UnsupportedVariant(format!("Block: {}", t))),
    }
}

fn read_meta(value: &Value) -> Result<Meta> {
    let obj = value
        .as_object()
        .ok_or_else(|| JsonReadError::InvalidType("Expected object for Meta".to_string()))?;
    read_meta_map(obj)
}

fn read_meta_map(obj: &Map<String, Value>) -> Result<Meta> {
    let mut meta = Meta::new();
    for (key, val) in obj {
        meta.insert(key.clone(), read_meta_value(val)?);
    }
    Ok(meta)
}

fn read_meta_value(value: &Value) -> Result<MetaValue> {
    let (t, c) = read_tag(value)?;
    match t {
        "MetaString" => Ok(MetaValue::MetaString(read_string(
            content(c)?,
            "MetaString content",
        )?)),
        "MetaBool" => {
            let b = content(c)?.as_bool().ok_or_else(|| {
                JsonReadError::InvalidType("MetaBool content must be boolean".to_string())
            })?;
            Ok(MetaValue::MetaBool(b))
        }
        "MetaInlines" => Ok(MetaValue::MetaInlines(read_inlines(content(c)?)?)),
        "MetaBlocks" => Ok(MetaValue::MetaBlocks(read_blocks(content(c)?)?)),
        "MetaList" => Ok(MetaValue::MetaList(
            read_array(content(c)?, "MetaList content")?
                .iter()
                .map(read_meta_value)
                .collect::<Result<Vec<_>>>()?,
        )),
        "MetaMap" => {
            let obj = content(c)?.as_object().ok_or_else(|| {
                JsonReadError::InvalidType("MetaMap content must be object".to_string())
            })?;
            Ok(MetaValue::MetaMap(read_meta_map(obj)?))
        }
        _ => Err(JsonReadError::UnsupportedVariant(format!("MetaValue: {}", t))),
    }
}

/*
 * attr.rs
 * Copyright (c) 2025 Posit, PBC
 */

pub fn empty_attr() -> Attr {
    (String::new(), vec![], vec![])
}

/// (identifier, classes, key/value attributes)
///
/// Key/value pairs are a list, not a map: pandoc allows repeated keys and
/// documents must survive a read/write unchanged.
pub type Attr = (String, Vec<String>, Vec<(String, String)>);

/// Build an Attr carrying only classes.
pub fn attr_with_classes<I, S>(classes: I) -> Attr
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    (
        String::new(),
        classes.into_iter().map(Into::into).collect(),
        vec![],
    )
}

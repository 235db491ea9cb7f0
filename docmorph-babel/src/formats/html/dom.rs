//! Read-only helpers over the `markup5ever_rcdom` tree.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::ConvertError;

/// Parses a full document or a fragment; fragments are wrapped in `<html><body>`.
pub fn parse_html(html: &str) -> Result<RcDom, ConvertError> {
    parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| ConvertError::Parse(e.to_string()))
}

/// Lowercase local name of an element, `None` for other nodes.
pub fn tag_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(str::to_ascii_lowercase(&name.local)),
        _ => None,
    }
}

pub fn is_element(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Element { .. })
}

pub fn attr(handle: &Handle, name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| str::eq_ignore_ascii_case(&attr.name.local, name))
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

pub fn has_class(handle: &Handle, class: &str) -> bool {
    attr(handle, "class")
        .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Snapshot of the child nodes, safe to hold across awaits.
pub fn children(handle: &Handle) -> Vec<Handle> {
    handle.children.borrow().clone()
}

pub fn element_children(handle: &Handle) -> Vec<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .filter(|child| is_element(child))
        .cloned()
        .collect()
}

/// Concatenated text of all descendant text nodes.
pub fn text_content(handle: &Handle) -> String {
    let mut text = String::new();
    collect_text(handle, &mut text);
    text
}

fn collect_text(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// True when a direct child text node holds non-whitespace.
pub fn has_direct_text(handle: &Handle) -> bool {
    handle.children.borrow().iter().any(|child| match &child.data {
        NodeData::Text { contents } => !contents.borrow().trim().is_empty(),
        _ => false,
    })
}

/// Descendant elements with any of `tags`, in document order. Excludes `handle` itself.
pub fn select_all(handle: &Handle, tags: &[&str]) -> Vec<Handle> {
    let mut found = Vec::new();
    for child in handle.children.borrow().iter() {
        collect_matching(child, tags, &mut found);
    }
    found
}

fn collect_matching(handle: &Handle, tags: &[&str], found: &mut Vec<Handle>) {
    if let Some(name) = tag_name(handle) {
        if tags.contains(&name.as_str()) {
            found.push(handle.clone());
        }
    }
    for child in handle.children.borrow().iter() {
        collect_matching(child, tags, found);
    }
}

/// First descendant element named `tag`.
pub fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if tag_name(child).as_deref() == Some(tag) {
            return Some(child.clone());
        }
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}

/// Collapses runs of HTML whitespace to a single space, as a browser lays out text.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

//! [`Element`] to markup conversion.

use std::fmt::Write;

use super::{Element, Node};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serialize an element tree as an XML fragment.
///
/// Elements without children are written self-closing.
pub fn serialize(element: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, element);
    out
}

/// Serialize an element tree as a standalone XML document.
pub fn serialize_document(element: &Element) -> String {
    let mut out = String::from(XML_DECLARATION);
    out.push('\n');
    write_element(&mut out, element);
    out
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(element.name());
    for (name, value) in element.attributes() {
        let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
    }

    if element.children().is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in element.children() {
        match child {
            Node::Element(child) => write_element(out, child),
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Comment(text) => {
                let _ = write!(out, "<!--{text}-->");
            }
        }
    }
    let _ = write!(out, "</{}>", element.name());
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            // Literal newlines and tabs would be normalized to spaces on re-parse.
            '\n' => escaped.push_str("&#10;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

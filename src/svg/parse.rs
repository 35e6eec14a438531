//! Markup to [`Element`] conversion.

use roxmltree::{Document, ParsingOptions};

use super::{Element, Node};

/// Markup that could not be read as a well-formed XML document.
#[derive(Debug, thiserror::Error)]
#[error("invalid markup: {0}")]
pub struct ParseError(#[from] roxmltree::Error);

/// Parse well-formed markup (SVG, XHTML, or any XML) into an element tree.
///
/// Namespace declarations are kept on the element that declares them and
/// names keep the prefixes used in the source.
///
/// # Errors
///
/// Returns an error if the markup is not well-formed.
pub fn parse_document(markup: &str) -> Result<Element, ParseError> {
    let options = ParsingOptions {
        // XHTML snapshots usually start with a doctype.
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(markup, options)?;
    Ok(convert(doc.root_element()))
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let mut element = Element::new(element_name(node));

    for (name, uri) in declared_namespaces(node) {
        let key = name.map_or_else(|| "xmlns".to_string(), |prefix| format!("xmlns:{prefix}"));
        element.set_attribute(key, uri);
    }

    for attr in node.attributes() {
        let name = match attr.namespace().and_then(|uri| node.lookup_prefix(uri)) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", attr.name()),
            _ => attr.name().to_string(),
        };
        element.set_attribute(name, attr.value());
    }

    for child in node.children() {
        if child.is_element() {
            element.children.push(Node::Element(convert(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(Node::Text(text.to_string()));
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                element.children.push(Node::Comment(text.to_string()));
            }
        }
    }

    element
}

fn element_name(node: roxmltree::Node<'_, '_>) -> String {
    let tag = node.tag_name();
    let Some(uri) = tag.namespace() else {
        return tag.name().to_string();
    };
    if node.lookup_namespace_uri(None) == Some(uri) {
        return tag.name().to_string();
    }
    match node.lookup_prefix(uri) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", tag.name()),
        _ => tag.name().to_string(),
    }
}

/// Namespaces in scope on `node` that its parent element does not have.
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<(Option<String>, String)> {
    let in_scope = |node: roxmltree::Node<'_, '_>| -> Vec<(Option<String>, String)> {
        node.namespaces()
            .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
            .collect()
    };
    let inherited = node.parent_element().map(in_scope).unwrap_or_default();

    let mut declared: Vec<_> = in_scope(node)
        .into_iter()
        .filter(|(name, _)| name.as_deref() != Some("xml"))
        .filter(|declared| !inherited.contains(declared))
        .collect();
    // Default namespace first, then prefixes alphabetically.
    declared.sort();
    declared
}

//! Immutable SVG/XML element trees.
//!
//! The exporter never touches a live document. Markup is parsed once into an
//! [`Element`] value tree, transformed into new trees, and serialized back
//! to text:
//! - [`parse_document`]: markup to tree (via `roxmltree`)
//! - [`serialize`] / [`serialize_document`]: tree to markup

mod parse;
mod serialize;

pub use parse::{ParseError, parse_document};
pub use serialize::{serialize, serialize_document};

/// The SVG namespace URI.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The `XLink` namespace URI, still used by many renderers for `xlink:href`.
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An element with its qualified name, ordered attributes, and children.
///
/// Names keep their prefix (`xlink:href`, `svg:rect`) so a tree serializes
/// back to the same qualified names it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attribute`].
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a child element or node.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text node.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Qualified name, including any prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Set an attribute, replacing an existing value in place so the
    /// attribute order stays stable.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Remove an attribute, returning its old value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) | Node::Comment(_) => None,
        })
    }

    /// Whether the whitespace-separated `class` list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Self> = self.child_elements().collect();
        stack.reverse();
        Descendants { stack }
    }

    /// First descendant (document order) matching `predicate`.
    pub fn find_descendant(&self, predicate: impl Fn(&Self) -> bool) -> Option<&Self> {
        self.descendants().find(|element| predicate(element))
    }

    /// Visit `self` and every descendant element, pre-order, mutably.
    pub fn for_each_element_mut(&mut self, visit: &mut impl FnMut(&mut Self)) {
        visit(self);
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.for_each_element_mut(visit);
            }
        }
    }

    /// Whether `self` or any descendant uses a name (element or attribute)
    /// with the given prefix.
    pub fn uses_prefix(&self, prefix: &str) -> bool {
        let uses = |element: &Self| {
            has_prefix(&element.name, prefix)
                || element
                    .attributes
                    .iter()
                    .any(|(key, _)| has_prefix(key, prefix))
        };
        uses(self) || self.descendants().any(uses)
    }
}

fn has_prefix(name: &str, prefix: &str) -> bool {
    name.split_once(':').is_some_and(|(p, _)| p == prefix)
}

/// Pre-order iterator over descendant elements.
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(next.child_elements());
        self.stack[start..].reverse();
        Some(next)
    }
}

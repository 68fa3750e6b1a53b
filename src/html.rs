//! Owned HTML fragment tree.
//!
//! The markdown adapter produces an HTML string; every rewrite pass works on
//! this tree instead. Parsing goes through [`scraper`] (html5ever), after which
//! the result is copied into plain owned nodes so passes can splice, replace
//! and re-attribute elements without fighting a borrowed DOM.
//!
//! ```text
//! Fragment
//! └── Node::Element  name + ordered attrs + ordered children
//!     ├── Node::Text
//!     └── Node::Comment
//! ```
//!
//! Attributes keep insertion order for elements built by the passes. Parsed
//! attributes are sorted by name on import so serialization is stable from run
//! to run regardless of how the parser stores them.

use scraper::{ElementRef, Html};
use std::fmt;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements whose leading newline is swallowed by HTML parsers.
const NEWLINE_SENSITIVE: &[&str] = &["pre", "textarea", "listing"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.collect_text(out),
            Node::Text(text) => out.push_str(text),
            Node::Comment(_) => {}
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    /// Set an attribute, replacing any existing value in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Append a class, keeping the existing ones.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", &joined);
    }

    /// Direct element children, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// First descendant element with the given name, depth first.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements()
            .find_map(|child| if child.is(name) { Some(child) } else { child.find(name) })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// A parsed HTML fragment: an ordered list of top-level nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn parse(html: &str) -> Self {
        let document = Html::parse_fragment(html);
        Self {
            nodes: convert_children(document.root_element()),
        }
    }

    /// Top-level elements in document order.
    pub fn top_level(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(Node::as_element)
    }

    /// Every element with the given name, in document order.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_named(&self.nodes, name, &mut found);
        found
    }

    /// Visit every element in document (pre-)order.
    ///
    /// Children appended to an element by `f` are visited as well.
    pub fn for_each_element_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        walk_mut(&mut self.nodes, f);
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(&mut out, node, None);
        }
        out
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn convert_children(parent: ElementRef<'_>) -> Vec<Node> {
    parent
        .children()
        .filter_map(|child| match child.value() {
            scraper::Node::Element(_) => ElementRef::wrap(child).map(|el| convert_element(el).into()),
            scraper::Node::Text(text) => Some(Node::Text(text.to_string())),
            scraper::Node::Comment(comment) => Some(Node::Comment(comment.to_string())),
            _ => None,
        })
        .collect()
}

fn convert_element(el: ElementRef<'_>) -> Element {
    let value = el.value();
    let mut attrs: Vec<(String, String)> = value
        .attrs()
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect();
    attrs.sort();
    Element {
        name: value.name().to_string(),
        attrs,
        children: convert_children(el),
    }
}

fn collect_named<'a>(nodes: &'a [Node], name: &str, found: &mut Vec<&'a Element>) {
    for el in nodes.iter().filter_map(Node::as_element) {
        if el.is(name) {
            found.push(el);
        }
        collect_named(&el.children, name, found);
    }
}

fn walk_mut<F: FnMut(&mut Element)>(nodes: &mut [Node], f: &mut F) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            walk_mut(&mut el.children, f);
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

fn write_node(out: &mut String, node: &Node, parent: Option<&Element>) {
    match node {
        Node::Text(text) => {
            if parent.is_some_and(|p| RAW_TEXT_ELEMENTS.iter().any(|raw| p.is(raw))) {
                out.push_str(text);
            } else {
                escape_text(out, text);
            }
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Element(el) => write_element(out, el),
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.name);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(out, value);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.iter().any(|void| el.is(void)) {
        return;
    }

    let leading_newline = matches!(el.children.first(), Some(Node::Text(t)) if t.starts_with('\n'));
    if leading_newline && NEWLINE_SENSITIVE.iter().any(|name| el.is(name)) {
        out.push('\n');
    }

    for child in &el.children {
        write_node(out, child, Some(el));
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

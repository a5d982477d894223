//! Rendered content tree.
//!
//! The renderer produces a [`Node`] tree rather than writing HTML directly,
//! so the annotation passes (glossary wrapping, region substitution) and the
//! heading-highlight rewrite can run as pure recursive transforms before
//! serialization. This replaces the original design's post-render DOM walking
//! and mutation observers: there is no live tree to race against, and
//! "already processed" tracking is a structural skip rule instead of a
//! node registry.

use std::fmt::Write as _;

/// One node of rendered content.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A text leaf. Serialized HTML-escaped.
    Text(String),
    /// An element with a tag name, attributes, and children.
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
    /// A sequence of nodes with no wrapping element.
    Fragment(Vec<Node>),
    /// Pre-serialized HTML emitted verbatim (classifier box output).
    Raw(String),
}

/// Tags whose subtrees are never touched by text-level passes.
pub const OPAQUE_TAGS: &[&str] = &["script", "style", "code", "pre", "input", "textarea"];

/// Elements without a closing tag.
const VOID_TAGS: &[&str] = &["img", "br", "hr", "input", "meta", "link"];

impl Node {
    /// Shorthand for an element with no attributes.
    pub fn elem(tag: &str, children: Vec<Node>) -> Node {
        Node::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children,
        }
    }

    /// Shorthand for an element with attributes.
    pub fn elem_attrs(tag: &str, attrs: Vec<(String, String)>, children: Vec<Node>) -> Node {
        Node::Element {
            tag: tag.to_string(),
            attrs,
            children,
        }
    }

    /// Shorthand for a text leaf.
    pub fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    /// Value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Whether this element carries the given class token.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == class))
    }

    /// Concatenated text content of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element { children, .. } | Node::Fragment(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Node::Raw(_) => {}
        }
    }

    /// Whether any descendant element has the given tag.
    pub fn contains_tag(&self, tag: &str) -> bool {
        match self {
            Node::Element {
                tag: t, children, ..
            } => t == tag || children.iter().any(|c| c.contains_tag(tag)),
            Node::Fragment(children) => children.iter().any(|c| c.contains_tag(tag)),
            _ => false,
        }
    }

    /// Serialize this subtree to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&escape_html(t)),
            Node::Raw(html) => out.push_str(html),
            Node::Fragment(children) => {
                for child in children {
                    child.write_html(out);
                }
            }
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                let _ = write!(out, "<{tag}");
                for (k, v) in attrs {
                    let _ = write!(out, " {k}=\"{}\"", escape_html(v));
                }
                if VOID_TAGS.contains(&tag.as_str()) && children.is_empty() {
                    out.push_str(">");
                    return;
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

/// Escape HTML special characters to prevent XSS.
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

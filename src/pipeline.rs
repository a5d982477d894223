//! End-to-end chapter pipeline.
//!
//! Raw chapter markdown flows through the text rewrites, the renderer, and
//! the annotation passes in a fixed order:
//!
//! 1. resolve image references ([`crate::refs`])
//! 2. rewrite collapsible markers ([`crate::collapsible`])
//! 3. split out inline data-URI images ([`split_content_parts`])
//! 4. render each part ([`crate::render_html`])
//! 5. annotate glossary terms, substitute region vocabulary
//!    ([`crate::annotate`])
//!
//! Every step is pure and synchronous; chapters are independent of each
//! other.

use std::sync::LazyLock;

use regex::Regex;

use crate::annotate::{annotate_glossary, substitute_region};
use crate::ast::Node;
use crate::collapsible::rewrite_collapsibles;
use crate::glossary::GlossaryTerm;
use crate::refs::resolve_image_refs;
use crate::region::{Region, TermMapping};
use crate::render_html::render_markdown;

/// Inline image whose destination is a data URI. These are megabytes of
/// base64 in practice and are lifted out before markdown parsing.
static DATA_URI_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\((data:[^)\s]+)\)").expect("valid regex"));

/// One split piece of processed chapter markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Markdown(String),
    Image { url: String, alt: String },
}

/// Split processed markdown around inline data-URI images, preserving
/// order. Regular URL images stay inside the markdown parts.
pub fn split_content_parts(markdown: &str) -> Vec<ContentPart> {
    let mut parts = Vec::new();
    let mut last = 0;

    for caps in DATA_URI_IMAGE.captures_iter(markdown) {
        let whole = caps.get(0).expect("whole match");
        let before = &markdown[last..whole.start()];
        if !before.trim().is_empty() {
            parts.push(ContentPart::Markdown(before.to_string()));
        }
        parts.push(ContentPart::Image {
            url: caps[2].to_string(),
            alt: caps[1].to_string(),
        });
        last = whole.end();
    }

    let rest = &markdown[last..];
    if !rest.trim().is_empty() || parts.is_empty() {
        parts.push(ContentPart::Markdown(rest.to_string()));
    }
    parts
}

/// The full chapter renderer, carrying the loaded term data.
#[derive(Debug, Default)]
pub struct GuidePipeline {
    glossary: Vec<GlossaryTerm>,
    mappings: Vec<TermMapping>,
}

impl GuidePipeline {
    pub fn new(glossary: Vec<GlossaryTerm>, mappings: Vec<TermMapping>) -> GuidePipeline {
        GuidePipeline { glossary, mappings }
    }

    /// Run the whole pipeline on one chapter's raw markdown.
    pub fn render(&self, markdown: &str, region: Region) -> Node {
        let resolved = resolve_image_refs(markdown);
        let rewritten = rewrite_collapsibles(&resolved);

        let mut nodes = Vec::new();
        for part in split_content_parts(&rewritten) {
            match part {
                ContentPart::Markdown(md) => nodes.push(render_markdown(&md)),
                ContentPart::Image { url, alt } => nodes.push(Node::elem_attrs(
                    "img",
                    vec![
                        ("src".to_string(), url),
                        ("alt".to_string(), alt),
                        ("class".to_string(), "guide-image".to_string()),
                    ],
                    vec![],
                )),
            }
        }

        let mut tree = Node::Fragment(nodes);
        annotate_glossary(&mut tree, &self.glossary);
        substitute_region(&mut tree, &self.mappings, region);
        tree
    }

    /// [`Self::render`], serialized.
    pub fn render_html(&self, markdown: &str, region: Region) -> String {
        self.render(markdown, region).to_html()
    }
}

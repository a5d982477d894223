//! Mini-parser for rich text inside table cells and narrative headers.
//!
//! Table cells arrive as raw text (the markdown inside GFM table cells is
//! not re-parsed), so bold markers and bullet delimiters must be recovered
//! by hand. The same parser serves two places:
//!
//! - narrative-header tables, whose single head cell holds a title followed
//!   by `**Section**` sub-headers with ` - ` bullet runs;
//! - data cells, whose text is split on bullet delimiters into lists, with
//!   bold-only parts promoted to sub-header paragraphs.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::Node;

static SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));

static CELL_BULLET_TEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)[-−–—]\s+").expect("valid regex"));

static CELL_BULLET_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[-−–—]\s+").expect("valid regex"));

static BOLD_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*([^*]+)\*\*$").expect("valid regex"));

/// One parsed block of a narrative header.
#[derive(Debug, Clone, PartialEq)]
pub enum RichBlock {
    /// Leading title text before the first bold marker.
    Title(String),
    /// A `**Section**` header with its bullet items.
    Section { name: String, bullets: Vec<String> },
    /// Fallback: a bold-only line acting as a sub-header.
    SubHeader(String),
    /// Fallback: a run of `- ` bullet lines.
    Bullets(Vec<String>),
    /// Fallback: plain text.
    Paragraph(String),
}

/// One item of a bullet-split table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellItem {
    /// A part that is exactly one `**bold**` span; rendered as a heavy
    /// paragraph rather than a list entry.
    SubHeader(String),
    Bullet(String),
}

/// Parse narrative-header markup: a title segment, then `**Section**`
/// headers each followed by bullet content.
///
/// Falls back to a line-by-line parse when the text has no usable
/// `**section**` delimiters.
pub fn parse_rich_text(text: &str) -> Vec<RichBlock> {
    let text = unescape(text);

    let sections: Vec<_> = SECTION.captures_iter(&text).collect();
    if sections.is_empty() {
        return parse_lines(&text);
    }

    let mut blocks = Vec::new();

    let first_start = sections[0].get(0).expect("whole match").start();
    let title = text[..first_start].trim();
    if !title.is_empty() {
        blocks.push(RichBlock::Title(title.to_string()));
    }

    for (i, caps) in sections.iter().enumerate() {
        let name = caps[1].trim().to_string();
        let content_start = caps.get(0).expect("whole match").end();
        let content_end = sections
            .get(i + 1)
            .map(|next| next.get(0).expect("whole match").start())
            .unwrap_or(text.len());
        let content = &text[content_start..content_end];

        let bullets: Vec<String> = split_bullets(content);
        blocks.push(RichBlock::Section { name, bullets });
    }

    blocks
}

/// Line-by-line fallback: bold-only lines become sub-headers, `- ` lines
/// accumulate into bullet runs (flushed by the first non-bullet line),
/// everything else is a paragraph.
fn parse_lines(text: &str) -> Vec<RichBlock> {
    let mut blocks = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(caps) = BOLD_ONLY.captures(trimmed) {
            flush(&mut pending, &mut blocks);
            blocks.push(RichBlock::SubHeader(caps[1].trim().to_string()));
        } else if let Some(rest) = trimmed.strip_prefix("- ") {
            pending.push(rest.trim().to_string());
        } else {
            flush(&mut pending, &mut blocks);
            blocks.push(RichBlock::Paragraph(trimmed.to_string()));
        }
    }
    flush(&mut pending, &mut blocks);

    blocks
}

fn flush(pending: &mut Vec<String>, blocks: &mut Vec<RichBlock>) {
    if !pending.is_empty() {
        blocks.push(RichBlock::Bullets(std::mem::take(pending)));
    }
}

fn split_bullets(content: &str) -> Vec<String> {
    CELL_BULLET_SPLIT
        .split(content)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a data cell's text into list items, if it contains a bullet
/// delimiter (whitespace + one of `- − – —` + whitespace). Returns `None`
/// when the cell has no bullets and should render as-is.
pub fn split_cell_bullets(text: &str) -> Option<Vec<CellItem>> {
    let text = unescape(text);
    if !CELL_BULLET_TEST.is_match(&text) {
        return None;
    }

    let items = CELL_BULLET_SPLIT
        .split(&text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|part| match BOLD_ONLY.captures(part) {
            Some(caps) => CellItem::SubHeader(caps[1].trim().to_string()),
            None => CellItem::Bullet(part.to_string()),
        })
        .collect();
    Some(items)
}

/// Flatten a parsed cell subtree back to marker text, restoring `**`
/// around bold spans so the splitters can see them. `text_content` would
/// strip the markers the cell parsers key on.
pub fn cell_text(node: &Node) -> String {
    let mut out = String::new();
    collect_marker_text(node, &mut out);
    out
}

fn collect_marker_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(t),
        Node::Element { tag, children, .. } => {
            let bold = tag == "strong";
            if bold {
                out.push_str("**");
            }
            for child in children {
                collect_marker_text(child, out);
            }
            if bold {
                out.push_str("**");
            }
        }
        Node::Fragment(children) => {
            for child in children {
                collect_marker_text(child, out);
            }
        }
        Node::Raw(_) => {}
    }
}

/// Render text with inline `**bold**` spans as a node sequence.
pub fn bold_spans(text: &str) -> Node {
    let mut children = Vec::new();
    let mut last = 0;

    for caps in SECTION.captures_iter(text) {
        let whole = caps.get(0).expect("whole match");
        if whole.start() > last {
            children.push(Node::text(&text[last..whole.start()]));
        }
        children.push(Node::elem("strong", vec![Node::text(caps[1].trim())]));
        last = whole.end();
    }
    if last < text.len() {
        children.push(Node::text(&text[last..]));
    }

    Node::Fragment(children)
}

/// Undo markdown escapes that survive inside raw table cell text.
fn unescape(text: &str) -> String {
    text.replace("\\*", "*").replace("\\-", "-")
}

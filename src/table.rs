//! Table shape reclassification.
//!
//! Guide tables come in three shapes that share one markdown syntax:
//!
//! - regular data tables with real column headers in the head row;
//! - "merged header" tables whose head row holds a free-form title and
//!   subtitle while the real column headers sit bold-marked in the first
//!   body row;
//! - single-column tables whose head cell is narrative markup (title,
//!   `**Section**` sub-headers, bullet runs).
//!
//! `classify_table` decides which shape applies from the parsed node tree.
//! Declining (`None`) is a valid outcome; the caller must then fall back to
//! default table rendering.

use crate::ast::Node;
use crate::richtext::{RichBlock, cell_text, parse_rich_text};

/// A classified table, ready for shape-specific rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum TableShape {
    /// Real column headers in the head row; every body row is data.
    Regular {
        headers: Vec<String>,
        rows: Vec<Vec<Node>>,
    },
    /// Title/subtitle in the head cell, column headers in the first body
    /// row, data in the remaining rows.
    MergedHeader {
        title: String,
        subtitle: Option<String>,
        headers: Vec<String>,
        rows: Vec<Vec<Node>>,
    },
    /// Narrative markup in the single head cell; every body row is data.
    NarrativeHeader {
        header: Vec<RichBlock>,
        rows: Vec<Vec<Node>>,
    },
}

/// Substrings that split a merged-header head cell into title and subtitle.
/// First found wins.
const OBJECTIVE_MARKERS: &[&str] = &[
    "Procurement and organization objective:",
    "objective:",
    "Objective:",
];

/// Decide the shape of a parsed table.
///
/// Precedence:
/// 1. two or more non-empty head cells → `Regular`, even when body cells
///    happen to contain bold text;
/// 2. a single textual head cell and no bold in the first body row →
///    `NarrativeHeader`;
/// 3. bold somewhere in the first body row → `MergedHeader`;
/// 4. otherwise `None` — render as a default table.
pub fn classify_table(head: &[Node], body: &[Vec<Node>]) -> Option<TableShape> {
    let head_texts: Vec<String> = head.iter().map(|c| c.text_content().trim().to_string()).collect();
    let non_empty_heads = head_texts.iter().filter(|t| !t.is_empty()).count();

    if non_empty_heads >= 2 {
        return Some(TableShape::Regular {
            headers: head_texts,
            rows: body.to_vec(),
        });
    }

    let first_row_has_bold = body
        .first()
        .is_some_and(|row| row.iter().any(|cell| cell.contains_tag("strong")));

    let single_head = head_texts.first().is_some_and(|t| !t.is_empty())
        && head_texts.iter().skip(1).all(|t| t.is_empty());

    if single_head && !first_row_has_bold {
        // Parse from marker-restoring text: the head cell's `**` may have
        // been consumed by the markdown parser into `strong` elements.
        return Some(TableShape::NarrativeHeader {
            header: parse_rich_text(&cell_text(&head[0])),
            rows: body.to_vec(),
        });
    }

    if first_row_has_bold {
        let raw_title = head_texts.first().cloned().unwrap_or_default();
        let (title, subtitle) = split_title(&raw_title);
        let headers = body[0].iter().map(extract_strong_text).collect();
        return Some(TableShape::MergedHeader {
            title,
            subtitle,
            headers,
            rows: body[1..].to_vec(),
        });
    }

    None
}

/// Split a head cell's raw text on the first objective marker found.
fn split_title(text: &str) -> (String, Option<String>) {
    for marker in OBJECTIVE_MARKERS {
        if let Some(pos) = text.find(marker) {
            let title = text[..pos].trim().to_string();
            let rest = text[pos + marker.len()..].trim();
            let title = if title.is_empty() {
                text.trim().to_string()
            } else {
                title
            };
            return (title, Some(format!("Objective: {rest}")));
        }
    }
    (text.trim().to_string(), None)
}

/// Text of the first `strong` descendant of a cell, or empty.
fn extract_strong_text(cell: &Node) -> String {
    fn find(node: &Node) -> Option<String> {
        match node {
            Node::Element { tag, children, .. } if tag == "strong" => {
                Some(Node::Fragment(children.clone()).text_content())
            }
            Node::Element { children, .. } | Node::Fragment(children) => {
                children.iter().find_map(find)
            }
            _ => None,
        }
    }
    find(cell).unwrap_or_default()
}

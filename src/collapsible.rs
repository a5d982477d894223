//! Collapsible-block rewriting.
//!
//! Authors mark expandable regions with a `{.collapsible}` annotation on a
//! bolded title. Three source shapes are recognized:
//!
//! - heading style: `#### **Title {.collapsible}**` followed by a body
//! - paragraph style: `**Title {.collapsible}**` followed by one paragraph
//! - bullet style: `* **Title {.collapsible}**` with indented continuation
//!   lines as the body
//!
//! Each match is rewritten into a `<collapsible>` custom block tag carrying
//! the title and the body markdown; markers inside a captured body become
//! nested blocks. The renderer later hydrates these into a toggle widget
//! whose body starts hidden. Ids are assigned in document order
//! (`collapsible-1`, `collapsible-2`, ...) so repeated renders of the same
//! chapter produce identical markup.
//!
//! The `{.collapsible}` marker is consumed by the rewrite and emitted
//! blocks pass through untouched, so running the pass on its own output
//! changes nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::escape_html;

static HEADING_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})\s+\*\*(.*?)\s*\{\.collapsible\}\*\*\s*$").expect("valid regex")
});

static PARAGRAPH_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*(.*?)\s*\{\.collapsible\}\*\*\s*$").expect("valid regex")
});

static BULLET_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[*-]\s+\*\*(.*?)\s*\{\.collapsible\}\*\*\s*$").expect("valid regex")
});

/// Rewrite all `{.collapsible}` annotations into `<collapsible>` block tags.
pub fn rewrite_collapsibles(content: &str) -> String {
    let mut next_id = 0usize;
    rewrite_section(content, &mut next_id)
}

/// One scan over a region of markdown. Captured bodies are rewritten
/// recursively with the same id counter, so nested markers become nested
/// blocks and ids stay unique in document order.
fn rewrite_section(content: &str, next_id: &mut usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        // An already-emitted block passes through verbatim; its markers were
        // consumed when it was written. The counter still advances past its
        // ids so later markers in the same document cannot collide.
        if line.trim_start().starts_with("<collapsible ") {
            let mut depth = 0usize;
            while i < lines.len() {
                let l = lines[i];
                if l.trim_start().starts_with("<collapsible ") {
                    depth += 1;
                    *next_id += 1;
                } else if l.trim() == "</collapsible>" {
                    depth = depth.saturating_sub(1);
                }
                out.push(l.to_string());
                i += 1;
                if depth == 0 {
                    break;
                }
            }
            continue;
        }

        if let Some(caps) = HEADING_TITLE.captures(line) {
            let level = caps[1].len();
            let title = caps[2].trim().to_string();
            let (body, consumed) = capture_heading_body(&lines, i + 1, level);
            *next_id += 1;
            let id = *next_id;
            let body = rewrite_section(&body, next_id);
            out.push(emit_block(id, &title, Some(level), None, &body));
            i += 1 + consumed;
            continue;
        }

        if let Some(caps) = PARAGRAPH_TITLE.captures(line) {
            let title = caps[1].trim().to_string();
            if let Some((body, consumed)) = capture_paragraph_body(&lines, i + 1) {
                *next_id += 1;
                let id = *next_id;
                let body = rewrite_section(&body, next_id);
                out.push(emit_block(id, &title, None, None, &body));
                i += 1 + consumed;
                continue;
            }
        }

        if let Some(caps) = BULLET_TITLE.captures(line) {
            let title = caps[1].trim().to_string();
            let (body, consumed) = capture_bullet_body(&lines, i + 1);
            *next_id += 1;
            let id = *next_id;
            let body = rewrite_section(&body, next_id);
            out.push(emit_block(id, &title, None, Some("bullet"), &body));
            i += 1 + consumed;
            continue;
        }

        out.push(line.to_string());
        i += 1;
    }

    out.join("\n")
}

/// Heading level of a line, if it is a markdown ATX heading.
fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=6).contains(&hashes) && line[hashes..].starts_with(' ') {
        Some(hashes)
    } else {
        None
    }
}

/// Capture a heading-style body starting at `start`.
///
/// The body stops before the next heading of the same or higher level, or at
/// a double-blank-line boundary. Returns the trimmed body and the number of
/// lines consumed.
fn capture_heading_body(lines: &[&str], start: usize, level: usize) -> (String, usize) {
    let mut body: Vec<&str> = Vec::new();
    let mut blanks = 0;
    let mut j = start;

    while j < lines.len() {
        let l = lines[j];
        if let Some(h) = heading_level(l)
            && h <= level
        {
            break;
        }
        if l.trim().is_empty() {
            blanks += 1;
            if blanks >= 2 {
                j += 1;
                break;
            }
        } else {
            blanks = 0;
        }
        body.push(l);
        j += 1;
    }

    (body.join("\n").trim().to_string(), j - start)
}

/// Capture a paragraph-style body: optional blank lines, then one run of
/// consecutive non-blank lines. Returns `None` if no paragraph follows (the
/// title line is then left in place untouched).
fn capture_paragraph_body(lines: &[&str], start: usize) -> Option<(String, usize)> {
    let mut j = start;
    while j < lines.len() && lines[j].trim().is_empty() {
        j += 1;
    }
    if j >= lines.len() {
        return None;
    }
    let para_start = j;
    while j < lines.len() && !lines[j].trim().is_empty() {
        j += 1;
    }
    let body = lines[para_start..j].join("\n");
    Some((body, j - start))
}

/// Capture a bullet-style body: blank lines and two-space-indented
/// continuation lines, stopping at the first non-indented non-blank line
/// (a sibling bullet or any other top-level content). The indent is
/// stripped from the captured body.
fn capture_bullet_body(lines: &[&str], start: usize) -> (String, usize) {
    let mut body: Vec<String> = Vec::new();
    let mut j = start;

    while j < lines.len() {
        let l = lines[j];
        if l.trim().is_empty() {
            body.push(String::new());
        } else if let Some(stripped) = l.strip_prefix("  ") {
            body.push(stripped.to_string());
        } else {
            break;
        }
        j += 1;
    }

    (body.join("\n").trim().to_string(), j - start)
}

fn emit_block(
    id: usize,
    title: &str,
    level: Option<usize>,
    variant: Option<&str>,
    body: &str,
) -> String {
    let mut attrs = format!(
        "id=\"collapsible-{id}\" title=\"{}\"",
        escape_html(title)
    );
    if let Some(level) = level {
        attrs.push_str(&format!(" level=\"{level}\""));
    }
    if let Some(variant) = variant {
        attrs.push_str(&format!(" variant=\"{variant}\""));
    }
    format!("<collapsible {attrs}>\n\n{body}\n\n</collapsible>")
}

//! HTML renderer.
//!
//! Produces a [`Node`] tree with `guide-*` CSS classes from chapter
//! markdown. Markdown is parsed with `pulldown-cmark` (GFM tables and
//! strikethrough enabled); three hooks intervene during the event walk:
//!
//! - fenced code blocks go through the classifier and render as Who/What
//!   boxes, info boxes, or nothing at all;
//! - tables go through the reclassifier, with plain table rendering as the
//!   mandatory fallback when it declines;
//! - italics inside headings become highlight spans.
//!
//! `<collapsible>` block tags produced by the rewriter are hydrated into a
//! toggle widget whose body starts hidden.

use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::ast::{Node, escape_html};
use crate::fenced::{Background, FenceKind, classify_fence, info_box_markdown};
use crate::richtext::{CellItem, RichBlock, bold_spans, cell_text, split_cell_bullets};
use crate::table::{TableShape, classify_table};

static COLLAPSIBLE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^<collapsible id="([^"]+)" title="([^"]*)"(?: level="(\d+)")?(?: variant="([^"]+)")?>\s*$"#,
    )
    .expect("valid regex")
});

/// Internal marker tags used while assembling tables; never serialized.
const TABLE_MARK: &str = "#table";
const HEAD_MARK: &str = "#head";
const ROW_MARK: &str = "#row";
const CELL_MARK: &str = "#cell";

/// Render chapter markdown (already reference-resolved and
/// collapsible-rewritten) to a node tree.
pub fn render_markdown(markdown: &str) -> Node {
    let mut nodes = Vec::new();
    let mut plain = String::new();
    let mut lines = markdown.lines();

    while let Some(line) = lines.next() {
        let Some(caps) = COLLAPSIBLE_OPEN.captures(line) else {
            plain.push_str(line);
            plain.push('\n');
            continue;
        };

        if !plain.trim().is_empty() {
            nodes.extend(render_segment(&plain));
        }
        plain.clear();

        let id = caps[1].to_string();
        let title = unescape_attr(&caps[2]);
        let level = caps.get(3).map(|m| m.as_str().to_string());
        let variant = caps.get(4).map(|m| m.as_str().to_string());

        let mut body = String::new();
        let mut depth = 1usize;
        for body_line in lines.by_ref() {
            if COLLAPSIBLE_OPEN.is_match(body_line) {
                depth += 1;
            } else if body_line.trim() == "</collapsible>" {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            body.push_str(body_line);
            body.push('\n');
        }
        nodes.push(collapsible_widget(
            &id,
            &title,
            level.as_deref(),
            variant.as_deref(),
            &body,
        ));
    }
    if !plain.trim().is_empty() {
        nodes.extend(render_segment(&plain));
    }

    Node::Fragment(nodes)
}

/// The expand/collapse widget: a toggle header plus a hidden body.
fn collapsible_widget(
    id: &str,
    title: &str,
    level: Option<&str>,
    variant: Option<&str>,
    body: &str,
) -> Node {
    let mut class = "guide-collapsible".to_string();
    if variant == Some("bullet") {
        class.push_str(" guide-collapsible-bullet");
    }
    let mut attrs = vec![
        ("class".to_string(), class),
        ("id".to_string(), id.to_string()),
    ];
    if let Some(level) = level {
        attrs.push(("data-level".to_string(), level.to_string()));
    }

    let body_id = format!("{id}-body");
    Node::elem_attrs(
        "div",
        attrs,
        vec![
            Node::elem_attrs(
                "button",
                vec![
                    ("class".to_string(), "guide-collapsible-toggle".to_string()),
                    ("aria-expanded".to_string(), "false".to_string()),
                    ("aria-controls".to_string(), body_id.clone()),
                ],
                vec![Node::text(title)],
            ),
            Node::elem_attrs(
                "div",
                vec![
                    ("class".to_string(), "guide-collapsible-body".to_string()),
                    ("id".to_string(), body_id),
                    ("style".to_string(), "display:none".to_string()),
                ],
                vec![render_markdown(body)],
            ),
        ],
    )
}

/// Reverse of attribute escaping for titles carried in collapsible tags.
fn unescape_attr(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Render one plain markdown segment (no collapsible tags) via the
/// pulldown-cmark event stream.
fn render_segment(markdown: &str) -> Vec<Node> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(markdown, options) {
        builder.event(event);
    }
    builder.finish()
}

/// Assembles the node tree from parser events. Frames on the stack are
/// ordinary elements except for the `#`-prefixed table markers, which exist
/// only until the table closes and is classified.
struct TreeBuilder {
    stack: Vec<Frame>,
    /// Fence text accumulates here instead of the tree.
    fence: Option<String>,
}

struct Frame {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl TreeBuilder {
    fn new() -> TreeBuilder {
        TreeBuilder {
            stack: vec![Frame {
                tag: String::new(),
                attrs: Vec::new(),
                children: Vec::new(),
            }],
            fence: None,
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.stack.pop().map(|f| f.children).unwrap_or_default()
    }

    fn push(&mut self, tag: &str) {
        self.push_attrs(tag, Vec::new());
    }

    fn push_attrs(&mut self, tag: &str, attrs: Vec<(String, String)>) {
        self.stack.push(Frame {
            tag: tag.to_string(),
            attrs,
            children: Vec::new(),
        });
    }

    fn emit(&mut self, node: Node) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(node);
        }
    }

    /// Pop the current frame and emit it as an element.
    fn close(&mut self) {
        if let Some(frame) = self.stack.pop() {
            let node = Node::Element {
                tag: frame.tag,
                attrs: frame.attrs,
                children: frame.children,
            };
            self.emit(node);
        }
    }

    fn event(&mut self, event: Event) {
        if let Some(fence) = self.fence.as_mut() {
            match event {
                Event::Text(t) => fence.push_str(&t),
                Event::End(TagEnd::CodeBlock) => {
                    let text = self.fence.take().unwrap_or_default();
                    if let Some(node) = render_fence(&text) {
                        self.emit(node);
                    }
                }
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(t) => self.emit(Node::text(&t)),
            Event::Code(t) => self.emit(Node::elem("code", vec![Node::text(&t)])),
            Event::Html(html) | Event::InlineHtml(html) => {
                self.emit(Node::Raw(html.to_string()));
            }
            Event::SoftBreak => self.emit(Node::text("\n")),
            Event::HardBreak => self.emit(Node::elem("br", vec![])),
            Event::Rule => self.emit(Node::elem("hr", vec![])),
            Event::InlineMath(t) | Event::DisplayMath(t) => self.emit(Node::text(&t)),
            Event::TaskListMarker(_) | Event::FootnoteReference(_) => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => self.push("p"),
            Tag::Heading { level, .. } => self.push(&level.to_string()),
            Tag::BlockQuote(_) => self.push("blockquote"),
            Tag::CodeBlock(_) => {
                // Indented code is treated the same as an unlabeled fence.
                self.fence = Some(String::new());
            }
            Tag::List(Some(start)) => {
                let attrs = if start != 1 {
                    vec![("start".to_string(), start.to_string())]
                } else {
                    Vec::new()
                };
                self.push_attrs("ol", attrs);
            }
            Tag::List(None) => self.push("ul"),
            Tag::Item => self.push("li"),
            Tag::Emphasis => self.push("em"),
            Tag::Strong => self.push("strong"),
            Tag::Strikethrough => self.push("del"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut attrs = vec![("href".to_string(), dest_url.to_string())];
                if !title.is_empty() {
                    attrs.push(("title".to_string(), title.to_string()));
                }
                self.push_attrs("a", attrs);
            }
            Tag::Image { dest_url, .. } => {
                self.push_attrs("img", vec![("src".to_string(), dest_url.to_string())]);
            }
            Tag::Table(_) => self.push(TABLE_MARK),
            Tag::TableHead => self.push(HEAD_MARK),
            Tag::TableRow => self.push(ROW_MARK),
            Tag::TableCell => self.push(CELL_MARK),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                if let Some(frame) = self.stack.last_mut() {
                    for child in &mut frame.children {
                        highlight_italics(child);
                    }
                }
                self.close();
            }
            TagEnd::Image => {
                // Alt text was collected as children; fold it into the attr.
                if let Some(frame) = self.stack.pop() {
                    let alt = Node::Fragment(frame.children).text_content();
                    let mut attrs = frame.attrs;
                    attrs.push(("alt".to_string(), alt));
                    self.emit(Node::Element {
                        tag: "img".to_string(),
                        attrs,
                        children: Vec::new(),
                    });
                }
            }
            TagEnd::TableCell => {
                if let Some(frame) = self.stack.pop() {
                    self.emit(Node::Fragment(frame.children));
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => self.close(),
            TagEnd::Table => {
                if let Some(frame) = self.stack.pop() {
                    self.emit(build_table(frame.children));
                }
            }
            TagEnd::Paragraph
            | TagEnd::BlockQuote(_)
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link => self.close(),
            _ => {}
        }
    }
}

/// Rewrite `em`/`i` elements to highlight spans, in place.
fn highlight_italics(node: &mut Node) {
    match node {
        Node::Element {
            tag,
            attrs,
            children,
        } => {
            if tag == "em" || tag == "i" {
                *tag = "span".to_string();
                attrs.push(("class".to_string(), "highlight".to_string()));
            }
            for child in children {
                highlight_italics(child);
            }
        }
        Node::Fragment(children) => {
            for child in children {
                highlight_italics(child);
            }
        }
        _ => {}
    }
}

// -----------------------------------------------------------------------
// Fenced blocks
// -----------------------------------------------------------------------

/// Classify fence text and render the box, or `None` to suppress it.
fn render_fence(text: &str) -> Option<Node> {
    match classify_fence(text) {
        FenceKind::Discard => None,
        FenceKind::WhoWhat { who, what } => Some(who_what_box(&who, &what)),
        FenceKind::InfoBox {
            title,
            icon,
            background,
            body,
        } => Some(info_box(
            title.as_deref(),
            icon.as_deref(),
            background,
            &body,
        )),
    }
}

fn who_what_box(who: &str, what: &str) -> Node {
    let row = |label: &str, value: &str| {
        Node::elem_attrs(
            "div",
            vec![("class".to_string(), "guide-whowhat-row".to_string())],
            vec![
                Node::elem_attrs(
                    "span",
                    vec![("class".to_string(), "guide-whowhat-label".to_string())],
                    vec![Node::text(label)],
                ),
                Node::elem("span", vec![Node::text(value)]),
            ],
        )
    };
    Node::elem_attrs(
        "div",
        vec![("class".to_string(), "guide-whowhat".to_string())],
        vec![row("Who", who), row("What", what)],
    )
}

fn info_box(title: Option<&str>, icon: Option<&str>, background: Background, body: &str) -> Node {
    let class = match background {
        Background::Green => "guide-infobox guide-infobox-green",
        Background::Gray => "guide-infobox guide-infobox-gray",
    };
    let mut children = Vec::new();
    if let Some(icon) = icon {
        children.push(Node::elem_attrs(
            "span",
            vec![
                ("class".to_string(), "guide-infobox-icon".to_string()),
                ("data-icon".to_string(), icon.to_string()),
            ],
            vec![],
        ));
    }
    children.push(Node::elem_attrs(
        "div",
        vec![("class".to_string(), "guide-infobox-body".to_string())],
        vec![render_markdown(&info_box_markdown(title, body))],
    ));
    Node::elem_attrs(
        "div",
        vec![("class".to_string(), class.to_string())],
        children,
    )
}

// -----------------------------------------------------------------------
// Tables
// -----------------------------------------------------------------------

/// Unpack the marker frames collected during the event walk, classify the
/// table, and render the matching shape. Classification declining is not
/// an error; the plain-table fallback always renders something.
fn build_table(parts: Vec<Node>) -> Node {
    let mut head: Vec<Node> = Vec::new();
    let mut rows: Vec<Vec<Node>> = Vec::new();

    for part in parts {
        if let Node::Element { tag, children, .. } = part {
            if tag == HEAD_MARK {
                head = children;
            } else if tag == ROW_MARK {
                rows.push(children);
            }
        }
    }

    match classify_table(&head, &rows) {
        Some(TableShape::Regular { headers, rows }) => regular_table(&headers, rows),
        Some(TableShape::MergedHeader {
            title,
            subtitle,
            headers,
            rows,
        }) => merged_header_table(&title, subtitle.as_deref(), &headers, rows),
        Some(TableShape::NarrativeHeader { header, rows }) => narrative_header_table(&header, rows),
        None => default_table(head, rows),
    }
}

fn th(content: Node) -> Node {
    Node::elem("th", vec![content])
}

fn header_row(headers: &[String]) -> Node {
    Node::elem("tr", headers.iter().map(|h| th(Node::text(h))).collect())
}

/// Merged-header column headers were bold in the source row; keep them so.
fn bold_header_row(headers: &[String]) -> Node {
    Node::elem(
        "tr",
        headers
            .iter()
            .map(|h| th(Node::elem("strong", vec![Node::text(h)])))
            .collect(),
    )
}

fn data_rows(rows: Vec<Vec<Node>>) -> Node {
    Node::elem(
        "tbody",
        rows.into_iter()
            .map(|row| {
                Node::elem(
                    "tr",
                    row.into_iter()
                        .map(|cell| Node::elem("td", vec![render_cell(cell)]))
                        .collect(),
                )
            })
            .collect(),
    )
}

fn table_elem(class: &str, children: Vec<Node>) -> Node {
    Node::elem_attrs(
        "table",
        vec![("class".to_string(), format!("guide-table {class}"))],
        children,
    )
}

fn regular_table(headers: &[String], rows: Vec<Vec<Node>>) -> Node {
    table_elem(
        "guide-table-regular",
        vec![Node::elem("thead", vec![header_row(headers)]), data_rows(rows)],
    )
}

fn merged_header_table(
    title: &str,
    subtitle: Option<&str>,
    headers: &[String],
    rows: Vec<Vec<Node>>,
) -> Node {
    let span = headers.len().max(1).to_string();
    let mut banner = vec![Node::elem_attrs(
        "div",
        vec![("class".to_string(), "guide-table-title".to_string())],
        vec![Node::text(title)],
    )];
    if let Some(subtitle) = subtitle {
        banner.push(Node::elem_attrs(
            "div",
            vec![("class".to_string(), "guide-table-subtitle".to_string())],
            vec![Node::text(subtitle)],
        ));
    }

    table_elem(
        "guide-table-merged",
        vec![
            Node::elem(
                "thead",
                vec![
                    Node::elem(
                        "tr",
                        vec![Node::elem_attrs(
                            "th",
                            vec![("colspan".to_string(), span)],
                            banner,
                        )],
                    ),
                    bold_header_row(headers),
                ],
            ),
            data_rows(rows),
        ],
    )
}

fn narrative_header_table(header: &[RichBlock], rows: Vec<Vec<Node>>) -> Node {
    let span = rows.iter().map(|r| r.len()).max().unwrap_or(1).to_string();
    table_elem(
        "guide-table-narrative",
        vec![
            Node::elem(
                "thead",
                vec![Node::elem(
                    "tr",
                    vec![Node::elem_attrs(
                        "th",
                        vec![("colspan".to_string(), span)],
                        header.iter().map(rich_block).collect(),
                    )],
                )],
            ),
            data_rows(rows),
        ],
    )
}

fn default_table(head: Vec<Node>, rows: Vec<Vec<Node>>) -> Node {
    let mut children = Vec::new();
    if head.iter().any(|c| !c.text_content().trim().is_empty()) {
        children.push(Node::elem(
            "thead",
            vec![Node::elem("tr", head.into_iter().map(th).collect())],
        ));
    }
    children.push(data_rows(rows));
    table_elem("guide-table-default", children)
}

fn rich_block(block: &RichBlock) -> Node {
    match block {
        RichBlock::Title(text) => Node::elem_attrs(
            "div",
            vec![("class".to_string(), "guide-rich-title".to_string())],
            vec![Node::text(text)],
        ),
        RichBlock::Section { name, bullets } => Node::elem_attrs(
            "div",
            vec![("class".to_string(), "guide-rich-section".to_string())],
            vec![
                Node::elem("strong", vec![Node::text(name)]),
                bullet_list(bullets),
            ],
        ),
        RichBlock::SubHeader(text) => {
            Node::elem("p", vec![Node::elem("strong", vec![Node::text(text)])])
        }
        RichBlock::Bullets(items) => bullet_list(items),
        RichBlock::Paragraph(text) => Node::elem("p", vec![bold_spans(text)]),
    }
}

fn bullet_list(items: &[String]) -> Node {
    Node::elem(
        "ul",
        items
            .iter()
            .map(|item| Node::elem("li", vec![bold_spans(item)]))
            .collect(),
    )
}

/// Cell content: split into a list when the text carries bullet
/// delimiters, with bold-only parts promoted to sub-header paragraphs;
/// otherwise the parsed inline content passes through unchanged.
fn render_cell(cell: Node) -> Node {
    let text = cell_text(&cell);
    let Some(items) = split_cell_bullets(&text) else {
        return cell;
    };

    let mut out: Vec<Node> = Vec::new();
    let mut pending: Vec<Node> = Vec::new();
    for item in items {
        match item {
            CellItem::SubHeader(text) => {
                if !pending.is_empty() {
                    out.push(Node::elem("ul", std::mem::take(&mut pending)));
                }
                out.push(Node::elem_attrs(
                    "p",
                    vec![("class".to_string(), "guide-cell-subheader".to_string())],
                    vec![Node::elem("strong", vec![Node::text(&text)])],
                ));
            }
            CellItem::Bullet(text) => {
                pending.push(Node::elem("li", vec![bold_spans(&text)]));
            }
        }
    }
    if !pending.is_empty() {
        out.push(Node::elem("ul", pending));
    }
    Node::Fragment(out)
}

// -----------------------------------------------------------------------
// Full pages
// -----------------------------------------------------------------------

/// Configuration for full-page HTML rendering.
#[derive(Debug, Clone, Default)]
pub struct PageConfig {
    /// Page title; falls back to "Guide".
    pub title: Option<String>,
    /// Optional meta description.
    pub description: Option<String>,
    /// Language code (default "en").
    pub lang: Option<String>,
    /// Print variant: hides navigation chrome.
    pub print: bool,
    /// Trigger the system print dialog once content settles (print pages
    /// only, requested via query parameter).
    pub autoprint: bool,
}

/// Wrap a rendered body fragment in a complete HTML page embedding the
/// crate stylesheet and the collapsible toggle script.
pub fn to_html_page(body: &str, config: &PageConfig) -> String {
    let lang = config.lang.as_deref().unwrap_or("en");
    let title = config.title.as_deref().unwrap_or("Guide");

    let mut meta_extra = String::new();
    if let Some(desc) = &config.description {
        meta_extra.push_str(&format!(
            "\n    <meta name=\"description\" content=\"{}\">",
            escape_html(desc)
        ));
    }

    let article_class = if config.print {
        "guide guide-print"
    } else {
        "guide"
    };
    let autoprint = if config.print && config.autoprint {
        "\n<script>window.addEventListener('load', () => setTimeout(() => window.print(), 200));</script>"
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>{meta_extra}
    <style>{css}</style>
</head>
<body>
<article class="{article_class}">
{body}
</article>
<script>
document.querySelectorAll('.guide-collapsible-toggle').forEach(btn => {{
  btn.addEventListener('click', () => {{
    const target = document.getElementById(btn.getAttribute('aria-controls'));
    const open = btn.getAttribute('aria-expanded') === 'true';
    btn.setAttribute('aria-expanded', String(!open));
    target.style.display = open ? 'none' : 'block';
  }});
}});
</script>{autoprint}
</body>
</html>"#,
        lang = escape_html(lang),
        title = escape_html(title),
        meta_extra = meta_extra,
        css = crate::GUIDE_CSS,
        body = body,
        article_class = article_class,
        autoprint = autoprint,
    )
}

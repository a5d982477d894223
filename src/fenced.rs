//! Fenced-block classification.
//!
//! Code fences in guide chapters are a mini-DSL for styled callouts, not
//! code display (the guides never show code samples). A fence is classified
//! into one of three render instructions:
//!
//! - a two-row "Who/What" definition box,
//! - a bulleted info box (optionally headed, optionally iconed), or
//! - `Discard` — unrecognized fences render as nothing.
//!
//! A fence may open with YAML frontmatter (`---` ... `---`) recognizing
//! `icon` and `background` keys.

use serde::Deserialize;

/// Background variant for info boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    Green,
    Gray,
}

impl Background {
    fn parse(s: &str) -> Background {
        match s.trim() {
            "grey" | "gray" => Background::Gray,
            _ => Background::Green,
        }
    }
}

/// Render instruction for one fenced block.
#[derive(Debug, Clone, PartialEq)]
pub enum FenceKind {
    /// Two-row definition box with "Who" and "What" labels.
    WhoWhat { who: String, what: String },
    /// Styled box whose body is re-rendered as nested markdown.
    InfoBox {
        title: Option<String>,
        icon: Option<String>,
        background: Background,
        body: String,
    },
    /// Plain or unrecognized code; suppressed from output entirely.
    Discard,
}

#[derive(Debug, Default, Deserialize)]
struct FenceFrontMatter {
    icon: Option<String>,
    background: Option<String>,
}

/// Classify the literal text content of one fenced code block.
pub fn classify_fence(content: &str) -> FenceKind {
    let content = content.trim();
    if content.is_empty() {
        return FenceKind::Discard;
    }

    let mut lines: Vec<&str> = content.lines().collect();
    let mut icon: Option<String> = None;
    let mut background = Background::Green;

    // Frontmatter: first line exactly `---`, closed by a second bare `---`.
    // A missing closer means no frontmatter at all; the whole content goes
    // through classification raw.
    if lines.first() == Some(&"---") {
        if let Some(end) = lines.iter().skip(1).position(|l| *l == "---") {
            let inner = lines[1..=end].join("\n");
            match serde_yaml::from_str::<FenceFrontMatter>(&inner) {
                Ok(fm) => {
                    icon = fm.icon.map(|s| s.trim().to_string());
                    if let Some(bg) = fm.background {
                        background = Background::parse(&bg);
                    }
                }
                Err(err) => {
                    log::debug!("ignoring unparseable fence frontmatter: {err}");
                }
            }
            lines.drain(..=end + 1);
        }
    }

    // Who/What box: both labels present, all other lines ignored.
    let who = lines
        .iter()
        .find_map(|l| l.trim().strip_prefix("- Who:").map(str::trim));
    let what = lines
        .iter()
        .find_map(|l| l.trim().strip_prefix("- What:").map(str::trim));
    if let (Some(who), Some(what)) = (who, what) {
        return FenceKind::WhoWhat {
            who: who.to_string(),
            what: what.to_string(),
        };
    }

    // Title: only an actual heading on the first non-blank line counts.
    let mut title: Option<String> = None;
    let mut body_start = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(text) = heading_text(trimmed) {
            title = Some(text.to_string());
            body_start = i + 1;
        }
        break;
    }

    let has_bullets = lines.iter().any(|l| l.trim().starts_with('-'));

    let eligible = (icon.is_some() && !lines.is_empty()) || (title.is_some() && has_bullets);
    if !eligible {
        return FenceKind::Discard;
    }

    let body = if title.is_some() {
        lines[body_start..].join("\n").trim().to_string()
    } else {
        lines.join("\n").trim().to_string()
    };

    FenceKind::InfoBox {
        title,
        icon,
        background,
        body,
    }
}

/// Nested markdown fed to the renderer for an info box: the body, prefixed
/// with a `###` heading when a title exists.
pub fn info_box_markdown(title: Option<&str>, body: &str) -> String {
    match title {
        Some(title) => format!("### {title}\n\n{body}"),
        None => body.to_string(),
    }
}

fn heading_text(line: &str) -> Option<&str> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=6).contains(&hashes) && line[hashes..].starts_with(' ') {
        Some(line[hashes..].trim())
    } else {
        None
    }
}

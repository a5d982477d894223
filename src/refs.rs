//! Image-reference resolution.
//!
//! Guide chapters exported from word processors use reference-style images
//! (`![alt][ref]` with a `[ref]: url` definition elsewhere, often a
//! multi-megabyte data URI). This pass inlines every reference as
//! `![alt](url)` and strips the definition lines, so downstream passes see
//! only inline image syntax.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static REF_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[([^\]]+)\]:[ \t]*(.+)$").expect("valid regex"));

/// Inline all image references and remove their definition lines.
///
/// Reference keys are matched case-insensitively. Multiple definitions for
/// the same key: last one wins. A usage with no matching definition is left
/// untouched (the image renders broken, which is acceptable). Running this
/// on its own output is a no-op: resolved output contains no definition
/// lines.
pub fn resolve_image_refs(content: &str) -> String {
    let mut refs: HashMap<String, String> = HashMap::new();

    for caps in REF_DEF.captures_iter(content) {
        let key = caps[1].trim().to_lowercase();
        let mut url = caps[2].trim();
        if url.starts_with('<') && url.ends_with('>') {
            url = &url[1..url.len() - 1];
        }
        if !url.is_empty() {
            refs.insert(key, url.to_string());
        }
    }

    if refs.is_empty() {
        return content.to_string();
    }
    log::debug!("resolving {} image reference definition(s)", refs.len());

    let mut resolved = content.to_string();
    for (key, url) in &refs {
        let escaped = regex::escape(key);

        // ![alt][ref] usages, alt optional, ref case-insensitive.
        let usage = Regex::new(&format!(r"(?i)!\[(.*?)\]\[{escaped}\]")).expect("valid regex");
        resolved = usage
            .replace_all(&resolved, |caps: &regex::Captures| {
                format!("![{}]({url})", &caps[1])
            })
            .into_owned();

        // Remove the definition line itself.
        let def = Regex::new(&format!(r"(?im)^\[{escaped}\]:[ \t]*.+$")).expect("valid regex");
        resolved = def.replace_all(&resolved, "").into_owned();
    }

    resolved
}

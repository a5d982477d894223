//! Post-render annotation passes.
//!
//! Both passes are pure transforms over the rendered [`Node`] tree, run
//! before serialization:
//!
//! - [`annotate_glossary`] wraps glossary-term occurrences in tooltip-ready
//!   spans;
//! - [`substitute_region`] rewrites the other region's vocabulary into the
//!   active region's.
//!
//! Opaque subtrees (`script`, `code`, form controls, ...) and explicitly
//! opted-out containers are never descended into. Already-wrapped glossary
//! spans are skipped structurally, so re-running a pass on its own output
//! changes nothing.

use crate::ast::{Node, OPAQUE_TAGS};
use crate::glossary::GlossaryTerm;
use crate::matcher::TermMatcher;
use crate::region::{Region, TermMapping};

/// Class names whose subtrees the glossary pass leaves alone.
const GLOSSARY_SKIP_CLASSES: &[&str] = &["glossary-term", "no-glossary"];

/// Class name that opts a subtree out of region substitution.
const REGION_SKIP_CLASS: &str = "no-region-replace";

/// Wrap every whole-word glossary-term occurrence in a
/// `span.glossary-term` carrying the term and its definition as data
/// attributes (the tooltip reads them client-side). Longest term wins on
/// overlap; an empty term list is a no-op.
pub fn annotate_glossary(node: &mut Node, terms: &[GlossaryTerm]) {
    let words: Vec<&str> = terms.iter().map(|t| t.term.as_str()).collect();
    let matcher = TermMatcher::new(&words);
    if matcher.is_empty() {
        return;
    }
    walk(node, GLOSSARY_SKIP_CLASSES, &mut |text| {
        wrap_terms(text, &matcher, terms)
    });
}

/// Replace the *other* region's terms with the active region's, in place,
/// across all reachable text leaves. Whole-word, case-insensitive,
/// longest-first. Applying the same region twice is a no-op: substituted
/// text contains only active-region terms, which are not in the pattern
/// set.
pub fn substitute_region(node: &mut Node, mappings: &[TermMapping], region: Region) {
    let other = region.other();
    let sources: Vec<&str> = mappings.iter().map(|m| m.term_for(other)).collect();
    let matcher = TermMatcher::new(&sources);
    if matcher.is_empty() {
        return;
    }
    walk(node, &[REGION_SKIP_CLASS], &mut |text| {
        let replaced = replace_terms(text, &matcher, &|i| mappings[i].term_for(region));
        (replaced != text).then_some(Node::Text(replaced))
    });
}

/// Substitute region terms in a plain string, for text that never enters
/// the rendered tree.
pub fn substitute_region_text(text: &str, mappings: &[TermMapping], region: Region) -> String {
    let other = region.other();
    let sources: Vec<&str> = mappings.iter().map(|m| m.term_for(other)).collect();
    let matcher = TermMatcher::new(&sources);
    if matcher.is_empty() {
        return text.to_string();
    }
    replace_terms(text, &matcher, &|i| mappings[i].term_for(region))
}

/// Visit every reachable text leaf; `f` returns a replacement node when the
/// leaf changes. Opaque tags and skip-listed classes prune the walk.
fn walk(node: &mut Node, skip_classes: &[&str], f: &mut dyn FnMut(&str) -> Option<Node>) {
    match node {
        Node::Text(t) => {
            if let Some(replacement) = f(t) {
                *node = replacement;
            }
        }
        Node::Element {
            tag,
            attrs,
            children,
        } => {
            if OPAQUE_TAGS.contains(&tag.as_str()) {
                return;
            }
            let class = attrs
                .iter()
                .find(|(k, _)| k == "class")
                .map(|(_, v)| v.as_str())
                .unwrap_or("");
            if class
                .split_whitespace()
                .any(|token| skip_classes.contains(&token))
            {
                return;
            }
            for child in children {
                walk(child, skip_classes, f);
            }
        }
        Node::Fragment(children) => {
            for child in children {
                walk(child, skip_classes, f);
            }
        }
        Node::Raw(_) => {}
    }
}

/// Split matched text into plain pieces and glossary spans. `None` when
/// nothing matched (the leaf stays as-is).
fn wrap_terms(text: &str, matcher: &TermMatcher, terms: &[GlossaryTerm]) -> Option<Node> {
    let matches = matcher.find(text);
    if matches.is_empty() {
        return None;
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for m in matches {
        if m.start > last {
            pieces.push(Node::text(&text[last..m.start]));
        }
        let term = &terms[m.term];
        pieces.push(Node::elem_attrs(
            "span",
            vec![
                ("class".to_string(), "glossary-term".to_string()),
                ("data-term".to_string(), term.term.clone()),
                ("data-definition".to_string(), term.definition.clone()),
            ],
            vec![Node::text(&text[m.start..m.end])],
        ));
        last = m.end;
    }
    if last < text.len() {
        pieces.push(Node::text(&text[last..]));
    }
    Some(Node::Fragment(pieces))
}

/// Rebuild text with every match replaced via `replacement(term_index)`.
fn replace_terms<'a>(
    text: &str,
    matcher: &TermMatcher,
    replacement: &dyn Fn(usize) -> &'a str,
) -> String {
    let matches = matcher.find(text);
    if matches.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in matches {
        out.push_str(&text[last..m.start]);
        out.push_str(replacement(m.term));
        last = m.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ai_terms() -> Vec<GlossaryTerm> {
        vec![GlossaryTerm {
            term: "AI".to_string(),
            definition: "Artificial Intelligence".to_string(),
        }]
    }

    fn state_mapping() -> Vec<TermMapping> {
        vec![TermMapping {
            us: "state".to_string(),
            global: "province".to_string(),
        }]
    }

    #[test]
    fn wraps_single_occurrence_with_definition() {
        let mut node = Node::elem("p", vec![Node::text("Buying AI is hard.")]);
        annotate_glossary(&mut node, &ai_terms());
        let html = node.to_html();
        assert_eq!(
            html,
            "<p>Buying <span class=\"glossary-term\" data-term=\"AI\" \
             data-definition=\"Artificial Intelligence\">AI</span> is hard.</p>"
        );
    }

    #[test]
    fn surrounding_text_stays_plain() {
        let mut node = Node::elem("p", vec![Node::text("Buying AI is hard.")]);
        annotate_glossary(&mut node, &ai_terms());
        match &node {
            Node::Element { children, .. } => match &children[0] {
                Node::Fragment(pieces) => {
                    assert_eq!(pieces[0], Node::text("Buying "));
                    assert_eq!(pieces[2], Node::text(" is hard."));
                }
                other => panic!("expected fragment, got {other:?}"),
            },
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn longest_term_wraps_as_one_unit() {
        let terms = vec![
            GlossaryTerm {
                term: "data".to_string(),
                definition: "facts".to_string(),
            },
            GlossaryTerm {
                term: "open data".to_string(),
                definition: "free facts".to_string(),
            },
        ];
        let mut node = Node::text("open data policy");
        annotate_glossary(&mut node, &terms);
        let html = node.to_html();
        assert!(html.contains("data-term=\"open data\""));
        assert!(!html.contains("data-term=\"data\""));
    }

    #[test]
    fn code_subtree_untouched() {
        let mut node = Node::elem("code", vec![Node::text("AI")]);
        annotate_glossary(&mut node, &ai_terms());
        assert_eq!(node.to_html(), "<code>AI</code>");
    }

    #[test]
    fn no_glossary_container_untouched() {
        let mut node = Node::elem_attrs(
            "div",
            vec![("class".to_string(), "no-glossary".to_string())],
            vec![Node::text("AI")],
        );
        annotate_glossary(&mut node, &ai_terms());
        assert_eq!(node.text_content(), "AI");
        assert!(!node.to_html().contains("glossary-term"));
    }

    #[test]
    fn glossary_pass_is_idempotent() {
        let mut node = Node::elem("p", vec![Node::text("AI and AI")]);
        annotate_glossary(&mut node, &ai_terms());
        let once = node.to_html();
        annotate_glossary(&mut node, &ai_terms());
        assert_eq!(node.to_html(), once);
    }

    #[test]
    fn empty_term_list_is_noop() {
        let mut node = Node::text("AI everywhere");
        annotate_glossary(&mut node, &[]);
        assert_eq!(node, Node::text("AI everywhere"));
    }

    #[test]
    fn region_swaps_other_terms() {
        let mut node = Node::elem("p", vec![Node::text("Each state sets policy.")]);
        substitute_region(&mut node, &state_mapping(), Region::Global);
        assert_eq!(node.text_content(), "Each province sets policy.");
    }

    #[test]
    fn region_substitution_respects_word_boundaries() {
        let mut node = Node::text("statement about state");
        substitute_region(&mut node, &state_mapping(), Region::Global);
        assert_eq!(node.text_content(), "statement about province");
    }

    #[test]
    fn region_substitution_case_insensitive() {
        let mut node = Node::text("State and state");
        substitute_region(&mut node, &state_mapping(), Region::Global);
        assert_eq!(node.text_content(), "province and province");
    }

    #[test]
    fn region_pass_is_idempotent() {
        let mut node = Node::text("state policy");
        substitute_region(&mut node, &state_mapping(), Region::Global);
        let once = node.text_content();
        substitute_region(&mut node, &state_mapping(), Region::Global);
        assert_eq!(node.text_content(), once);
    }

    #[test]
    fn us_region_swaps_global_terms_back() {
        let mut node = Node::text("province policy");
        substitute_region(&mut node, &state_mapping(), Region::Us);
        assert_eq!(node.text_content(), "state policy");
    }

    #[test]
    fn opted_out_container_keeps_region_terms() {
        let mut node = Node::elem_attrs(
            "div",
            vec![("class".to_string(), "no-region-replace".to_string())],
            vec![Node::text("state")],
        );
        substitute_region(&mut node, &state_mapping(), Region::Global);
        assert_eq!(node.text_content(), "state");
    }

    #[test]
    fn substitute_region_text_handles_plain_strings() {
        let out = substitute_region_text("state of play", &state_mapping(), Region::Global);
        assert_eq!(out, "province of play");
    }

    #[test]
    fn longest_mapping_wins() {
        let mappings = vec![
            TermMapping {
                us: "zip code".to_string(),
                global: "postal code".to_string(),
            },
            TermMapping {
                us: "zip".to_string(),
                global: "archive".to_string(),
            },
        ];
        let out = substitute_region_text("enter your zip code", &mappings, Region::Global);
        assert_eq!(out, "enter your postal code");
    }
}

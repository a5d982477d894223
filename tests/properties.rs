//! Property tests for the text-rewrite passes.
//!
//! All three rewrites promise the same contract: running a pass on its own
//! output changes nothing. The unit tests pin that down for hand-picked
//! inputs; these exercise it across generated documents.

use proptest::prelude::*;

use fieldguide::annotate::substitute_region_text;
use fieldguide::matcher::TermMatcher;
use fieldguide::{Region, TermMapping, resolve_image_refs, rewrite_collapsibles};

fn mappings() -> Vec<TermMapping> {
    vec![
        TermMapping {
            us: "state".to_string(),
            global: "province".to_string(),
        },
        TermMapping {
            us: "zip code".to_string(),
            global: "postal code".to_string(),
        },
        TermMapping {
            us: "attorney".to_string(),
            global: "solicitor".to_string(),
        },
    ]
}

/// Words drawn from both vocabularies plus neutral filler.
fn word() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "state",
        "State",
        "province",
        "zip",
        "zip code",
        "postal code",
        "attorney",
        "solicitor",
        "statement",
        "policy",
        "the",
        "agency",
        "writes",
    ])
}

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 0..12).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn region_substitution_idempotent(text in sentence(), global in any::<bool>()) {
        let region = if global { Region::Global } else { Region::Us };
        let once = substitute_region_text(&text, &mappings(), region);
        let twice = substitute_region_text(&once, &mappings(), region);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn region_substitution_removes_other_vocabulary(text in sentence()) {
        let out = substitute_region_text(&text, &mappings(), Region::Global);
        let matcher = TermMatcher::new(&["state", "zip code", "attorney"]);
        prop_assert!(matcher.find(&out).is_empty(), "US terms left in {out:?}");
    }

    #[test]
    fn matcher_results_sorted_and_disjoint(text in sentence()) {
        let matcher = TermMatcher::new(&["state", "zip code", "zip", "po"]);
        let found = matcher.find(&text);
        for pair in found.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for m in &found {
            prop_assert!(m.start < m.end && m.end <= text.len());
        }
    }

    #[test]
    fn image_resolution_idempotent(
        alt in "[A-Za-z ]{0,12}",
        key in "[a-z][a-z0-9]{0,8}",
        name in "[a-z]{1,8}",
        filler in "[a-z ]{0,40}",
    ) {
        let doc = format!("![{alt}][{key}]\n\n{filler}\n\n[{key}]: http://x/{name}.png");
        let once = resolve_image_refs(&doc);
        let twice = resolve_image_refs(&once);
        let inlined = format!("![{alt}](http://x/{name}.png)");
        let definition = format!("[{key}]:");
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.contains(&inlined));
        prop_assert!(!once.contains(&definition));
    }

    #[test]
    fn collapsible_rewrite_idempotent(
        title in "[A-Za-z][A-Za-z ]{0,19}",
        body in "[a-z][a-z ]{0,30}",
        filler in "[a-z ]{0,30}",
    ) {
        let doc = format!(
            "# Chapter\n\n{filler}\n\n**{title} {{.collapsible}}**\n\n{body}\n\n\
             #### **{title} {{.collapsible}}**\n\n{body}\n"
        );
        let once = rewrite_collapsibles(&doc);
        let twice = rewrite_collapsibles(&once);
        let marker = "{.collapsible}";
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.contains(marker));
        prop_assert!(once.contains("collapsible-1"));
        prop_assert!(once.contains("collapsible-2"));
    }

    #[test]
    fn nested_collapsible_rewrite_idempotent(
        outer in "[A-Za-z][A-Za-z ]{0,12}",
        inner in "[A-Za-z][A-Za-z ]{0,12}",
        body in "[a-z][a-z ]{0,20}",
    ) {
        let doc = format!(
            "## **{outer} {{.collapsible}}**\n\n**{inner} {{.collapsible}}**\n\n{body}\n"
        );
        let once = rewrite_collapsibles(&doc);
        let twice = rewrite_collapsibles(&once);
        let marker = "{.collapsible}";
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.contains(marker));
        prop_assert!(once.contains("collapsible-1"));
        prop_assert!(once.contains("collapsible-2"));
    }
}

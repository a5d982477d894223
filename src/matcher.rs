//! Whole-word term matching shared by the glossary and region passes.
//!
//! Matching is case-insensitive, word-boundary delimited, and
//! non-overlapping. Longer terms are tried first, so with both "data" and
//! "open data" in the list, "open data policy" matches "open data" as one
//! unit and never splits it.

use regex::Regex;

/// One accepted match: byte range into the searched text plus the index of
/// the matched term in the list the matcher was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermMatch {
    pub start: usize,
    pub end: usize,
    pub term: usize,
}

/// A compiled term list. Build once, match against many text fragments.
#[derive(Debug)]
pub struct TermMatcher {
    /// Patterns paired with the caller's term index, longest term first.
    patterns: Vec<(Regex, usize)>,
}

impl TermMatcher {
    /// Compile a matcher over `terms`. Empty or whitespace-only terms are
    /// dropped; an empty list yields a matcher that never matches.
    pub fn new<S: AsRef<str>>(terms: &[S]) -> TermMatcher {
        let mut indexed: Vec<(usize, &str)> = terms
            .iter()
            .map(|t| t.as_ref().trim())
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
            .collect();
        // Longest first; ties keep list order.
        indexed.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        let patterns = indexed
            .into_iter()
            .filter_map(|(i, term)| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
                match Regex::new(&pattern) {
                    Ok(re) => Some((re, i)),
                    Err(err) => {
                        log::warn!("skipping unmatchable term {term:?}: {err}");
                        None
                    }
                }
            })
            .collect();

        TermMatcher { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// All non-overlapping matches in `text`, in text order. Longer terms
    /// claim their ranges first; later (shorter) terms cannot overlap them.
    pub fn find(&self, text: &str) -> Vec<TermMatch> {
        let mut accepted: Vec<TermMatch> = Vec::new();

        for (re, term) in &self.patterns {
            for m in re.find_iter(text) {
                let overlaps = accepted
                    .iter()
                    .any(|a| m.start() < a.end && a.start < m.end());
                if !overlaps {
                    accepted.push(TermMatch {
                        start: m.start(),
                        end: m.end(),
                        term: *term,
                    });
                }
            }
        }

        accepted.sort_by_key(|m| m.start);
        accepted
    }
}

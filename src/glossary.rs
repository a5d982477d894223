//! Glossary term list.
//!
//! Terms originate in a hand-maintained CSV (`Source, Term, Definition`)
//! and are carried at runtime as a JSON array. The CSV uses quoted fields
//! with embedded commas and doubled quotes, so splitting is done by a small
//! state machine rather than `str::split`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GuideError;

/// One defined term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    #[serde(rename = "Term")]
    pub term: String,
    #[serde(rename = "Definition")]
    pub definition: String,
}

/// Load the glossary from its JSON form.
pub fn load_glossary(path: &Path) -> Result<Vec<GlossaryTerm>, GuideError> {
    let raw = std::fs::read_to_string(path).map_err(|source| GuideError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| GuideError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the source CSV into a deduplicated, alphabetically sorted term
/// list. Expects `Source, Term, Definition` columns with an optional header
/// row; rows with a blank term or definition are skipped. Duplicate terms
/// (case-insensitive) keep their first definition.
pub fn parse_glossary_csv(raw: &str) -> Vec<GlossaryTerm> {
    let mut terms: Vec<GlossaryTerm> = Vec::new();

    for (i, record) in split_records(raw).iter().enumerate() {
        let fields = split_fields(record);
        if fields.len() < 3 {
            continue;
        }
        let term = fields[1].trim();
        let definition = fields[2].trim();
        if term.is_empty() || definition.is_empty() {
            continue;
        }
        if i == 0 && term.eq_ignore_ascii_case("term") {
            continue;
        }
        if terms.iter().any(|t| t.term.eq_ignore_ascii_case(term)) {
            log::debug!("duplicate glossary term {term:?} skipped");
            continue;
        }
        terms.push(GlossaryTerm {
            term: term.to_string(),
            definition: definition.to_string(),
        });
    }

    terms.sort_by(|a, b| a.term.to_lowercase().cmp(&b.term.to_lowercase()));
    terms
}

/// Split CSV text into logical records, keeping newlines that fall inside
/// quoted fields.
fn split_records(raw: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in raw.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '\n' if !in_quotes => {
                if !current.trim().is_empty() {
                    records.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            '\r' => {}
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        records.push(current);
    }
    records
}

/// Split one record into fields, honoring quotes and `""` escapes.
fn split_fields(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_plain_rows() {
        let csv = "Source,Term,Definition\nNIST,AI,Artificial Intelligence\nOMB,API,Application Programming Interface\n";
        let terms = parse_glossary_csv(csv);
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].term, "AI");
        assert_eq!(terms[0].definition, "Artificial Intelligence");
    }

    #[test]
    fn quoted_field_with_comma() {
        let csv = "Source,Term,Definition\nx,Open data,\"Data that is free to use, reuse, and redistribute\"\n";
        let terms = parse_glossary_csv(csv);
        assert_eq!(
            terms[0].definition,
            "Data that is free to use, reuse, and redistribute"
        );
    }

    #[test]
    fn doubled_quotes_unescape() {
        let csv = "x,Cloud,\"Also called \"\"the cloud\"\"\"\n";
        let terms = parse_glossary_csv(csv);
        assert_eq!(terms[0].definition, "Also called \"the cloud\"");
    }

    #[test]
    fn newline_inside_quoted_field() {
        let csv = "x,RFP,\"Request for\nProposal\"\ny,SLA,Service Level Agreement\n";
        let terms = parse_glossary_csv(csv);
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].definition, "Request for\nProposal");
    }

    #[test]
    fn header_row_skipped() {
        let csv = "Source,Term,Definition\nx,AI,def\n";
        assert_eq!(parse_glossary_csv(csv).len(), 1);
    }

    #[test]
    fn duplicate_terms_keep_first() {
        let csv = "x,AI,first\ny,ai,second\n";
        let terms = parse_glossary_csv(csv);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].definition, "first");
    }

    #[test]
    fn blank_term_or_definition_skipped() {
        let csv = "x,,no term\ny,Orphan,\n";
        assert_eq!(parse_glossary_csv(csv), vec![]);
    }

    #[test]
    fn output_sorted_alphabetically() {
        let csv = "x,zebra,z\ny,Alpha,a\n";
        let terms = parse_glossary_csv(csv);
        assert_eq!(terms[0].term, "Alpha");
        assert_eq!(terms[1].term, "zebra");
    }

    #[test]
    fn short_rows_skipped() {
        let csv = "only,two\nx,AI,def\n";
        assert_eq!(parse_glossary_csv(csv).len(), 1);
    }

    #[test]
    fn json_round_trip_uses_capitalized_keys() {
        let term = GlossaryTerm {
            term: "AI".to_string(),
            definition: "Artificial Intelligence".to_string(),
        };
        let json = serde_json::to_string(&term).expect("serializes");
        assert_eq!(json, r#"{"Term":"AI","Definition":"Artificial Intelligence"}"#);
        let back: GlossaryTerm = serde_json::from_str(&json).expect("parses");
        assert_eq!(back, term);
    }
}

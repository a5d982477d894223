//! Section/chapter navigation structure.
//!
//! A separate table-of-contents markdown file groups chapters into numbered
//! sections for navigation. TOC entries name chapters by title, not by
//! filename, so each entry is matched to a content file by normalized
//! substring comparison; entries with no match are dropped with a warning
//! rather than failing the build.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::content::{Chapter, ContentStore};
use crate::error::GuideError;

/// Characters of the normalized title used for fuzzy comparison.
const MATCH_PREFIX_LEN: usize = 20;

/// One chapter as referenced from the navigation structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionChapter {
    pub slug: String,
    pub title: String,
    pub order: u32,
}

/// A named group of consecutive chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub number: u32,
    pub title: String,
    pub chapters: Vec<SectionChapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureMetadata {
    pub source: String,
    pub matched: usize,
    pub unmatched: usize,
}

/// The full navigation tree for one guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionsStructure {
    pub title: String,
    pub sections: Vec<Section>,
    pub metadata: StructureMetadata,
}

/// Build the structure from TOC markdown and the available chapters.
///
/// The TOC format: an optional `# Title` line, unindented `N. Section
/// Title` lines opening sections, and indented `N. Chapter Title` lines
/// listing that section's chapters in reading order. Sections that end up
/// with no matched chapters are filtered out.
pub fn build_structure(toc: &str, chapters: &[Chapter], source: &str) -> SectionsStructure {
    let mut title = String::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut matched = 0;
    let mut unmatched = 0;

    for line in toc.lines() {
        if let Some(t) = line.trim().strip_prefix("# ")
            && title.is_empty()
        {
            title = t.trim().to_string();
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');
        let Some((number, text)) = numbered_entry(line.trim()) else {
            continue;
        };

        if !indented {
            sections.push(Section {
                number,
                title: text.to_string(),
                chapters: Vec::new(),
            });
            continue;
        }

        let Some(section) = sections.last_mut() else {
            log::warn!("chapter entry {text:?} appears before any section, skipping");
            unmatched += 1;
            continue;
        };
        match find_chapter(text, chapters) {
            Some(chapter) => {
                matched += 1;
                section.chapters.push(SectionChapter {
                    slug: chapter.slug.clone(),
                    title: chapter.title.clone(),
                    order: chapter.order,
                });
            }
            None => {
                log::warn!("no content file matches contents entry {text:?}, dropping it");
                unmatched += 1;
            }
        }
    }

    sections.retain(|s| !s.chapters.is_empty());

    SectionsStructure {
        title,
        sections,
        metadata: StructureMetadata {
            source: source.to_string(),
            matched,
            unmatched,
        },
    }
}

/// `N. Title` → (N, Title).
fn numbered_entry(line: &str) -> Option<(u32, &str)> {
    let dot = line.find('.')?;
    let number: u32 = line[..dot].trim().parse().ok()?;
    let text = line[dot + 1..].trim();
    (!text.is_empty()).then_some((number, text))
}

/// Fuzzy title match: lowercase, strip punctuation, compare the first
/// [`MATCH_PREFIX_LEN`] characters as substrings in either direction.
fn find_chapter<'a>(title: &str, chapters: &'a [Chapter]) -> Option<&'a Chapter> {
    let wanted = prefix(&normalize(title));
    if wanted.is_empty() {
        return None;
    }
    chapters.iter().find(|c| {
        let have = normalize(&c.title);
        have.contains(&wanted) || wanted.contains(&prefix(&have))
    })
}

fn normalize(s: &str) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn prefix(s: &str) -> String {
    s.chars().take(MATCH_PREFIX_LEN).collect()
}

/// Loads and memoizes the structure for the life of the process.
#[derive(Debug)]
pub struct StructureLoader {
    toc_path: PathBuf,
    cached: OnceLock<SectionsStructure>,
}

impl StructureLoader {
    pub fn new(toc_path: impl Into<PathBuf>) -> StructureLoader {
        StructureLoader {
            toc_path: toc_path.into(),
            cached: OnceLock::new(),
        }
    }

    /// Parse on first call, return the cached result afterwards.
    pub fn load(&self, store: &ContentStore) -> Result<&SectionsStructure, GuideError> {
        if let Some(structure) = self.cached.get() {
            return Ok(structure);
        }
        let toc = std::fs::read_to_string(&self.toc_path).map_err(|source| GuideError::Read {
            path: self.toc_path.clone(),
            source,
        })?;
        let source_name = self
            .toc_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("toc")
            .to_string();
        let structure = build_structure(&toc, store.chapters(), &source_name);
        Ok(self.cached.get_or_init(|| structure))
    }
}

/// Load a pre-built structure from its JSON form.
pub fn load_structure(path: &Path) -> Result<SectionsStructure, GuideError> {
    let raw = std::fs::read_to_string(path).map_err(|source| GuideError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| GuideError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chapter(slug: &str, title: &str, order: u32) -> Chapter {
        Chapter {
            slug: slug.to_string(),
            title: title.to_string(),
            order,
            filename: format!("{slug}.md"),
        }
    }

    fn sample_chapters() -> Vec<Chapter> {
        vec![
            chapter("01-getting-started", "Getting Started with Procurement", 1),
            chapter("02-planning", "Planning Your Purchase", 2),
            chapter("03-vendors", "Working with Vendors", 3),
        ]
    }

    const TOC: &str = "# Buyer's Guide\n\n1. Foundations\n   1. Getting Started with Procurement\n   2. Planning Your Purchase\n2. Execution\n   1. Working with Vendors\n";

    #[test]
    fn builds_sections_with_matched_chapters() {
        let structure = build_structure(TOC, &sample_chapters(), "toc.md");
        assert_eq!(structure.title, "Buyer's Guide");
        assert_eq!(structure.sections.len(), 2);
        assert_eq!(structure.sections[0].title, "Foundations");
        assert_eq!(structure.sections[0].chapters.len(), 2);
        assert_eq!(structure.sections[1].chapters[0].slug, "03-vendors");
        assert_eq!(structure.metadata.matched, 3);
        assert_eq!(structure.metadata.unmatched, 0);
    }

    #[test]
    fn fuzzy_match_tolerates_punctuation_and_case() {
        let toc = "1. Section\n   1. GETTING STARTED — with procurement!\n";
        let structure = build_structure(toc, &sample_chapters(), "toc.md");
        assert_eq!(structure.sections[0].chapters[0].slug, "01-getting-started");
    }

    #[test]
    fn unmatched_entry_is_dropped_not_fatal() {
        let toc = "1. Section\n   1. Chapter That Does Not Exist\n   2. Planning Your Purchase\n";
        let structure = build_structure(toc, &sample_chapters(), "toc.md");
        assert_eq!(structure.sections[0].chapters.len(), 1);
        assert_eq!(structure.metadata.unmatched, 1);
    }

    #[test]
    fn empty_sections_filtered_out() {
        let toc = "1. Ghost Section\n   1. Nothing Here\n2. Real\n   1. Planning Your Purchase\n";
        let structure = build_structure(toc, &sample_chapters(), "toc.md");
        assert_eq!(structure.sections.len(), 1);
        assert_eq!(structure.sections[0].title, "Real");
    }

    #[test]
    fn non_numbered_lines_ignored() {
        let toc = "# T\n\nsome prose\n1. S\n   1. Planning Your Purchase\n";
        let structure = build_structure(toc, &sample_chapters(), "toc.md");
        assert_eq!(structure.sections.len(), 1);
    }

    #[test]
    fn chapter_before_any_section_is_skipped() {
        let toc = "   1. Planning Your Purchase\n1. S\n   1. Working with Vendors\n";
        let structure = build_structure(toc, &sample_chapters(), "toc.md");
        assert_eq!(structure.sections.len(), 1);
        assert_eq!(structure.metadata.unmatched, 1);
    }

    #[test]
    fn structure_round_trips_through_json() {
        let structure = build_structure(TOC, &sample_chapters(), "toc.md");
        let json = serde_json::to_string(&structure).expect("serializes");
        let back: SectionsStructure = serde_json::from_str(&json).expect("parses");
        assert_eq!(back, structure);
    }

    #[test]
    fn loader_memoizes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let toc_path = dir.path().join("toc.md");
        std::fs::write(&toc_path, TOC).expect("writes");
        let content_dir = dir.path().join("content");
        std::fs::create_dir(&content_dir).expect("mkdir");
        std::fs::write(
            content_dir.join("01-getting-started.md"),
            "# Getting Started with Procurement",
        )
        .expect("writes");
        let store = ContentStore::open(&content_dir).expect("opens");

        let loader = StructureLoader::new(&toc_path);
        let first = loader.load(&store).expect("loads").clone();

        // Changing the file after the first load must not change the result.
        std::fs::write(&toc_path, "# Other\n").expect("writes");
        let second = loader.load(&store).expect("loads");
        assert_eq!(*second, first);
    }
}

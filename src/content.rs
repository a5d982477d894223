//! Chapter content store.
//!
//! One markdown file per chapter, named `NN-slug.md`: the two-digit prefix
//! is the chapter's position, the first `# Heading` line its title. The
//! store scans the content directory once and keeps the metadata; chapter
//! bodies are read on demand.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::GuideError;

/// Order assigned to files without a numeric prefix; sorts them last.
const UNORDERED: u32 = 999;

/// Metadata for one chapter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub slug: String,
    pub title: String,
    pub order: u32,
    pub filename: String,
}

/// All chapters of one guide, sorted by order.
#[derive(Debug)]
pub struct ContentStore {
    dir: PathBuf,
    chapters: Vec<Chapter>,
}

impl ContentStore {
    /// Scan `dir` for `*.md` chapter files.
    pub fn open(dir: impl Into<PathBuf>) -> Result<ContentStore, GuideError> {
        let dir = dir.into();
        let entries = std::fs::read_dir(&dir).map_err(|source| GuideError::Read {
            path: dir.clone(),
            source,
        })?;

        let mut chapters = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GuideError::Read {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = filename.strip_suffix(".md") else {
                continue;
            };

            let raw = std::fs::read_to_string(&path).map_err(|source| GuideError::Read {
                path: path.clone(),
                source,
            })?;

            let slug = stem.to_string();
            chapters.push(Chapter {
                title: extract_title(&raw).unwrap_or_else(|| slug.clone()),
                order: extract_order(stem),
                filename: filename.to_string(),
                slug,
            });
        }

        chapters.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.slug.cmp(&b.slug)));
        log::debug!("loaded {} chapter(s) from {}", chapters.len(), dir.display());
        Ok(ContentStore { dir, chapters })
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Look up a chapter by slug. `None` maps to a not-found page.
    pub fn chapter(&self, slug: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.slug == slug)
    }

    /// Raw markdown body of a chapter.
    pub fn content(&self, slug: &str) -> Result<String, GuideError> {
        let chapter = self
            .chapter(slug)
            .ok_or_else(|| GuideError::ChapterNotFound(slug.to_string()))?;
        let path = self.dir.join(&chapter.filename);
        std::fs::read_to_string(&path).map_err(|source| GuideError::Read { path, source })
    }

    /// Previous and next chapters in reading order.
    pub fn adjacent(&self, slug: &str) -> (Option<&Chapter>, Option<&Chapter>) {
        let Some(pos) = self.chapters.iter().position(|c| c.slug == slug) else {
            return (None, None);
        };
        let prev = pos.checked_sub(1).map(|i| &self.chapters[i]);
        let next = self.chapters.get(pos + 1);
        (prev, next)
    }
}

/// Text of the first `# Heading` line.
fn extract_title(raw: &str) -> Option<String> {
    raw.lines().find_map(|line| {
        let trimmed = line.trim();
        trimmed
            .strip_prefix("# ")
            .map(|title| title.trim().to_string())
    })
}

/// Leading numeric filename prefix, e.g. `03-planning` → 3.
fn extract_order(stem: &str) -> u32 {
    let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(UNORDERED)
}

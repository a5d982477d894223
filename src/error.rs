//! Crate error types.

use std::path::PathBuf;

/// Errors from loading guide content and data files.
///
/// Transformation passes never fail: unresolved references, unrecognized
/// fences, and declined table shapes all degrade to the fallback rendering
/// path instead of producing errors.
#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    /// Reading a content or data file failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a generated data file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON data file (sections structure, region terms) failed to parse.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The requested chapter slug does not exist in the content store.
    ///
    /// Maps to a not-found page in the serving layer, never a crash.
    #[error("chapter not found: {0}")]
    ChapterNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_not_found_display() {
        let err = GuideError::ChapterNotFound("09-missing".to_string());
        assert_eq!(err.to_string(), "chapter not found: 09-missing");
    }

    #[test]
    fn read_error_includes_path() {
        let err = GuideError::Read {
            path: PathBuf::from("content/01-intro.md"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("content/01-intro.md"));
    }
}

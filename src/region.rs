//! Region terminology selection.
//!
//! The guide ships two vocabularies for the same concepts (US and global
//! procurement terms). A bidirectional mapping table pairs them; the
//! reader's choice is a single [`Region`] value persisted to a small
//! preference file. Print output always uses US terms.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GuideError;

/// Which terminology variant to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "GLOBAL")]
    Global,
}

impl Region {
    /// The region whose terms get replaced when this one is active.
    pub fn other(self) -> Region {
        match self {
            Region::Us => Region::Global,
            Region::Global => Region::Us,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::Global => "GLOBAL",
        }
    }

    fn parse(s: &str) -> Option<Region> {
        match s.trim() {
            "US" => Some(Region::Us),
            "GLOBAL" => Some(Region::Global),
            _ => None,
        }
    }
}

/// One US/global term pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMapping {
    #[serde(rename = "US")]
    pub us: String,
    #[serde(rename = "GLOBAL")]
    pub global: String,
}

impl TermMapping {
    /// The term shown in the given region.
    pub fn term_for(&self, region: Region) -> &str {
        match region {
            Region::Us => &self.us,
            Region::Global => &self.global,
        }
    }
}

/// Load the mapping table from its JSON array.
pub fn load_term_mappings(path: &Path) -> Result<Vec<TermMapping>, GuideError> {
    let raw = std::fs::read_to_string(path).map_err(|source| GuideError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| GuideError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// File-backed region preference, read on demand and written on change.
/// A missing or unreadable file means the default (`US`).
#[derive(Debug, Clone)]
pub struct RegionPreference {
    path: PathBuf,
}

impl RegionPreference {
    pub fn new(path: impl Into<PathBuf>) -> RegionPreference {
        RegionPreference { path: path.into() }
    }

    pub fn get(&self) -> Region {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| Region::parse(&s))
            .unwrap_or_default()
    }

    pub fn set(&self, region: Region) -> Result<(), GuideError> {
        std::fs::write(&self.path, region.as_str()).map_err(|source| GuideError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// The region to render with. Print contexts force `US` regardless of
    /// the stored preference.
    pub fn effective(&self, print: bool) -> Region {
        if print { Region::Us } else { self.get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_region_is_us() {
        assert_eq!(Region::default(), Region::Us);
    }

    #[test]
    fn other_flips() {
        assert_eq!(Region::Us.other(), Region::Global);
        assert_eq!(Region::Global.other(), Region::Us);
    }

    #[test]
    fn mapping_json_uses_region_keys() {
        let json = r#"[{"US":"state","GLOBAL":"province"}]"#;
        let mappings: Vec<TermMapping> = serde_json::from_str(json).expect("parses");
        assert_eq!(mappings[0].us, "state");
        assert_eq!(mappings[0].global, "province");
        assert_eq!(mappings[0].term_for(Region::Global), "province");
    }

    #[test]
    fn missing_preference_file_defaults_to_us() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pref = RegionPreference::new(dir.path().join("region"));
        assert_eq!(pref.get(), Region::Us);
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pref = RegionPreference::new(dir.path().join("region"));
        pref.set(Region::Global).expect("writes");
        assert_eq!(pref.get(), Region::Global);
    }

    #[test]
    fn garbage_preference_defaults_to_us() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("region");
        std::fs::write(&path, "EUROPE").expect("writes");
        assert_eq!(RegionPreference::new(path).get(), Region::Us);
    }

    #[test]
    fn print_forces_us() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pref = RegionPreference::new(dir.path().join("region"));
        pref.set(Region::Global).expect("writes");
        assert_eq!(pref.effective(true), Region::Us);
        assert_eq!(pref.effective(false), Region::Global);
    }
}

//! `fieldguide` — renderer for chaptered markdown guides.
//!
//! Turns a directory of chapter markdown files into navigable HTML with
//! collapsible sections, styled callout fences repurposed from code blocks,
//! reshaped tables, glossary-term tooltips, and US/global terminology
//! switching. Optional features add headless-Chromium PDF export (`pdf`)
//! and Axum route handlers (`axum`).
//!
//! # Quick start
//!
//! ```
//! use fieldguide::{GuidePipeline, Region};
//!
//! let pipeline = GuidePipeline::default();
//! let html = pipeline.render_html("# Hello\n\nSome *body* text.\n", Region::Us);
//! assert!(html.contains("<h1>Hello</h1>"));
//! ```

pub mod annotate;
pub mod ast;
pub mod collapsible;
pub mod content;
pub mod error;
pub mod fenced;
pub mod glossary;
pub mod matcher;
pub mod pipeline;
pub mod refs;
pub mod region;
pub mod render_html;
#[cfg(feature = "pdf")]
pub mod render_pdf;
pub mod richtext;
#[cfg(feature = "axum")]
pub mod serve;
pub mod structure;
pub mod table;

pub use annotate::{annotate_glossary, substitute_region};
pub use ast::Node;
pub use collapsible::rewrite_collapsibles;
pub use content::{Chapter, ContentStore};
pub use error::GuideError;
pub use fenced::{Background, FenceKind, classify_fence};
pub use glossary::{GlossaryTerm, load_glossary, parse_glossary_csv};
pub use pipeline::{ContentPart, GuidePipeline, split_content_parts};
pub use refs::resolve_image_refs;
pub use region::{Region, RegionPreference, TermMapping, load_term_mappings};
pub use render_html::{PageConfig, render_markdown, to_html_page};
pub use structure::{SectionsStructure, StructureLoader, build_structure};
pub use table::{TableShape, classify_table};

#[cfg(feature = "pdf")]
pub use render_pdf::{PdfConfig, PdfError, chapter_to_pdf};

/// The guide stylesheet, embedded at build time and inlined into every
/// rendered page.
pub const GUIDE_CSS: &str = include_str!("../assets/fieldguide.css");

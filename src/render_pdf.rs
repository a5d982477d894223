//! PDF export via headless Chromium.
//!
//! Renders a chapter through the normal pipeline (region forced to US, as
//! on any print surface), wraps it in a print-variant page, and pipes it
//! through headless Chrome's PDF printer over the DevTools Protocol.
//! Callers that cannot launch Chrome fall back to the print page's system
//! print dialog.

use crate::pipeline::GuidePipeline;
use crate::region::Region;
use crate::render_html::{PageConfig, to_html_page};

use std::sync::LazyLock;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use regex::Regex;

/// Modern CSS color functions Chrome's PDF printer renders unreliably.
static MODERN_COLOR_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:oklab|oklch|lab|lch)\([^)]*\)").expect("valid regex"));

/// Fallback for down-converted color functions.
const SAFE_COLOR: &str = "#333333";

/// Paper sizes for PDF output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaperSize {
    /// 8.5 x 11 inches
    Letter,
    /// 8.27 x 11.69 inches (210 x 297 mm)
    A4,
    /// Custom width x height in inches
    Custom { width: f64, height: f64 },
}

impl PaperSize {
    fn width(&self) -> f64 {
        match self {
            Self::Letter => 8.5,
            Self::A4 => 8.27,
            Self::Custom { width, .. } => *width,
        }
    }

    fn height(&self) -> f64 {
        match self {
            Self::Letter => 11.0,
            Self::A4 => 11.69,
            Self::Custom { height, .. } => *height,
        }
    }
}

/// Margins in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 0.75,
            right: 0.75,
            bottom: 0.75,
            left: 0.75,
        }
    }
}

/// Configuration for PDF rendering.
#[derive(Debug, Clone)]
pub struct PdfConfig {
    /// Paper size (default: A4).
    pub paper_size: PaperSize,
    /// Page margins in inches.
    pub margins: Margins,
    /// Landscape orientation (default: false).
    pub landscape: bool,
    /// Print background graphics (default: true).
    pub print_background: bool,
    /// Page title override.
    pub title: Option<String>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            margins: Margins::default(),
            landscape: false,
            print_background: true,
            title: None,
        }
    }
}

/// Errors that can occur during PDF generation.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// Failed to launch headless Chrome.
    #[error("Chrome launch failed: {0}")]
    ChromeLaunch(String),

    /// Failed to load page content.
    #[error("Page load failed: {0}")]
    PageLoad(String),

    /// Failed to generate PDF from page.
    #[error("PDF generation failed: {0}")]
    PdfGeneration(String),
}

/// Render one chapter's markdown to PDF bytes.
///
/// # Errors
///
/// Returns [`PdfError`] if Chrome cannot be launched, the page fails to
/// load, or PDF generation fails. Callers should fall back to the print
/// page on error rather than surfacing it as fatal.
pub async fn chapter_to_pdf(
    pipeline: &GuidePipeline,
    markdown: &str,
    config: &PdfConfig,
) -> Result<Vec<u8>, PdfError> {
    let body = pipeline.render_html(markdown, Region::Us);
    let page_config = PageConfig {
        title: config.title.clone(),
        print: true,
        ..PageConfig::default()
    };
    let html = to_html_page(&body, &page_config);
    let html = sanitize_colors(&html);
    let html = inject_print_css(&html, config);

    html_to_pdf(&html, config).await
}

/// Print already-assembled page HTML to PDF bytes.
pub async fn html_to_pdf(html: &str, config: &PdfConfig) -> Result<Vec<u8>, PdfError> {
    let browser_config = BrowserConfig::builder()
        .no_sandbox()
        .build()
        .map_err(|e| PdfError::ChromeLaunch(e.to_string()))?;

    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| PdfError::ChromeLaunch(e.to_string()))?;

    // Drive the handler on a background task
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| PdfError::PageLoad(e.to_string()))?;

    page.set_content(html)
        .await
        .map_err(|e| PdfError::PageLoad(e.to_string()))?;

    let pdf_params = PrintToPdfParams::builder()
        .paper_width(config.paper_size.width())
        .paper_height(config.paper_size.height())
        .margin_top(config.margins.top)
        .margin_right(config.margins.right)
        .margin_bottom(config.margins.bottom)
        .margin_left(config.margins.left)
        .landscape(config.landscape)
        .print_background(config.print_background);

    let pdf_bytes = page
        .pdf(pdf_params.build())
        .await
        .map_err(|e| PdfError::PdfGeneration(e.to_string()))?;

    let _ = browser.close().await;
    let _ = handler_task.await;

    Ok(pdf_bytes)
}

/// Down-convert `lab()`/`lch()`/`oklab()`/`oklch()` color functions to a
/// safe hex fallback before capture. Chrome's print pipeline mishandles
/// them in some versions.
pub fn sanitize_colors(html: &str) -> String {
    MODERN_COLOR_FN.replace_all(html, SAFE_COLOR).into_owned()
}

/// Inject `@page` rules for paper size and margins plus `@media print`
/// overrides that hide navigation chrome.
pub fn inject_print_css(html: &str, config: &PdfConfig) -> String {
    let width = config.paper_size.width();
    let height = config.paper_size.height();
    let top = config.margins.top;
    let right = config.margins.right;
    let bottom = config.margins.bottom;
    let left = config.margins.left;

    let print_css = format!(
        r#"<style>
    @page {{
        size: {width}in {height}in;
        margin: {top}in {right}in {bottom}in {left}in;
    }}
    @media print {{
        body {{
            -webkit-print-color-adjust: exact;
            print-color-adjust: exact;
        }}
        .guide {{
            max-width: 100%;
            margin: 0;
            padding: 0;
        }}
        .guide-nav,
        .guide-footer,
        .pdf-trigger {{
            display: none !important;
        }}
    }}
    </style>"#
    );

    if let Some(pos) = html.find("</head>") {
        let mut result = String::with_capacity(html.len() + print_css.len() + 1);
        result.push_str(&html[..pos]);
        result.push('\n');
        result.push_str(&print_css);
        result.push('\n');
        result.push_str(&html[pos..]);
        result
    } else {
        format!("{print_css}\n{html}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_config_defaults_are_sensible() {
        let config = PdfConfig::default();
        assert_eq!(config.paper_size, PaperSize::A4);
        assert!((config.margins.top - 0.75).abs() < f64::EPSILON);
        assert!(!config.landscape);
        assert!(config.print_background);
        assert!(config.title.is_none());
    }

    #[test]
    fn paper_size_dimensions() {
        assert!((PaperSize::Letter.width() - 8.5).abs() < f64::EPSILON);
        assert!((PaperSize::Letter.height() - 11.0).abs() < f64::EPSILON);
        assert!((PaperSize::A4.width() - 8.27).abs() < f64::EPSILON);

        let custom = PaperSize::Custom {
            width: 5.0,
            height: 7.0,
        };
        assert!((custom.width() - 5.0).abs() < f64::EPSILON);
        assert!((custom.height() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sanitize_replaces_modern_color_functions() {
        let html = "color: oklch(0.7 0.1 150); background: lab(50% 40 59.5);";
        let out = sanitize_colors(html);
        assert_eq!(out, "color: #333333; background: #333333;");
    }

    #[test]
    fn sanitize_leaves_classic_colors_alone() {
        let html = "color: #fff; background: rgb(0, 0, 0); border-color: hsl(120, 50%, 50%);";
        assert_eq!(sanitize_colors(html), html);
    }

    #[test]
    fn sanitize_handles_nested_oklch_in_stylesheet() {
        let css = ".x { color: oklch(0.2 0.01 260 / 0.5); }";
        assert!(!sanitize_colors(css).contains("oklch"));
    }

    #[test]
    fn inject_print_css_inserts_before_head_close() {
        let html = "<html>\n<head>\n    <title>Test</title>\n</head>\n<body>Hello</body>\n</html>";
        let result = inject_print_css(html, &PdfConfig::default());

        let head_close = result.find("</head>").expect("head close");
        let page_rule = result.find("@page").expect("page rule");
        assert!(page_rule < head_close);
        assert!(result.contains("8.27in 11.69in"));
        assert!(result.contains("@media print"));
    }

    #[test]
    fn inject_print_css_hides_chrome() {
        let result = inject_print_css("<head></head>", &PdfConfig::default());
        assert!(result.contains(".guide-nav"));
        assert!(result.contains(".guide-footer"));
        assert!(result.contains(".pdf-trigger"));
        assert!(result.contains("display: none !important"));
    }

    #[test]
    fn inject_print_css_custom_margins() {
        let config = PdfConfig {
            margins: Margins {
                top: 0.5,
                right: 1.0,
                bottom: 0.5,
                left: 1.0,
            },
            ..PdfConfig::default()
        };
        let result = inject_print_css("<head></head>", &config);
        assert!(result.contains("0.5in 1in 0.5in 1in"));
    }

    #[test]
    fn inject_print_css_no_head_tag() {
        let result = inject_print_css("<body>Hello</body>", &PdfConfig::default());
        assert!(result.starts_with("<style>"));
        assert!(result.contains("@page"));
    }

    /// Requires a working Chrome installation.
    /// Run with: cargo test --features pdf -- --ignored
    #[tokio::test]
    #[ignore]
    async fn chapter_to_pdf_produces_valid_pdf_bytes() {
        let pipeline = GuidePipeline::default();
        let pdf_bytes = chapter_to_pdf(
            &pipeline,
            "# Hello\n\nA test chapter.\n",
            &PdfConfig::default(),
        )
        .await
        .expect("PDF generation should succeed");

        assert!(pdf_bytes.len() > 4);
        assert_eq!(&pdf_bytes[..5], b"%PDF-");
    }
}

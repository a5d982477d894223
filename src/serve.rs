//! Optional Axum route handlers for serving guide pages.
//!
//! Enable with `features = ["axum"]` in Cargo.toml.
//!
//! # Usage
//!
//! ```ignore
//! let server = std::sync::Arc::new(GuideServer::new(store, pipeline, preference));
//! let app = fieldguide::serve::router(server);
//! ```

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;

use crate::GUIDE_CSS;
use crate::content::ContentStore;
use crate::error::GuideError;
use crate::pipeline::GuidePipeline;
use crate::region::RegionPreference;
use crate::render_html::{PageConfig, to_html_page};

/// Shared state for the guide routes.
pub struct GuideServer {
    store: ContentStore,
    pipeline: GuidePipeline,
    preference: RegionPreference,
}

impl GuideServer {
    pub fn new(
        store: ContentStore,
        pipeline: GuidePipeline,
        preference: RegionPreference,
    ) -> GuideServer {
        GuideServer {
            store,
            pipeline,
            preference,
        }
    }
}

/// Build the guide router: chapter pages, print variants, and the CSS.
pub fn router(server: Arc<GuideServer>) -> Router {
    Router::new()
        .route("/chapter/{slug}", get(chapter_page))
        .route("/chapter/{slug}/print", get(chapter_print_page))
        .route("/static/css/guide.css", get(guide_css))
        .with_state(server)
}

#[derive(Debug, Deserialize)]
pub struct PrintQuery {
    /// `?autoprint=1` opens the system print dialog once content settles.
    autoprint: Option<String>,
}

/// One chapter as a full HTML page. Unknown slugs are 404, not errors.
pub async fn chapter_page(
    State(server): State<Arc<GuideServer>>,
    Path(slug): Path<String>,
) -> Response {
    render_chapter(&server, &slug, false, false)
}

/// Print variant: region forced to US, navigation chrome hidden.
pub async fn chapter_print_page(
    State(server): State<Arc<GuideServer>>,
    Path(slug): Path<String>,
    Query(query): Query<PrintQuery>,
) -> Response {
    let autoprint = query.autoprint.as_deref() == Some("1");
    render_chapter(&server, &slug, true, autoprint)
}

fn render_chapter(server: &GuideServer, slug: &str, print: bool, autoprint: bool) -> Response {
    let markdown = match server.store.content(slug) {
        Ok(markdown) => markdown,
        Err(GuideError::ChapterNotFound(_)) => {
            return (StatusCode::NOT_FOUND, "chapter not found").into_response();
        }
        Err(err) => {
            log::warn!("failed to read chapter {slug:?}: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "content unavailable").into_response();
        }
    };

    let region = server.preference.effective(print);
    let body = server.pipeline.render_html(&markdown, region);
    let title = server.store.chapter(slug).map(|c| c.title.clone());
    let page = to_html_page(
        &body,
        &PageConfig {
            title,
            print,
            autoprint,
            ..PageConfig::default()
        },
    );
    Html(page).into_response()
}

/// Serve the guide CSS with correct Content-Type and cache headers.
pub async fn guide_css() -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        GUIDE_CSS,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;

    fn server() -> (tempfile::TempDir, Arc<GuideServer>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let content_dir = dir.path().join("content");
        std::fs::create_dir(&content_dir).expect("mkdir");
        std::fs::write(
            content_dir.join("01-intro.md"),
            "# Introduction\n\nEach state buys software.\n",
        )
        .expect("writes");

        let store = ContentStore::open(&content_dir).expect("opens");
        let pipeline = GuidePipeline::new(
            vec![],
            vec![crate::region::TermMapping {
                us: "state".to_string(),
                global: "province".to_string(),
            }],
        );
        let preference = RegionPreference::new(dir.path().join("region"));
        (dir, Arc::new(GuideServer::new(store, pipeline, preference)))
    }

    #[tokio::test]
    async fn chapter_page_renders() {
        let (_dir, server) = server();
        let response = chapter_page(State(server), Path("01-intro".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_slug_is_404() {
        let (_dir, server) = server();
        let response = chapter_page(State(server), Path("nope".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn print_page_forces_us_terms() {
        let (_dir, server) = server();
        server.preference.set(Region::Global).expect("writes");

        let response = chapter_print_page(
            State(server),
            Path("01-intro".to_string()),
            Query(PrintQuery {
                autoprint: Some("1".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let html = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(html.contains("state buys"), "print must keep US vocabulary");
        assert!(html.contains("guide-print"));
        assert!(html.contains("window.print()"));
    }

    #[tokio::test]
    async fn css_served_with_cache_headers() {
        let response = guide_css().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).expect("ct"),
            "text/css; charset=utf-8"
        );
    }
}

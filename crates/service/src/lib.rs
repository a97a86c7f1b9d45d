//! # schsvg-service
//!
//! Renders KiCad schematics fetched over HTTP and streams the SVG back.
//!
//! - `GET /render?url=<http(s) url of a .sch>`
//! - `GET /github/<owner>/<repo>/blob/<ref>/<path>.sch`
//! - `GET /health`

pub mod api;
pub mod config;
pub mod environment;
pub mod error;
pub mod location;
pub mod state;

use axum::{Router, routing::get};
use state::AppState;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/render", get(api::render_url))
        .route("/github/*path", get(api::render_github))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Verification router.
//!
//! `/` serves the upload page; JSON endpoints are nested under `/api/`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::page;
use crate::api::types::ApiContext;

/// Room for multipart boundaries and part headers above the file limit.
pub const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024;

/// Build the full application router.
pub fn verification_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/verify", post(endpoints::verify::verify))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(ctx);

    Router::new()
        .route("/", get(page::serve_upload_page))
        .nest("/api", api)
}

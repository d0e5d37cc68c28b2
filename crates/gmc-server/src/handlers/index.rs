//! Dashboard page.

use axum::http::Uri;
use axum::response::Html;

use crate::error::ApiError;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path().to_string())
}

//! Bearer-token gate for the protected routes.
//!
//! The expected key is configured at startup (`FOLIO_SERVER_API_KEY`)
//! and lives in [`AppState`]. Comparison is constant time so a probing
//! client learns nothing from response latency.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Byte-wise comparison whose timing does not depend on where the
/// first mismatch occurs. Length still short-circuits.
fn keys_match(candidate: &str, expected: &str) -> bool {
    let (a, b) = (candidate.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match bearer_token(request.headers()) {
        Some(token) if keys_match(token, &state.api_key) => next.run(request).await,
        _ => ApiError::Unauthorized.into_response(),
    }
}

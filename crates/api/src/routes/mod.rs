//! API route definitions.

use axum::{Router, middleware};
use chrono::{DateTime, Utc};

use crate::{AppState, middleware::access_token_middleware};

pub mod containers;
pub mod ecosystem;
pub mod files;
pub mod health;

/// Path segment standing in for the root's empty identifier.
///
/// Codec output never has length 1, so the alias cannot collide with a real
/// identifier.
pub const ROOT_SEGMENT: &str = "_";

/// Creates the public API router.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(health::routes())
}

/// Creates the WOPI router; every route requires an access token.
#[allow(clippy::needless_pass_by_value)]
pub fn wopi_routes_with_state(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(ecosystem::routes())
        .merge(containers::routes())
        .merge(files::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access_token_middleware,
        ))
}

/// Identifier named by a path segment.
pub(crate) fn identifier_from_segment(segment: &str) -> &str {
    if segment == ROOT_SEGMENT { "" } else { segment }
}

/// Absolute URL of a WOPI resource, carrying the caller's access token.
pub(crate) fn wopi_url(base_url: &str, kind: &str, identifier: &str, access_token: &str) -> String {
    let segment = if identifier.is_empty() {
        ROOT_SEGMENT
    } else {
        identifier
    };
    format!("{base_url}/wopi/{kind}/{segment}?access_token={access_token}")
}

/// Round-trip timestamp: `2026-03-01T10:20:30.1234567Z`.
pub(crate) fn round_trip_time(time: &DateTime<Utc>) -> String {
    format!(
        "{}.{:07}Z",
        time.format("%Y-%m-%dT%H:%M:%S"),
        time.timestamp_subsec_nanos() / 100
    )
}

/// Timestamp at second resolution, used as the resource version.
pub(crate) fn version_of(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S").to_string()
}

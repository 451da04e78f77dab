//! Access-token middleware for WOPI routes.

use axum::{
    Json,
    extract::{FromRequestParts, Query, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use docgate_shared::{AccessTokenClaims, AccessTokenError};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::AppState;

#[derive(Debug, Deserialize)]
struct AccessTokenQuery {
    access_token: Option<String>,
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Middleware that validates the `access_token` query parameter.
///
/// On success the validated token is stored in request extensions; handlers
/// read it back through the [`AccessToken`] extractor.
pub async fn access_token_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = Query::<AccessTokenQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.access_token)
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        return unauthorized(
            "missing_token",
            "access_token query parameter is required",
        );
    };

    match state.access_tokens.validate(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(AccessToken { token, claims });
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "Rejected access token");
            match e {
                AccessTokenError::Expired => unauthorized("token_expired", "Token has expired"),
                _ => unauthorized("invalid_token", "Invalid or malformed token"),
            }
        }
    }
}

/// Validated access token of the current request.
#[derive(Debug, Clone)]
pub struct AccessToken {
    token: String,
    claims: AccessTokenClaims,
}

impl AccessToken {
    /// The token as received, for embedding in child resource URLs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Subject the token was issued to.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }
}

impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AccessToken>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "message": "Access token required"
                })),
            )
        })
    }
}

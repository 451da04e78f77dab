//! File routes: CheckFileInfo, GetFile and PutFile.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::info;

use super::{identifier_from_segment, round_trip_time, version_of};
use crate::{AppState, error::ApiError, middleware::AccessToken};

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/files/{id}", get(check_file_info))
        .route("/files/{id}/contents", get(get_file).post(put_file))
}

/// Response of CheckFileInfo.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckFileInfo {
    /// File name including extension.
    pub base_file_name: String,
    /// Storage-level owner.
    pub owner_id: String,
    /// Subject of the access token.
    pub user_id: String,
    /// Size in bytes.
    pub size: u64,
    /// Version derived from the last write time.
    pub version: String,
    /// Content hash, when the backend has one.
    #[serde(rename = "SHA256", skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Last write time, round-trip format.
    pub last_modified_time: String,
}

/// GET `/wopi/files/{id}`
async fn check_file_info(
    State(state): State<AppState>,
    token: AccessToken,
    Path(id): Path<String>,
) -> Result<Json<CheckFileInfo>, ApiError> {
    let file = state
        .storage
        .get_file(identifier_from_segment(&id))
        .await?;

    Ok(Json(CheckFileInfo {
        version: version_of(&file.last_write_time_utc),
        last_modified_time: round_trip_time(&file.last_write_time_utc),
        base_file_name: file.name,
        owner_id: file.owner,
        user_id: token.subject().to_string(),
        size: file.length,
        sha256: file.content_hash,
    }))
}

/// GET `/wopi/files/{id}/contents`
async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let reader = state
        .storage
        .read_stream(identifier_from_segment(&id))
        .await?;

    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        )],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}

/// POST `/wopi/files/{id}/contents`
///
/// Replaces the content of an existing file with the request body.
async fn put_file(
    State(state): State<AppState>,
    token: AccessToken,
    Path(id): Path<String>,
    body: Body,
) -> Result<StatusCode, ApiError> {
    let stream = body.into_data_stream().map_err(std::io::Error::other);

    state
        .storage
        .write_stream(
            identifier_from_segment(&id),
            Box::new(StreamReader::new(stream)),
        )
        .await?;

    info!(file = %id, user = %token.subject(), "File content replaced");
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use base64::Engine as _;
    use docgate_core::storage::codec;
    use sha2::{Digest, Sha256};

    use crate::routes::test_support::{TestApp, body_bytes, body_json};

    #[tokio::test]
    async fn test_check_file_info() {
        let app = TestApp::new(&[("docs/report.pdf", b"0123456789")]);

        let response = app
            .get(&format!("/wopi/files/{}", codec::encode("docs/report.pdf")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let expected_hash =
            base64::engine::general_purpose::STANDARD.encode(Sha256::digest(b"0123456789"));
        assert_eq!(json["BaseFileName"], "report.pdf");
        assert_eq!(json["Size"], 10);
        assert_eq!(json["UserId"], "alice");
        assert_eq!(json["SHA256"], expected_hash);
        assert!(json["OwnerId"].as_str().is_some_and(|o| !o.is_empty()));
    }

    #[tokio::test]
    async fn test_check_file_info_on_folder_is_not_found() {
        let app = TestApp::new(&[("docs/report.pdf", b"x")]);

        let response = app
            .get(&format!("/wopi/files/{}", codec::encode("docs")))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_file_contents() {
        let app = TestApp::new(&[("a.docx", b"document body")]);

        let response = app
            .get(&format!("/wopi/files/{}/contents", codec::encode("a.docx")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(body_bytes(response).await, b"document body");
    }

    #[tokio::test]
    async fn test_put_file_then_get() {
        let app = TestApp::new(&[("a.docx", b"old")]);
        let id = codec::encode("a.docx");

        let response = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri(app.uri(&format!("/wopi/files/{id}/contents")))
                    .header("X-WOPI-Override", "PUT")
                    .body(Body::from("brand new content"))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.get(&format!("/wopi/files/{id}/contents")).await;
        assert_eq!(body_bytes(response).await, b"brand new content");
        assert_eq!(
            std::fs::read(app.root.path().join("a.docx")).unwrap(),
            b"brand new content"
        );
    }

    #[tokio::test]
    async fn test_put_file_missing_is_not_found() {
        let app = TestApp::new(&[]);

        let response = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri(app.uri(&format!(
                        "/wopi/files/{}/contents",
                        codec::encode("new.docx")
                    )))
                    .body(Body::from("x"))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!app.root.path().join("new.docx").exists());
    }
}

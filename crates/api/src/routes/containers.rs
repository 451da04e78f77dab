//! Container routes: CheckContainerInfo and EnumerateChildren.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use tracing::debug;

use super::{identifier_from_segment, round_trip_time, version_of, wopi_url};
use crate::{AppState, error::ApiError, middleware::AccessToken};

/// Creates the container routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/containers/{id}", get(check_container_info))
        .route("/containers/{id}/children", get(enumerate_children))
}

// ============================================================================
// Response Types
// ============================================================================

/// Response of CheckContainerInfo.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckContainerInfo {
    /// Display name.
    pub name: String,
}

/// A file inside a container.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChildFile {
    /// File name.
    pub name: String,
    /// Absolute URL of the file.
    pub url: String,
    /// Last write time, round-trip format.
    pub last_modified_time: String,
    /// Size in bytes.
    pub size: u64,
    /// Version derived from the last write time.
    pub version: String,
}

/// A container inside a container.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChildContainer {
    /// Display name.
    pub name: String,
    /// Absolute URL of the container.
    pub url: String,
}

/// Response of EnumerateChildren.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerChildren {
    /// Sub-containers.
    pub child_containers: Vec<ChildContainer>,
    /// Files.
    pub child_files: Vec<ChildFile>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/wopi/containers/{id}`
async fn check_container_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CheckContainerInfo>, ApiError> {
    let folder = state
        .storage
        .get_folder(identifier_from_segment(&id))
        .await?;

    Ok(Json(CheckContainerInfo { name: folder.name }))
}

/// GET `/wopi/containers/{id}/children`
async fn enumerate_children(
    State(state): State<AppState>,
    token: AccessToken,
    Path(id): Path<String>,
) -> Result<Json<ContainerChildren>, ApiError> {
    let identifier = identifier_from_segment(&id);
    let (files, folders) = tokio::try_join!(
        state.storage.list_files(identifier),
        state.storage.list_folders(identifier),
    )?;

    debug!(
        container = %id,
        files = files.len(),
        containers = folders.len(),
        "Enumerated children"
    );

    let child_files = files
        .into_iter()
        .map(|file| ChildFile {
            url: wopi_url(
                &state.base_url,
                "files",
                file.identifier.as_str(),
                token.as_str(),
            ),
            last_modified_time: round_trip_time(&file.last_write_time_utc),
            version: version_of(&file.last_write_time_utc),
            size: file.length,
            name: file.name,
        })
        .collect();

    let child_containers = folders
        .into_iter()
        .map(|folder| ChildContainer {
            url: wopi_url(
                &state.base_url,
                "containers",
                folder.identifier.as_str(),
                token.as_str(),
            ),
            name: folder.name,
        })
        .collect();

    Ok(Json(ContainerChildren {
        child_containers,
        child_files,
    }))
}

//! Ecosystem routes.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::wopi_url;
use crate::{AppState, error::ApiError, middleware::AccessToken};

/// Creates the ecosystem routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/ecosystem/root_container_pointer",
        get(root_container_pointer),
    )
}

/// Pointer to a container.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerPointer {
    /// Display name.
    pub name: String,
    /// Absolute URL of the container.
    pub url: String,
}

/// Response of GetRootContainer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RootContainerInfo {
    /// The root container.
    pub container_pointer: ContainerPointer,
}

/// GET `/wopi/ecosystem/root_container_pointer`
async fn root_container_pointer(
    State(state): State<AppState>,
    token: AccessToken,
) -> Result<Json<RootContainerInfo>, ApiError> {
    let root = state.storage.get_folder("").await?;

    Ok(Json(RootContainerInfo {
        container_pointer: ContainerPointer {
            name: root.name,
            url: wopi_url(
                &state.base_url,
                "containers",
                root.identifier.as_str(),
                token.as_str(),
            ),
        },
    }))
}

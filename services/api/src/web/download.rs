//! services/api/src/web/download.rs
//!
//! `GET /api/download?avatar=<file>`: serves a committed avatar image. This is
//! the route the stored avatar references point at.

use crate::web::{state::AppState, status::Status};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadParams {
    /// File name such as `14051531.jpg`.
    pub avatar: String,
}

/// Only bare file names are served; anything that could leave the avatar
/// directory is refused.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Download an avatar image.
#[utoipa::path(
    get,
    path = "/api/download",
    params(DownloadParams),
    responses(
        (status = 200, description = "The JPEG image, or status 4040 when it does not exist", content_type = "image/jpeg")
    )
)]
pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadParams>,
) -> Response {
    if !is_plain_file_name(&params.avatar) {
        warn!("Refused avatar download for {:?}", params.avatar);
        return Status::AvatarNotFound.into_response();
    }

    let path = state.config.avatar_dir.join(&params.avatar);
    match state.files.read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        Err(e) => {
            warn!("Avatar {} unavailable: {:?}", path.display(), e);
            Status::AvatarNotFound.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_plain_file_name;

    #[test]
    fn only_bare_names_are_served() {
        assert!(is_plain_file_name("14051531.jpg"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("../secret"));
        assert!(!is_plain_file_name("a/b.jpg"));
        assert!(!is_plain_file_name("a\\b.jpg"));
        assert!(!is_plain_file_name(".hidden"));
    }
}

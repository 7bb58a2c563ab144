//! services/api/src/web/rest.rs
//!
//! Assembles the profile routes and holds the master definition for the
//! OpenAPI specification.

use crate::web::{
    avatar::{self, avatar_handler},
    download::{self, download_handler},
    modify::{self, modify_handler, ModifyRequest},
    query::{self, query_handler, QueryRequest},
    state::AppState,
    status::StatusBody,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        modify::modify_handler,
        avatar::avatar_handler,
        query::query_handler,
        download::download_handler,
    ),
    components(
        schemas(StatusBody, ModifyRequest, QueryRequest)
    ),
    tags(
        (name = "Mentor Profile API", description = "Profile editing, avatar upload and profile queries.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the `/api` routes with shared state applied.
pub fn api_router(state: Arc<AppState>) -> Router {
    let profile_routes = Router::new()
        .route("/modify", post(modify_handler))
        .route("/avatar", post(avatar_handler))
        .route("/query", post(query_handler));

    Router::new()
        .nest("/api/profile", profile_routes)
        .route("/api/download", get(download_handler))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}

//! services/api/src/web/modify.rs
//!
//! `POST /api/profile/modify`: overwrite the user-editable profile fields.

use crate::web::{
    state::AppState,
    status::{Status, StatusBody},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use mentor_core::domain::ProfileChanges;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModifyRequest {
    /// A number, or a string holding one.
    #[serde(deserialize_with = "school_id_from_number_or_string")]
    #[schema(value_type = i64)]
    pub school_id: i64,
    pub sex: Option<String>,
    pub birth_date: Option<String>,
    pub phone_num: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

fn school_id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(id) => Ok(id),
        NumberOrString::String(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid school_id '{}'", text))),
    }
}

impl ModifyRequest {
    fn into_parts(self) -> (i64, ProfileChanges) {
        (
            self.school_id,
            ProfileChanges {
                sex: self.sex,
                birth_date: self.birth_date,
                phone_num: self.phone_num,
                description: self.description,
            },
        )
    }
}

/// Update sex, birth date, phone number and description of one profile.
///
/// Absent fields are cleared.
#[utoipa::path(
    post,
    path = "/api/profile/modify",
    request_body = ModifyRequest,
    responses(
        (status = 200, description = "2000 on success, 5000 on store failure, 4000 on a malformed body", body = StatusBody)
    )
)]
pub async fn modify_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ModifyRequest>, JsonRejection>,
) -> Status {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(e) => {
            warn!("Rejected modify request: {}", e);
            return Status::RequestMalformed;
        }
    };
    let (school_id, changes) = req.into_parts();

    match state.db.update_profile(school_id, &changes).await {
        Ok(()) => {
            info!("Profile {} modified", school_id);
            Status::ProfileModSuccessful
        }
        Err(e) => {
            error!("Failed to modify profile {}: {:?}", school_id, e);
            Status::ConnectionError
        }
    }
}

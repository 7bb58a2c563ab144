//! services/api/src/web/query.rs
//!
//! `POST /api/profile/query`: read profiles in one of four modes.
//!
//! The `request` field is resolved into a `QueryMode` once, at the boundary:
//!
//! | payload                                       | mode    |
//! |-----------------------------------------------|---------|
//! | `"all"`                                       | All     |
//! | `14051531` or `{"school_id": 14051531}`       | Single  |
//! | `{"cur_class": 5}`                            | Class   |
//! | `{"cur_class": 5, "school_id": ..., "details": true}` | Details |

use crate::web::state::AppState;
use crate::web::status::Status;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::try_join3;
use mentor_core::domain::{Final, Meeting, Plan, Profile, ProfileFilter, ProfileRecords};
use mentor_core::ports::ProfileStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

//=========================================================================================
// Request Payload and Query Modes
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// `"all"`, a school id, or an object with `school_id`, `cur_class`, `details`.
    #[schema(value_type = Object)]
    pub request: QueryTarget,
}

/// The raw shapes `request` may take on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryTarget {
    SchoolId(i64),
    Keyword(String),
    Object(QueryObject),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryObject {
    pub school_id: Option<i64>,
    pub cur_class: Option<i64>,
    #[serde(default)]
    pub details: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// One profile by exact identifier, no join.
    Single { school_id: i64 },
    /// Every student profile, no join.
    All,
    /// Students of a class, joined with their plans, meetings and final.
    Class { class_id: i64 },
    /// One student's profile, plans and meetings within a class.
    Details { school_id: i64, class_id: i64 },
}

impl TryFrom<QueryTarget> for QueryMode {
    type Error = Status;

    fn try_from(target: QueryTarget) -> Result<Self, Self::Error> {
        match target {
            QueryTarget::SchoolId(school_id) => Ok(QueryMode::Single { school_id }),
            QueryTarget::Keyword(word) if word == "all" => Ok(QueryMode::All),
            QueryTarget::Keyword(word) => word
                .trim()
                .parse()
                .map(|school_id| QueryMode::Single { school_id })
                .map_err(|_| Status::RequestMalformed),
            QueryTarget::Object(obj) => match (obj.details, obj.cur_class, obj.school_id) {
                (true, Some(class_id), Some(school_id)) => {
                    Ok(QueryMode::Details { school_id, class_id })
                }
                (true, _, _) => Err(Status::RequestMalformed),
                (false, Some(class_id), _) => Ok(QueryMode::Class { class_id }),
                (false, None, Some(school_id)) => Ok(QueryMode::Single { school_id }),
                (false, None, None) => Err(Status::RequestMalformed),
            },
        }
    }
}

//=========================================================================================
// Response Shapes
//=========================================================================================

/// A class member as returned by the join query: the profile, its most recent
/// plan and meeting, and the final record's fields flattened alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMember {
    #[serde(flatten)]
    pub profile: Profile,
    pub newest_plan: Option<Plan>,
    pub newest_meeting: Option<Meeting>,
    #[serde(flatten)]
    pub final_record: Option<Final>,
}

impl From<ProfileRecords> for ClassMember {
    fn from(records: ProfileRecords) -> Self {
        let ProfileRecords {
            profile,
            mut plans,
            mut meetings,
            final_record,
        } = records;
        // Sub-collections arrive oldest first.
        Self {
            profile,
            newest_plan: plans.pop(),
            newest_meeting: meetings.pop(),
            final_record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDetails {
    pub profile: Profile,
    pub plans: Vec<Plan>,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Profiles(Vec<Profile>),
    Class(Vec<ClassMember>),
    Details(StudentDetails),
}

impl IntoResponse for QueryResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

//=========================================================================================
// Query Execution
//=========================================================================================

/// Executes one resolved query against the store.
pub async fn run_query(
    db: &dyn ProfileStore,
    student_floor: i64,
    mode: QueryMode,
) -> Result<QueryResponse, Status> {
    match mode {
        QueryMode::Single { school_id } => {
            list_profiles(db, ProfileFilter::SchoolId(school_id)).await
        }
        QueryMode::All => list_profiles(db, ProfileFilter::MinSchoolId(student_floor)).await,
        QueryMode::Class { class_id } => {
            let records = db
                .find_class_records(class_id, student_floor)
                .await
                .map_err(|e| {
                    error!("Class query for {} failed: {:?}", class_id, e);
                    Status::ConnectionError
                })?;
            Ok(QueryResponse::Class(
                records.into_iter().map(ClassMember::from).collect(),
            ))
        }
        QueryMode::Details {
            school_id,
            class_id,
        } => student_details(db, school_id, class_id)
            .await
            .map(QueryResponse::Details),
    }
}

async fn list_profiles(db: &dyn ProfileStore, filter: ProfileFilter) -> Result<QueryResponse, Status> {
    let profiles = db.find_profiles(filter).await.map_err(|e| {
        error!("Profile query {:?} failed: {:?}", filter, e);
        Status::ConnectionError
    })?;
    if profiles.is_empty() {
        return Err(Status::ProfileFetchFailed);
    }
    Ok(QueryResponse::Profiles(profiles))
}

/// Fetches the profile, plans and meetings concurrently. The first failure
/// settles the outcome; the remaining fetches are dropped.
pub async fn student_details(
    db: &dyn ProfileStore,
    school_id: i64,
    class_id: i64,
) -> Result<StudentDetails, Status> {
    let (profile, plans, meetings) = try_join3(
        db.get_profile(school_id),
        db.list_plans(school_id, class_id),
        db.list_meetings(school_id, class_id),
    )
    .await
    .map_err(|e| {
        error!(
            "Details query for {} in class {} failed: {:?}",
            school_id, class_id, e
        );
        Status::from_store(&e)
    })?;

    Ok(StudentDetails {
        profile,
        plans,
        meetings,
    })
}

/// Query profiles.
#[utoipa::path(
    post,
    path = "/api/profile/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Profile data, or a status body (2201 not found, 5000 store failure, 4000 malformed request)")
    )
)]
pub async fn query_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let mode = match payload {
        Ok(Json(req)) => QueryMode::try_from(req.request),
        Err(e) => {
            warn!("Rejected query request: {}", e);
            Err(Status::RequestMalformed)
        }
    };
    let mode = match mode {
        Ok(mode) => mode,
        Err(status) => return status.into_response(),
    };

    info!("Profile query: {:?}", mode);
    match run_query(state.db.as_ref(), state.config.student_id_floor, mode).await {
        Ok(data) => data.into_response(),
        Err(status) => status.into_response(),
    }
}

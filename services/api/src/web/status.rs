//! services/api/src/web/status.rs
//!
//! The catalogue of application status codes. Every outcome that is not a
//! data payload is written as `{ "status": <code>, "msg": <text> }` with HTTP 200;
//! clients inspect the body, not the transport status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use mentor_core::ports::PortError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    ProfileModSuccessful,
    ProfileFetchFailed,
    RequestMalformed,
    AvatarNotFound,
    ConnectionError,
    FileRenameFailed,
    FileDeleteFailed,
    UploadFailed,
}

/// The JSON body a `Status` is rendered as.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusBody {
    pub status: u16,
    pub msg: String,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::ProfileModSuccessful => 2000,
            Status::ProfileFetchFailed => 2201,
            Status::RequestMalformed => 4000,
            Status::AvatarNotFound => 4040,
            Status::ConnectionError => 5000,
            Status::FileRenameFailed => 5101,
            Status::FileDeleteFailed => 5102,
            Status::UploadFailed => 5103,
        }
    }

    pub fn msg(self) -> &'static str {
        match self {
            Status::ProfileModSuccessful => "profile updated",
            Status::ProfileFetchFailed => "profile not found",
            Status::RequestMalformed => "request is missing required fields",
            Status::AvatarNotFound => "avatar not found",
            Status::ConnectionError => "database connection error",
            Status::FileRenameFailed => "avatar file rename failed",
            Status::FileDeleteFailed => "previous avatar file could not be deleted",
            Status::UploadFailed => "avatar upload could not be stored",
        }
    }

    pub fn body(self) -> StatusBody {
        StatusBody {
            status: self.code(),
            msg: self.msg().to_string(),
        }
    }

    /// Store failures: a missing row is a fetch failure, anything else is
    /// reported as a connection error.
    pub fn from_store(err: &PortError) -> Self {
        match err {
            PortError::NotFound(_) => Status::ProfileFetchFailed,
            PortError::Unexpected(_) => Status::ConnectionError,
        }
    }
}

impl IntoResponse for Status {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.body())).into_response()
    }
}

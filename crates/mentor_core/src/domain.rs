//! crates/mentor_core/src/domain.rs
//!
//! Defines the core records of the mentoring application.
//! They are owned by the store; this crate only reads them and updates fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One record per user, student or staff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub school_id: i64,
    pub sex: Option<String>,
    pub birth_date: Option<String>,
    pub phone_num: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub cur_class: Option<i64>,
}

/// A scheduled mentoring task for a student within a class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub id: i64,
    pub school_id: i64,
    pub class_id: i64,
    pub start: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub content: String,
    pub status: i32,
    #[serde(serialize_with = "crate::time::serialize")]
    pub created_at: DateTime<Utc>,
}

/// A logged mentoring meeting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meeting {
    pub id: i64,
    pub school_id: i64,
    pub class_id: i64,
    pub date: Option<NaiveDate>,
    pub content: String,
    #[serde(serialize_with = "crate::time::serialize")]
    pub created_at: DateTime<Utc>,
}

/// The final submission and its evaluation.
///
/// `school_id` is skipped on output because the record is flattened onto
/// its owning profile, which already carries the identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Final {
    #[serde(skip)]
    pub school_id: i64,
    pub submission_id: Option<i64>,
    pub submission_source: Option<String>,
    pub rate: Option<i32>,
    pub remark: Option<String>,
    #[serde(serialize_with = "crate::time::serialize")]
    pub updated_at: DateTime<Utc>,
}

/// The four fields a user may change on their own profile.
/// `None` is written through as an empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub sex: Option<String>,
    pub birth_date: Option<String>,
    pub phone_num: Option<String>,
    pub description: Option<String>,
}

/// Row filter for plain profile listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFilter {
    /// Exactly one identifier.
    SchoolId(i64),
    /// Every profile whose identifier is at least the given floor.
    MinSchoolId(i64),
}

/// A profile joined with its plans and meetings (both ordered by creation,
/// oldest first) and its optional final record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecords {
    pub profile: Profile,
    pub plans: Vec<Plan>,
    pub meetings: Vec<Meeting>,
    pub final_record: Option<Final>,
}

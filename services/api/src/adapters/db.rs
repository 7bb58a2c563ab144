//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ProfileStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mentor_core::domain::{Final, Meeting, Plan, Profile, ProfileChanges, ProfileFilter, ProfileRecords};
use mentor_core::ports::{PortError, PortResult, ProfileStore};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ProfileStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const PROFILE_COLUMNS: &str =
    "school_id, sex, birth_date, phone_num, description, avatar, cur_class";
const PLAN_COLUMNS: &str =
    "id, school_id, class_id, start, deadline, content, status, created_at";
const MEETING_COLUMNS: &str = "id, school_id, class_id, date, content, created_at";
const FINAL_COLUMNS: &str =
    "school_id, submission_id, submission_source, rate, remark, updated_at";

#[derive(FromRow)]
struct ProfileRecord {
    school_id: i64,
    sex: Option<String>,
    birth_date: Option<String>,
    phone_num: Option<String>,
    description: Option<String>,
    avatar: Option<String>,
    cur_class: Option<i64>,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            school_id: self.school_id,
            sex: self.sex,
            birth_date: self.birth_date,
            phone_num: self.phone_num,
            description: self.description,
            avatar: self.avatar,
            cur_class: self.cur_class,
        }
    }
}

#[derive(FromRow)]
struct PlanRecord {
    id: i64,
    school_id: i64,
    class_id: i64,
    start: Option<NaiveDate>,
    deadline: Option<NaiveDate>,
    content: String,
    status: i32,
    created_at: DateTime<Utc>,
}
impl PlanRecord {
    fn to_domain(self) -> Plan {
        Plan {
            id: self.id,
            school_id: self.school_id,
            class_id: self.class_id,
            start: self.start,
            deadline: self.deadline,
            content: self.content,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct MeetingRecord {
    id: i64,
    school_id: i64,
    class_id: i64,
    date: Option<NaiveDate>,
    content: String,
    created_at: DateTime<Utc>,
}
impl MeetingRecord {
    fn to_domain(self) -> Meeting {
        Meeting {
            id: self.id,
            school_id: self.school_id,
            class_id: self.class_id,
            date: self.date,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct FinalRecord {
    school_id: i64,
    submission_id: Option<i64>,
    submission_source: Option<String>,
    rate: Option<i32>,
    remark: Option<String>,
    updated_at: DateTime<Utc>,
}
impl FinalRecord {
    fn to_domain(self) -> Final {
        Final {
            school_id: self.school_id,
            submission_id: self.submission_id,
            submission_source: self.submission_source,
            rate: self.rate,
            remark: self.remark,
            updated_at: self.updated_at,
        }
    }
}

/// Groups the per-student rows under their profiles, keeping the profile order
/// and the creation order of plans and meetings as fetched.
fn assemble_records(
    profiles: Vec<Profile>,
    plans: Vec<Plan>,
    meetings: Vec<Meeting>,
    finals: Vec<Final>,
) -> Vec<ProfileRecords> {
    let mut plans_by_student: HashMap<i64, Vec<Plan>> = HashMap::new();
    for plan in plans {
        plans_by_student.entry(plan.school_id).or_default().push(plan);
    }
    let mut meetings_by_student: HashMap<i64, Vec<Meeting>> = HashMap::new();
    for meeting in meetings {
        meetings_by_student
            .entry(meeting.school_id)
            .or_default()
            .push(meeting);
    }
    let mut finals_by_student: HashMap<i64, Final> = finals
        .into_iter()
        .map(|f| (f.school_id, f))
        .collect();

    profiles
        .into_iter()
        .map(|profile| {
            let id = profile.school_id;
            ProfileRecords {
                plans: plans_by_student.remove(&id).unwrap_or_default(),
                meetings: meetings_by_student.remove(&id).unwrap_or_default(),
                final_record: finals_by_student.remove(&id),
                profile,
            }
        })
        .collect()
}

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for DbAdapter {
    async fn update_profile(&self, school_id: i64, changes: &ProfileChanges) -> PortResult<()> {
        sqlx::query(
            "UPDATE profiles SET sex = $1, birth_date = $2, phone_num = $3, description = $4 WHERE school_id = $5",
        )
        .bind(&changes.sex)
        .bind(&changes.birth_date)
        .bind(&changes.phone_num)
        .bind(&changes.description)
        .bind(school_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn update_avatar(&self, school_id: i64, avatar: &str) -> PortResult<()> {
        sqlx::query("UPDATE profiles SET avatar = $1 WHERE school_id = $2")
            .bind(avatar)
            .bind(school_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn find_profile_by_avatar(&self, avatar: &str) -> PortResult<Option<Profile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE avatar = $1 LIMIT 1"
        ))
        .bind(avatar)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ProfileRecord::to_domain))
    }

    async fn get_profile(&self, school_id: i64) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE school_id = $1"
        ))
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Profile {} not found", school_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn find_profiles(&self, filter: ProfileFilter) -> PortResult<Vec<Profile>> {
        let (sql, bound) = match filter {
            ProfileFilter::SchoolId(id) => (
                format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE school_id = $1"),
                id,
            ),
            ProfileFilter::MinSchoolId(floor) => (
                format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles WHERE school_id >= $1 ORDER BY school_id ASC"
                ),
                floor,
            ),
        };
        let records = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(bound)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_class_records(
        &self,
        class_id: i64,
        min_school_id: i64,
    ) -> PortResult<Vec<ProfileRecords>> {
        let profiles: Vec<Profile> = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE cur_class = $1 AND school_id >= $2 ORDER BY school_id ASC"
        ))
        .bind(class_id)
        .bind(min_school_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?
        .into_iter()
        .map(|r| r.to_domain())
        .collect();

        if profiles.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = profiles.iter().map(|p| p.school_id).collect();

        let plans = sqlx::query_as::<_, PlanRecord>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE school_id = ANY($1) AND class_id = $2 ORDER BY created_at ASC, id ASC"
        ))
        .bind(&ids)
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?
        .into_iter()
        .map(|r| r.to_domain())
        .collect();

        let meetings = sqlx::query_as::<_, MeetingRecord>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE school_id = ANY($1) AND class_id = $2 ORDER BY created_at ASC, id ASC"
        ))
        .bind(&ids)
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?
        .into_iter()
        .map(|r| r.to_domain())
        .collect();

        let finals = sqlx::query_as::<_, FinalRecord>(&format!(
            "SELECT {FINAL_COLUMNS} FROM finals WHERE school_id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?
        .into_iter()
        .map(|r| r.to_domain())
        .collect();

        Ok(assemble_records(profiles, plans, meetings, finals))
    }

    async fn list_plans(&self, school_id: i64, class_id: i64) -> PortResult<Vec<Plan>> {
        let records = sqlx::query_as::<_, PlanRecord>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE school_id = $1 AND class_id = $2 ORDER BY created_at DESC, id DESC"
        ))
        .bind(school_id)
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_meetings(&self, school_id: i64, class_id: i64) -> PortResult<Vec<Meeting>> {
        let records = sqlx::query_as::<_, MeetingRecord>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE school_id = $1 AND class_id = $2 ORDER BY created_at DESC, id DESC"
        ))
        .bind(school_id)
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

//! In-memory stand-ins for the store and file ports. Both write every call
//! into a shared log so tests can assert ordering across them.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::state::AppState;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mentor_core::domain::{Final, Meeting, Plan, Profile, ProfileChanges, ProfileFilter, ProfileRecords};
use mentor_core::ports::{FileStore, PortError, PortResult, ProfileStore};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_490_000_000 + secs, 0).unwrap()
}

pub fn profile(school_id: i64, class: Option<i64>) -> Profile {
    Profile {
        school_id,
        sex: None,
        birth_date: None,
        phone_num: None,
        description: None,
        avatar: None,
        cur_class: class,
    }
}

pub fn plan(id: i64, school_id: i64, class_id: i64, created: i64) -> Plan {
    Plan {
        id,
        school_id,
        class_id,
        start: None,
        deadline: None,
        content: format!("plan {id}"),
        status: 0,
        created_at: at(created),
    }
}

pub fn meeting(id: i64, school_id: i64, class_id: i64, created: i64) -> Meeting {
    Meeting {
        id,
        school_id,
        class_id,
        date: None,
        content: format!("meeting {id}"),
        created_at: at(created),
    }
}

//=========================================================================================
// Profile store
//=========================================================================================

#[derive(Default)]
pub struct MemoryStore {
    pub profiles: Mutex<Vec<Profile>>,
    pub plans: Mutex<Vec<Plan>>,
    pub meetings: Mutex<Vec<Meeting>>,
    pub finals: Mutex<Vec<Final>>,
    failing: Mutex<HashSet<&'static str>>,
    log: Log,
}

impl MemoryStore {
    pub fn with_log(log: Log) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    /// Makes every later call of the named operation fail as a store error.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn log(&self) -> Vec<String> {
        entries(&self.log)
    }

    fn record(&self, op: &'static str, detail: String) -> PortResult<()> {
        self.log.lock().unwrap().push(format!("{op} {detail}"));
        if self.failing.lock().unwrap().contains(op) {
            return Err(PortError::Unexpected(format!("{op} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn update_profile(&self, school_id: i64, changes: &ProfileChanges) -> PortResult<()> {
        self.record("update_profile", format!("{school_id} {changes:?}"))?;
        let mut profiles = self.profiles.lock().unwrap();
        for p in profiles.iter_mut().filter(|p| p.school_id == school_id) {
            p.sex = changes.sex.clone();
            p.birth_date = changes.birth_date.clone();
            p.phone_num = changes.phone_num.clone();
            p.description = changes.description.clone();
        }
        Ok(())
    }

    async fn update_avatar(&self, school_id: i64, avatar: &str) -> PortResult<()> {
        self.record("update_avatar", format!("{school_id} {avatar}"))?;
        let mut profiles = self.profiles.lock().unwrap();
        for p in profiles.iter_mut().filter(|p| p.school_id == school_id) {
            p.avatar = Some(avatar.to_string());
        }
        Ok(())
    }

    async fn find_profile_by_avatar(&self, avatar: &str) -> PortResult<Option<Profile>> {
        self.record("find_profile_by_avatar", avatar.to_string())?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.avatar.as_deref() == Some(avatar))
            .cloned())
    }

    async fn get_profile(&self, school_id: i64) -> PortResult<Profile> {
        self.record("get_profile", school_id.to_string())?;
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.school_id == school_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Profile {school_id} not found")))
    }

    async fn find_profiles(&self, filter: ProfileFilter) -> PortResult<Vec<Profile>> {
        self.record("find_profiles", format!("{filter:?}"))?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|p| match filter {
                ProfileFilter::SchoolId(id) => p.school_id == id,
                ProfileFilter::MinSchoolId(floor) => p.school_id >= floor,
            })
            .cloned()
            .collect())
    }

    async fn find_class_records(
        &self,
        class_id: i64,
        min_school_id: i64,
    ) -> PortResult<Vec<ProfileRecords>> {
        self.record("find_class_records", format!("{class_id} {min_school_id}"))?;
        let profiles = self.profiles.lock().unwrap().clone();
        let plans = self.plans.lock().unwrap().clone();
        let meetings = self.meetings.lock().unwrap().clone();
        let finals = self.finals.lock().unwrap().clone();

        Ok(profiles
            .into_iter()
            .filter(|p| p.cur_class == Some(class_id) && p.school_id >= min_school_id)
            .map(|profile| {
                let id = profile.school_id;
                let mut own_plans: Vec<Plan> = plans
                    .iter()
                    .filter(|x| x.school_id == id && x.class_id == class_id)
                    .cloned()
                    .collect();
                own_plans.sort_by_key(|x| x.created_at);
                let mut own_meetings: Vec<Meeting> = meetings
                    .iter()
                    .filter(|x| x.school_id == id && x.class_id == class_id)
                    .cloned()
                    .collect();
                own_meetings.sort_by_key(|x| x.created_at);
                ProfileRecords {
                    profile,
                    plans: own_plans,
                    meetings: own_meetings,
                    final_record: finals.iter().find(|f| f.school_id == id).cloned(),
                }
            })
            .collect())
    }

    async fn list_plans(&self, school_id: i64, class_id: i64) -> PortResult<Vec<Plan>> {
        self.record("list_plans", format!("{school_id} {class_id}"))?;
        let mut plans: Vec<Plan> = self
            .plans
            .lock()
            .unwrap()
            .iter()
            .filter(|x| x.school_id == school_id && x.class_id == class_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    async fn list_meetings(&self, school_id: i64, class_id: i64) -> PortResult<Vec<Meeting>> {
        self.record("list_meetings", format!("{school_id} {class_id}"))?;
        let mut meetings: Vec<Meeting> = self
            .meetings
            .lock()
            .unwrap()
            .iter()
            .filter(|x| x.school_id == school_id && x.class_id == class_id)
            .cloned()
            .collect();
        meetings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(meetings)
    }
}

//=========================================================================================
// File store
//=========================================================================================

#[derive(Default)]
pub struct MemoryFiles {
    pub files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    failing: Mutex<HashSet<&'static str>>,
    staged: Mutex<u32>,
    log: Log,
}

impl MemoryFiles {
    pub fn with_log(log: Log) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn put(&self, path: impl Into<PathBuf>, data: &[u8]) {
        self.files.lock().unwrap().insert(path.into(), data.to_vec());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    fn record(&self, op: &'static str, detail: String) -> PortResult<()> {
        self.log.lock().unwrap().push(format!("{op} {detail}"));
        if self.failing.lock().unwrap().contains(op) {
            return Err(PortError::Unexpected(format!("{op}: permission denied")));
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemoryFiles {
    async fn stage_upload(&self, data: &[u8]) -> PortResult<PathBuf> {
        let path = {
            let mut n = self.staged.lock().unwrap();
            *n += 1;
            PathBuf::from(format!("uploads/{n}"))
        };
        self.record("stage_upload", path.display().to_string())?;
        self.put(path.clone(), data);
        Ok(path)
    }

    async fn remove(&self, path: &Path) -> PortResult<()> {
        self.record("remove", path.display().to_string())?;
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(path.display().to_string()))
    }

    async fn rename(&self, from: &Path, to: &Path) -> PortResult<()> {
        self.record("rename", format!("{} {}", from.display(), to.display()))?;
        let mut files = self.files.lock().unwrap();
        let data = files
            .remove(from)
            .ok_or_else(|| PortError::NotFound(from.display().to_string()))?;
        files.insert(to.to_path_buf(), data);
        Ok(())
    }

    async fn read(&self, path: &Path) -> PortResult<Vec<u8>> {
        self.record("read", path.display().to_string())?;
        self.get(path)
            .ok_or_else(|| PortError::NotFound(path.display().to_string()))
    }
}

//=========================================================================================
// App state
//=========================================================================================

pub fn test_config(avatar_dir: impl Into<PathBuf>) -> Config {
    let avatar_dir = avatar_dir.into();
    Config::from_lookup(move |key| match key {
        "DATABASE_URL" => Some("postgres://localhost/mentor_test".to_string()),
        "AVATAR_DIR" => Some(avatar_dir.display().to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn app_state(store: Arc<MemoryStore>, files: Arc<dyn FileStore>, avatar_dir: &Path) -> Arc<AppState> {
    Arc::new(AppState {
        db: store,
        files,
        config: Arc::new(test_config(avatar_dir)),
    })
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

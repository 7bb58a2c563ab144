//! crates/mentor_core/src/ports.rs
//!
//! Defines the service contracts (traits) the handlers are written against.
//! The store and the file system live behind these traits so the request
//! pipelines stay independent of Postgres and of the local disk.

use crate::domain::{Meeting, Plan, Profile, ProfileChanges, ProfileFilter, ProfileRecords};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ProfileStore: Send + Sync {
    // --- Profile writes ---
    async fn update_profile(&self, school_id: i64, changes: &ProfileChanges) -> PortResult<()>;

    async fn update_avatar(&self, school_id: i64, avatar: &str) -> PortResult<()>;

    // --- Profile reads ---
    async fn find_profile_by_avatar(&self, avatar: &str) -> PortResult<Option<Profile>>;

    /// Fails with `PortError::NotFound` when no profile has the identifier.
    async fn get_profile(&self, school_id: i64) -> PortResult<Profile>;

    async fn find_profiles(&self, filter: ProfileFilter) -> PortResult<Vec<Profile>>;

    /// Profiles of one class at or above `min_school_id`, with their plans,
    /// meetings and final record for that class.
    async fn find_class_records(
        &self,
        class_id: i64,
        min_school_id: i64,
    ) -> PortResult<Vec<ProfileRecords>>;

    // --- Mentoring records, newest first ---
    async fn list_plans(&self, school_id: i64, class_id: i64) -> PortResult<Vec<Plan>>;

    async fn list_meetings(&self, school_id: i64, class_id: i64) -> PortResult<Vec<Meeting>>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes an uploaded body to a fresh temporary file and returns its path.
    async fn stage_upload(&self, data: &[u8]) -> PortResult<PathBuf>;

    /// Removes a file. A missing file is reported as `PortError::NotFound`.
    async fn remove(&self, path: &Path) -> PortResult<()>;

    async fn rename(&self, from: &Path, to: &Path) -> PortResult<()>;

    async fn read(&self, path: &Path) -> PortResult<Vec<u8>>;
}

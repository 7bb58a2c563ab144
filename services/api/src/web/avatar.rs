//! services/api/src/web/avatar.rs
//!
//! `POST /api/profile/avatar`: replace a user's avatar image.
//!
//! The upload runs through four stages that share one `AvatarContext`:
//!
//! 1. receive: stage the multipart file, compute the target path and public reference
//! 2. reclaim: if a profile already points at that reference, delete the old file
//! 3. commit file: rename the staged file onto the target path
//! 4. commit record: store the reference on the profile
//!
//! A stage only runs once the previous one succeeded; the first failure is the
//! response. Nothing is rolled back; a staged upload that never got renamed is
//! discarded.

use crate::web::{
    state::AppState,
    status::{Status, StatusBody},
};
use axum::extract::{multipart::MultipartRejection, Multipart, State};
use bytes::Bytes;
use mentor_core::ports::{FileStore, PortError, ProfileStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Public reference stored on the profile; served by the download route.
pub fn avatar_reference(school_id: i64) -> String {
    format!("/api/download?avatar={}", avatar_file_name(school_id))
}

pub fn avatar_file_name(school_id: i64) -> String {
    format!("{}.jpg", school_id)
}

/// What the multipart body carried once the file has been staged on disk.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub school_id: i64,
    pub staged_path: PathBuf,
}

/// Request-scoped state threaded through the pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarContext {
    pub school_id: i64,
    pub staged_path: PathBuf,
    pub target_path: PathBuf,
    pub reference: String,
}

pub struct AvatarPipeline<'a> {
    db: &'a dyn ProfileStore,
    files: &'a dyn FileStore,
    avatar_dir: &'a Path,
}

impl<'a> AvatarPipeline<'a> {
    pub fn new(db: &'a dyn ProfileStore, files: &'a dyn FileStore, avatar_dir: &'a Path) -> Self {
        Self {
            db,
            files,
            avatar_dir,
        }
    }

    /// Runs every stage in order and returns the single terminal status.
    pub async fn run(&self, upload: AvatarUpload) -> Status {
        let ctx = self.receive(upload);
        match self.advance(&ctx).await {
            Ok(()) => Status::ProfileModSuccessful,
            Err(status) => status,
        }
    }

    async fn advance(&self, ctx: &AvatarContext) -> Result<(), Status> {
        if let Err(status) = self.reclaim(ctx).await {
            self.discard_staged(ctx).await;
            return Err(status);
        }
        if let Err(status) = self.commit_file(ctx).await {
            self.discard_staged(ctx).await;
            return Err(status);
        }
        self.commit_record(ctx).await
    }

    /// Best-effort cleanup of an upload that never reached the avatar directory.
    async fn discard_staged(&self, ctx: &AvatarContext) {
        if let Err(e) = self.files.remove(&ctx.staged_path).await {
            warn!(
                "Staged upload {} left behind: {:?}",
                ctx.staged_path.display(),
                e
            );
        }
    }

    pub fn receive(&self, upload: AvatarUpload) -> AvatarContext {
        let ctx = AvatarContext {
            school_id: upload.school_id,
            staged_path: upload.staged_path,
            target_path: self.avatar_dir.join(avatar_file_name(upload.school_id)),
            reference: avatar_reference(upload.school_id),
        };
        info!(
            "Avatar for {} received, target {}",
            ctx.school_id,
            ctx.target_path.display()
        );
        ctx
    }

    pub async fn reclaim(&self, ctx: &AvatarContext) -> Result<(), Status> {
        let existing = self
            .db
            .find_profile_by_avatar(&ctx.reference)
            .await
            .map_err(|e| {
                error!("Avatar lookup for {} failed: {:?}", ctx.school_id, e);
                Status::ConnectionError
            })?;

        if existing.is_none() {
            return Ok(());
        }

        match self.files.remove(&ctx.target_path).await {
            Ok(()) => {
                info!("Previous avatar {} deleted", ctx.target_path.display());
                Ok(())
            }
            Err(PortError::NotFound(_)) => {
                warn!(
                    "Previous avatar {} was already gone",
                    ctx.target_path.display()
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete previous avatar: {:?}", e);
                Err(Status::FileDeleteFailed)
            }
        }
    }

    pub async fn commit_file(&self, ctx: &AvatarContext) -> Result<(), Status> {
        self.files
            .rename(&ctx.staged_path, &ctx.target_path)
            .await
            .map_err(|e| {
                error!("Avatar file rename error: {:?}", e);
                Status::FileRenameFailed
            })
    }

    pub async fn commit_record(&self, ctx: &AvatarContext) -> Result<(), Status> {
        self.db
            .update_avatar(ctx.school_id, &ctx.reference)
            .await
            .map_err(|e| {
                error!("Failed to store avatar for {}: {:?}", ctx.school_id, e);
                Status::ConnectionError
            })?;
        info!("Avatar for {} modified", ctx.school_id);
        Ok(())
    }
}

/// Pulls `school_id` and the first file part out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<(i64, Bytes), Status> {
    let mut school_id = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Failed to read multipart data: {}", e);
        Status::RequestMalformed
    })? {
        if field.name() == Some("school_id") {
            let text = field.text().await.map_err(|_| Status::RequestMalformed)?;
            school_id = Some(
                text.trim()
                    .parse::<i64>()
                    .map_err(|_| Status::RequestMalformed)?,
            );
        } else if file.is_none() && (field.file_name().is_some() || field.name() == Some("file")) {
            let data = field.bytes().await.map_err(|e| {
                warn!("Failed to read file bytes: {}", e);
                Status::RequestMalformed
            })?;
            file = Some(data);
        }
    }

    match (school_id, file) {
        (Some(id), Some(data)) => Ok((id, data)),
        _ => Err(Status::RequestMalformed),
    }
}

/// Upload a new avatar image.
///
/// Accepts a multipart/form-data request with a `school_id` text part and a
/// `file` part.
#[utoipa::path(
    post,
    path = "/api/profile/avatar",
    request_body(content_type = "multipart/form-data", description = "`school_id` and the image `file`."),
    responses(
        (status = 200, description = "2000 on success; 5000, 5101, 5102, 5103 or 4000 on failure", body = StatusBody)
    )
)]
pub async fn avatar_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Status {
    let multipart = match multipart {
        Ok(m) => m,
        Err(e) => {
            warn!("Rejected avatar request: {}", e);
            return Status::RequestMalformed;
        }
    };
    let (school_id, data) = match read_upload(multipart).await {
        Ok(parts) => parts,
        Err(status) => return status,
    };

    let staged_path = match state.files.stage_upload(&data).await {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to stage avatar upload: {:?}", e);
            return Status::UploadFailed;
        }
    };

    AvatarPipeline::new(
        state.db.as_ref(),
        state.files.as_ref(),
        &state.config.avatar_dir,
    )
    .run(AvatarUpload {
        school_id,
        staged_path,
    })
    .await
}

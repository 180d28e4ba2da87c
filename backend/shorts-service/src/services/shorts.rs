/// Shorts reconciliation workflow
///
/// A post and its encoded video show up in no particular order: the client
/// may create the post before encoding finishes, or the encoding provider may
/// call back before the post exists. Both triggers run find-or-create against
/// the registry so that exactly one Shorts row per upload key survives and the
/// post ends up linked to it.
///
/// Encoding callbacks arrive as:
/// - success: WAITING -> RUNNING -> COMPLETE
/// - failure: WAITING -> RUNNING -> FAILURE
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::db::ShortsRepository;
use crate::error::{AppError, Result};
use crate::models::{
    CallbackOutcome, EncodeStateNotice, EncodingCallback, EncodingStatus, NewShorts, Post, Shorts,
    ShortsState,
};
use crate::services::notifications::NotificationSink;

pub struct ShortsService {
    repo: Arc<dyn ShortsRepository>,
    notifications: Arc<dyn NotificationSink>,
    storage: StorageConfig,
}

impl ShortsService {
    pub fn new(
        repo: Arc<dyn ShortsRepository>,
        notifications: Arc<dyn NotificationSink>,
        storage: StorageConfig,
    ) -> Self {
        Self {
            repo,
            notifications,
            storage,
        }
    }

    pub fn generate_shorts_file_name(&self, upload_key: &str) -> String {
        self.storage.shorts.render(upload_key)
    }

    pub fn generate_thumbnail_file_name(&self, upload_key: &str) -> String {
        self.storage.thumbnail.render(upload_key)
    }

    pub async fn find_by_upload_key(&self, upload_key: &str) -> Result<Option<Shorts>> {
        self.repo.find_by_upload_key(upload_key).await
    }

    /// Persist an in-progress row with derived URLs.
    ///
    /// Callers check for absence first; a concurrent writer still shows up as
    /// `AppError::Conflict`.
    pub async fn create_placeholder(&self, upload_key: &str) -> Result<Shorts> {
        let new_shorts = NewShorts {
            upload_key: upload_key.to_string(),
            shorts_url: self.generate_shorts_file_name(upload_key),
            thumbnail_url: self.generate_thumbnail_file_name(upload_key),
            state: ShortsState::InProgress,
        };
        self.repo.save(&new_shorts).await
    }

    /// Returns the row for `upload_key` and whether this call created it.
    async fn find_or_create_placeholder(&self, upload_key: &str) -> Result<(Shorts, bool)> {
        if let Some(existing) = self.repo.find_by_upload_key(upload_key).await? {
            return Ok((existing, false));
        }
        self.insert_placeholder_or_reread(upload_key).await
    }

    /// Insert after a lookup missed. Losing the insert race to another
    /// trigger yields the winner's row with `created == false`.
    async fn insert_placeholder_or_reread(&self, upload_key: &str) -> Result<(Shorts, bool)> {
        match self.create_placeholder(upload_key).await {
            Ok(created) => Ok((created, true)),
            Err(AppError::Conflict(_)) => {
                debug!(%upload_key, "Lost placeholder race; re-reading shorts");
                let existing = self
                    .repo
                    .find_by_upload_key(upload_key)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "shorts {} conflicted on insert but is missing",
                            upload_key
                        ))
                    })?;
                Ok((existing, false))
            }
            Err(err) => Err(err),
        }
    }

    /// Link the Shorts for `upload_key` to a post that is being created.
    ///
    /// If the row already exists the encoder got there first and the row is
    /// marked OK. Otherwise an in-progress placeholder is created for the
    /// callbacks to update later.
    pub async fn connect_shorts(&self, post: Post, upload_key: &str) -> Result<Post> {
        if let Some(mut shorts) = self.repo.find_by_upload_key(upload_key).await? {
            self.repo.update_state(upload_key, ShortsState::Ok).await?;
            shorts.state = ShortsState::Ok;
            info!(%upload_key, post_id = %post.id, "Linked post to encoded shorts");
            return Ok(post.attach_shorts(&shorts));
        }

        let (mut shorts, created) = self.insert_placeholder_or_reread(upload_key).await?;
        if !created {
            // A WAITING callback inserted the row between our lookup and insert.
            self.repo.update_state(upload_key, ShortsState::Ok).await?;
            shorts.state = ShortsState::Ok;
        }
        info!(%upload_key, post_id = %post.id, created, "Linked post to shorts placeholder");
        Ok(post.attach_shorts(&shorts))
    }

    /// Apply one encoding-provider callback.
    ///
    /// Notifications are queued only after the registry write succeeded.
    pub async fn process_encoding_callback(
        &self,
        callback: &EncodingCallback,
    ) -> Result<CallbackOutcome> {
        let upload_key = upload_key_from_file_path(&callback.file_path)?;

        let outcome = match &callback.status {
            EncodingStatus::Waiting => {
                let (_, created) = self.find_or_create_placeholder(upload_key).await?;
                self.notify(upload_key, ShortsState::InProgress);
                CallbackOutcome::Registered { created }
            }
            EncodingStatus::Running => CallbackOutcome::Ignored,
            EncodingStatus::Failure => {
                self.repo.update_state(upload_key, ShortsState::Fail).await?;
                self.notify(upload_key, ShortsState::Fail);
                CallbackOutcome::Failed
            }
            EncodingStatus::Complete => {
                self.repo.update_state(upload_key, ShortsState::Ok).await?;
                self.notify(upload_key, ShortsState::Ok);
                CallbackOutcome::Completed
            }
            EncodingStatus::Other(raw) => CallbackOutcome::UnrecognizedStatus(raw.clone()),
        };

        debug!(%upload_key, ?outcome, "Processed encoding callback");
        Ok(outcome)
    }

    fn notify(&self, upload_key: &str, state: ShortsState) {
        self.notifications.enqueue(EncodeStateNotice {
            upload_key: upload_key.to_string(),
            state,
        });
    }
}

/// Extract the upload key from an encoded file path.
///
/// The key is the file name (after the last `/`) up to its first `_`, e.g.
/// `/videos/abc123_1699999999.mp4` -> `abc123`.
pub fn upload_key_from_file_path(file_path: &str) -> Result<&str> {
    let (_, file_name) = file_path
        .rsplit_once('/')
        .ok_or_else(|| AppError::Parse(format!("file path has no '/': {}", file_path)))?;

    let (key, _) = file_name.split_once('_').ok_or_else(|| {
        AppError::Parse(format!("file name has no '_' separator: {}", file_path))
    })?;

    if key.is_empty() {
        warn!(%file_path, "Encoding callback file name starts with '_'");
        return Err(AppError::Parse(format!(
            "empty upload key in file path: {}",
            file_path
        )));
    }
    Ok(key)
}

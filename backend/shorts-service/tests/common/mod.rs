//! In-memory fakes for the shorts-service ports.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use shorts_service::config::{StorageConfig, UrlTemplate};
use shorts_service::db::{PostRepository, ShortsRepository};
use shorts_service::models::{EncodeStateNotice, NewShorts, Post, Shorts, ShortsState};
use shorts_service::services::{NotificationSink, PostService, ShortsService};
use shorts_service::{AppError, Result};

pub const SHORTS_HEAD: &str = "https://cdn.test/shorts/";
pub const SHORTS_TAIL: &str = "/master.m3u8";
pub const THUMB_HEAD: &str = "https://cdn.test/thumbnails/";
pub const THUMB_TAIL: &str = "_01.jpg";

pub fn storage_config() -> StorageConfig {
    StorageConfig {
        shorts: UrlTemplate::new(SHORTS_HEAD, SHORTS_TAIL),
        thumbnail: UrlTemplate::new(THUMB_HEAD, THUMB_TAIL),
    }
}

/// Registry backed by a map, enforcing the same unique-key rule as the table.
#[derive(Default)]
pub struct InMemoryShortsRepository {
    rows: Mutex<HashMap<String, Shorts>>,
    /// Row another trigger inserts right after our next lookup misses.
    racing_insert: Mutex<Option<NewShorts>>,
}

impl InMemoryShortsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a concurrent trigger winning the insert for `upload_key`
    /// between this caller's lookup and its insert.
    pub fn race_insert(&self, upload_key: &str, state: ShortsState) {
        *self.racing_insert.lock().unwrap() = Some(NewShorts {
            upload_key: upload_key.to_string(),
            shorts_url: format!("{SHORTS_HEAD}{upload_key}{SHORTS_TAIL}"),
            thumbnail_url: format!("{THUMB_HEAD}{upload_key}{THUMB_TAIL}"),
            state,
        });
    }

    pub fn seed(&self, shorts: &NewShorts) -> Shorts {
        let row = to_row(shorts);
        self.rows
            .lock()
            .unwrap()
            .insert(row.upload_key.clone(), row.clone());
        row
    }

    pub fn count(&self, upload_key: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.upload_key == upload_key)
            .count()
    }

    pub fn get(&self, upload_key: &str) -> Option<Shorts> {
        self.rows.lock().unwrap().get(upload_key).cloned()
    }
}

fn to_row(shorts: &NewShorts) -> Shorts {
    let now = Utc::now();
    Shorts {
        id: Uuid::new_v4(),
        upload_key: shorts.upload_key.clone(),
        shorts_url: shorts.shorts_url.clone(),
        thumbnail_url: shorts.thumbnail_url.clone(),
        state: shorts.state,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ShortsRepository for InMemoryShortsRepository {
    // Every method yields first so that joined triggers interleave the way
    // concurrent requests do against the real table.
    async fn find_by_upload_key(&self, upload_key: &str) -> Result<Option<Shorts>> {
        tokio::task::yield_now().await;
        let found = self.rows.lock().unwrap().get(upload_key).cloned();
        if found.is_none() {
            let pending = self.racing_insert.lock().unwrap().take();
            if let Some(pending) = pending {
                self.seed(&pending);
            }
        }
        Ok(found)
    }

    async fn save(&self, shorts: &NewShorts) -> Result<Shorts> {
        tokio::task::yield_now().await;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&shorts.upload_key) {
            return Err(AppError::Conflict(format!(
                "shorts with upload key {} already exists",
                shorts.upload_key
            )));
        }
        let row = to_row(shorts);
        rows.insert(row.upload_key.clone(), row.clone());
        Ok(row)
    }

    async fn update_state(&self, upload_key: &str, state: ShortsState) -> Result<()> {
        tokio::task::yield_now().await;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(upload_key)
            .ok_or_else(|| AppError::NotFound(format!("shorts with upload key {}", upload_key)))?;
        row.state = state;
        row.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    rows: Mutex<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn all(&self) -> Vec<Post> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, post: &Post) -> Result<Post> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(shorts_id) = post.shorts_id {
            if rows.values().any(|p| p.shorts_id == Some(shorts_id)) {
                return Err(AppError::Conflict(format!(
                    "shorts {} is already linked to a post",
                    shorts_id
                )));
            }
        }
        rows.insert(post.id, post.clone());
        Ok(post.clone())
    }

    async fn get(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.rows.lock().unwrap().get(&post_id).cloned())
    }

    async fn find_by_shorts_id(&self, shorts_id: Uuid) -> Result<Option<Post>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|p| p.shorts_id == Some(shorts_id))
            .cloned())
    }
}

/// Sink that keeps every enqueued notice for assertions.
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<EncodeStateNotice>>,
}

impl RecordingSink {
    pub fn notices(&self) -> Vec<EncodeStateNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn enqueue(&self, notice: EncodeStateNotice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub struct TestHarness {
    pub shorts_repo: Arc<InMemoryShortsRepository>,
    pub post_repo: Arc<InMemoryPostRepository>,
    pub sink: Arc<RecordingSink>,
    pub shorts: Arc<ShortsService>,
    pub posts: Arc<PostService>,
}

impl TestHarness {
    pub fn new() -> Self {
        let shorts_repo = Arc::new(InMemoryShortsRepository::new());
        let post_repo = Arc::new(InMemoryPostRepository::default());
        let sink = Arc::new(RecordingSink::default());
        let shorts = Arc::new(ShortsService::new(
            shorts_repo.clone(),
            sink.clone(),
            storage_config(),
        ));
        let posts = Arc::new(PostService::new(post_repo.clone(), shorts.clone()));
        Self {
            shorts_repo,
            post_repo,
            sink,
            shorts,
            posts,
        }
    }
}

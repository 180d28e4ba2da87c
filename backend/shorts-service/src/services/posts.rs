/// Post service - creates posts and hands any upload key to the shorts workflow
use std::sync::Arc;

use uuid::Uuid;

use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::models::{CreatePostRequest, Post, PostCategory};
use crate::services::shorts::ShortsService;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    shorts: Arc<ShortsService>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, shorts: Arc<ShortsService>) -> Self {
        Self { posts, shorts }
    }

    /// Create a post, linking the Shorts for `upload_key` when one is given.
    pub async fn create_post(&self, user_id: Uuid, req: CreatePostRequest) -> Result<Post> {
        let category: PostCategory = req.category.parse()?;

        let upload_key = match req.upload_key.as_deref().map(str::trim) {
            Some("") => {
                return Err(AppError::ValidationError(
                    "upload_key must not be blank".to_string(),
                ))
            }
            other => other,
        };

        let hashtags = req
            .hashtags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        let mut post = Post::new(user_id, category, hashtags);
        if let Some(upload_key) = upload_key {
            self.ensure_shorts_unclaimed(upload_key).await?;
            post = self.shorts.connect_shorts(post, upload_key).await?;
        }

        let post = self.posts.insert(&post).await?;
        tracing::info!(post_id = %post.id, %user_id, shorts_id = ?post.shorts_id, "Post created");
        Ok(post)
    }

    /// Reject before `connect_shorts` writes any state: a post that cannot be
    /// inserted must leave the Shorts row untouched.
    async fn ensure_shorts_unclaimed(&self, upload_key: &str) -> Result<()> {
        let Some(shorts) = self.shorts.find_by_upload_key(upload_key).await? else {
            return Ok(());
        };
        if let Some(owner) = self.posts.find_by_shorts_id(shorts.id).await? {
            tracing::warn!(%upload_key, owner_post_id = %owner.id, "Shorts already linked to a post");
            return Err(AppError::Conflict(format!(
                "shorts {} is already linked to post {}",
                upload_key, owner.id
            )));
        }
        Ok(())
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        self.posts.get(post_id).await
    }
}

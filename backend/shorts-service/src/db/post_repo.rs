/// Post repository - database operations for posts
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Post;

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a post built in memory, including its Shorts link.
    async fn insert(&self, post: &Post) -> Result<Post>;

    async fn get(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// The post that owns `shorts_id`, if any.
    async fn find_by_shorts_id(&self, shorts_id: Uuid) -> Result<Option<Post>>;
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn insert(&self, post: &Post) -> Result<Post> {
        // posts.shorts_id is UNIQUE, so linking a Shorts that another post
        // already owns surfaces as a Conflict.
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, user_id, category, hashtags, shorts_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, category, hashtags, shorts_id, created_at, updated_at
            "#,
        )
        .bind(post.id)
        .bind(post.user_id)
        .bind(post.category)
        .bind(&post.hashtags)
        .bind(post.shorts_id)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn get(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, category, hashtags, shorts_id, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_by_shorts_id(&self, shorts_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, category, hashtags, shorts_id, created_at, updated_at
            FROM posts
            WHERE shorts_id = $1
            "#,
        )
        .bind(shorts_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }
}

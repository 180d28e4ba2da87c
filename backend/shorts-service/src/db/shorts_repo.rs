/// Shorts repository - database operations for shorts
use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::{NewShorts, Shorts, ShortsState};

/// Storage port for the Shorts registry.
///
/// `upload_key` is unique; implementations must never hold two rows for it.
#[async_trait]
pub trait ShortsRepository: Send + Sync {
    /// Exact-match lookup by upload key.
    async fn find_by_upload_key(&self, upload_key: &str) -> Result<Option<Shorts>>;

    /// Insert a new row.
    ///
    /// # Errors
    ///
    /// `AppError::Conflict` if a row with the same upload key already exists.
    async fn save(&self, shorts: &NewShorts) -> Result<Shorts>;

    /// Set the state of the row matching `upload_key` in a single statement.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` if no row matches. No row is created.
    async fn update_state(&self, upload_key: &str, state: ShortsState) -> Result<()>;
}

/// PostgreSQL-backed registry
#[derive(Clone)]
pub struct PgShortsRepository {
    pool: PgPool,
}

impl PgShortsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShortsRepository for PgShortsRepository {
    async fn find_by_upload_key(&self, upload_key: &str) -> Result<Option<Shorts>> {
        let shorts = sqlx::query_as::<_, Shorts>(
            r#"
            SELECT id, upload_key, shorts_url, thumbnail_url, state, created_at, updated_at
            FROM shorts
            WHERE upload_key = $1
            "#,
        )
        .bind(upload_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shorts)
    }

    async fn save(&self, shorts: &NewShorts) -> Result<Shorts> {
        // ON CONFLICT keeps the losing writer from aborting with a 23505; it
        // gets no row back instead.
        let inserted = sqlx::query_as::<_, Shorts>(
            r#"
            INSERT INTO shorts (upload_key, shorts_url, thumbnail_url, state)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (upload_key) DO NOTHING
            RETURNING id, upload_key, shorts_url, thumbnail_url, state, created_at, updated_at
            "#,
        )
        .bind(&shorts.upload_key)
        .bind(&shorts.shorts_url)
        .bind(&shorts.thumbnail_url)
        .bind(shorts.state)
        .fetch_optional(&self.pool)
        .await?;

        inserted.ok_or_else(|| {
            AppError::Conflict(format!(
                "shorts with upload key {} already exists",
                shorts.upload_key
            ))
        })
    }

    async fn update_state(&self, upload_key: &str, state: ShortsState) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE shorts
            SET state = $1, updated_at = NOW()
            WHERE upload_key = $2
            "#,
        )
        .bind(state)
        .bind(upload_key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "shorts with upload key {}",
                upload_key
            )));
        }
        Ok(())
    }
}

/// Database access layer
///
/// This module provides:
/// - The `StoryRepository` seam the HTTP layer is built against
/// - A PostgreSQL implementation and an in-memory one
/// - Connection pool creation and migrations
pub mod memory;
pub mod story_repo;

pub use memory::InMemoryStoryRepository;
pub use story_repo::PgStoryRepository;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{Comment, Story, StoryChanges, StoryDetail, StoryWithAuthor};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Storage operations for the story collection.
///
/// Lookups return `None` for an absent document instead of failing, and
/// listings are ordered newest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StoryRepository: Send + Sync {
    /// Public stories of every user, with owners resolved.
    async fn list_public(&self) -> Result<Vec<StoryWithAuthor>>;

    /// Stories owned by `user_id`; only public ones when `public_only`.
    async fn list_by_user(&self, user_id: Uuid, public_only: bool)
        -> Result<Vec<StoryWithAuthor>>;

    async fn find(&self, story_id: Uuid) -> Result<Option<Story>>;

    /// Story with owner and comment authors resolved.
    async fn find_detail(&self, story_id: Uuid) -> Result<Option<StoryDetail>>;

    async fn insert(&self, story: Story) -> Result<Story>;

    /// Overwrite the editable fields. `None` when the story does not exist.
    async fn update(&self, story_id: Uuid, changes: StoryChanges) -> Result<Option<Story>>;

    /// Returns whether a story was removed.
    async fn delete(&self, story_id: Uuid) -> Result<bool>;

    /// Put `comment` in front of the story's comments. `None` when the
    /// story does not exist.
    async fn prepend_comment(&self, comment: Comment) -> Result<Option<Comment>>;

    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> Result<()>;
}

/// Create a PostgreSQL connection pool and verify it answers queries.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    debug!(
        "Creating database pool: max={}, min={}, acquire_timeout={}s, connect_timeout={}s",
        config.max_connections,
        config.min_connections,
        config.acquire_timeout_secs,
        config.connect_timeout_secs
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    match tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(result) => {
            result?;
        }
        Err(_) => {
            return Err(crate::error::AppError::Internal(format!(
                "database did not answer within {}s",
                config.connect_timeout_secs
            )))
        }
    }

    info!("Database pool ready");
    Ok(pool)
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| crate::error::AppError::Internal(format!("migration failed: {e}")))?;
    Ok(())
}

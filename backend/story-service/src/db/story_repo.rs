use super::StoryRepository;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentWithAuthor, Story, StoryChanges, StoryDetail, StoryStatus, StoryWithAuthor,
    UserSummary,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

const STORY_COLUMNS: &str = r#"
    s.id, s.user_id, s.title, s.body, s.status, s.allow_comments, s.created_at,
    u.display_name AS author_name, u.image AS author_image
"#;

const FOREIGN_KEY_VIOLATION: &str = "23503";

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    )
}

/// `StoryRepository` backed by the `stories` and `story_comments` tables.
#[derive(Clone)]
pub struct PgStoryRepository {
    pool: PgPool,
}

impl PgStoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_story(row: &PgRow) -> Result<Story> {
        let status: String = row.try_get("status")?;
        Ok(Story {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            status: StoryStatus::try_from(status.as_str())
                .map_err(|_| AppError::Internal(format!("stored status `{status}` is invalid")))?,
            allow_comments: row.try_get("allow_comments")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_author(row: &PgRow, user_id: Uuid) -> Result<UserSummary> {
        let name: Option<String> = row.try_get("author_name")?;
        Ok(match name {
            Some(display_name) => UserSummary {
                id: user_id,
                display_name,
                image: row.try_get("author_image")?,
            },
            None => UserSummary::unknown(user_id),
        })
    }

    fn row_to_listing(row: &PgRow) -> Result<StoryWithAuthor> {
        let story = Self::row_to_story(row)?;
        let user = Self::row_to_author(row, story.user_id)?;
        Ok(StoryWithAuthor { story, user })
    }

    fn row_to_comment(row: &PgRow) -> Result<Comment> {
        Ok(Comment {
            id: row.try_get("id")?,
            story_id: row.try_get("story_id")?,
            user_id: row.try_get("user_id")?,
            body: row.try_get("body")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl StoryRepository for PgStoryRepository {
    async fn list_public(&self) -> Result<Vec<StoryWithAuthor>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {STORY_COLUMNS}
            FROM stories s
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.status = 'public'
            ORDER BY s.created_at DESC, s.id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_listing).collect()
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        public_only: bool,
    ) -> Result<Vec<StoryWithAuthor>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {STORY_COLUMNS}
            FROM stories s
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.user_id = $1 AND ($2 = FALSE OR s.status = 'public')
            ORDER BY s.created_at DESC, s.id DESC
            "#
        ))
        .bind(user_id)
        .bind(public_only)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_listing).collect()
    }

    async fn find(&self, story_id: Uuid) -> Result<Option<Story>> {
        let row = sqlx::query(
            r#"
            SELECT s.id, s.user_id, s.title, s.body, s.status, s.allow_comments, s.created_at
            FROM stories s
            WHERE s.id = $1
            "#,
        )
        .bind(story_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_story).transpose()
    }

    async fn find_detail(&self, story_id: Uuid) -> Result<Option<StoryDetail>> {
        let row_opt = sqlx::query(&format!(
            r#"
            SELECT {STORY_COLUMNS}
            FROM stories s
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
            "#
        ))
        .bind(story_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row_opt {
            Some(r) => r,
            None => return Ok(None),
        };
        let StoryWithAuthor { story, user } = Self::row_to_listing(&row)?;

        let comment_rows = sqlx::query(
            r#"
            SELECT c.id, c.story_id, c.user_id, c.body, c.created_at,
                   u.display_name AS author_name, u.image AS author_image
            FROM story_comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.story_id = $1
            ORDER BY c.seq DESC
            "#,
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await?;

        let comments = comment_rows
            .iter()
            .map(|row| {
                let comment = Self::row_to_comment(row)?;
                let user = Self::row_to_author(row, comment.user_id)?;
                Ok(CommentWithAuthor { comment, user })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(StoryDetail {
            story,
            user,
            comments,
        }))
    }

    async fn insert(&self, story: Story) -> Result<Story> {
        let row = sqlx::query(
            r#"
            INSERT INTO stories (id, user_id, title, body, status, allow_comments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, title, body, status, allow_comments, created_at
            "#,
        )
        .bind(story.id)
        .bind(story.user_id)
        .bind(&story.title)
        .bind(&story.body)
        .bind(story.status.as_str())
        .bind(story.allow_comments)
        .bind(story.created_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_story(&row)
    }

    async fn update(&self, story_id: Uuid, changes: StoryChanges) -> Result<Option<Story>> {
        let row = sqlx::query(
            r#"
            UPDATE stories
            SET title = $2, body = $3, status = $4, allow_comments = $5
            WHERE id = $1
            RETURNING id, user_id, title, body, status, allow_comments, created_at
            "#,
        )
        .bind(story_id)
        .bind(&changes.title)
        .bind(&changes.body)
        .bind(changes.status.as_str())
        .bind(changes.allow_comments)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_story).transpose()
    }

    async fn delete(&self, story_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(story_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn prepend_comment(&self, comment: Comment) -> Result<Option<Comment>> {
        // `seq` grows with every insert, so ordering by it descending puts
        // the newest comment first. A missing story surfaces as a foreign key
        // violation, which also covers a delete racing this insert.
        let inserted = sqlx::query(
            r#"
            INSERT INTO story_comments (id, story_id, user_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, story_id, user_id, body, created_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.story_id)
        .bind(comment.user_id)
        .bind(&comment.body)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Self::row_to_comment(&row).map(Some),
            Err(e) if is_foreign_key_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

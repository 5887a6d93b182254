use crate::db::StoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{check_story_deletion, check_story_update};
use crate::models::{
    Comment, CommentForm, Story, StoryChanges, StoryDetail, StoryForm, StoryWithAuthor,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a show-page lookup.
#[derive(Debug)]
pub enum StoryAccess {
    Visible(StoryDetail),
    /// The story exists but the viewer may not read it.
    Hidden,
}

pub struct StoriesService {
    repo: Arc<dyn StoryRepository>,
}

impl StoriesService {
    pub fn new(repo: Arc<dyn StoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_public(&self) -> Result<Vec<StoryWithAuthor>> {
        self.repo.list_public().await
    }

    pub async fn list_user_public(&self, owner_id: Uuid) -> Result<Vec<StoryWithAuthor>> {
        self.repo.list_by_user(owner_id, true).await
    }

    /// Every story of `user_id`, private ones included.
    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<StoryWithAuthor>> {
        self.repo.list_by_user(user_id, false).await
    }

    pub async fn show(&self, story_id: Uuid, viewer: Option<Uuid>) -> Result<StoryAccess> {
        let detail = self
            .repo
            .find_detail(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("story {story_id}")))?;

        if detail.story.is_visible_to(viewer) {
            Ok(StoryAccess::Visible(detail))
        } else {
            Ok(StoryAccess::Hidden)
        }
    }

    /// The story when `user_id` owns it, `None` when someone else does.
    pub async fn editable(&self, story_id: Uuid, user_id: Uuid) -> Result<Option<Story>> {
        let story = self.find_existing(story_id).await?;
        Ok(story.is_owned_by(user_id).then_some(story))
    }

    pub async fn create(&self, owner_id: Uuid, form: StoryForm) -> Result<Story> {
        let changes = StoryChanges::try_from(form)?;
        let story = Story {
            id: Uuid::new_v4(),
            user_id: owner_id,
            title: changes.title,
            body: changes.body,
            status: changes.status,
            allow_comments: changes.allow_comments,
            created_at: Utc::now(),
        };

        let story = self.repo.insert(story).await?;
        tracing::info!(story_id = %story.id, user_id = %owner_id, status = story.status.as_str(), "story created");
        Ok(story)
    }

    pub async fn update(&self, story_id: Uuid, user_id: Uuid, form: StoryForm) -> Result<Story> {
        let story = self.find_existing(story_id).await?;
        if let Err(e) = check_story_update(user_id, &story) {
            tracing::warn!(story_id = %story_id, user_id = %user_id, "update refused: not the owner");
            return Err(e);
        }
        let changes = StoryChanges::try_from(form)?;

        // The story can disappear between the check and the write.
        let updated = self
            .repo
            .update(story_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("story {story_id}")))?;

        tracing::info!(story_id = %story_id, user_id = %user_id, "story updated");
        Ok(updated)
    }

    /// Delete a story. Deleting one that no longer exists succeeds.
    pub async fn delete(&self, story_id: Uuid, user_id: Uuid) -> Result<bool> {
        let story = match self.repo.find(story_id).await? {
            Some(story) => story,
            None => {
                tracing::debug!(story_id = %story_id, "delete of absent story");
                return Ok(false);
            }
        };
        if let Err(e) = check_story_deletion(user_id, &story) {
            tracing::warn!(story_id = %story_id, user_id = %user_id, "delete refused: not the owner");
            return Err(e);
        }

        let deleted = self.repo.delete(story_id).await?;
        tracing::info!(story_id = %story_id, user_id = %user_id, "story deleted");
        Ok(deleted)
    }

    pub async fn add_comment(
        &self,
        story_id: Uuid,
        user_id: Uuid,
        form: CommentForm,
    ) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            story_id,
            user_id,
            body: form.comment_body.unwrap_or_default(),
            created_at: Utc::now(),
        };

        let comment = self
            .repo
            .prepend_comment(comment)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("story {story_id}")))?;

        tracing::info!(story_id = %story_id, user_id = %user_id, comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    async fn find_existing(&self, story_id: Uuid) -> Result<Story> {
        self.repo
            .find(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("story {story_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStoryRepository, MockStoryRepository};
    use crate::models::StoryStatus;

    fn service() -> StoriesService {
        StoriesService::new(Arc::new(InMemoryStoryRepository::new()))
    }

    fn form(title: &str, status: &str) -> StoryForm {
        StoryForm {
            title: Some(title.into()),
            body: Some("body".into()),
            status: Some(status.into()),
            allow_comments: Some("on".into()),
        }
    }

    #[tokio::test]
    async fn private_story_is_hidden_from_others() {
        let svc = service();
        let owner = Uuid::new_v4();
        let story = svc.create(owner, form("secret", "private")).await.unwrap();

        assert!(matches!(
            svc.show(story.id, None).await.unwrap(),
            StoryAccess::Hidden
        ));
        assert!(matches!(
            svc.show(story.id, Some(Uuid::new_v4())).await.unwrap(),
            StoryAccess::Hidden
        ));
        assert!(matches!(
            svc.show(story.id, Some(owner)).await.unwrap(),
            StoryAccess::Visible(_)
        ));
    }

    #[tokio::test]
    async fn show_of_missing_story_is_not_found() {
        let result = service().show(Uuid::new_v4(), None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn only_owner_may_update() {
        let svc = service();
        let owner = Uuid::new_v4();
        let story = svc.create(owner, form("v1", "public")).await.unwrap();

        let refused = svc.update(story.id, Uuid::new_v4(), form("hijack", "public")).await;
        assert!(matches!(refused, Err(AppError::Forbidden(_))));

        let updated = svc
            .update(story.id, owner, form("v2", "private"))
            .await
            .unwrap();
        assert_eq!(updated.title, "v2");
        assert_eq!(updated.status, StoryStatus::Private);
        assert_eq!(updated.user_id, owner);
    }

    #[tokio::test]
    async fn update_without_allow_comments_clears_it() {
        let svc = service();
        let owner = Uuid::new_v4();
        let story = svc.create(owner, form("t", "public")).await.unwrap();
        assert!(story.allow_comments);

        let updated = svc
            .update(
                story.id,
                owner,
                StoryForm {
                    allow_comments: None,
                    ..form("t", "public")
                },
            )
            .await
            .unwrap();
        assert!(!updated.allow_comments);
    }

    #[tokio::test]
    async fn only_owner_may_delete_and_delete_is_idempotent() {
        let svc = service();
        let owner = Uuid::new_v4();
        let story = svc.create(owner, form("t", "public")).await.unwrap();

        let refused = svc.delete(story.id, Uuid::new_v4()).await;
        assert!(matches!(refused, Err(AppError::Forbidden(_))));

        assert!(svc.delete(story.id, owner).await.unwrap());
        assert!(!svc.delete(story.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn editable_is_none_for_non_owner() {
        let svc = service();
        let owner = Uuid::new_v4();
        let story = svc.create(owner, form("t", "public")).await.unwrap();

        assert!(svc.editable(story.id, Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(svc.editable(story.id, owner).await.unwrap().unwrap().id, story.id);
    }

    #[tokio::test]
    async fn comments_prepend() {
        let svc = service();
        let story = svc.create(Uuid::new_v4(), form("t", "public")).await.unwrap();
        for body in ["C1", "C2"] {
            svc.add_comment(
                story.id,
                Uuid::new_v4(),
                CommentForm {
                    comment_body: Some(body.into()),
                },
            )
            .await
            .unwrap();
        }

        let StoryAccess::Visible(detail) = svc.show(story.id, None).await.unwrap() else {
            panic!("public story should be visible");
        };
        let bodies: Vec<_> = detail.comments.iter().map(|c| c.comment.body.as_str()).collect();
        assert_eq!(bodies, ["C2", "C1"]);
    }

    #[tokio::test]
    async fn comment_on_missing_story_is_not_found() {
        let result = service()
            .add_comment(Uuid::new_v4(), Uuid::new_v4(), CommentForm::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let mut repo = MockStoryRepository::new();
        repo.expect_list_public()
            .returning(|| Err(AppError::Internal("connection reset".into())));

        let svc = StoriesService::new(Arc::new(repo));
        assert!(matches!(
            svc.list_public().await,
            Err(AppError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn invalid_status_never_reaches_storage() {
        // No expectations: any repository call would panic.
        let repo = MockStoryRepository::new();
        let svc = StoriesService::new(Arc::new(repo));

        let result = svc.create(Uuid::new_v4(), form("t", "unlisted")).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn ownership_is_checked_before_the_form() {
        let svc = service();
        let owner = Uuid::new_v4();
        let story = svc.create(owner, form("t", "public")).await.unwrap();

        let stranger = svc.update(story.id, Uuid::new_v4(), form("t", "unlisted")).await;
        assert!(matches!(stranger, Err(AppError::Forbidden(_))));

        let own = svc.update(story.id, owner, form("t", "unlisted")).await;
        assert!(matches!(own, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn update_of_missing_story_is_not_found() {
        let result = service()
            .update(Uuid::new_v4(), Uuid::new_v4(), form("t", "public"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

//! In-process `StoryRepository`.
//!
//! Used when the service runs with `STORY_STORE=memory` and by the test
//! suites. Comments live inside their story, newest at index 0.

use super::StoryRepository;
use crate::error::Result;
use crate::models::{
    Comment, CommentWithAuthor, Story, StoryChanges, StoryDetail, StoryStatus, StoryWithAuthor,
    UserSummary,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredStory {
    story: Story,
    comments: Vec<Comment>,
}

#[derive(Default)]
struct Inner {
    stories: HashMap<Uuid, StoredStory>,
    users: HashMap<Uuid, UserSummary>,
}

#[derive(Default)]
pub struct InMemoryStoryRepository {
    inner: RwLock<Inner>,
}

impl InMemoryStoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a profile used to resolve user references.
    pub async fn upsert_user(&self, user: UserSummary) {
        self.inner.write().await.users.insert(user.id, user);
    }
}

impl Inner {
    fn resolve(&self, user_id: Uuid) -> UserSummary {
        self.users
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserSummary::unknown(user_id))
    }

    fn listing<'a>(&self, stories: impl Iterator<Item = &'a Story>) -> Vec<StoryWithAuthor> {
        let mut rows: Vec<StoryWithAuthor> = stories
            .map(|story| StoryWithAuthor {
                story: story.clone(),
                user: self.resolve(story.user_id),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.story
                .created_at
                .cmp(&a.story.created_at)
                .then_with(|| b.story.id.cmp(&a.story.id))
        });
        rows
    }
}

#[async_trait::async_trait]
impl StoryRepository for InMemoryStoryRepository {
    async fn list_public(&self) -> Result<Vec<StoryWithAuthor>> {
        let inner = self.inner.read().await;
        Ok(inner.listing(
            inner
                .stories
                .values()
                .map(|s| &s.story)
                .filter(|s| s.status == StoryStatus::Public),
        ))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        public_only: bool,
    ) -> Result<Vec<StoryWithAuthor>> {
        let inner = self.inner.read().await;
        Ok(inner.listing(
            inner
                .stories
                .values()
                .map(|s| &s.story)
                .filter(|s| s.user_id == user_id)
                .filter(|s| !public_only || s.status == StoryStatus::Public),
        ))
    }

    async fn find(&self, story_id: Uuid) -> Result<Option<Story>> {
        let inner = self.inner.read().await;
        Ok(inner.stories.get(&story_id).map(|s| s.story.clone()))
    }

    async fn find_detail(&self, story_id: Uuid) -> Result<Option<StoryDetail>> {
        let inner = self.inner.read().await;
        Ok(inner.stories.get(&story_id).map(|stored| StoryDetail {
            story: stored.story.clone(),
            user: inner.resolve(stored.story.user_id),
            comments: stored
                .comments
                .iter()
                .map(|comment| CommentWithAuthor {
                    comment: comment.clone(),
                    user: inner.resolve(comment.user_id),
                })
                .collect(),
        }))
    }

    async fn insert(&self, story: Story) -> Result<Story> {
        let mut inner = self.inner.write().await;
        inner.stories.insert(
            story.id,
            StoredStory {
                story: story.clone(),
                comments: Vec::new(),
            },
        );
        Ok(story)
    }

    async fn update(&self, story_id: Uuid, changes: StoryChanges) -> Result<Option<Story>> {
        let mut inner = self.inner.write().await;
        Ok(inner.stories.get_mut(&story_id).map(|stored| {
            let story = &mut stored.story;
            story.title = changes.title;
            story.body = changes.body;
            story.status = changes.status;
            story.allow_comments = changes.allow_comments;
            story.clone()
        }))
    }

    async fn delete(&self, story_id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.stories.remove(&story_id).is_some())
    }

    async fn prepend_comment(&self, comment: Comment) -> Result<Option<Comment>> {
        let mut inner = self.inner.write().await;
        Ok(inner.stories.get_mut(&comment.story_id).map(|stored| {
            stored.comments.insert(0, comment.clone());
            comment
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

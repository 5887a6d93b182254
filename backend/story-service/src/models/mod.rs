/// Data models for story-service
///
/// This module defines structures for:
/// - Story: a user-authored post with a visibility status
/// - Comment: a reply embedded in a story, newest first
/// - UserSummary: the resolved author of a story or comment
/// - StoryForm / CommentForm: form-encoded request bodies
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    #[default]
    Public,
    Private,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Public => "public",
            StoryStatus::Private => "private",
        }
    }
}

impl TryFrom<&str> for StoryStatus {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "public" => Ok(StoryStatus::Public),
            "private" => Ok(StoryStatus::Private),
            _ => Err(AppError::BadRequest(format!("invalid status `{s}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub status: StoryStatus,
    pub allow_comments: bool,
    pub created_at: DateTime<Utc>,
}

impl Story {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Public stories are readable by anyone, private ones only by the owner.
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        self.status == StoryStatus::Public || viewer.is_some_and(|v| self.is_owned_by(v))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub story_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A user reference resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub display_name: String,
    pub image: Option<String>,
}

impl UserSummary {
    /// Placeholder for a reference with no profile row.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            display_name: "Unknown".to_string(),
            image: None,
        }
    }
}

/// Listing row: a story with its owner resolved.
#[derive(Debug, Clone, Serialize)]
pub struct StoryWithAuthor {
    #[serde(flatten)]
    pub story: Story,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: UserSummary,
}

/// Show-page payload: story, owner, and comments with their authors.
#[derive(Debug, Clone, Serialize)]
pub struct StoryDetail {
    #[serde(flatten)]
    pub story: Story,
    pub user: UserSummary,
    pub comments: Vec<CommentWithAuthor>,
}

/// Values written by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryChanges {
    pub title: String,
    pub body: String,
    pub status: StoryStatus,
    pub allow_comments: bool,
}

/// Form body for the add and edit pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryForm {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "allowComments")]
    pub allow_comments: Option<String>,
}

impl TryFrom<StoryForm> for StoryChanges {
    type Error = AppError;

    fn try_from(form: StoryForm) -> std::result::Result<Self, Self::Error> {
        let status = match form.status.as_deref() {
            None | Some("") => StoryStatus::default(),
            Some(raw) => StoryStatus::try_from(raw)?,
        };

        Ok(StoryChanges {
            title: form.title.unwrap_or_default(),
            body: form.body.unwrap_or_default(),
            status,
            // A checkbox only submits its field when ticked.
            allow_comments: form.allow_comments.is_some_and(|v| !v.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(rename = "commentBody")]
    pub comment_body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(status: StoryStatus, owner: Uuid) -> Story {
        Story {
            id: Uuid::new_v4(),
            user_id: owner,
            title: "T".into(),
            body: "B".into(),
            status,
            allow_comments: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!(StoryStatus::try_from("public").unwrap(), StoryStatus::Public);
        assert_eq!(StoryStatus::try_from("private").unwrap(), StoryStatus::Private);
        assert!(StoryStatus::try_from("unlisted").is_err());
        assert_eq!(StoryStatus::Private.as_str(), "private");
    }

    #[test]
    fn allow_comments_follows_field_presence() {
        let absent = StoryChanges::try_from(StoryForm::default()).unwrap();
        assert!(!absent.allow_comments);

        let present = StoryChanges::try_from(StoryForm {
            allow_comments: Some("on".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(present.allow_comments);

        let empty = StoryChanges::try_from(StoryForm {
            allow_comments: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
        assert!(!empty.allow_comments);
    }

    #[test]
    fn missing_fields_are_coerced_not_rejected() {
        let changes = StoryChanges::try_from(StoryForm::default()).unwrap();
        assert_eq!(changes.title, "");
        assert_eq!(changes.body, "");
        assert_eq!(changes.status, StoryStatus::Public);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = StoryChanges::try_from(StoryForm {
            status: Some("friends".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn visibility_rules() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let public = story(StoryStatus::Public, owner);
        assert!(public.is_visible_to(None));
        assert!(public.is_visible_to(Some(stranger)));

        let private = story(StoryStatus::Private, owner);
        assert!(!private.is_visible_to(None));
        assert!(!private.is_visible_to(Some(stranger)));
        assert!(private.is_visible_to(Some(owner)));
    }

    #[test]
    fn listing_rows_serialize_flat() {
        let owner = Uuid::new_v4();
        let row = StoryWithAuthor {
            story: story(StoryStatus::Public, owner),
            user: UserSummary::unknown(owner),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["status"], "public");
        assert_eq!(json["user"]["display_name"], "Unknown");
    }
}

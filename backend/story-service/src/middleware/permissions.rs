/// Ownership checks for stories
///
/// Only the author of a story may edit or delete it.
use crate::error::{AppError, Result};
use crate::models::Story;
use uuid::Uuid;

/// Check if a user owns a story
pub fn check_story_ownership(user_id: Uuid, story: &Story) -> Result<()> {
    if story.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this story".to_string(),
        ))
    }
}

/// Verify user may update a story
pub fn check_story_update(user_id: Uuid, story: &Story) -> Result<()> {
    check_story_ownership(user_id, story)
}

/// Verify user may delete a story
pub fn check_story_deletion(user_id: Uuid, story: &Story) -> Result<()> {
    check_story_ownership(user_id, story)
}

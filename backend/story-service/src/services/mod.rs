/// Business logic layer for story-service
///
/// Visibility and ownership rules live here so that every storage backend
/// gets the same behaviour.
pub mod stories;

pub use stories::{StoriesService, StoryAccess};

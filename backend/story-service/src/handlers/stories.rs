/// Story handlers - HTTP endpoints mounted under `/stories`
use crate::db::StoryRepository;
use crate::error::Result;
use crate::middleware::UserId;
use crate::models::{CommentForm, StoryForm};
use crate::services::{StoriesService, StoryAccess};
use crate::templates::Templates;
use actix_web::{http::header, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

/// Listing target for refused show/edit pages.
pub const STORIES_PATH: &str = "/stories";
/// Landing page after an update or delete.
pub const DASHBOARD_PATH: &str = "/dashboard";

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn show_path(story_id: Uuid) -> String {
    format!("{STORIES_PATH}/show/{story_id}")
}

fn stories_service(repo: web::Data<dyn StoryRepository>) -> StoriesService {
    StoriesService::new(repo.into_inner())
}

/// List public stories, newest first
pub async fn list_stories(
    repo: web::Data<dyn StoryRepository>,
    templates: web::Data<Templates>,
    viewer: Option<UserId>,
) -> Result<HttpResponse> {
    let stories = stories_service(repo).list_public().await?;

    templates.render(
        "stories/index.html",
        &json!({ "stories": stories, "viewer": viewer.map(|v| v.0) }),
    )
}

/// Show a single story
pub async fn show_story(
    repo: web::Data<dyn StoryRepository>,
    templates: web::Data<Templates>,
    story_id: web::Path<Uuid>,
    viewer: Option<UserId>,
) -> Result<HttpResponse> {
    let viewer = viewer.map(|v| v.0);

    match stories_service(repo).show(*story_id, viewer).await? {
        StoryAccess::Visible(story) => templates.render(
            "stories/show.html",
            &json!({ "story": story, "viewer": viewer }),
        ),
        StoryAccess::Hidden => Ok(redirect(STORIES_PATH)),
    }
}

/// List a user's public stories
pub async fn list_user_stories(
    repo: web::Data<dyn StoryRepository>,
    templates: web::Data<Templates>,
    owner_id: web::Path<Uuid>,
    viewer: Option<UserId>,
) -> Result<HttpResponse> {
    let stories = stories_service(repo).list_user_public(*owner_id).await?;

    templates.render(
        "stories/index.html",
        &json!({ "stories": stories, "viewer": viewer.map(|v| v.0) }),
    )
}

/// List the current user's stories, private ones included
pub async fn list_my_stories(
    user_id: UserId,
    repo: web::Data<dyn StoryRepository>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse> {
    let stories = stories_service(repo).list_mine(user_id.0).await?;

    templates.render(
        "stories/index.html",
        &json!({ "stories": stories, "viewer": user_id.0 }),
    )
}

/// Show the add-story form
pub async fn add_story_form(
    user_id: UserId,
    templates: web::Data<Templates>,
) -> Result<HttpResponse> {
    templates.render("stories/add.html", &json!({ "viewer": user_id.0 }))
}

/// Show the edit form to the story's owner
pub async fn edit_story_form(
    user_id: UserId,
    repo: web::Data<dyn StoryRepository>,
    templates: web::Data<Templates>,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match stories_service(repo).editable(*story_id, user_id.0).await? {
        Some(story) => templates.render(
            "stories/edit.html",
            &json!({ "story": story, "viewer": user_id.0 }),
        ),
        None => Ok(redirect(STORIES_PATH)),
    }
}

/// Create a story owned by the current user
pub async fn create_story(
    user_id: UserId,
    repo: web::Data<dyn StoryRepository>,
    form: web::Form<StoryForm>,
) -> Result<HttpResponse> {
    let story = stories_service(repo)
        .create(user_id.0, form.into_inner())
        .await?;

    Ok(redirect(&show_path(story.id)))
}

/// Update a story's editable fields
pub async fn update_story(
    user_id: UserId,
    repo: web::Data<dyn StoryRepository>,
    story_id: web::Path<Uuid>,
    form: web::Form<StoryForm>,
) -> Result<HttpResponse> {
    stories_service(repo)
        .update(*story_id, user_id.0, form.into_inner())
        .await?;

    Ok(redirect(DASHBOARD_PATH))
}

/// Delete a story
pub async fn delete_story(
    user_id: UserId,
    repo: web::Data<dyn StoryRepository>,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    stories_service(repo).delete(*story_id, user_id.0).await?;

    Ok(redirect(DASHBOARD_PATH))
}

/// Add a comment in front of the story's comments
pub async fn add_comment(
    user_id: UserId,
    repo: web::Data<dyn StoryRepository>,
    story_id: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    stories_service(repo)
        .add_comment(*story_id, user_id.0, form.into_inner())
        .await?;

    Ok(redirect(&show_path(*story_id)))
}

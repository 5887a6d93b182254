/// HTTP handlers for story-service
///
/// This module contains handlers for:
/// - Stories: list, show, create, edit, delete, and comment (`/stories/*`)
/// - Dashboard: the signed-in user's stories
/// - Health: storage reachability
pub mod stories;

pub use stories::{
    add_comment, add_story_form, create_story, delete_story, edit_story_form, list_my_stories,
    list_stories, list_user_stories, show_story, update_story,
};

use crate::db::StoryRepository;
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::StoriesService;
use crate::templates::Templates;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Send visitors of `/` to the public listing
pub async fn home() -> HttpResponse {
    stories::redirect(stories::STORIES_PATH)
}

/// The signed-in user's stories with edit and delete controls
pub async fn dashboard(
    user_id: UserId,
    repo: web::Data<dyn StoryRepository>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse> {
    let stories = StoriesService::new(repo.into_inner())
        .list_mine(user_id.0)
        .await?;

    templates.render(
        "dashboard.html",
        &json!({ "stories": stories, "viewer": user_id.0 }),
    )
}

pub async fn health_summary(repo: web::Data<dyn StoryRepository>) -> HttpResponse {
    match repo.ping().await {
        Ok(_) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "service": "story-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "unhealthy",
            "error": format!("storage unreachable: {}", e),
            "service": "story-service"
        })),
    }
}

/// Register every route of the service.
///
/// `/{story_id}` goes last so it never shadows the fixed segments.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/dashboard", web::get().to(dashboard))
        .route("/api/v1/health", web::get().to(health_summary))
        .service(
            web::scope("/stories")
                .service(
                    web::resource(["", "/"])
                        .route(web::get().to(list_stories))
                        .route(web::post().to(create_story)),
                )
                .route("/show/{story_id}", web::get().to(show_story))
                .route("/user/{user_id}", web::get().to(list_user_stories))
                .route("/my", web::get().to(list_my_stories))
                .route("/add", web::get().to(add_story_form))
                .route("/edit/{story_id}", web::get().to(edit_story_form))
                .route("/comment/{story_id}", web::post().to(add_comment))
                .service(
                    web::resource("/{story_id}")
                        .route(web::put().to(update_story))
                        .route(web::delete().to(delete_story)),
                ),
        );
}

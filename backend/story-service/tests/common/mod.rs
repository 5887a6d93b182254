//! Shared fixtures for the HTTP tests.
//!
//! Builds the full application against an `InMemoryStoryRepository` and
//! mints session tokens with the same secret the app verifies.

#![allow(dead_code)]

use actix_web::http::header;
use actix_web::test::TestRequest;
use std::sync::Arc;
use story_service::db::InMemoryStoryRepository;
use story_service::middleware::JwtKeys;
use uuid::Uuid;

pub const TEST_SECRET: &[u8] = b"story-service-test-secret";
pub const SESSION_COOKIE: &str = "session";

/// Build and initialise the app for `$repo` (an `Arc<InMemoryStoryRepository>`).
macro_rules! story_app {
    ($repo:expr) => {{
        let repo: std::sync::Arc<dyn story_service::db::StoryRepository> = $repo.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(repo))
                .app_data(actix_web::web::Data::new(
                    story_service::templates::Templates::new().expect("templates load"),
                ))
                .wrap(story_service::middleware::SessionIdentity::new(
                    std::sync::Arc::new(story_service::middleware::JwtKeys::from_secret(
                        $crate::common::TEST_SECRET,
                    )),
                    $crate::common::SESSION_COOKIE,
                ))
                .wrap(story_service::middleware::MethodOverride)
                .configure(story_service::handlers::configure),
        )
        .await
    }};
}

pub fn repo() -> Arc<InMemoryStoryRepository> {
    Arc::new(InMemoryStoryRepository::new())
}

pub fn token_for(user_id: Uuid) -> String {
    JwtKeys::from_secret(TEST_SECRET)
        .issue(user_id, 3600)
        .expect("token")
}

/// Attach a session cookie for `user_id`.
pub fn as_user(req: TestRequest, user_id: Uuid) -> TestRequest {
    req.cookie(actix_web::cookie::Cookie::new(
        SESSION_COOKIE,
        token_for(user_id),
    ))
}

/// Attach a Bearer token for `user_id`.
pub fn as_bearer(req: TestRequest, user_id: Uuid) -> TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(user_id))))
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Id at the end of a `/stories/show/{id}` redirect.
pub fn story_id_from_location(location: &str) -> Uuid {
    let raw = location
        .strip_prefix("/stories/show/")
        .expect("redirect to show page");
    Uuid::parse_str(raw).expect("uuid in redirect")
}

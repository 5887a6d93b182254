/// HTTP middleware utilities for story-service
///
/// Provides session identity (with the `UserId` guard extractor), HTML form
/// method override, and story ownership checks.
pub mod auth;
pub mod method_override;
pub mod permissions;

pub use auth::{JwtKeys, SessionIdentity, UserId, LOGIN_REDIRECT};
pub use method_override::MethodOverride;
pub use permissions::*;

/// Story Service Library
///
/// Server-rendered story publishing: public and private stories, comments,
/// and session-gated editing.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Stories, comments, resolved users, form bodies
/// - `services`: Visibility and ownership rules
/// - `db`: Storage seam with PostgreSQL and in-memory implementations
/// - `middleware`: Session identity, method override, ownership checks
/// - `templates`: Tera view renderer
/// - `helpers`: Text helpers exposed as template filters
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod templates;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use story_service::config::{Config, StoreBackend};
use story_service::db::{self, InMemoryStoryRepository, PgStoryRepository, StoryRepository};
use story_service::handlers;
use story_service::middleware::{JwtKeys, MethodOverride, SessionIdentity};
use story_service::templates::Templates;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn StoryRepository>> {
    match config.store {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            db::run_migrations(&pool)
                .await
                .context("failed to apply migrations")?;
            Ok(Arc::new(PgStoryRepository::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory story store; data is lost on restart");
            Ok(Arc::new(InMemoryStoryRepository::new()))
        }
    }
}

/// Story Service
///
/// Serves the story pages under `/stories`, the dashboard, and a health
/// endpoint at `/api/v1/health`.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            anyhow::bail!("failed to load configuration: {e}");
        }
    };

    tracing::info!("Starting story-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let repo = open_store(&config).await?;
    let repo_data: web::Data<dyn StoryRepository> = web::Data::from(repo);
    let templates = web::Data::new(Templates::new().context("failed to load templates")?);
    let jwt_keys = Arc::new(JwtKeys::from_secret(config.auth.jwt_secret.as_bytes()));
    let session_cookie = config.auth.session_cookie.clone();

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Binding to {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(repo_data.clone())
            .app_data(templates.clone())
            .wrap(SessionIdentity::new(jwt_keys.clone(), &session_cookie))
            .wrap(MethodOverride)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            result
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            server_task
                .await
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
    }

    tracing::info!("Story-service shutting down");
    Ok(())
}

//! YaNews and YaNote server

use anyhow::Result;
use chrono::Duration;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ya_sites::{
    api::{self, AppState},
    config::Config,
    db::{self, DatabasePool},
    models::CreateNewsInput,
    services::{system_clock, Clock, NewsService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ya_sites=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting YaNews/YaNote...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    let applied = db::migrations::prepare(&pool).await?;
    tracing::info!("Database ready, {} migrations applied", applied);

    let clock = system_clock();
    let state = AppState::new(pool.clone(), &config, clock.clone())?;

    let expired = state.user_service.cleanup_expired_sessions().await?;
    if expired > 0 {
        tracing::info!("Removed {} expired sessions", expired);
    }

    if config.news.seed_demo_news {
        seed_demo_news(&state.news_service, clock.now()).await?;
    }

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Fill an empty news table with one item per day, newest first
async fn seed_demo_news(news_service: &NewsService, now: chrono::DateTime<chrono::Utc>) -> Result<()> {
    if news_service.count().await? > 0 {
        tracing::debug!("News table not empty, skipping demo news");
        return Ok(());
    }

    let items = (0..12)
        .map(|day| {
            CreateNewsInput::new(format!("Новость {}", day + 1), "Просто текст.")
                .with_date(now - Duration::days(day))
        })
        .collect();
    let created = news_service.create_many(items).await?;
    tracing::info!("Seeded {} demo news items", created.len());
    Ok(())
}

/// Shorts Service - HTTP Server
///
/// Accepts post creation and encoding-provider callbacks and reconciles them
/// into shorts records.
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::Context;
use shorts_service::db::{PgPostRepository, PgShortsRepository};
use shorts_service::handlers;
use shorts_service::middleware::JwtAuthMiddleware;
use shorts_service::services::{
    HttpNotificationClient, NotificationDispatcher, PostService, RetryPolicy, ShortsService,
};
use shorts_service::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    tracing::info!(env = %config.app.env, "Starting shorts service");

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run migrations")?;

    let notifier = Arc::new(HttpNotificationClient::new(&config.notification.base_url));
    let (dispatcher, dispatcher_handle) = NotificationDispatcher::spawn(
        notifier,
        RetryPolicy::new(config.notification.max_retries),
    );

    let shorts_service = Arc::new(ShortsService::new(
        Arc::new(PgShortsRepository::new(db_pool.clone())),
        Arc::new(dispatcher),
        config.storage.clone(),
    ));
    let post_service = Arc::new(PostService::new(
        Arc::new(PgPostRepository::new(db_pool.clone())),
        shorts_service.clone(),
    ));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server on {}", bind_address);

    let jwt_secret = config.auth.jwt_secret.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(shorts_service.clone()))
            .app_data(web::Data::from(post_service.clone()))
            .wrap(actix_middleware::Logger::default())
            .configure(|cfg| handlers::register_routes(cfg, JwtAuthMiddleware::new(&jwt_secret)))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    // Give queued notifications a moment to drain once the workers are gone.
    match tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await {
        Ok(Err(e)) => tracing::error!("Notification dispatcher task failed: {}", e),
        Err(_) => tracing::warn!("Notification dispatcher still busy at shutdown"),
        Ok(Ok(())) => {}
    }

    tracing::info!("Shorts-service shutting down");
    Ok(())
}

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use notification_service::{
    config::StorageBackend,
    db, handlers, metrics,
    repository::{MemoryDirectory, Stores},
    services::{Broadcaster, Mailer, SmtpMailer},
    AppState, Config, ConnectionManager,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,actix_web=info".into());
    if config.app.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(env = %config.app.env, backend = ?config.storage.backend, "Starting notification-service");

    let stores = match config.storage.backend {
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let pool = db::init_pool(url, config.storage.run_migrations)
                .await
                .context("Failed to initialize database pool")?;
            tracing::info!("Database pool ready");
            Stores::postgres(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Stores::memory(Arc::new(MemoryDirectory::new()))
        }
    };

    let connection_manager = ConnectionManager::new();
    tracing::info!("WebSocket connection manager initialized");

    let mailer = SmtpMailer::new(&config.smtp).context("Failed to configure SMTP mailer")?;
    tracing::info!(enabled = mailer.is_enabled(), smtp = ?config.smtp, "Email transport ready");

    let broadcaster: Arc<dyn Broadcaster> = Arc::new(connection_manager.clone());
    let mailer: Arc<dyn Mailer> = Arc::new(mailer);
    let state = web::Data::new(AppState::new(
        stores,
        broadcaster,
        mailer,
        config.fanout.email_concurrency,
    ));
    let manager = web::Data::new(connection_manager);

    let addr = config.bind_addr();
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(manager.clone())
            .wrap(middleware::Logger::default())
            .wrap(metrics::http_metrics())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::register_routes)
    })
    .bind(&addr)
    .with_context(|| format!("Failed to bind {}", addr))?
    .run()
    .await
    .context("HTTP server terminated with error")
}

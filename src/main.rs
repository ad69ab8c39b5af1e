use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_board::{
    api,
    auth::TokenVerifier,
    config::Settings,
    integrations::{
        email::SmtpMailer, shortener::SpooShortener, IntegrationManager, LinkShortener, Mailer,
    },
    service::{Notifiers, ServiceContext},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_board=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting campus board on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    // Initialize integration manager
    let integration_manager = Arc::new(IntegrationManager::new());
    let mut notifiers = Notifiers::default();

    // Register integrations
    if let Some(mailer) = SmtpMailer::new(settings.email.clone(), &settings.server.frontend_url)? {
        let mailer = Arc::new(mailer);
        integration_manager.register(mailer.clone()).await;
        notifiers.mailer = Some(mailer as Arc<dyn Mailer>);
    } else {
        tracing::info!("Email notifications disabled");
    }

    if let Some(shortener) = SpooShortener::new(settings.shortener.clone()) {
        let shortener = Arc::new(shortener);
        integration_manager.register(shortener.clone()).await;
        notifiers.shortener = Some(shortener as Arc<dyn LinkShortener>);
    } else {
        tracing::info!("Link shortening disabled");
    }

    // Check integration health
    let health_results = integration_manager.health_check_all().await;
    for (name, result) in health_results {
        match result {
            Ok(_) => tracing::info!("Integration {} is healthy", name),
            Err(e) => tracing::warn!("Integration {} health check failed: {:?}", name, e),
        }
    }

    let token_verifier = TokenVerifier::from_config(&settings.auth)?.map(Arc::new);
    if token_verifier.is_none() {
        tracing::warn!("No token secret or public key configured; every request will be anonymous");
    }

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        db_pool.clone(),
        integration_manager,
        notifiers,
        token_verifier,
        &settings,
    ));

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}

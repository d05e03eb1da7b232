use std::sync::Arc;

use account_service::config::Config;
use account_service::domain::user::service::AuthService;
use account_service::domain::user::service::TokenTtls;
use account_service::inbound::http::router::create_router;
use account_service::outbound::mailer::LoggingMailer;
use account_service::outbound::repositories::user::PostgresUserRepository;
use auth::IdCodec;
use auth::TokenService;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let tokens = TokenService::new(config.auth.secret.as_bytes());
    let id_codec = Arc::new(IdCodec::new(&config.hashid.salt, config.hashid.min_length)?);
    let ttls = TokenTtls {
        access: Duration::minutes(config.auth.access_expiration_minutes),
        refresh: Duration::minutes(config.auth.refresh_expiration_minutes),
        verify_email: Duration::minutes(config.auth.verify_email_expiration_minutes),
    };

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let mailer = Arc::new(LoggingMailer::new(config.email.from_address.clone()));

    let auth_service = Arc::new(AuthService::new(
        user_repository,
        tokens,
        Arc::clone(&id_codec),
        ttls,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, mailer, id_codec);
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited");

    Ok(())
}

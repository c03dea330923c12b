//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `account::AccountError`.

use account::infra::{DevBackendConfig, HmacSsoSigner, InMemoryExchange, LogMailer, SsoConfig};
use account::{AccountConfig, account_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,account=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let account_config = if cfg!(debug_assertions) && env::var("EXCHANGE_NAME").is_err() {
        AccountConfig::development()
    } else {
        AccountConfig::from_env()
    };
    tracing::info!(exchange = %account_config.exchange_name, "Account configuration loaded");

    let mailer = Arc::new(LogMailer::new(account_config.exchange_name.clone()));
    let exchange = InMemoryExchange::new(DevBackendConfig::from_env(), mailer.clone());
    let sso = Arc::new(HmacSsoSigner::new(SsoConfig::from_env()));

    // Optional seed account; failure here should not prevent server startup
    if let (Ok(email), Ok(password)) = (env::var("SEED_USER_EMAIL"), env::var("SEED_USER_PASSWORD")) {
        match exchange.register_verified(&email, &password).await {
            Ok(user) => tracing::info!(user_id = user.id, email = %user.email, "Seed user created"),
            Err(e) => tracing::warn!(error = %e, "Seed user creation failed, continuing anyway"),
        }
    }

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/v2", account_router(exchange, mailer, sso, account_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:31113".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

//! Authkit API server entry point.
//!
//! Composes the stores, mailer, signer, and auth service at startup and
//! serves the axum router.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use authkit_api::{AppState, router};
use authkit_core::auth::jwt::{TokenSigner, resolve_secret};
use authkit_core::auth::service::AuthService;
use authkit_core::mail::TracingMailer;
use authkit_core::store::pg::{PgResetTokenStore, PgUserStore};

/// Command-line options; every flag falls back to the environment.
///
/// | Variable          | Default                               |
/// |-------------------|---------------------------------------|
/// | `BIND_ADDR`       | `127.0.0.1:3100`                      |
/// | `DATABASE_URL`    | `postgres://localhost:5432/authkit`   |
/// | `PUBLIC_BASE_URL` | `http://localhost:3100`               |
///
/// Signing secrets come from `ACCESS_TOKEN_SECRET` / `REFRESH_TOKEN_SECRET`,
/// else are generated and persisted under the platform data dir.
#[derive(Debug, Parser)]
#[command(name = "authkit-api-server", version, about = "Authkit HTTP API server")]
struct Cli {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/authkit"
    )]
    database_url: String,

    /// Public base URL embedded in emailed verification links.
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://localhost:3100")]
    public_base_url: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cli.database_url)
        .await
        .expect("connect to PostgreSQL");

    authkit_core::migrate::migrate(&pool)
        .await
        .expect("run database migrations");

    let signer = Arc::new(TokenSigner::new(
        resolve_secret("ACCESS_TOKEN_SECRET", "access-token-secret").as_bytes(),
        resolve_secret("REFRESH_TOKEN_SECRET", "refresh-token-secret").as_bytes(),
    ));

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let reset_tokens = Arc::new(PgResetTokenStore::new(pool));
    let auth = Arc::new(AuthService::new(
        users.clone(),
        reset_tokens,
        Arc::new(TracingMailer),
        signer.clone(),
        cli.public_base_url,
    ));

    let state = AppState {
        auth,
        users,
        signer,
    };

    let listener = TcpListener::bind(&cli.bind_addr)
        .await
        .expect("bind HTTP listener");
    info!(addr = %cli.bind_addr, "authkit api server listening");

    axum::serve(listener, router(state))
        .await
        .expect("server error");
}

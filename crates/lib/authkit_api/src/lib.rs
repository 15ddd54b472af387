//! # authkit_api
//!
//! HTTP API library for Authkit.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod validate;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use authkit_core::auth::jwt::TokenSigner;
use authkit_core::auth::service::AuthService;
use authkit_core::store::UserStore;

use crate::handlers::{auth, health, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrated auth flows.
    pub auth: Arc<AuthService>,
    /// User store, for profile lookups outside the auth flows.
    pub users: Arc<dyn UserStore>,
    /// Token signer, shared with the bearer middlewares.
    pub signer: Arc<TokenSigner>,
}

/// Builds the axum router with all routes and shared state.
///
/// `/auth` stays unprefixed, everything else lives under `/v1`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/signin", post(auth::signin_handler))
        .route("/auth/verify/email", get(auth::verify_email_handler))
        .route("/auth/password/forgot", post(auth::forgot_password_handler))
        .route("/auth/password/reset", post(auth::reset_password_handler));

    // Session routes (require a valid refresh token in the bearer header)
    let session = Router::new()
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_refresh,
        ));

    // Protected routes (require a valid access token)
    let protected = Router::new()
        .route("/v1/users/me", get(users::me_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(session)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}

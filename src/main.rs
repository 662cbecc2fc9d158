// SPDX-License-Identifier: MIT

//! Authgate API Server
//!
//! Email/password and Google OAuth2 login with JWT session tokens tracked
//! per device in each user's active-token set.

use authgate::{
    config::{Config, StoreBackend},
    db::UserStore,
    services::{GoogleOAuth, TokenIssuer},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Authgate API");

    // Initialize the credential store
    let store = match config.store_backend {
        StoreBackend::Firestore => UserStore::firestore(&config.gcp_project_id)
            .await
            .expect("Failed to connect to Firestore"),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory user store; sessions are lost on restart");
            UserStore::memory()
        }
    };

    // Signing keys are derived once here; rotation requires a restart and
    // invalidates every outstanding session
    let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_days);

    let google = GoogleOAuth::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_callback_url.clone(),
        config.oauth_state_key.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config,
        store,
        tokens,
        google,
    });

    // Build router
    let app = authgate::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("authgate=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

// SPDX-License-Identifier: MIT

use authgate::config::Config;
use authgate::db::UserStore;
use authgate::routes::create_router;
use authgate::services::{GoogleOAuth, TokenIssuer};
use authgate::AppState;
use std::sync::Arc;

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store = UserStore::memory();
    let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_days);
    let google = GoogleOAuth::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_callback_url.clone(),
        config.oauth_state_key.clone(),
    );

    let state = Arc::new(AppState {
        config,
        store,
        tokens,
        google,
    });

    (create_router(state.clone()), state)
}

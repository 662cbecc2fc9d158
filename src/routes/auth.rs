// SPDX-License-Identifier: MIT

//! Google OAuth login routes.
//!
//! The browser is mid-handshake on these routes, so failures redirect back
//! to the frontend with an `error` query parameter instead of surfacing
//! HTTP errors.

use crate::error::Result;
use crate::services::session;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/auth/google", get(google_start))
        .route("/user/auth/google/callback", get(google_callback))
}

/// Start the OAuth flow: redirect to Google's consent screen.
async fn google_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let url = state.google.authorize_url()?;
    tracing::info!("Starting Google OAuth flow");
    Ok(Redirect::temporary(&url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback: exchange the code, bind a session token, and send the
/// browser back to the frontend with the token as a query parameter.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let frontend = &state.config.frontend_url;

    // The user denied consent, or Google reported a failure
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return login_error(frontend, "google_auth_failed");
    }

    let (Some(code), Some(oauth_state)) = (params.code, params.state) else {
        return login_error(frontend, "auth_failed");
    };

    if !state.google.verify_state(&oauth_state) {
        tracing::warn!("Invalid or tampered OAuth state parameter");
        return login_error(frontend, "auth_failed");
    }

    match complete_login(&state, &code).await {
        Ok(token) => {
            Redirect::temporary(&format!("{}/auth/callback?token={}", frontend, token))
        }
        Err(e) => {
            tracing::error!(error = %e, "Google login failed");
            login_error(frontend, "server_error")
        }
    }
}

/// Exchange the code for a verified profile, resolve the local user, and
/// bind a fresh session token to them.
async fn complete_login(state: &AppState, code: &str) -> Result<String> {
    let profile = state.google.exchange_code(code).await?;
    let mut user = session::oauth_login(&state.store, profile).await?;

    let token = state.tokens.issue(&user.id)?;
    user.tokens.push(token.clone());
    state.store.save(&mut user).await?;

    tracing::info!(user_id = %user.id, "Google login succeeded");
    Ok(token)
}

fn login_error(frontend_url: &str, code: &str) -> Redirect {
    Redirect::temporary(&format!("{}/login?error={}", frontend_url, code))
}

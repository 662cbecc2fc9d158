// SPDX-License-Identifier: MIT

//! Authentication decision engine.
//!
//! Every request to a protected route flows through [`require_auth`]:
//! signature check, expiry check with the exempt-route carve-out, then the
//! token-set membership lookup against the credential store.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Routes that accept an expired (but otherwise valid) token, so a client
/// can renew or end a session after natural expiry.
///
/// Keyed on exact path: a new route that should be exempt must be listed
/// here explicitly. `/user/logout/all` is deliberately absent.
pub const EXPIRY_EXEMPT_PATHS: &[&str] = &["/user/refresh", "/user/logout"];

/// Authenticated request context: the resolved user and the raw token
/// that proved them.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Middleware that requires a valid session token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::MissingToken)?;

    let session = resolve_session(&state, &token, request.uri().path()).await?;
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Decide whether a presented token authenticates a request to `path`.
///
/// Expired tokens pass only for paths in [`EXPIRY_EXEMPT_PATHS`], and every
/// accepted token must still be a live member of its user's token set — a
/// logged-out token fails the lookup no matter how well it is signed.
pub async fn resolve_session(
    state: &AppState,
    token: &str,
    path: &str,
) -> Result<AuthSession, AppError> {
    let decoded = state.tokens.decode(token).map_err(|e| {
        tracing::debug!(error = %e, "Token failed verification");
        AppError::InvalidToken
    })?;

    if decoded.expired && !EXPIRY_EXEMPT_PATHS.contains(&path) {
        return Err(AppError::TokenExpired);
    }

    // Store errors bubble up as 500, distinct from any auth rejection.
    let user = state
        .store
        .find_by_id_and_token(&decoded.claims.sub, token)
        .await?
        .ok_or(AppError::SessionRevoked)?;

    Ok(AuthSession {
        user,
        token: token.to_string(),
    })
}

/// Extract the raw token from an `Authorization: Bearer` header.
fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::UserStore;
    use crate::models::NewUser;
    use crate::services::{GoogleOAuth, TokenIssuer};
    use axum::http::{HeaderMap, HeaderValue};
    use chrono::Duration;

    fn test_state() -> AppState {
        let config = Config::test_default();
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_days);
        let google = GoogleOAuth::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_callback_url.clone(),
            config.oauth_state_key.clone(),
        );
        AppState {
            config,
            store: UserStore::memory(),
            tokens,
            google,
        }
    }

    async fn seeded_user(state: &AppState, token: &str) -> User {
        let mut user = state
            .store
            .create(NewUser {
                email: "a@x.com".to_string(),
                password: Some("secret1".to_string()),
                google_id: None,
                display_name: "A".to_string(),
                avatar: String::new(),
            })
            .await
            .unwrap();
        user.tokens.push(token.to_string());
        state.store.save(&mut user).await.unwrap();
        user
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc".to_string()));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_valid_member_token_resolves() {
        let state = test_state();
        let user = state
            .store
            .create(NewUser {
                email: "a@x.com".to_string(),
                password: Some("secret1".to_string()),
                google_id: None,
                display_name: "A".to_string(),
                avatar: String::new(),
            })
            .await
            .unwrap();

        let token = state.tokens.issue(&user.id).unwrap();
        let mut stored = state.store.find_by_id(&user.id).await.unwrap().unwrap();
        stored.tokens.push(token.clone());
        state.store.save(&mut stored).await.unwrap();

        let session = resolve_session(&state, &token, "/user/profile").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(session.token, token);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let state = test_state();
        let err = resolve_session(&state, "not.a.jwt", "/user/profile")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn test_well_signed_nonmember_token_rejected() {
        let state = test_state();
        let user = seeded_user(&state, "some-other-token").await;

        // Correctly signed, but never appended to the user's token set
        let token = state.tokens.issue(&user.id).unwrap();
        let err = resolve_session(&state, &token, "/user/profile")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SessionRevoked));
    }

    #[tokio::test]
    async fn test_expired_token_rejected_on_nonexempt_path() {
        let state = test_state();
        let user = state
            .store
            .create(NewUser {
                email: "a@x.com".to_string(),
                password: Some("secret1".to_string()),
                google_id: None,
                display_name: "A".to_string(),
                avatar: String::new(),
            })
            .await
            .unwrap();

        let token = state
            .tokens
            .issue_with_ttl(&user.id, Duration::seconds(-60))
            .unwrap();
        let mut stored = state.store.find_by_id(&user.id).await.unwrap().unwrap();
        stored.tokens.push(token.clone());
        state.store.save(&mut stored).await.unwrap();

        let err = resolve_session(&state, &token, "/user/profile")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));

        // The exemption is exact-path; logout/all is not exempt
        let err = resolve_session(&state, &token, "/user/logout/all")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));

        // The same token passes on the exempt paths
        assert!(resolve_session(&state, &token, "/user/refresh").await.is_ok());
        assert!(resolve_session(&state, &token, "/user/logout").await.is_ok());
    }
}

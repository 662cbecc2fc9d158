// SPDX-License-Identifier: MIT

//! Session mutation operations.
//!
//! These are the only code paths that alter a user's token set: login
//! appends, refresh swaps, logout removes, logout-all clears. Every
//! mutation goes through `UserStore::save`.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};
use crate::services::google::VerifiedProfile;
use crate::services::token::TokenIssuer;

/// Password login: verify credentials, issue a token, bind it to the user.
///
/// Unknown email, password-less (Google-only) account, and hash mismatch
/// are indistinguishable to the caller.
pub async fn password_login(
    store: &UserStore,
    tokens: &TokenIssuer,
    email: &str,
    password: &str,
) -> Result<(User, String)> {
    let Some(mut user) = store.find_by_email(email).await? else {
        return Err(AppError::InvalidCredentials);
    };

    if !user.verify_password(password) {
        return Err(AppError::InvalidCredentials);
    }

    let token = tokens.issue(&user.id)?;
    user.tokens.push(token.clone());
    store.save(&mut user).await?;

    Ok((user, token))
}

/// Resolve a verified Google login to a local user, linking or creating
/// by email. Token issuance happens at the HTTP boundary, not here.
pub async fn oauth_login(store: &UserStore, profile: VerifiedProfile) -> Result<User> {
    if let Some(mut user) = store.find_by_email(&profile.email).await? {
        let mut changed = false;

        if user.google_id.is_none() {
            user.google_id = Some(profile.google_id);
            changed = true;
        }
        // Fill blanks only; the user's own edits win over Google's values.
        if user.display_name.trim().is_empty() && !profile.display_name.trim().is_empty() {
            user.display_name = profile.display_name.trim().to_string();
            changed = true;
        }
        if user.avatar.is_empty() && !profile.avatar.is_empty() {
            user.avatar = profile.avatar;
            changed = true;
        }

        if changed {
            store.save(&mut user).await?;
            tracing::info!(user_id = %user.id, "Linked Google account to existing user");
        }
        return Ok(user);
    }

    // First login for this email: create a password-less account. Google
    // may omit the display name; fall back to the mailbox name.
    let display_name = if profile.display_name.trim().is_empty() {
        profile
            .email
            .split('@')
            .next()
            .unwrap_or("user")
            .to_string()
    } else {
        profile.display_name.trim().to_string()
    };

    let user = store
        .create(NewUser {
            email: profile.email,
            password: None,
            google_id: Some(profile.google_id),
            display_name,
            avatar: profile.avatar,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Created user from Google login");
    Ok(user)
}

/// Swap the presented token for a fresh one: exactly one token replaces
/// another and the set size is unchanged.
pub async fn refresh(
    store: &UserStore,
    tokens: &TokenIssuer,
    user: &mut User,
    old_token: &str,
) -> Result<String> {
    let new_token = tokens.issue(&user.id)?;

    user.tokens.retain(|t| t != old_token);
    user.tokens.push(new_token.clone());
    store.save(user).await?;

    Ok(new_token)
}

/// Remove exactly the presented token; other devices stay signed in.
pub async fn logout(store: &UserStore, user: &mut User, token: &str) -> Result<()> {
    user.tokens.retain(|t| t != token);
    store.save(user).await
}

/// Clear the whole token set, signing out every device at once.
pub async fn logout_all(store: &UserStore, user: &mut User) -> Result<()> {
    user.tokens.clear();
    store.save(user).await
}

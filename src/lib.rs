// SPDX-License-Identifier: MIT

//! Authgate: email/password and Google OAuth2 login with JWT sessions.
//!
//! This crate provides a user-authentication backend: token issuance,
//! multi-device session tracking via a per-user token set, and token
//! refresh/logout.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::UserStore;
use services::{GoogleOAuth, TokenIssuer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: UserStore,
    pub tokens: TokenIssuer,
    pub google: GoogleOAuth,
}

// SPDX-License-Identifier: MIT

//! Application error types with a consistent JSON response envelope.
//!
//! Every failure a client can see becomes `{"success": false, "message": ...}`
//! with one of the statuses 400/401/404/500. Internal details are logged and
//! never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Email 已被註冊")]
    DuplicateEmail,

    #[error("帳號或密碼錯誤")]
    InvalidCredentials,

    /// No bearer token on a protected route.
    #[error("未提供 token")]
    MissingToken,

    /// Token is malformed or its signature does not verify.
    #[error("JWT 驗證失敗")]
    InvalidToken,

    /// Token expired and the route is not in the expiry-exempt set.
    #[error("token 已過期")]
    TokenExpired,

    /// Token is well-signed but no longer a member of its user's token set
    /// (or the user is gone).
    #[error("使用者不存在或 token 已失效")]
    SessionRevoked,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("找不到該路由")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error envelope.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::DuplicateEmail | AppError::Validation(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidCredentials
            | AppError::MissingToken
            | AppError::InvalidToken
            | AppError::TokenExpired
            | AppError::SessionRevoked => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Internal failures collapse to a generic message; details stay in
        // the logs above.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "伺服器錯誤".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            success: false,
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

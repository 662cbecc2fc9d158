//! User model: stored record, sanitized profile view, password hashing.

use crate::error::AppError;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// bcrypt cost factor for password hashing.
const BCRYPT_COST: u32 = 10;

/// User record as persisted in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// System-generated ID (also the document ID)
    pub id: String,
    /// Email address, stored lowercased
    pub email: String,
    /// bcrypt hash; None for accounts created via Google login
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Linked Google account ID
    #[serde(default)]
    pub google_id: Option<String>,
    /// Display name
    pub display_name: String,
    /// Avatar URL ("" if unset)
    #[serde(default)]
    pub avatar: String,
    /// Session tokens currently accepted for this user, in issuance order.
    /// This is the multi-device session set.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Last persisted mutation (RFC 3339)
    pub updated_at: String,
    /// Write counter, bumped on every save. Never serialized outward.
    #[serde(default)]
    pub version: u64,
}

/// Fields for creating a new user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Plaintext password; hashed before the record is built.
    pub password: Option<String>,
    pub google_id: Option<String>,
    pub display_name: String,
    pub avatar: String,
}

impl User {
    /// Build a fresh record from registration or OAuth fields.
    ///
    /// The plaintext password (if any) is bcrypt-hashed here and never kept.
    /// An account must have a password or a linked Google identity.
    pub fn from_new(new: NewUser) -> Result<Self, AppError> {
        if new.display_name.trim().is_empty() {
            return Err(AppError::Validation("顯示名稱為必填欄位".to_string()));
        }
        if new.password.is_none() && new.google_id.is_none() {
            return Err(AppError::Validation("密碼為必填欄位".to_string()));
        }

        let password_hash = match new.password {
            Some(ref plaintext) => Some(hash_password(plaintext)?),
            None => None,
        };

        let now = Utc::now().to_rfc3339();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(&new.email),
            password_hash,
            google_id: new.google_id,
            display_name: new.display_name.trim().to_string(),
            avatar: new.avatar,
            tokens: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            version: 0,
        })
    }

    /// Replace the password, re-hashing the new plaintext.
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), AppError> {
        self.password_hash = Some(hash_password(plaintext)?);
        Ok(())
    }

    /// Check a candidate password against the stored hash.
    ///
    /// Accounts without a password (Google-only) never match.
    pub fn verify_password(&self, candidate: &str) -> bool {
        match &self.password_hash {
            Some(hash) => bcrypt::verify(candidate, hash).unwrap_or(false),
            None => false,
        }
    }

    /// Externally visible projection of this record.
    ///
    /// Never includes the password hash, the token set, or the write
    /// counter; this is the only shape handlers serialize.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            google_id: self.google_id.clone(),
            display_name: self.display_name.clone(),
            avatar: self.avatar.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// Response-boundary view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub google_id: Option<String>,
    pub display_name: String,
    pub avatar: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Lowercase and trim an email for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(plaintext: &str) -> Result<String, AppError> {
    bcrypt::hash(plaintext, BCRYPT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

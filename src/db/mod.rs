//! Credential store: user records and their active session tokens.
//!
//! `UserStore` is the only writer of user records. Concurrent saves of the
//! same user are last-writer-wins; the read-modify-write around the token
//! set is not atomic and two simultaneous refreshes on one account can
//! lose a mutation. This is an accepted limitation.

pub mod firestore;
pub mod memory;

use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{NewUser, User};
use chrono::Utc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// User store handle, cheap to clone.
#[derive(Clone)]
pub struct UserStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(self::firestore::FirestoreBackend),
    Memory(self::memory::MemoryBackend),
}

impl UserStore {
    /// Connect to Firestore (production backend).
    pub async fn firestore(project_id: &str) -> Result<Self, AppError> {
        let backend = self::firestore::FirestoreBackend::new(project_id).await?;
        Ok(Self {
            backend: Backend::Firestore(backend),
        })
    }

    /// In-memory store for tests and local development. Nothing persists
    /// past the process.
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(self::memory::MemoryBackend::default()),
        }
    }

    /// Look up a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        match &self.backend {
            Backend::Firestore(f) => f.find_by_email(&email).await,
            Backend::Memory(m) => m.find_by_email(&email),
        }
    }

    /// Look up a user by ID.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(f) => f.find_by_id(id).await,
            Backend::Memory(m) => m.find_by_id(id),
        }
    }

    /// The authorization-membership check: returns the user only when the
    /// literal token string is still present in their token set. A
    /// well-signed token that has been logged out fails here.
    pub async fn find_by_id_and_token(
        &self,
        id: &str,
        token: &str,
    ) -> Result<Option<User>, AppError> {
        let user = self.find_by_id(id).await?;
        Ok(user.filter(|u| u.tokens.iter().any(|t| t == token)))
    }

    /// Create a user, enforcing email uniqueness.
    ///
    /// The plaintext password in `new` (if any) is hashed while building
    /// the record; it is never written anywhere.
    pub async fn create(&self, new: NewUser) -> Result<User, AppError> {
        if self.find_by_email(&new.email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let user = User::from_new(new)?;
        match &self.backend {
            Backend::Firestore(f) => f.upsert(&user).await?,
            Backend::Memory(m) => m.insert(&user)?,
        }

        tracing::debug!(user_id = %user.id, "Created user record");
        Ok(user)
    }

    /// Persist a mutated record (token set, password, profile fields).
    ///
    /// Stamps `updated_at` and bumps the write counter. Whole-record write:
    /// the last save wins.
    pub async fn save(&self, user: &mut User) -> Result<(), AppError> {
        user.updated_at = Utc::now().to_rfc3339();
        user.version += 1;
        match &self.backend {
            Backend::Firestore(f) => f.upsert(user).await,
            Backend::Memory(m) => m.save(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: Some("secret1".to_string()),
            google_id: None,
            display_name: "Test User".to_string(),
            avatar: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_enforces_unique_email() {
        let store = UserStore::memory();
        store.create(new_user("a@x.com")).await.unwrap();

        let err = store.create(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));

        // Uniqueness is case-insensitive
        let err = store.create(new_user("A@X.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let store = UserStore::memory();
        let created = store.create(new_user("Mixed@Case.com")).await.unwrap();

        let found = store.find_by_email("mixed@case.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_find_by_id_and_token_requires_membership() {
        let store = UserStore::memory();
        let mut user = store.create(new_user("m@x.com")).await.unwrap();

        user.tokens.push("tok-1".to_string());
        store.save(&mut user).await.unwrap();

        assert!(store
            .find_by_id_and_token(&user.id, "tok-1")
            .await
            .unwrap()
            .is_some());
        // Structurally plausible but not a member
        assert!(store
            .find_by_id_and_token(&user.id, "tok-2")
            .await
            .unwrap()
            .is_none());
        // Unknown user
        assert!(store
            .find_by_id_and_token("no-such-id", "tok-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_save_bumps_version_and_updated_at() {
        let store = UserStore::memory();
        let mut user = store.create(new_user("v@x.com")).await.unwrap();
        assert_eq!(user.version, 0);

        user.tokens.push("tok".to_string());
        store.save(&mut user).await.unwrap();
        assert_eq!(user.version, 1);

        let stored = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.tokens, vec!["tok".to_string()]);
    }
}

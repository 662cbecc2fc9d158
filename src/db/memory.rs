//! In-memory user store backed by DashMap.
//!
//! Backs the test suite and local development without GCP credentials.

use crate::error::AppError;
use crate::models::User;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Process-local user storage.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    /// Records keyed by user ID
    users: Arc<DashMap<String, User>>,
    /// Email (lowercased) -> user ID index
    emails: Arc<DashMap<String, String>>,
}

impl MemoryBackend {
    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.emails.get(email).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id)
    }

    /// Insert a new record; the email index entry doubles as the
    /// uniqueness guard.
    pub fn insert(&self, user: &User) -> Result<(), AppError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }

    /// Whole-record replace. Concurrent writers race last-save-wins.
    pub fn save(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}

//! User accounts and profile lookups: registration, credential check,
//! password change, exact-name search, and friend listing.
//!
//! Passwords are stored and compared verbatim, as the directory has always
//! done; credential hardening is out of scope here.

use crate::error::{ProfNetError, Result};
use crate::graph::store::GraphStore;
use crate::types::{NewUser, User};

/// Account and profile operations over a store.
pub struct UserDirectory<'a> {
    store: &'a GraphStore,
}

impl<'a> UserDirectory<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the id is empty or already taken.
    pub fn register(&self, new_user: NewUser) -> Result<User> {
        if new_user.user_id.trim().is_empty() {
            return Err(ProfNetError::InvalidRequest("user id must not be empty".into()));
        }
        if self.store.user_exists(&new_user.user_id)? {
            return Err(ProfNetError::InvalidRequest(format!(
                "user id '{}' is already taken",
                new_user.user_id
            )));
        }

        self.store.insert_user(&new_user)?;
        tracing::info!(user_id = %new_user.user_id, "user registered");
        self.profile(&new_user.user_id)
    }

    /// Check credentials. `None` means unknown user or wrong password —
    /// the caller cannot tell which.
    pub fn authenticate(&self, user_id: &str, password: &str) -> Result<Option<User>> {
        if self.store.verify_credentials(user_id, password)? {
            self.store.get_user(user_id)
        } else {
            Ok(None)
        }
    }

    /// Change a user's password.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unregistered user.
    pub fn change_password(&self, user_id: &str, new_password: &str) -> Result<()> {
        if !self.store.update_password(user_id, new_password)? {
            return Err(ProfNetError::NotFound(format!("user '{user_id}'")));
        }
        tracing::info!(user_id, "password changed");
        Ok(())
    }

    /// Look up a profile by id.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unregistered user.
    pub fn profile(&self, user_id: &str) -> Result<User> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| ProfNetError::NotFound(format!("user '{user_id}'")))
    }

    /// Exact-name search. An empty result is a legitimate answer, not an
    /// error.
    pub fn search_by_name(&self, name: &str) -> Result<Vec<User>> {
        self.store.users_by_name(name)
    }

    /// Profiles connected to `user_id` by an accepted edge, in either
    /// direction, ordered by user id.
    pub fn friends_of(&self, user_id: &str) -> Result<Vec<User>> {
        let mut peers = self.store.accepted_peers(user_id)?;
        peers.sort();
        peers
            .iter()
            .map(|peer| self.profile(peer))
            .collect::<Result<Vec<_>>>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

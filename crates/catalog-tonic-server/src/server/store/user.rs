//! Provisioned identities and the in-memory user store.

use catalog_tonic_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// One provisioned identity.
///
/// The password is kept only as a bcrypt hash; identities are immutable
/// after provisioning except by full replacement.
#[derive(Clone, Debug)]
pub struct User {
    pub username: String,
    pub hashed_password: String,
    pub role: String,
}

impl User {
    /// Creates a user, hashing the password with bcrypt.
    pub fn new(username: &str, password: &str, role: &str) -> Result<Self> {
        let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
            Error::Internal {
                context: format!("cannot hash password: {e}"),
            }
        })?;

        Ok(Self {
            username: username.to_owned(),
            hashed_password,
            role: role.to_owned(),
        })
    }

    /// Checks a candidate password against the stored hash.
    pub fn is_correct_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.hashed_password).unwrap_or(false)
    }
}

/// Storage interface for identities.
pub trait UserStore: Send + Sync {
    /// Stores a copy of the user; duplicate usernames fail with
    /// [`Error::AlreadyExists`].
    fn save(&self, user: &User) -> Result<()>;

    /// Returns a copy of the user with this username, or `None`.
    fn find(&self, username: &str) -> Option<User>;
}

/// In-memory [`UserStore`].
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn save(&self, user: &User) -> Result<()> {
        let mut users = self.users.write();
        if users.contains_key(&user.username) {
            return Err(Error::AlreadyExists {
                id: user.username.clone(),
            });
        }

        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn find(&self, username: &str) -> Option<User> {
        self.users.read().get(username).cloned()
    }
}

//! Persisted sign-in state shared by the services.
//!
//! Token and user live in local storage under [`keys::TOKEN`] and
//! [`keys::USER`]. The token is also pushed into the [`ApiClient`] so every
//! request carries it.

use std::sync::Arc;

use fastbite_core::User;
use secrecy::SecretString;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::storage::{Storage, StorageError, StorageExt, keys};

/// Handle to the API client and the local store.
#[derive(Clone)]
pub struct Session {
    api: ApiClient,
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        Self { api, storage }
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Raw stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(keys::TOKEN)
    }

    /// Stored user record, if signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the record is corrupt.
    pub fn user(&self) -> Result<Option<User>, StorageError> {
        self.storage.get_json(keys::USER)
    }

    /// Save a fresh sign-in and attach the token to the API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn persist(&self, token: &str, user: &User) -> Result<(), StorageError> {
        self.storage.set(keys::TOKEN, token.to_string())?;
        self.storage.set_json(keys::USER, user)?;
        self.api
            .set_token(Some(SecretString::from(token.to_string())))
            .await;
        set_sentry_user(&user.id, Some(&user.email));
        debug!(user_id = %user.id, "Session persisted");
        Ok(())
    }

    /// Replace the stored token, keeping the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn replace_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(keys::TOKEN, token.to_string())?;
        self.api
            .set_token(Some(SecretString::from(token.to_string())))
            .await;
        Ok(())
    }

    /// Forget the signed-in user: token, user record and their cart mirror.
    ///
    /// The guest cart is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        // Read the user first; a corrupt record must not block sign-out.
        let user = self.user().ok().flatten();

        self.storage.remove(keys::TOKEN)?;
        self.storage.remove(keys::USER)?;
        if let Some(user) = &user {
            self.storage.remove(&keys::user_cart(&user.id))?;
        }
        self.api.set_token(None).await;
        clear_sentry_user();
        add_breadcrumb("auth", "Session cleared", None);

        if let Some(user) = user {
            info!(user_id = %user.id, "Signed out");
        }
        Ok(())
    }

    /// Anonymous visitor ID, created on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn guest_id(&self) -> Result<String, StorageError> {
        if let Some(id) = self.storage.get(keys::SESSION_ID)? {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.storage.set(keys::SESSION_ID, id.clone())?;
        Ok(id)
    }

    /// ID under which behavior is recorded: the user ID when signed in,
    /// otherwise the guest ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn owner_id(&self) -> Result<String, StorageError> {
        match self.user()? {
            Some(user) => Ok(user.id.into_inner()),
            None => self.guest_id(),
        }
    }
}

/// Session over in-memory storage pointed at a mock server, for tests.
#[cfg(test)]
pub(crate) fn test_session(
    server: &httpmock::MockServer,
) -> (Session, Arc<crate::storage::MemoryStorage>) {
    let storage = Arc::new(crate::storage::MemoryStorage::new());
    let session = Session::new(crate::api::test_client(server), storage.clone());
    (session, storage)
}

#[cfg(test)]
pub(crate) fn test_user(id: &str) -> User {
    User {
        id: fastbite_core::UserId::new(id),
        name: "An".to_string(),
        email: "an@fastbite.vn".to_string(),
        phone: None,
        role: fastbite_core::UserRole::Customer,
        favorite_categories: vec![],
        is_vegetarian: false,
    }
}

//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] fastbite_core::EmailError),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Name left blank on registration.
    #[error("name is required")]
    MissingName,

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// Stored token expired or was rejected; credentials were cleared.
    #[error("session expired")]
    SessionExpired,

    /// Backend call failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Local store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

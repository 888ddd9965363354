//! Authentication service.
//!
//! Password sign-in against the backend, with the JWT kept in local storage
//! and refreshed shortly before it expires.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, REFRESH_THRESHOLD, TokenStatus, decode_claims};

use chrono::Utc;
use fastbite_core::{Email, User};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, AuthResponse, RegisterRequest};
use crate::error::add_breadcrumb;
use crate::services::cart::{CartService, MergeReport};
use crate::services::session::Session;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Outcome of a successful sign-in or registration.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub cart_merge: MergeReport,
}

/// Authentication service.
#[derive(Debug, Clone)]
pub struct AuthService {
    session: Session,
    cart: CartService,
}

impl AuthService {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            cart: CartService::new(session.clone()),
            session,
        }
    }

    /// Restore the stored session, refreshing or dropping the token as
    /// needed.
    ///
    /// Returns the signed-in user, or `None` for a guest.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store is unreadable. Expired or
    /// rejected tokens are not errors; they yield `None`.
    #[instrument(skip(self))]
    pub async fn ensure_session(&self) -> Result<Option<User>, AuthError> {
        let Some(token) = self.session.token()? else {
            return Ok(None);
        };

        let status = TokenStatus::of(&token, Utc::now());
        if !status.is_usable() {
            info!(?status, "Stored token unusable, clearing credentials");
            self.session.clear().await?;
            return Ok(None);
        }

        self.session
            .api()
            .set_token(Some(SecretString::from(token)))
            .await;

        if status == TokenStatus::NeedsRefresh {
            match self.session.api().refresh_token().await {
                Ok(AuthResponse { token, user }) => {
                    self.session.replace_token(&token).await?;
                    if let Some(user) = user {
                        self.session.persist(&token, &user).await?;
                    }
                    info!("Refreshed access token");
                }
                Err(e) if e.is_auth() => {
                    warn!(error = %e, "Refresh rejected, clearing credentials");
                    self.session.clear().await?;
                    return Ok(None);
                }
                // Token is still valid for a few minutes; try again next time.
                Err(e) => warn!(error = %e, "Token refresh failed"),
            }
        }

        let user = match self.session.user()? {
            Some(user) => user,
            None => match self.session.api().me().await {
                Ok(user) => {
                    let token = self.session.token()?.unwrap_or_default();
                    self.session.persist(&token, &user).await?;
                    user
                }
                Err(e) if e.is_auth() => {
                    self.session.clear().await?;
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            },
        };

        crate::error::set_sentry_user(&user.id, Some(&user.email));
        Ok(Some(user))
    }

    /// Sign in with email and password, then merge the guest cart.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the backend refuses the
    /// credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let response = self
            .session
            .api()
            .login(&email, password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized { .. } | ApiError::Api { status: 400, .. } => {
                    AuthError::InvalidCredentials
                }
                other => AuthError::Api(other),
            })?;

        self.complete_sign_in(response).await
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password, phone))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<SignedIn, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        let request = RegisterRequest {
            name: name.to_string(),
            email,
            password: SecretString::from(password.to_string()),
            phone: phone.map(str::trim).filter(|p| !p.is_empty()).map(String::from),
        };

        let response = self
            .session
            .api()
            .register(&request)
            .await
            .map_err(|e| match e {
                ApiError::Api { status: 409, .. } => AuthError::UserAlreadyExists,
                ApiError::Api { ref message, .. } if message.to_lowercase().contains("exist") => {
                    AuthError::UserAlreadyExists
                }
                other => AuthError::Api(other),
            })?;

        self.complete_sign_in(response).await
    }

    /// Sign out. The guest cart is kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be written.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.session.clear().await?;
        Ok(())
    }

    /// The signed-in user, if any, without contacting the backend.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store is unreadable.
    pub fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.session.user()?)
    }

    async fn complete_sign_in(&self, response: AuthResponse) -> Result<SignedIn, AuthError> {
        let AuthResponse { token, user } = response;

        // Attach the token first so `me` is authenticated.
        self.session.replace_token(&token).await?;
        let user = match user {
            Some(user) => user,
            None => self.session.api().me().await?,
        };
        self.session.persist(&token, &user).await?;

        add_breadcrumb("auth", "Signed in", Some(&[("user_id", user.id.as_str())]));
        info!(user_id = %user.id, "Signed in");

        let cart_merge = match self.cart.merge_guest_cart(&user).await {
            Ok(report) => report,
            Err(crate::error::StorefrontError::Auth(e)) => return Err(e),
            Err(e) => {
                warn!(error = %e, "Guest cart merge failed");
                MergeReport::default()
            }
        };

        Ok(SignedIn { user, cart_merge })
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.trim() != password {
        return Err(AuthError::WeakPassword(
            "Password cannot start or end with whitespace".to_string(),
        ));
    }
    Ok(())
}

//! Authentication endpoints.

use fastbite_core::{Email, User};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing)]
    pub password: SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    #[serde(flatten)]
    request: &'a RegisterRequest,
    password: &'a str,
}

/// Token and user returned by login, register and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Deserialize)]
struct MeResponse {
    #[serde(default)]
    user: Option<User>,
}

impl ApiClient {
    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for wrong credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<AuthResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/login")
            .await?
            .json(&LoginRequest {
                email: email.as_str(),
                password,
            });
        self.execute_data(request, "login").await
    }

    /// Create an account; the backend signs the new user in.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is taken or the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let body = RegisterBody {
            request,
            password: request.password.expose_secret(),
        };
        let builder = self
            .request(Method::POST, "auth/register")
            .await?
            .json(&body);
        self.execute_data(builder, "register").await
    }

    /// Trade the current (still valid) token for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the current token is rejected.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<AuthResponse, ApiError> {
        let request = self.request(Method::POST, "auth/refresh-token").await?;
        self.execute_data(request, "refresh-token").await
    }

    /// The user the current token belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is rejected.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        let request = self.request(Method::GET, "auth/me").await?;
        let value: serde_json::Value = self.execute_data(request, "user").await?;

        // Some deployments wrap the user as `{"user": {...}}`.
        if let Ok(MeResponse { user: Some(user) }) = serde_json::from_value(value.clone()) {
            return Ok(user);
        }
        Ok(serde_json::from_value(value)?)
    }
}

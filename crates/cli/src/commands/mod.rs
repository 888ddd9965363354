//! Command implementations.
//!
//! Each module renders results as plain text on stdout. Failures come back
//! as [`CliError`] and are turned into a toast-style message by `main`.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;

use fastbite_admin::AdminError;
use fastbite_admin::api::AdminApiError;
use fastbite_admin::forms::FormErrors;
use fastbite_core::{CurrencyCode, Price};
use fastbite_storefront::StorefrontError;
use fastbite_storefront::api::ApiError;
use fastbite_storefront::services::AuthError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Arguments were valid for clap but not for the command.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Message shown to the person at the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storefront(e) => e.user_message(),
            Self::Admin(e) => match e {
                AdminError::Form(errors) => errors.to_string(),
                other => other.user_message(),
            },
            Self::Usage(message) => message.clone(),
        }
    }

    pub fn report(&self) {
        match self {
            Self::Storefront(e) => e.report(),
            Self::Admin(e) => e.report(),
            Self::Usage(_) => {}
        }
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        Self::Storefront(e.into())
    }
}

impl From<AuthError> for CliError {
    fn from(e: AuthError) -> Self {
        Self::Storefront(e.into())
    }
}

impl From<AdminApiError> for CliError {
    fn from(e: AdminApiError) -> Self {
        Self::Admin(e.into())
    }
}

impl From<FormErrors> for CliError {
    fn from(e: FormErrors) -> Self {
        Self::Admin(e.into())
    }
}

pub type CliResult = Result<(), CliError>;

pub(crate) fn money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

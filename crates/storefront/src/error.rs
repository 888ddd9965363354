//! Unified error handling with Sentry integration.
//!
//! Every service returns `Result<T, StorefrontError>` (or a narrower error
//! that converts into it). Front ends show [`StorefrontError::user_message`]
//! as a toast and call [`StorefrontError::report`] so unexpected failures
//! reach Sentry.

use fastbite_core::{CartError, ReviewError};
use thiserror::Error;

use crate::ai::AiError;
use crate::api::ApiError;
use crate::config::ConfigError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Authentication failed or the session expired.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart rule violated.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout precondition failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// AI completion failed.
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Review submission invalid.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),
}

impl StorefrontError {
    /// Whether the user has to sign in (again) to continue.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::NotSignedIn | AuthError::SessionExpired)
                | Self::Checkout(CheckoutError::NotSignedIn)
                | Self::Api(ApiError::Unauthorized { .. })
        )
    }

    /// Whether this is a failure the user did not cause and cannot fix.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Api(e) | Self::Auth(AuthError::Api(e)) => !matches!(
                e,
                ApiError::NotFound(_) | ApiError::Unauthorized { .. } | ApiError::RateLimited(_)
            ),
            Self::Storage(_) | Self::Auth(AuthError::Storage(_)) | Self::Ai(_) | Self::Config(_) => {
                true
            }
            Self::Auth(_) | Self::Cart(_) | Self::Checkout(_) | Self::Review(_) => false,
        }
    }

    /// Toast text. Never exposes internal details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) | Self::Auth(AuthError::Api(e)) => api_message(e),
            Self::Storage(_) | Self::Auth(AuthError::Storage(_)) | Self::Config(_) => {
                "Đã xảy ra lỗi, vui lòng thử lại.".to_string()
            }
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => "Email không hợp lệ.".to_string(),
                AuthError::InvalidCredentials => "Email hoặc mật khẩu không đúng.".to_string(),
                AuthError::UserAlreadyExists => "Email này đã được đăng ký.".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::MissingName => "Vui lòng nhập họ tên.".to_string(),
                AuthError::NotSignedIn => "Vui lòng đăng nhập để tiếp tục.".to_string(),
                _ => "Phiên đăng nhập đã hết hạn, vui lòng đăng nhập lại.".to_string(),
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity => "Số lượng phải lớn hơn 0.".to_string(),
                CartError::OutOfStock(name) => format!("{name} đã hết hàng."),
                CartError::Unavailable(name) => format!("{name} hiện không còn bán."),
                CartError::NotInCart(_) => "Sản phẩm không có trong giỏ hàng.".to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => "Giỏ hàng của bạn đang trống.".to_string(),
                CheckoutError::NotSignedIn => "Vui lòng đăng nhập để đặt hàng.".to_string(),
                CheckoutError::InvalidAddress(_) => {
                    "Vui lòng điền đầy đủ thông tin giao hàng.".to_string()
                }
                CheckoutError::CouponRejected(reason) => {
                    format!("Không thể áp dụng mã giảm giá: {reason}")
                }
                CheckoutError::NotCancellable { reference, status } => format!(
                    "Đơn hàng #{reference} không thể hủy ({}).",
                    status.label()
                ),
            },
            Self::Ai(_) => "Trợ lý ảo tạm thời không khả dụng.".to_string(),
            Self::Review(err) => match err {
                ReviewError::RatingOutOfRange(_) => "Vui lòng chọn từ 1 đến 5 sao.".to_string(),
                ReviewError::EmptyComment => "Vui lòng nhập nội dung đánh giá.".to_string(),
                ReviewError::CommentTooLong { max } => {
                    format!("Nội dung đánh giá tối đa {max} ký tự.")
                }
            },
        }
    }

    /// Capture unexpected failures to Sentry and log them with the event id.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, "Storefront error");
        }
    }
}

fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Http(_) => "Không thể kết nối máy chủ, vui lòng kiểm tra mạng.".to_string(),
        ApiError::Unauthorized { .. } => {
            "Phiên đăng nhập đã hết hạn, vui lòng đăng nhập lại.".to_string()
        }
        ApiError::NotFound(_) => "Không tìm thấy dữ liệu.".to_string(),
        ApiError::RateLimited(secs) => format!("Bạn thao tác quá nhanh, thử lại sau {secs} giây."),
        ApiError::Api { status, message } if *status < 500 && !message.is_empty() => {
            message.clone()
        }
        _ => "Máy chủ đang gặp sự cố, vui lòng thử lại sau.".to_string(),
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "p1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use fastbite_core::OrderStatus;

    use super::*;

    #[test]
    fn test_display() {
        let err = StorefrontError::Cart(CartError::OutOfStock("Gà rán".to_string()));
        assert_eq!(err.to_string(), "Cart error: Gà rán is out of stock");
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = StorefrontError::Api(ApiError::Api {
            status: 500,
            message: "MongoServerError: connection pool closed".to_string(),
        });
        assert!(!err.user_message().contains("Mongo"));

        let err = StorefrontError::Api(ApiError::Api {
            status: 400,
            message: "Sản phẩm đã hết hàng".to_string(),
        });
        assert_eq!(err.user_message(), "Sản phẩm đã hết hàng");

        let err = StorefrontError::Checkout(CheckoutError::NotCancellable {
            reference: "FB1".to_string(),
            status: OrderStatus::Delivered,
        });
        assert_eq!(err.user_message(), "Đơn hàng #FB1 không thể hủy (Đã giao).");
    }

    #[test]
    fn test_classification() {
        let expired = StorefrontError::Auth(AuthError::SessionExpired);
        assert!(expired.is_auth());
        assert!(!expired.is_unexpected());

        let server = StorefrontError::Api(ApiError::Api {
            status: 502,
            message: String::new(),
        });
        assert!(!server.is_auth());
        assert!(server.is_unexpected());

        let cart = StorefrontError::Cart(CartError::InvalidQuantity);
        assert!(!cart.is_unexpected());
    }
}

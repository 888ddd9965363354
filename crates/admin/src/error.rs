//! Unified error handling for the admin dashboard.

use thiserror::Error;

use crate::api::AdminApiError;
use crate::config::ConfigError;
use crate::forms::FormErrors;
use crate::notifications::NotificationError;

/// Application-level error type for the admin dashboard.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] AdminApiError),

    /// Real-time channel failed.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Form input rejected before submission.
    #[error("Invalid form: {0}")]
    Form(#[from] FormErrors),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl AdminError {
    /// Whether the admin token was refused.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Api(AdminApiError::Unauthorized { .. })
                | Self::Notification(NotificationError::ConnectRejected(_))
        )
    }

    /// Failures worth a Sentry event.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Api(e) => e.is_server_side() || matches!(e, AdminApiError::Parse(_)),
            Self::Notification(e) => matches!(
                e,
                NotificationError::ReconnectExhausted(_)
                    | NotificationError::Protocol(_)
                    | NotificationError::Task(_)
            ),
            Self::Config(_) => true,
            Self::Form(_) => false,
        }
    }

    /// Toast text for the operator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => match e {
                AdminApiError::Http(_) => "Không thể kết nối máy chủ.".to_string(),
                AdminApiError::Unauthorized { .. } => {
                    "Bạn không có quyền quản trị hoặc phiên đã hết hạn.".to_string()
                }
                AdminApiError::NotFound(_) => "Không tìm thấy dữ liệu.".to_string(),
                AdminApiError::RateLimited(secs) => {
                    format!("Quá nhiều yêu cầu, thử lại sau {secs} giây.")
                }
                AdminApiError::Api { status, message } if *status < 500 && !message.is_empty() => {
                    message.clone()
                }
                _ => "Máy chủ đang gặp sự cố, vui lòng thử lại sau.".to_string(),
            },
            Self::Notification(NotificationError::ConnectRejected(_)) => {
                "Không thể nhận thông báo: token quản trị không hợp lệ.".to_string()
            }
            Self::Notification(_) => "Mất kết nối thông báo thời gian thực.".to_string(),
            Self::Form(errors) => {
                format!("Vui lòng kiểm tra lại {} trường thông tin.", errors.len())
            }
            Self::Config(_) => "Cấu hình không hợp lệ.".to_string(),
        }
    }

    /// Capture unexpected failures to Sentry and log them with the event id.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin error"
            );
        } else {
            tracing::debug!(error = %self, "Admin error");
        }
    }
}

/// Result type alias for `AdminError`.
pub type Result<T> = std::result::Result<T, AdminError>;

/// Record an operator action as a Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, id: Option<&str>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };
    if let Some(id) = id {
        breadcrumb
            .data
            .insert("id".to_string(), serde_json::Value::String(id.to_string()));
    }
    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AdminError::Api(AdminApiError::NotFound("product p1".to_string()));
        assert_eq!(err.to_string(), "API error: Not found: product p1");
    }

    #[test]
    fn test_user_messages() {
        let mut errors = FormErrors::new();
        errors.add("name", "bắt buộc");
        errors.add("price", "giá không hợp lệ");
        let err = AdminError::from(errors);
        assert_eq!(err.user_message(), "Vui lòng kiểm tra lại 2 trường thông tin.");
        assert!(!err.is_unexpected());

        let err = AdminError::Api(AdminApiError::Api {
            status: 500,
            message: "CastError: Cast to ObjectId failed".to_string(),
        });
        assert!(!err.user_message().contains("CastError"));
        assert!(err.is_unexpected());
    }

    #[test]
    fn test_rejected_socket_is_auth() {
        let err = AdminError::Notification(NotificationError::ConnectRejected(
            "Invalid token".to_string(),
        ));
        assert!(err.is_auth());
        assert!(!err.is_unexpected());
    }
}

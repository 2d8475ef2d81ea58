use std::fmt;

use rusqlite;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    MissingToken,
    Unauthorized,
    Forbidden,
    HttpTimeout,
    RateLimited,
    InvalidResponse,
    InvalidRequest,
    Unavailable,
    Unknown,
}

impl ProviderErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderErrorCode::MissingToken => "MISSING_TOKEN",
            ProviderErrorCode::Unauthorized => "UNAUTHORIZED",
            ProviderErrorCode::Forbidden => "FORBIDDEN",
            ProviderErrorCode::HttpTimeout => "HTTP_TIMEOUT",
            ProviderErrorCode::RateLimited => "RATE_LIMITED",
            ProviderErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ProviderErrorCode::InvalidRequest => "INVALID_REQUEST",
            ProviderErrorCode::Unavailable => "PROVIDER_UNAVAILABLE",
            ProviderErrorCode::Unknown => "UNKNOWN_PROVIDER_ERROR",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("数据库错误: {message}")]
    Database { message: String },

    #[error("记录未找到")]
    NotFound,

    #[error("验证失败: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        details: Option<JsonValue>,
    },

    #[error("{message}")]
    Provider {
        code: ProviderErrorCode,
        message: String,
        correlation_id: Option<String>,
        details: Option<JsonValue>,
    },

    #[error("无效的日期格式: {value}")]
    InvalidDateFormat { value: String },

    #[error("记录缺少必需字段: {field}")]
    MissingField { field: &'static str },

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            source: None,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            source: None,
            details: Some(details),
        }
    }

    pub fn provider(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self::provider_with_details(code, message, None, None)
    }

    pub fn provider_with_details(
        code: ProviderErrorCode,
        message: impl Into<String>,
        correlation_id: Option<&str>,
        details: Option<JsonValue>,
    ) -> Self {
        let message = message.into();
        let correlation = correlation_id.map(|value| value.to_string());
        match (&correlation, &details) {
            (Some(id), Some(payload)) => {
                warn!(
                    target: "app::provider::error",
                    code = %code,
                    correlation_id = %id,
                    details = %payload,
                    %message
                );
            }
            (Some(id), None) => {
                warn!(
                    target: "app::provider::error",
                    code = %code,
                    correlation_id = %id,
                    %message
                );
            }
            (None, Some(payload)) => {
                warn!(target: "app::provider::error", code = %code, details = %payload, %message);
            }
            (None, None) => {
                warn!(target: "app::provider::error", code = %code, %message);
            }
        }

        AppError::Provider {
            code,
            message,
            correlation_id: correlation,
            details,
        }
    }

    pub fn provider_code(&self) -> Option<ProviderErrorCode> {
        match self {
            AppError::Provider { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn provider_correlation_id(&self) -> Option<&str> {
        match self {
            AppError::Provider { correlation_id, .. } => correlation_id.as_deref(),
            _ => None,
        }
    }

    pub fn provider_details(&self) -> Option<&JsonValue> {
        match self {
            AppError::Provider { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    pub fn validation_details(&self) -> Option<&JsonValue> {
        match self {
            AppError::Validation { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    pub fn invalid_date_format(value: impl Into<String>) -> Self {
        let value = value.into();
        warn!(target: "app::time", %value, "unparseable timestamp");
        AppError::InvalidDateFormat { value }
    }

    pub fn missing_field(field: &'static str) -> Self {
        warn!(target: "app::validation", field, "record is missing a required field");
        AppError::MissingField { field }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::database", "resource not found");
        AppError::NotFound
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::database", %message, "database error");
        AppError::Database { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::{QueryReturnedNoRows, SqliteFailure};
        use rusqlite::ErrorCode;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                AppError::database("违反唯一性或约束限制".to_string())
            }
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}

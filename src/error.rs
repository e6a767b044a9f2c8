use std::fmt;

use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

/// Failure classes for the AI scanner endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiErrorCode {
    MissingApiKey,
    Forbidden,
    HttpTimeout,
    RateLimited,
    InvalidResponse,
    InvalidRequest,
    Unavailable,
    Unknown,
}

impl AiErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            AiErrorCode::MissingApiKey => "MISSING_API_KEY",
            AiErrorCode::Forbidden => "FORBIDDEN",
            AiErrorCode::HttpTimeout => "HTTP_TIMEOUT",
            AiErrorCode::RateLimited => "RATE_LIMITED",
            AiErrorCode::InvalidResponse => "INVALID_RESPONSE",
            AiErrorCode::InvalidRequest => "INVALID_REQUEST",
            AiErrorCode::Unavailable => "AI_UNAVAILABLE",
            AiErrorCode::Unknown => "UNKNOWN_AI_ERROR",
        }
    }
}

impl fmt::Display for AiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure classes for the spreadsheet-backed activity gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorCode {
    MissingEndpoint,
    Network,
    Timeout,
    EmptyResponse,
    MalformedResponse,
    RemoteError,
    Misconfigured,
    BreakerOpen,
}

impl GatewayErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            GatewayErrorCode::MissingEndpoint => "MISSING_ENDPOINT",
            GatewayErrorCode::Network => "NETWORK",
            GatewayErrorCode::Timeout => "TIMEOUT",
            GatewayErrorCode::EmptyResponse => "EMPTY_RESPONSE",
            GatewayErrorCode::MalformedResponse => "MALFORMED_RESPONSE",
            GatewayErrorCode::RemoteError => "REMOTE_ERROR",
            GatewayErrorCode::Misconfigured => "MISCONFIGURED",
            GatewayErrorCode::BreakerOpen => "BREAKER_OPEN",
        }
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("record not found")]
    NotFound,

    #[error("record conflict: {message}")]
    Conflict { message: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("{message}")]
    Gateway {
        code: GatewayErrorCode,
        message: String,
    },

    #[error("{message}")]
    Ai {
        code: AiErrorCode,
        message: String,
        correlation_id: Option<String>,
    },

    #[error("no active session")]
    NoSession,

    #[error("insufficient points: need {required}, have {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation { message }
    }

    pub fn gateway(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::gateway", code = %code, %message, "gateway error");
        AppError::Gateway { code, message }
    }

    pub fn ai(code: AiErrorCode, message: impl Into<String>) -> Self {
        Self::ai_with_correlation(code, message, None)
    }

    pub fn ai_with_correlation(
        code: AiErrorCode,
        message: impl Into<String>,
        correlation_id: Option<&str>,
    ) -> Self {
        let message = message.into();
        match correlation_id {
            Some(id) => {
                warn!(target: "app::scan::error", code = %code, correlation_id = %id, %message);
            }
            None => {
                warn!(target: "app::scan::error", code = %code, %message);
            }
        }
        AppError::Ai {
            code,
            message,
            correlation_id: correlation_id.map(|value| value.to_string()),
        }
    }

    pub fn gateway_code(&self) -> Option<GatewayErrorCode> {
        match self {
            AppError::Gateway { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn ai_code(&self) -> Option<AiErrorCode> {
        match self {
            AppError::Ai { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn ai_correlation_id(&self) -> Option<&str> {
        match self {
            AppError::Ai { correlation_id, .. } => correlation_id.as_deref(),
            _ => None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::conflict", %message, "conflict error");
        AppError::Conflict { message }
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

    pub fn insufficient_points(required: i64, available: i64) -> Self {
        warn!(target: "app::points", required, available, "insufficient points");
        AppError::InsufficientPoints {
            required,
            available,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::{QueryReturnedNoRows, SqliteFailure};
        use rusqlite::ErrorCode;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                AppError::conflict("uniqueness or constraint violation")
            }
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}

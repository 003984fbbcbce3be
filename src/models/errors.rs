//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code for logging and monitoring.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - LOOKUP_xxx: external evidence lookup errors
//! - INVALID_xxx: malformed input
//! - API_xxx: HTTP surface errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Evidence Lookup Errors
    // ============================================
    /// External lookup timed out
    LookupTimeout,
    /// Could not reach the external service
    LookupConnectionFailed,
    /// External service responded with an unparseable body
    LookupInvalidResponse,
    /// External service returned an error response
    LookupFailed,

    // ============================================
    // Input Errors
    // ============================================
    /// Address does not match the 20-byte hex format
    InvalidAddress,
    /// Transaction field the analyzer cannot reason about
    InvalidTransaction,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LookupTimeout => "LOOKUP_TIMEOUT",
            Self::LookupConnectionFailed => "LOOKUP_CONNECTION_FAILED",
            Self::LookupInvalidResponse => "LOOKUP_INVALID_RESPONSE",
            Self::LookupFailed => "LOOKUP_FAILED",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::InvalidTransaction => "INVALID_TRANSACTION",
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidAddress | Self::InvalidTransaction | Self::ApiBadRequest => 400,
            Self::ApiRateLimited => 429,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LookupTimeout | Self::LookupConnectionFailed | Self::LookupFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// External lookup timed out
    pub fn lookup_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LookupTimeout, msg)
    }

    /// External service unreachable
    pub fn lookup_connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LookupConnectionFailed, msg)
    }

    /// External service returned garbage
    pub fn lookup_invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LookupInvalidResponse, msg)
    }

    /// External service returned an error
    pub fn lookup_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LookupFailed, msg)
    }

    /// Malformed address
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    /// Structurally unusable transaction
    pub fn invalid_transaction(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransaction, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::LookupTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::LookupConnectionFailed, "Connection failed")
        } else if err.is_decode() {
            Self::with_source(ErrorCode::LookupInvalidResponse, "Response decode error", err)
        } else {
            Self::new(ErrorCode::LookupFailed, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::LookupInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::lookup_timeout("Connection timed out");
        assert_eq!(err.code, ErrorCode::LookupTimeout);
        assert_eq!(err.code_str(), "LOOKUP_TIMEOUT");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::LookupTimeout.is_retryable());
        assert!(ErrorCode::LookupConnectionFailed.is_retryable());
        assert!(!ErrorCode::InvalidAddress.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::LookupFailed.http_status(), 500);
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::invalid_address("not hex");
        assert_eq!(err.to_string(), "[INVALID_ADDRESS] not hex");
    }
}

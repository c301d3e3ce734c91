use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/**
 * 应用错误类型 - 使用 miette 提供用户友好的错误诊断
 *
 * Validation errors are detected before any backend I/O and map to 4xx
 * responses; backend errors from the mandatory query path propagate with
 * the original cause text attached. Best-effort side paths (cache writes,
 * history records, metric samples) never surface these to the caller.
 */
#[derive(Error, Debug, Diagnostic)]
pub enum AppError {
    #[error("Validation error: {0}")]
    #[diagnostic(
        code(logboard::validation_error),
        help("Check that your input meets the required format and constraints")
    )]
    Validation(String),

    #[error("Search backend error during {operation}: {message}")]
    #[diagnostic(
        code(logboard::search_backend_error),
        help("The search engine is unreachable or rejected the query")
    )]
    SearchBackend { operation: String, message: String },

    #[error("Document store error: {0}")]
    #[diagnostic(code(logboard::store_error))]
    Store(String),

    #[error("Cache store error: {0}")]
    #[diagnostic(code(logboard::cache_error))]
    Cache(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(logboard::not_found))]
    NotFound(String),

    #[error("Resource exhausted: {0}")]
    #[diagnostic(code(logboard::resource_exhausted))]
    ResourceExhausted(String),

    #[error("Timed out after {seconds}s during {operation}")]
    #[diagnostic(code(logboard::timeout))]
    Timeout { operation: String, seconds: u64 },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(logboard::config_error))]
    Config(String),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(logboard::serialization_error))]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn search_backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::SearchBackend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn store_error(message: impl Into<String>) -> Self {
        AppError::Store(message.into())
    }

    pub fn cache_error(message: impl Into<String>) -> Self {
        AppError::Cache(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        AppError::ResourceExhausted(message.into())
    }

    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        AppError::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// HTTP status code equivalent for the error envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::ResourceExhausted(_) => 413,
            AppError::Timeout { .. } => 504,
            AppError::SearchBackend { .. }
            | AppError::Store(_)
            | AppError::Cache(_)
            | AppError::Config(_)
            | AppError::Serialization(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Wire-format error envelope: `{"success": false, "error": ..., "code": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    pub code: u16,
}

impl ErrorEnvelope {
    /// Builds the client-facing envelope. Server-side failure detail is only
    /// exposed when `debug_errors` is set; production responses carry a
    /// generic message while the full error goes to the log.
    pub fn from_error(error: &AppError, debug_errors: bool) -> Self {
        let code = error.status_code();
        let message = if error.is_client_error() || debug_errors {
            error.to_string()
        } else {
            "Internal server error".to_string()
        };

        ErrorEnvelope {
            success: false,
            error: message,
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = AppError::search_backend("search_logs", "connection refused");
        assert!(matches!(error, AppError::SearchBackend { .. }));

        let error = AppError::validation("Invalid input");
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(AppError::validation("bad page").status_code(), 400);
        assert_eq!(AppError::not_found("file").status_code(), 404);
        assert_eq!(AppError::timeout("search_logs", 30).status_code(), 504);
        assert_eq!(
            AppError::search_backend("search_logs", "down").status_code(),
            500
        );
    }

    #[test]
    fn test_envelope_hides_internal_detail_in_production() {
        let error = AppError::search_backend("search_logs", "secret host unreachable");

        let prod = ErrorEnvelope::from_error(&error, false);
        assert!(!prod.success);
        assert_eq!(prod.code, 500);
        assert_eq!(prod.error, "Internal server error");

        let debug = ErrorEnvelope::from_error(&error, true);
        assert!(debug.error.contains("secret host unreachable"));
    }

    #[test]
    fn test_envelope_keeps_client_error_detail() {
        let error = AppError::validation("per_page must be greater than 0");
        let envelope = ErrorEnvelope::from_error(&error, false);
        assert_eq!(envelope.code, 400);
        assert!(envelope.error.contains("per_page"));
    }
}

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing backend URL or workspace id.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{0} not found")]
    NotFound(String),

    /// Response body did not have the expected JSON shape.
    #[error("Unexpected response: {0}")]
    Parsing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn missing_backend_url() -> Self {
        Self::Configuration(
            "backend URL is not configured (set NEURA_API_URL or backend.base_url)".to_string(),
        )
    }

    pub fn missing_workspace() -> Self {
        Self::Configuration("no workspace selected".to_string())
    }

    /// Whether the request never left the client.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Validation(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parsing(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_carries_status_and_body() {
        let err = ApiError::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::NotFound("Workspace".to_string());
        assert_eq!(err.to_string(), "Workspace not found");
    }

    #[test]
    fn test_precondition_classification() {
        assert!(ApiError::missing_backend_url().is_precondition());
        assert!(ApiError::Validation("no files".into()).is_precondition());
        assert!(!ApiError::Http {
            status: 500,
            body: String::new()
        }
        .is_precondition());
    }

    #[test]
    fn test_json_error_maps_to_parsing() {
        let err: ApiError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(matches!(err, ApiError::Parsing(_)));
    }
}

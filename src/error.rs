use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Failed to read session file {path}: {source}")]
    SessionRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write session file {path}: {source}")]
    SessionWrite {
        path: String,
        source: std::io::Error,
    },

    #[error("Session file is not valid JSON: {0}")]
    SessionFormat(#[from] serde_json::Error),

    #[error("Invalid config file {path}: {message}")]
    ConfigInvalid { path: String, message: String },

    #[error("No session directory available (HOME not set?)")]
    NoSessionPath,

    #[error("Invalid NPP \"{input}\" (must not be empty)")]
    InvalidNpp { input: String },

    #[error("Invalid notification id \"{input}\"")]
    InvalidId { input: String },

    #[error("{action} failed (see log output above)")]
    ActionFailed { action: String },

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Stream(#[from] StreamError),
}

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Server answered {code} for {url}")]
    Status { url: String, code: u16 },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    /// True when the server produced an HTTP response, whatever its status
    pub(crate) fn is_response(&self) -> bool {
        matches!(self, ApiError::Status { .. } | ApiError::Decode { .. })
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub(crate) enum StreamError {
    #[error("Failed to open notification stream: {0}")]
    Connect(String),

    #[error("Notification stream rejected with status {0}")]
    Rejected(u16),

    #[error("Notification stream read failed: {0}")]
    Read(String),

    #[error("Notification server reported: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_display_npp() {
        let e = AppError::InvalidNpp {
            input: " ".to_string(),
        };
        assert_eq!(e.to_string(), r#"Invalid NPP " " (must not be empty)"#);
    }

    #[test]
    fn api_error_display_status() {
        let e = ApiError::Status {
            url: "http://h/api/notifications/update/3".to_string(),
            code: 500,
        };
        assert_eq!(
            e.to_string(),
            "Server answered 500 for http://h/api/notifications/update/3"
        );
    }

    #[test]
    fn api_error_response_classification() {
        let transport = ApiError::Transport {
            url: "u".to_string(),
            message: "connection refused".to_string(),
        };
        let status = ApiError::Status {
            url: "u".to_string(),
            code: 404,
        };
        let decode = ApiError::Decode {
            url: "u".to_string(),
            message: "eof".to_string(),
        };
        assert!(!transport.is_response());
        assert!(status.is_response());
        assert!(decode.is_response());
    }

    #[test]
    fn app_error_from_api_error() {
        let api = ApiError::Status {
            url: "u".to_string(),
            code: 401,
        };
        let app: AppError = api.into();
        assert_eq!(app.to_string(), "Server answered 401 for u");
    }

    #[test]
    fn stream_error_display() {
        assert_eq!(
            StreamError::Rejected(403).to_string(),
            "Notification stream rejected with status 403"
        );
    }
}

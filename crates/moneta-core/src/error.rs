//! Error types for Moneta

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means the caller has no usable session
    pub fn is_auth(&self) -> bool {
        match self {
            Self::NotAuthenticated => true,
            Self::Backend { status, .. } => *status == 401,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = Error::Backend {
            status: 409,
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error (409): duplicate key value");
    }

    #[test]
    fn test_is_auth() {
        assert!(Error::NotAuthenticated.is_auth());
        assert!(Error::Backend {
            status: 401,
            message: "JWT expired".into()
        }
        .is_auth());
        assert!(!Error::InvalidData("x".into()).is_auth());
    }
}

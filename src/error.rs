//! Error types and handling for the `WindWatch` service

use thiserror::Error;

/// Main error type for the `WindWatch` service
#[derive(Error, Debug)]
pub enum WindWatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather API fetch or decode errors
    #[error("Weather fetch error: {message}")]
    Fetch { message: String },

    /// Email delivery errors
    #[error("Email delivery error: {message}")]
    Email { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WindWatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new weather fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new email delivery error
    pub fn email<S: Into<String>>(message: S) -> Self {
        Self::Email {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for WindWatchError {
    fn from(source: reqwest::Error) -> Self {
        Self::Fetch {
            message: source.to_string(),
        }
    }
}

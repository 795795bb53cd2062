//! Country lookup error kinds and error value helpers.
//!
//! ```rust
//! use gcountry::CountryError;
//!
//! let missing = CountryError::not_found("no such country");
//! assert!(!missing.retryable);
//!
//! let timeout = CountryError::timeout("temporary timeout");
//! assert!(timeout.retryable);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryErrorKind {
    DataLoad,
    NotFound,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    RateLimited,
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryError {
    pub kind: CountryErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl CountryError {
    pub fn new(kind: CountryErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn data_load(message: impl Into<String>) -> Self {
        Self::new(CountryErrorKind::DataLoad, message, false)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(CountryErrorKind::NotFound, message, false)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(CountryErrorKind::InvalidRequest, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(CountryErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(CountryErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CountryErrorKind::Unavailable, message, true)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(CountryErrorKind::RateLimited, message, true)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(CountryErrorKind::Malformed, message, false)
    }
}

impl Display for CountryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for CountryError {}

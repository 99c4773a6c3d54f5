//! Library-wide error types.
//!
//! Every fallible operation in the crate returns [`Result`]. Failures from the
//! transport and from remote error decoding propagate unchanged; nothing in
//! this library retries or swallows an error.
//!
//! # Design
//!
//! - [`Error`]: top-level error enum
//! - [`ApiError`]: a structured error returned by the remote service, with
//!   [`ApiErrorKind`] for discriminating on the numeric code
//! - [`Error::NotFound`] is distinct from an empty value so callers can tell
//!   "not hydrated yet" apart from "confirmed absent"
//!
//! # Example
//!
//! ```ignore
//! use lastfm_client::error::{Error, Result};
//!
//! match client.artists().get(Some("Cher"), None, false) {
//!     Ok(artist) => println!("{artist}"),
//!     Err(Error::NotFound { .. }) => println!("no such artist"),
//!     Err(e) => return Err(e),
//! }
//! ```

use std::fmt;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller did not supply enough identifying information
    #[error("Underspecified request: {0}")]
    UnderspecifiedRequest(String),

    /// The remote service answered with a structured error
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The lookup has no match on the remote service
    #[error("Not found: {namespace} {key:?}")]
    NotFound { namespace: &'static str, key: String },

    /// Transport-level failure (connection, TLS, HTTP status)
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be decoded or had an unexpected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A raw field could not be converted to its typed attribute
    #[error("Invalid value for field '{field}': {message}")]
    Conversion { field: &'static str, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an underspecified-request error.
    pub fn underspecified(message: impl Into<String>) -> Self {
        Self::UnderspecifiedRequest(message.into())
    }

    /// Create a not found error.
    pub fn not_found(namespace: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            namespace,
            key: key.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a conversion error for `field`.
    pub fn conversion(field: &'static str, message: impl Into<String>) -> Self {
        Self::Conversion {
            field,
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// The remote error, if this error came from the service.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::WithContext { source, .. } => source.api_error(),
            _ => None,
        }
    }
}

/// A structured error returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: u32,
    pub message: String,
}

impl ApiError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Classify the numeric code.
    pub fn kind(&self) -> ApiErrorKind {
        ApiErrorKind::from_code(self.code)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, code {})", self.message, self.kind(), self.code)
    }
}

impl std::error::Error for ApiError {}

/// Remote error classes, one per documented service error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidService,
    InvalidMethod,
    AuthenticationFailed,
    InvalidFormat,
    InvalidParameters,
    InvalidResource,
    InvalidSessionKey,
    InvalidApiKey,
    ServiceOffline,
    SubscribersOnly,
    /// Any code without a dedicated class
    Other,
}

impl ApiErrorKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            2 => Self::InvalidService,
            3 => Self::InvalidMethod,
            4 => Self::AuthenticationFailed,
            5 => Self::InvalidFormat,
            6 => Self::InvalidParameters,
            7 => Self::InvalidResource,
            9 => Self::InvalidSessionKey,
            10 => Self::InvalidApiKey,
            11 => Self::ServiceOffline,
            12 => Self::SubscribersOnly,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidService => "invalid service",
            Self::InvalidMethod => "invalid method",
            Self::AuthenticationFailed => "authentication failed",
            Self::InvalidFormat => "invalid format",
            Self::InvalidParameters => "invalid parameters",
            Self::InvalidResource => "invalid resource",
            Self::InvalidSessionKey => "invalid session key",
            Self::InvalidApiKey => "invalid API key",
            Self::ServiceOffline => "service offline",
            Self::SubscribersOnly => "subscribers only",
            Self::Other => "unknown error",
        };
        f.write_str(name)
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serde_json::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Parse(e.to_string()).context(ctx))
    }
}

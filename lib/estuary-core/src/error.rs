//! Error types for the Estuary client.
//!
//! Every failure of a call ends up as one [`Error`]:
//!
//! - local errors ([`Error::Encode`], [`Error::QueryEncode`], [`Error::InvalidUrl`],
//!   [`Error::InvalidRequest`]) are raised before any network I/O;
//! - [`Error::Response`] wraps a [`ResponseError`], for both transport failures
//!   (status code `0`) and non-2xx statuses;
//! - [`Error::Decode`] reports a 2xx response whose body did not match the
//!   expected type.

use derive_more::{Display, Error, From};

const CANCELLED_MESSAGE: &str = "request cancelled";

// ============================================================================
// Structured response error
// ============================================================================

/// Normalized error for a failed exchange.
///
/// `status_code` is `0` and `url` is empty when no response was received.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("request failed: {message}")]
pub struct ResponseError {
    message: String,
    status_code: u16,
    url: String,
    cancelled: bool,
}

impl ResponseError {
    /// A failure before any response was received.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: 0,
            url: String::new(),
            cancelled: false,
        }
    }

    /// A call aborted through its cancellation token.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::transport(CANCELLED_MESSAGE)
        }
    }

    /// A response with a non-2xx status.
    #[must_use]
    pub fn status(status_code: u16, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            url: url.into(),
            cancelled: false,
        }
    }

    /// Human readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, `0` if no response was received.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Request URL, empty if no response was received.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// No response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        self.status_code == 0
    }

    /// The call was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for client operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The JSON request body could not be serialized.
    #[display("JSON serialization error: {_0}")]
    #[from]
    Encode(serde_json::Error),

    /// The query string could not be serialized.
    #[display("query serialization error: {_0}")]
    #[from]
    QueryEncode(serde_html_form::ser::Error),

    /// The host or path did not form a valid URL.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// The request could not be built (e.g. an invalid header value).
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Transport failure or non-2xx status.
    #[display("{_0}")]
    #[from]
    Response(ResponseError),

    /// A 2xx response whose body did not decode into the expected type.
    #[display("unable to decode response from {url} (status {status_code}) at '{path}': {message}")]
    #[from(skip)]
    Decode {
        /// JSON path of the offending field, empty for syntax errors.
        path: String,
        /// Parser message.
        message: String,
        /// HTTP status of the response.
        status_code: u16,
        /// Request URL.
        url: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Response(ResponseError::transport(message))
    }

    /// Create a cancellation error.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::Response(ResponseError::cancelled())
    }

    /// The structured response error, if any.
    #[must_use]
    pub const fn response_error(&self) -> Option<&ResponseError> {
        match self {
            Self::Response(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status code for response and decode errors (`0` for transport errors).
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response(err) => Some(err.status_code),
            Self::Decode { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Request URL for status and decode errors.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Response(err) if !err.is_transport() => Some(err.url()),
            Self::Decode { url, .. } => Some(url),
            _ => None,
        }
    }

    /// No response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Response(err) if err.is_transport())
    }

    /// The server answered with a non-2xx status.
    #[must_use]
    pub const fn is_status(&self) -> bool {
        matches!(self, Self::Response(err) if !err.is_transport())
    }

    /// The server accepted the call but the body could not be decoded.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// The call was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Response(err) if err.is_cancelled())
    }

    /// Raised locally, before any network I/O.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Encode(_) | Self::QueryEncode(_) | Self::InvalidUrl(_) | Self::InvalidRequest(_)
        )
    }
}

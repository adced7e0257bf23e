//! Response classification and error normalization.
//!
//! The executor feeds every exchange outcome through these functions:
//!
//! - no response: [`transport_error`], status code `0`;
//! - 2xx: [`is_success`], the response is passed through untouched;
//! - anything else: [`status_error`], which reads the `{"error": "..."}`
//!   shape the service uses for failures.

use bytes::Bytes;
use serde::Deserialize;

use crate::{Error, ResponseError};

/// Failure body returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    /// Error description.
    pub error: String,
}

/// Status is 2xx.
#[must_use]
pub const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}

/// Error for an exchange that produced no response.
#[must_use]
pub fn transport_error(description: impl Into<String>) -> ResponseError {
    ResponseError::transport(description)
}

/// Error for a non-2xx response.
///
/// `body` is the fully read response body, or a description of why it could
/// not be read. An unreadable body and a body that is not a valid
/// [`ErrorBody`] both produce `unable to decode error response: <detail>`.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use estuary_core::classify::status_error;
///
/// let err = status_error(401, "https://api.estuary.tech/content/add", Ok(Bytes::from(r#"{"error":"bad token"}"#)));
/// assert_eq!(err.message(), "bad token");
/// assert_eq!(err.status_code(), 401);
/// ```
#[must_use]
pub fn status_error(status: u16, url: &str, body: Result<Bytes, String>) -> ResponseError {
    let message = body
        .and_then(|bytes| {
            serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|parsed| parsed.error)
                .map_err(|err| err.to_string())
        })
        .unwrap_or_else(|detail| format!("unable to decode error response: {detail}"));

    ResponseError::status(status, url, message)
}

/// Error for a 2xx response whose body is not the expected shape.
///
/// `path` is the JSON path of the offending field, empty when the body as a
/// whole is unusable.
#[must_use]
pub fn decode_error(
    status: u16,
    url: &str,
    path: impl Into<String>,
    message: impl Into<String>,
) -> Error {
    Error::Decode {
        path: path.into(),
        message: message.into(),
        status_code: status,
        url: url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    const URL: &str = "https://api.estuary.tech/pinning/pins";

    #[test]
    fn success_range() {
        for status in [200, 201, 202, 204, 299] {
            check!(is_success(status), "{status} should be a success");
        }
        for status in [0, 100, 199, 300, 301, 400, 404, 500, 599] {
            check!(!is_success(status), "{status} should not be a success");
        }
    }

    #[test]
    fn error_field_becomes_message() {
        for status in [300, 400, 401, 404, 500, 503] {
            let err = status_error(status, URL, Ok(Bytes::from(r#"{"error":"bad token"}"#)));
            check!(err.message() == "bad token");
            check!(err.status_code() == status);
            check!(err.url() == URL);
        }
    }

    #[test]
    fn unparseable_body_keeps_status() {
        let err = status_error(502, URL, Ok(Bytes::from("<html>Bad Gateway</html>")));
        check!(err.message().starts_with("unable to decode error response: "));
        check!(err.status_code() == 502);
        check!(err.url() == URL);
    }

    #[test]
    fn wrong_shape_is_unparseable() {
        let err = status_error(400, URL, Ok(Bytes::from(r#"{"message":"nope"}"#)));
        check!(err.message().starts_with("unable to decode error response: "));
        check!(err.message().contains("missing field `error`"));
    }

    #[test]
    fn empty_body_is_unparseable() {
        let err = status_error(404, URL, Ok(Bytes::new()));
        check!(err.message().starts_with("unable to decode error response: "));
        check!(err.status_code() == 404);
    }

    #[test]
    fn decode_error_keeps_status_and_url() {
        let err = decode_error(200, URL, "results[0].created", "premature end of input");
        check!(err.is_decode());
        check!(err.status_code() == Some(200));
        check!(err.url() == Some(URL));
        check!(err.to_string().contains("results[0].created"));
    }

    #[test]
    fn unreadable_body_uses_same_format() {
        let err = status_error(500, URL, Err("connection reset".to_string()));
        check!(err.message() == "unable to decode error response: connection reset");
        check!(err.status_code() == 500);
        check!(err.url() == URL);
    }

    #[test]
    fn transport_error_has_zero_status() {
        let err = transport_error("dns error");
        check!(err.status_code() == 0);
        check!(err.url().is_empty());
        check!(err.message() == "dns error");
    }
}

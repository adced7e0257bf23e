//! Successful responses.

use std::fmt;
use std::io;

use bytes::Bytes;
use estuary_core::classify::decode_error;
use estuary_core::{CancellationToken, Result, from_json};
use http::HeaderMap;
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;

use crate::executor::cancellable;

pub(crate) type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// A 2xx response whose body has not been read yet.
///
/// Dropping the response releases the connection body.
pub struct Response {
    status: u16,
    url: String,
    headers: HeaderMap,
    body: ResponseBody,
    cancel: Option<CancellationToken>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl Response {
    pub(crate) fn new(
        status: u16,
        url: String,
        headers: HeaderMap,
        body: ResponseBody,
        cancel: Option<CancellationToken>,
    ) -> Self {
        Self {
            status,
            url,
            headers,
            body,
            cancel,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// URL of the request.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Read the whole body.
    ///
    /// # Errors
    ///
    /// Returns a cancellation error when the call's token fires first, or
    /// [`estuary_core::Error::Decode`] when the body cannot be read to the end.
    pub async fn bytes(self) -> Result<Bytes> {
        let Self {
            status,
            url,
            body,
            cancel,
            ..
        } = self;

        cancellable(cancel.as_ref(), async {
            body.collect()
                .await
                .map(http_body_util::Collected::to_bytes)
                .map_err(|err| {
                    decode_error(
                        status,
                        &url,
                        String::new(),
                        format!("unable to read response body: {err}"),
                    )
                })
        })
        .await
    }

    /// Read the body and decode it as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`Response::bytes`], plus [`estuary_core::Error::Decode`] when the body is
    /// not a valid `T`.
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        let status = self.status;
        let url = self.url.clone();
        let bytes = self.bytes().await?;
        from_json(&bytes, status, &url)
    }
}

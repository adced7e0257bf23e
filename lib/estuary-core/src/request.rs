//! Request descriptors.
//!
//! A [`Request`] carries everything one logical call needs: host, path,
//! query, headers, an optional cancellation token and an optional body. Its
//! setters consume and return the descriptor, and the executor takes it by
//! value, so nothing can change it while the exchange is in flight.
//!
//! # Example
//!
//! ```
//! use estuary_core::Request;
//! use bytes::Bytes;
//!
//! let request = Request::<Bytes>::new("api.estuary.tech", "/content/add-ipfs")
//!     .header("User-Agent", "estuary-client/0.1.0")
//!     .query("root", "QmRoot")
//!     .query("name", "my dag");
//!
//! let url = request.url("https").expect("url");
//! assert_eq!(url.as_str(), "https://api.estuary.tech/content/add-ipfs?name=my+dag&root=QmRoot");
//! ```

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{Headers, JsonBody, Params, Result};

/// Descriptor of one logical API call.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    host: String,
    path: String,
    query: Params,
    headers: Headers,
    cancel: Option<CancellationToken>,
    body: Option<B>,
}

/// The fields of a [`Request`], for the executor.
#[derive(Debug)]
pub struct Parts<B> {
    /// Remote host, optionally with a port.
    pub host: String,
    /// Absolute path, already escaped.
    pub path: String,
    /// Query parameters.
    pub query: Params,
    /// Request headers.
    pub headers: Headers,
    /// Cancellation token bound to the call.
    pub cancel: Option<CancellationToken>,
    /// Request body.
    pub body: Option<B>,
}

impl<B> Request<B> {
    /// Creates a descriptor for `path` on `host`.
    #[must_use]
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            query: Params::new(),
            headers: Headers::new(),
            cancel: None,
            body: None,
        }
    }

    /// Sets a query parameter, replacing previous values.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.set(key, value);
        self
    }

    /// Appends a query value, keeping previous ones.
    #[must_use]
    pub fn query_add(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.add(key, value);
        self
    }

    /// Sets a header, replacing a previous value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Merges headers; the given ones win.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Binds a cancellation token to the call.
    #[must_use]
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Remote host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters.
    #[must_use]
    pub const fn query_params(&self) -> &Params {
        &self.query
    }

    /// Mutable access to query parameters.
    #[must_use]
    pub fn query_params_mut(&mut self) -> &mut Params {
        &mut self.query
    }

    /// Request headers.
    #[must_use]
    pub const fn header_map(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn header_map_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Cancellation token, if any.
    #[must_use]
    pub const fn cancel_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Request body.
    #[must_use]
    pub const fn body_ref(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Full URL of the call for the given scheme.
    ///
    /// The query string is omitted when there are no parameters.
    pub fn url(&self, scheme: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{scheme}://{}", self.host))?;
        url.set_path(&self.path);
        let query = self.query.encode()?;
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// Consume into parts.
    #[must_use]
    pub fn into_parts(self) -> Parts<B> {
        Parts {
            host: self.host,
            path: self.path,
            query: self.query,
            headers: self.headers,
            cancel: self.cancel,
            body: self.body,
        }
    }
}

impl Request<Bytes> {
    /// Set a JSON body with its `Content-Type` and `Content-Length`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Encode`] if serialization fails.
    pub fn json<T: serde::Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = JsonBody::encode(value)?;
        Ok(self
            .header("Content-Type", body.content_type())
            .header("Content-Length", body.content_length().to_string())
            .body(body.into_bytes()))
    }
}

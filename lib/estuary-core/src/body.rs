//! Body serialization utilities.

use bytes::Bytes;

use crate::{Result, classify::decode_error};

/// Content type for JSON request bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// A request body serialized to JSON in memory.
///
/// Unlike a streamed upload, the length is known up front and is sent as an
/// explicit `Content-Length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonBody {
    bytes: Bytes,
}

impl JsonBody {
    /// Serializes `value`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Encode`] if serialization fails; nothing has been sent
    /// at that point.
    ///
    /// # Example
    ///
    /// ```
    /// use estuary_core::JsonBody;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Pin { cid: String }
    ///
    /// let body = JsonBody::encode(&Pin { cid: "QmRoot".to_string() }).expect("serialize");
    /// assert_eq!(body.as_bytes().as_ref(), br#"{"cid":"QmRoot"}"#);
    /// assert_eq!(body.content_length(), 16);
    /// ```
    pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_vec(value)
            .map(|bytes| Self {
                bytes: Bytes::from(bytes),
            })
            .map_err(Into::into)
    }

    /// `Content-Type` header value.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        CONTENT_TYPE_JSON
    }

    /// `Content-Length` header value.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.bytes.len()
    }

    /// Serialized bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consume into the serialized bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Deserialize a response body with path-aware error messages.
///
/// `status_code` and `url` describe the response the bytes came from; they
/// are carried into the [`crate::Error::Decode`] on failure so callers can tell a
/// rejected call from an accepted call with an unexpected body.
///
/// # Example
///
/// ```
/// use estuary_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Health { status: String }
///
/// let health: Health = from_json(br#"{"status":"ok"}"#, 200, "https://api.estuary.tech/health")
///     .expect("deserialize");
/// assert_eq!(health, Health { status: "ok".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(
    bytes: &[u8],
    status_code: u16,
    url: &str,
) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| decode_error(status_code, url, e.path().to_string(), e.inner().to_string()))
}

//! Multipart form data envelope for streamed file uploads.
//!
//! The envelope only produces the framing around a part; the part data itself
//! is streamed through the upload pipe by the caller, so its length never has
//! to be known.
//!
//! # Example
//!
//! ```
//! use estuary_core::MultipartEnvelope;
//!
//! let envelope = MultipartEnvelope::with_boundary("b0und");
//! assert_eq!(envelope.content_type(), "multipart/form-data; boundary=b0und");
//!
//! let mut body = envelope.file_part_header("data", "notes.txt").to_vec();
//! body.extend_from_slice(b"hello");
//! body.extend_from_slice(&envelope.trailer());
//! assert!(body.ends_with(b"hello\r\n--b0und--\r\n"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{BufMut, Bytes, BytesMut};

/// Form field name the service expects uploaded content under.
pub const UPLOAD_FIELD_NAME: &str = "data";

/// Content type written for streamed file parts.
const FILE_PART_CONTENT_TYPE: &str = "application/octet-stream";

/// Boundary and framing for a single-file multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartEnvelope {
    boundary: String,
}

impl Default for MultipartEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartEnvelope {
    /// Creates an envelope with a freshly generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: generate_boundary(),
        }
    }

    /// Creates an envelope with a fixed boundary.
    ///
    /// The boundary must not appear in the part data.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    /// The boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value: `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Opening boundary and headers of a file part, up to and including the
    /// blank line that precedes the data.
    #[must_use]
    pub fn file_part_header(&self, name: &str, filename: &str) -> Bytes {
        let mut buf = BytesMut::new();

        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"\r\n");

        buf.put_slice(b"Content-Disposition: form-data; name=\"");
        buf.put_slice(escape_quotes(name).as_bytes());
        buf.put_slice(b"\"; filename=\"");
        buf.put_slice(escape_quotes(filename).as_bytes());
        buf.put_slice(b"\"\r\n");

        buf.put_slice(b"Content-Type: ");
        buf.put_slice(FILE_PART_CONTENT_TYPE.as_bytes());
        buf.put_slice(b"\r\n");

        buf.put_slice(b"\r\n");

        buf.freeze()
    }

    /// End of the part data and the closing boundary.
    #[must_use]
    pub fn trailer(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_slice(b"\r\n--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");
        buf.freeze()
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Generate a boundary string unique within the process.
fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("----EstuaryBoundary{timestamp:x}{sequence:04x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_content_type() {
        let envelope = MultipartEnvelope::with_boundary("test-boundary");
        assert_eq!(
            envelope.content_type(),
            "multipart/form-data; boundary=test-boundary"
        );
    }

    #[test]
    fn envelope_generated_boundaries_differ() {
        let a = MultipartEnvelope::new();
        let b = MultipartEnvelope::new();
        assert!(a.boundary().starts_with("----EstuaryBoundary"));
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn file_part_framing() {
        let envelope = MultipartEnvelope::with_boundary("boundary123");

        let mut body = envelope.file_part_header(UPLOAD_FIELD_NAME, "dump.car").to_vec();
        body.extend_from_slice(b"file content");
        body.extend_from_slice(&envelope.trailer());

        insta::assert_snapshot!(String::from_utf8_lossy(&body).replace("\r\n", "\n"), @r#"
        --boundary123
        Content-Disposition: form-data; name="data"; filename="dump.car"
        Content-Type: application/octet-stream

        file content
        --boundary123--
        "#);
        assert!(body.starts_with(b"--boundary123\r\n"));
        assert!(body.ends_with(b"file content\r\n--boundary123--\r\n"));
    }

    #[test]
    fn filename_quotes_are_escaped() {
        let envelope = MultipartEnvelope::with_boundary("b");
        let header = envelope.file_part_header("data", r#"my "best" \ file"#);
        let header = String::from_utf8_lossy(&header);
        assert!(header.contains(r#"filename="my \"best\" \\ file""#));
    }

    #[test]
    fn empty_part() {
        let envelope = MultipartEnvelope::with_boundary("b");
        let mut body = envelope.file_part_header("data", "empty").to_vec();
        body.extend_from_slice(&envelope.trailer());
        assert!(body.ends_with(b"\r\n\r\n\r\n--b--\r\n"));
    }
}

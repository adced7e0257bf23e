//! Core types for the Estuary client.
//!
//! This crate holds everything about a call that does not touch the network:
//! - [`Params`] and [`Headers`] - query and header containers
//! - [`Request`] - descriptor of one logical call
//! - [`Method`] - the HTTP verbs the service uses
//! - [`JsonBody`] and [`from_json`] - JSON body encoding and decoding
//! - [`MultipartEnvelope`] - framing for streamed file uploads
//! - [`pipe`] and [`spawn_multipart_upload`] - the streaming upload pipeline
//! - [`classify`] - response classification and error normalization
//! - [`Error`], [`ResponseError`] and [`Result`] - error handling

mod body;
pub mod classify;
mod error;
mod method;
mod multipart;
mod params;
mod pipe;
pub mod prelude;
mod request;
mod upload;

pub use body::{CONTENT_TYPE_JSON, JsonBody, from_json};
pub use error::{Error, ResponseError, Result};
pub use method::Method;
pub use multipart::{MultipartEnvelope, UPLOAD_FIELD_NAME};
pub use params::{Headers, Params};
pub use pipe::{DEFAULT_PIPE_CAPACITY, PipeReader, PipeWriter, pipe};
pub use request::{Parts, Request};
pub use upload::{UploadTask, spawn_multipart_upload};

// Re-export the cancellation token bound to requests
pub use tokio_util::sync::CancellationToken;

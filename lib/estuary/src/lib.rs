//! Async client for the Estuary content storage and pinning API.
//!
//! Each endpoint method prepares a call value; sending it builds one HTTP
//! exchange, classifies the response and decodes the JSON body. Uploads stream
//! the source through a bounded pipe as `multipart/form-data`, so the file is
//! never held in memory.
//!
//! # Example
//!
//! ```no_run
//! use estuary::prelude::*;
//!
//! # async fn run() -> estuary::Result<()> {
//! let client = Client::default().with_token("EST-secret");
//!
//! let file = tokio::fs::File::open("photo.jpg").await.map_err(|e| Error::invalid_request(e.to_string()))?;
//! let added = client.content_add("photo.jpg", file).send().await?;
//!
//! let status = client.pins().add(&added.cid).name("photo").collection("holiday").send().await?;
//! println!("pin {} is {}", status.request_id, status.status);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connector;
mod executor;
mod pins;
pub mod prelude;
mod response;
pub mod types;

pub use client::{AuthedClient, Call, Client, ContentAddCall, ContentAddIpfsCall, EmptyCall};
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_HOST, DEFAULT_USER_AGENT, Scheme, VERSION,
};
pub use connector::https_connector;
pub use executor::Executor;
pub use pins::{PinCall, PinServices};
pub use response::Response;

// Re-export core types
pub use estuary_core::{
    CancellationToken, Error, Headers, Method, Params, Request, ResponseError, Result,
};

//! Prelude module for convenient imports.
//!
//! ```ignore
//! use estuary::prelude::*;
//! ```

pub use crate::types::{AddedContent, IpfsPin, IpfsPinStatus, PinList};
pub use crate::{
    AuthedClient, CancellationToken, Client, ClientConfig, Error, ResponseError, Result, Scheme,
};

//! Prelude module for convenient imports.
//!
//! ```ignore
//! use estuary_core::prelude::*;
//! ```

pub use crate::{
    CancellationToken, Error, Headers, JsonBody, Method, Params, Request, ResponseError, Result,
    from_json,
};

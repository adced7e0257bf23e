//! Pinning service endpoints.

use estuary_core::{CancellationToken, Method, Result};
use serde_json::{Map, Value};

use crate::client::{AuthedClient, Call, EmptyCall, escape_segment};
use crate::types::{IpfsPin, IpfsPinStatus, PinList};

const PINS_PATH: &str = "/pinning/pins";

/// Access to the IPFS pinning service API of a node.
#[derive(Debug, Clone)]
pub struct PinServices {
    client: AuthedClient,
}

impl PinServices {
    pub(crate) const fn new(client: AuthedClient) -> Self {
        Self { client }
    }

    /// List pins.
    pub fn list(&self) -> Call<PinList> {
        self.client.call(Method::Get, PINS_PATH)
    }

    /// Pin `cid`.
    pub fn add(&self, cid: &str) -> PinCall {
        PinCall::new(self.client.call(Method::Post, PINS_PATH), cid)
    }

    /// Status of a pin request.
    pub fn get(&self, request_id: &str) -> Call<IpfsPinStatus> {
        self.client.call(Method::Get, pin_path(request_id))
    }

    /// Replace the pin of a request with `cid`.
    pub fn replace(&self, request_id: &str, cid: &str) -> PinCall {
        PinCall::new(self.client.call(Method::Post, pin_path(request_id)), cid)
    }

    /// Remove a pin.
    pub fn delete(&self, request_id: &str) -> EmptyCall {
        self.client.empty_call(Method::Delete, pin_path(request_id))
    }
}

fn pin_path(request_id: &str) -> String {
    format!("{PINS_PATH}/{}", escape_segment(request_id))
}

/// A prepared pin add or replace.
#[derive(Debug)]
#[must_use = "calls do nothing unless sent"]
pub struct PinCall {
    call: Call<IpfsPinStatus>,
    pin: IpfsPin,
}

impl PinCall {
    fn new(call: Call<IpfsPinStatus>, cid: &str) -> Self {
        Self {
            call,
            pin: IpfsPin::new(cid),
        }
    }

    /// Name for the pin.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.pin.name = name.into();
        self
    }

    /// Collection for the pin, stored as `meta.collection`.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.pin
            .meta
            .insert("collection".to_string(), Value::String(collection.into()));
        self
    }

    /// Add peers known to have the content, as multiaddresses.
    pub fn origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pin.origins.extend(origins.into_iter().map(Into::into));
        self
    }

    /// Merge metadata into the pin; given keys win.
    pub fn meta(mut self, meta: Map<String, Value>) -> Self {
        self.pin.meta.extend(meta);
        self
    }

    /// Abort the call when `token` is cancelled.
    pub fn cancel_with(self, token: CancellationToken) -> Self {
        Self {
            call: self.call.cancel_with(token),
            pin: self.pin,
        }
    }

    /// The pin payload that will be sent.
    #[must_use]
    pub const fn pin(&self) -> &IpfsPin {
        &self.pin
    }

    /// Send the pin as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`estuary_core::Error::Encode`] if the metadata cannot be
    /// serialized, otherwise the same errors as [`Call::send`].
    pub async fn send(self) -> Result<IpfsPinStatus> {
        let Self { call, pin } = self;
        call.try_map_request(|request| request.json(&pin))?
            .send()
            .await
    }
}

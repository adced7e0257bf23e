//! Typed façades over the executor.
//!
//! Every endpoint method returns a call value. Nothing touches the network
//! until the call is sent, and each call is sent at most once.
//!
//! # Example
//!
//! ```no_run
//! use estuary::{Client, CancellationToken};
//!
//! # async fn run() -> estuary::Result<()> {
//! let client = Client::default();
//! let health = client.health().send().await?;
//! println!("status: {}", health.status);
//!
//! let token = CancellationToken::new();
//! let authed = client.with_token("EST-secret");
//! let pins = authed.pins().list().cancel_with(token).send().await?;
//! println!("{} pins", pins.count);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use estuary_core::{CancellationToken, Method, Request, Result, UPLOAD_FIELD_NAME};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;

use crate::{
    config::ClientConfig,
    executor::Executor,
    pins::PinServices,
    types::{
        AddedContent, ContentInfo, Health, IpfsPinStatus, MinerDeal, MinerDealFailure,
        MinerStats, MinerStorageAsk, PublicNodeInfo, PublicStats,
    },
};

/// Characters kept as-is in a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Escape `value` for use as one path segment.
pub(crate) fn escape_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// A prepared call decoding a JSON `T` on success.
#[must_use = "calls do nothing unless sent"]
pub struct Call<T> {
    executor: Executor,
    method: Method,
    request: Request,
    output: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("method", &self.method)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl<T> Call<T> {
    pub(crate) const fn new(executor: Executor, method: Method, request: Request) -> Self {
        Self {
            executor,
            method,
            request,
            output: PhantomData,
        }
    }

    /// Abort the call when `token` is cancelled.
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.request = self.request.cancel_with(token);
        self
    }

    /// The request this call will send.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    pub(crate) fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub(crate) fn try_map_request<F>(mut self, f: F) -> Result<Self>
    where
        F: FnOnce(Request) -> Result<Request>,
    {
        self.request = f(self.request)?;
        Ok(self)
    }
}

impl<T: DeserializeOwned> Call<T> {
    /// Send the request and decode the response.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error from the exchange, or a decode
    /// error when the response is not a valid `T`.
    pub async fn send(self) -> Result<T> {
        self.executor
            .execute(self.method, self.request)
            .await?
            .json()
            .await
    }
}

/// A prepared call whose response body is ignored.
#[derive(Debug)]
#[must_use = "calls do nothing unless sent"]
pub struct EmptyCall {
    executor: Executor,
    method: Method,
    request: Request,
}

impl EmptyCall {
    pub(crate) const fn new(executor: Executor, method: Method, request: Request) -> Self {
        Self {
            executor,
            method,
            request,
        }
    }

    /// Abort the call when `token` is cancelled.
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.request = self.request.cancel_with(token);
        self
    }

    /// The request this call will send.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Send the request.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error from the exchange.
    pub async fn send(self) -> Result<()> {
        self.executor.execute(self.method, self.request).await?;
        Ok(())
    }
}

/// Client for the endpoints that need no authentication.
#[derive(Debug, Clone, Default)]
pub struct Client {
    executor: Executor,
}

impl Client {
    /// Create a client with its own connection pool.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::from_executor(Executor::new(config))
    }

    /// Create a client sharing an existing executor.
    #[must_use]
    pub const fn from_executor(executor: Executor) -> Self {
        Self { executor }
    }

    /// The executor used by this client.
    #[must_use]
    pub const fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Effective `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> String {
        self.executor.config().user_agent()
    }

    /// Client for authenticated endpoints, sharing this client's transport
    /// and configuration.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> AuthedClient {
        AuthedClient {
            executor: self.executor.clone(),
            token: token.into(),
        }
    }

    /// Request descriptor for `path` with the default headers.
    #[must_use]
    pub fn new_request(&self, path: impl Into<String>) -> Request {
        base_request(&self.executor, path)
    }

    fn get<T>(&self, path: impl Into<String>) -> Call<T> {
        Call::new(self.executor.clone(), Method::Get, self.new_request(path))
    }

    /// Health of the node.
    pub fn health(&self) -> Call<Health> {
        self.get("/health")
    }

    /// Storage statistics of the node.
    pub fn public_stats(&self) -> Call<PublicStats> {
        self.get("/public/stats")
    }

    /// Public information about the node.
    pub fn public_node_info(&self) -> Call<PublicNodeInfo> {
        self.get("/public/info")
    }

    /// Content records for a CID.
    pub fn public_content_by_cid(&self, cid: &str) -> Call<Vec<ContentInfo>> {
        self.get(format!("/public/by-cid/{}", escape_segment(cid)))
    }

    /// Statistics about a miner.
    pub fn public_miner_stats(&self, miner: &str) -> Call<MinerStats> {
        self.get(format!("/public/miners/stats/{}", escape_segment(miner)))
    }

    /// Deals made with a miner.
    pub fn public_miner_deals(&self, miner: &str) -> Call<Vec<MinerDeal>> {
        self.get(format!("/public/miners/deals/{}", escape_segment(miner)))
    }

    /// Failed deal attempts with a miner.
    pub fn public_miner_failures(&self, miner: &str) -> Call<Vec<MinerDealFailure>> {
        self.get(format!("/public/miners/failures/{}", escape_segment(miner)))
    }

    /// Storage price asked by a miner.
    pub fn public_miner_storage_ask(&self, miner: &str) -> Call<MinerStorageAsk> {
        self.get(format!(
            "/public/miners/storage/query/{}",
            escape_segment(miner)
        ))
    }
}

fn base_request<B>(executor: &Executor, path: impl Into<String>) -> Request<B> {
    let config = executor.config();
    Request::new(config.host.clone(), path).header("User-Agent", config.user_agent())
}

/// Client for endpoints that need an API token.
#[derive(Clone)]
pub struct AuthedClient {
    executor: Executor,
    token: String,
}

impl fmt::Debug for AuthedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthedClient")
            .field("executor", &self.executor)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl AuthedClient {
    /// Create an authenticated client with its own connection pool.
    #[must_use]
    pub fn new(config: ClientConfig, token: impl Into<String>) -> Self {
        Client::new(config).with_token(token)
    }

    /// Effective `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> String {
        self.executor.config().user_agent()
    }

    /// Request descriptor for `path` with the default and bearer headers.
    #[must_use]
    pub fn new_request(&self, path: impl Into<String>) -> Request {
        self.authed_request(path)
    }

    fn authed_request<B>(&self, path: impl Into<String>) -> Request<B> {
        base_request(&self.executor, path)
            .header("Authorization", format!("Bearer {}", self.token))
    }

    pub(crate) fn call<T>(&self, method: Method, path: impl Into<String>) -> Call<T> {
        Call::new(self.executor.clone(), method, self.new_request(path))
    }

    pub(crate) fn empty_call(&self, method: Method, path: impl Into<String>) -> EmptyCall {
        EmptyCall::new(self.executor.clone(), method, self.new_request(path))
    }

    /// Upload `source` as new content named `name`.
    pub fn content_add<R>(&self, name: impl Into<String>, source: R) -> ContentAddCall<R>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        ContentAddCall {
            executor: self.executor.clone(),
            request: self.authed_request("/content/add"),
            filename: name.into(),
            source,
        }
    }

    /// Pin existing IPFS content rooted at `root`.
    pub fn content_add_ipfs(&self, root: &str) -> ContentAddIpfsCall {
        let mut call = self.call(Method::Post, "/content/add-ipfs");
        call.request_mut().query_params_mut().set("root", root);
        ContentAddIpfsCall { call }
    }

    /// Pinning service endpoints.
    #[must_use]
    pub fn pins(&self) -> PinServices {
        PinServices::new(self.clone())
    }
}

/// A prepared streamed upload.
#[must_use = "calls do nothing unless sent"]
pub struct ContentAddCall<R> {
    executor: Executor,
    request: Request<()>,
    filename: String,
    source: R,
}

impl<R> fmt::Debug for ContentAddCall<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAddCall")
            .field("request", &self.request)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

impl<R> ContentAddCall<R>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    /// Abort the upload when `token` is cancelled.
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.request = self.request.cancel_with(token);
        self
    }

    /// Stream the source and decode the stored content.
    ///
    /// # Errors
    ///
    /// A source read failure surfaces as a transport error carrying the
    /// source's message.
    pub async fn send(self) -> Result<AddedContent> {
        self.executor
            .execute_upload(self.request, UPLOAD_FIELD_NAME, &self.filename, self.source)
            .await?
            .json()
            .await
    }
}

/// A prepared pin of existing IPFS content.
#[derive(Debug)]
#[must_use = "calls do nothing unless sent"]
pub struct ContentAddIpfsCall {
    call: Call<IpfsPinStatus>,
}

impl ContentAddIpfsCall {
    /// Name for the content.
    pub fn name(mut self, name: &str) -> Self {
        self.call.request_mut().query_params_mut().set("name", name);
        self
    }

    /// Collection to add the content to.
    pub fn collection(mut self, collection: &str) -> Self {
        self.call
            .request_mut()
            .query_params_mut()
            .set("collection", collection);
        self
    }

    /// Peers known to have the content, as multiaddresses.
    pub fn peers<I, S>(mut self, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = peers
            .into_iter()
            .map(|peer| peer.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.call.request_mut().query_params_mut().set("peers", joined);
        self
    }

    /// Abort the call when `token` is cancelled.
    pub fn cancel_with(self, token: CancellationToken) -> Self {
        Self {
            call: self.call.cancel_with(token),
        }
    }

    /// The request this call will send.
    #[must_use]
    pub const fn request(&self) -> &Request<Bytes> {
        self.call.request()
    }

    /// Send the request.
    ///
    /// # Errors
    ///
    /// Same as [`Call::send`].
    pub async fn send(self) -> Result<IpfsPinStatus> {
        self.call.send().await
    }
}

//! HTTP exchange execution using hyper-util.

use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use bytes::Bytes;
use estuary_core::{
    CancellationToken, Error, Headers, Method, MultipartEnvelope, Request, Result, classify,
    spawn_multipart_upload,
};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::io::AsyncRead;
use tracing::{Instrument, Level, debug, info, span, warn};
use url::Url;

use crate::{config::ClientConfig, connector::https_connector, response::Response};

type RequestBody = UnsyncBoxBody<Bytes, io::Error>;

/// Runs request descriptors against the service.
///
/// Cloning is cheap: clones share the connection pool.
#[derive(Clone)]
pub struct Executor {
    inner: Client<HttpsConnector<HttpConnector>, RequestBody>,
    config: ClientConfig,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Executor {
    /// Create an executor with its own connection pool.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let connector = https_connector(config.connect_timeout);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform one exchange.
    ///
    /// A 2xx response is returned with its body unread. Anything else ends
    /// in an error: a [`estuary_core::ResponseError`] with status 0 when no
    /// response arrived, or with the response status and the server's
    /// message otherwise.
    ///
    /// # Errors
    ///
    /// Local errors (bad URL, bad header) are returned before any I/O.
    pub async fn execute(&self, method: Method, request: Request<Bytes>) -> Result<Response> {
        let url = request.url(self.config.scheme.as_str())?;
        let parts = request.into_parts();

        let body = parts
            .body
            .map_or_else(Full::default, Full::new)
            .map_err(|never| match never {})
            .boxed_unsync();
        let http_request = build_http_request(method, &url, &parts.headers, body)?;

        self.dispatch(
            method,
            url,
            http_request,
            parts.cancel,
            Some(self.config.timeout),
        )
        .await
    }

    /// Stream `source` as a single-file multipart POST.
    ///
    /// The file is sent in the form field `name` with the given filename. The
    /// body is produced by a background task while the exchange is in flight;
    /// the task is joined before this returns. If the exchange failed because
    /// the source or the producer failed, the error carries that failure's
    /// message.
    ///
    /// The configured request timeout does not apply here, since the
    /// duration depends on the size of the source.
    ///
    /// # Errors
    ///
    /// Same as [`Executor::execute`].
    pub async fn execute_upload<R>(
        &self,
        request: Request<()>,
        name: &str,
        filename: &str,
        source: R,
    ) -> Result<Response>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let envelope = MultipartEnvelope::new();
        let request = request.header("Content-Type", envelope.content_type());
        let url = request.url(self.config.scheme.as_str())?;
        let mut parts = request.into_parts();
        // The length is unknown, the body goes out chunked.
        parts.headers.remove("Content-Length");

        // Built before spawning the producer so a bad header fails without I/O.
        let http_request = build_http_request(Method::Post, &url, &parts.headers, empty_body())?;

        let (reader, task) = spawn_multipart_upload(
            &envelope,
            name,
            filename,
            source,
            self.config.upload_buffer,
            parts.cancel.clone(),
        );
        let http_request = http_request.map(|_| reader.boxed_unsync());

        let result = self
            .dispatch(Method::Post, url, http_request, parts.cancel, None)
            .await;
        let producer_error = task.join().await;

        settle_upload(result, producer_error)
    }

    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        http_request: http::Request<RequestBody>,
        cancel: Option<CancellationToken>,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let span = span!(Level::INFO, "estuary_request", %method, %url);

        async move {
            let start = Instant::now();
            debug!("sending request");

            let send = self.inner.request(http_request);
            let sent = async {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, send)
                        .await
                        .map_err(|_| Error::transport(format!("request timed out after {limit:?}")))
                        .and_then(|sent| sent.map_err(map_hyper_error)),
                    None => send.await.map_err(map_hyper_error),
                }
            };

            let response = match cancellable(cancel.as_ref(), sent).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(error = %err, elapsed_ms = elapsed_ms(start), "request failed");
                    return Err(err);
                }
            };

            let status = response.status().as_u16();
            let url = url.to_string();
            let (head, body) = response.into_parts();
            let body = body.map_err(io::Error::other).boxed_unsync();

            if classify::is_success(status) {
                info!(status, elapsed_ms = elapsed_ms(start), "request completed");
                return Ok(Response::new(status, url, head.headers, body, cancel));
            }

            let raw = cancellable(cancel.as_ref(), async {
                Ok(body
                    .collect()
                    .await
                    .map(http_body_util::Collected::to_bytes)
                    .map_err(|err| err.to_string()))
            })
            .await?;
            let err = classify::status_error(status, &url, raw);
            warn!(
                status,
                elapsed_ms = elapsed_ms(start),
                message = err.message(),
                "request failed with error status"
            );
            Err(err.into())
        }
        .instrument(span)
        .await
    }
}

/// Race `future` against the cancellation token, if any.
pub(crate) async fn cancellable<T, F>(cancel: Option<&CancellationToken>, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(Error::cancelled()),
                result = future => result,
            }
        }
        None => future.await,
    }
}

/// Combine the exchange outcome with the producer's failure, if any.
fn settle_upload(result: Result<Response>, producer_error: Option<io::Error>) -> Result<Response> {
    // A broken pipe only means the exchange dropped the body first.
    let producer_error = producer_error.filter(|cause| cause.kind() != io::ErrorKind::BrokenPipe);
    match (result, producer_error) {
        (Err(Error::Response(err)), Some(cause)) if err.is_transport() && !err.is_cancelled() => {
            warn!(error = %cause, "upload source failed");
            Err(Error::transport(cause.to_string()))
        }
        (Ok(response), Some(cause)) => {
            warn!(
                status = response.status(),
                error = %cause,
                "upload source failed after the response arrived"
            );
            Ok(response)
        }
        (result, _) => result,
    }
}

fn empty_body() -> RequestBody {
    Full::<Bytes>::default()
        .map_err(|never| match never {})
        .boxed_unsync()
}

fn build_http_request(
    method: Method,
    url: &Url,
    headers: &Headers,
    body: RequestBody,
) -> Result<http::Request<RequestBody>> {
    let mut builder = http::Request::builder()
        .method(http::Method::from(method))
        .uri(url.as_str());

    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }

    builder
        .body(body)
        .map_err(|e| Error::invalid_request(e.to_string()))
}

#[allow(clippy::needless_pass_by_value)]
fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
    Error::Response(classify::transport_error(describe(&err)))
}

/// Error message followed by its sources.
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

//! Streaming multipart upload producer.
//!
//! [`spawn_multipart_upload`] starts one background task that frames a byte
//! source as a single multipart file part and feeds it into a [`pipe`]. The
//! returned [`PipeReader`] is the request body; the returned [`UploadTask`]
//! must be joined (or dropped, which aborts it) before the call completes.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::multipart::MultipartEnvelope;
use crate::pipe::{PipeReader, PipeWriter, pipe};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Spawns the producer for a streamed single-file multipart body.
///
/// The producer writes the part header, copies `source` in chunks, writes the
/// trailer and closes the pipe. A source read error, a pipe write error or
/// cancellation closes the pipe with that error instead.
///
/// Must be called within a Tokio runtime.
pub fn spawn_multipart_upload<R>(
    envelope: &MultipartEnvelope,
    name: &str,
    filename: &str,
    source: R,
    capacity: usize,
    cancel: Option<CancellationToken>,
) -> (PipeReader, UploadTask)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (writer, reader) = pipe(capacity);
    let header = envelope.file_part_header(name, filename);
    let trailer = envelope.trailer();

    let handle = tokio::spawn(async move {
        let outcome = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(io::Error::new(
                        io::ErrorKind::Interrupted,
                        "upload cancelled",
                    )),
                    result = produce(&writer, header, source, trailer) => result,
                }
            }
            None => produce(&writer, header, source, trailer).await,
        };

        match outcome {
            Ok(()) => {
                writer.close();
                Ok(())
            }
            Err(err) => {
                let copy = io::Error::new(err.kind(), err.to_string());
                writer.close_with_error(err);
                Err(copy)
            }
        }
    });

    (
        reader,
        UploadTask {
            handle: Some(handle),
        },
    )
}

async fn produce<R>(writer: &PipeWriter, header: Bytes, mut source: R, trailer: Bytes) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    writer.write(header).await?;
    loop {
        let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
        if source.read_buf(&mut buf).await? == 0 {
            break;
        }
        writer.write(buf.freeze()).await?;
    }
    writer.write(trailer).await
}

/// Handle on the producer task of a streamed upload.
///
/// Dropping the handle aborts the producer.
#[derive(Debug)]
pub struct UploadTask {
    handle: Option<JoinHandle<io::Result<()>>>,
}

impl UploadTask {
    /// Stops the producer if it is still running and waits for it.
    ///
    /// Returns the error the producer closed the pipe with, if any. A
    /// producer that had already finished keeps its outcome.
    pub async fn join(mut self) -> Option<io::Error> {
        let handle = self.handle.take()?;
        handle.abort();
        match handle.await {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(join_err) if join_err.is_cancelled() => None,
            Err(join_err) => Some(io::Error::other(join_err.to_string())),
        }
    }
}

impl Drop for UploadTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use assert2::{check, let_assert};
    use http_body_util::BodyExt;
    use tokio::io::ReadBuf;

    use super::*;

    /// Yields `good` bytes, then fails.
    struct FailingReader {
        good: Vec<u8>,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.good.is_empty() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "source went away",
                )));
            }
            let n = self.good.len().min(buf.remaining());
            let rest = self.good.split_off(n);
            buf.put_slice(&self.good);
            self.good = rest;
            Poll::Ready(Ok(()))
        }
    }

    fn envelope() -> MultipartEnvelope {
        MultipartEnvelope::with_boundary("xyz")
    }

    #[tokio::test]
    async fn frames_source_as_single_part() {
        let source: &'static [u8] = b"some car bytes";
        let (reader, task) = spawn_multipart_upload(&envelope(), "data", "f.car", source, 2, None);

        let body = reader.collect().await.expect("collect").to_bytes();
        check!(task.join().await.is_none());

        let mut expected = envelope().file_part_header("data", "f.car").to_vec();
        expected.extend_from_slice(b"some car bytes");
        expected.extend_from_slice(&envelope().trailer());
        check!(body.as_ref() == expected.as_slice());
    }

    #[tokio::test]
    async fn large_source_is_streamed_intact() {
        let data: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        let (reader, task) =
            spawn_multipart_upload(&envelope(), "data", "big", std::io::Cursor::new(data.clone()), 2, None);

        let body = reader.collect().await.expect("collect").to_bytes();
        check!(task.join().await.is_none());

        let header_len = envelope().file_part_header("data", "big").len();
        let trailer_len = envelope().trailer().len();
        let_assert!(Some(payload) = body.get(header_len..body.len() - trailer_len));
        check!(payload == data.as_slice());
    }

    #[tokio::test]
    async fn source_error_reaches_reader_and_task() {
        let source = FailingReader {
            good: b"partial".to_vec(),
        };
        let (reader, task) = spawn_multipart_upload(&envelope(), "data", "f", source, 4, None);

        let_assert!(Err(err) = reader.collect().await);
        check!(err.kind() == io::ErrorKind::ConnectionReset);
        check!(err.to_string() == "source went away");

        let_assert!(Some(task_err) = task.join().await);
        check!(task_err.to_string() == "source went away");
    }

    #[tokio::test]
    async fn cancellation_closes_pipe_with_error() {
        let token = CancellationToken::new();
        // a source that never ends
        let (source, _keep_open) = tokio::io::duplex(16);
        let (reader, task) =
            spawn_multipart_upload(&envelope(), "data", "f", source, 1, Some(token.clone()));

        token.cancel();

        let_assert!(Err(err) = reader.collect().await);
        check!(err.kind() == io::ErrorKind::Interrupted);
        check!(task.join().await.is_some());
    }

    #[tokio::test]
    async fn join_stops_a_blocked_producer() {
        let (source, _keep_open) = tokio::io::duplex(16);
        let (reader, task) = spawn_multipart_upload(&envelope(), "data", "f", source, 1, None);

        let joined = tokio::time::timeout(std::time::Duration::from_secs(5), task.join()).await;
        check!(matches!(joined, Ok(None)));
        drop(reader);
    }
}

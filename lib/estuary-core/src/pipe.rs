//! Bounded in-memory pipe used as a streaming request body.
//!
//! A [`PipeWriter`] pushes chunks that a [`PipeReader`] hands to the HTTP
//! layer as body frames. Writes wait while the pipe is full, so the producer
//! can never run ahead of the connection by more than the pipe capacity.
//!
//! The writer ends the stream with exactly one of [`PipeWriter::close`] or
//! [`PipeWriter::close_with_error`]. A writer dropped without either is seen
//! by the reader as an error, never as a complete body.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use tokio::sync::mpsc;

/// Default number of chunks buffered between writer and reader.
pub const DEFAULT_PIPE_CAPACITY: usize = 8;

#[derive(Debug, Default)]
enum CloseState {
    #[default]
    Open,
    Clean,
    Failed(io::Error),
}

type Shared = Arc<Mutex<CloseState>>;

/// Creates a pipe holding at most `capacity` chunks (at least one).
#[must_use]
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let state = Shared::default();
    (
        PipeWriter {
            tx,
            state: Arc::clone(&state),
        },
        PipeReader {
            rx,
            state,
            done: false,
        },
    )
}

/// Write end of a [`pipe`].
#[derive(Debug)]
pub struct PipeWriter {
    tx: mpsc::Sender<Bytes>,
    state: Shared,
}

impl PipeWriter {
    /// Sends a chunk, waiting while the pipe is full.
    ///
    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::BrokenPipe`] once the reader is gone.
    pub async fn write(&self, chunk: Bytes) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx
            .send(chunk)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "upload pipe reader closed"))
    }

    /// Ends the stream normally.
    pub fn close(self) {
        self.finish(CloseState::Clean);
    }

    /// Ends the stream with `err`; the reader yields it after any chunks
    /// already buffered.
    pub fn close_with_error(self, err: io::Error) {
        self.finish(CloseState::Failed(err));
    }

    fn finish(self, outcome: CloseState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
        // dropping `tx` wakes the reader
    }
}

/// Read end of a [`pipe`], usable directly as an HTTP request body.
#[derive(Debug)]
pub struct PipeReader {
    rx: mpsc::Receiver<Bytes>,
    state: Shared,
    done: bool,
}

impl PipeReader {
    fn take_outcome(&self) -> Option<io::Error> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, CloseState::Clean) {
            CloseState::Clean => None,
            CloseState::Failed(err) => Some(err),
            CloseState::Open => Some(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "upload pipe closed before the body was complete",
            )),
        }
    }
}

impl Body for PipeReader {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(chunk)) => Poll::Ready(Some(Ok(Frame::data(chunk)))),
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(this.take_outcome().map(Err))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.done
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::default()
    }
}

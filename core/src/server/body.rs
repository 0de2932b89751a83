use axum::body::{Body, Bytes};
use futures::stream;
use std::fmt;
use std::io::{self, Write};
use tokio::sync::mpsc;

/// Buffered bytes handed to the response at once
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks queued between the encoding thread and the connection
const CHANNEL_CAPACITY: usize = 4;

/// Blocking [`Write`] half of a streamed response body
///
/// Must be driven from a blocking thread (`spawn_blocking`). Once the body is
/// dropped, for instance because the client disconnected, every write fails
/// with [`io::ErrorKind::BrokenPipe`].
pub struct BodyWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
    buf: Vec<u8>,
}

/// Creates a response body and the writer feeding it
pub fn channel() -> (BodyWriter, Body) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let writer = BodyWriter {
        tx,
        buf: Vec::with_capacity(CHUNK_SIZE),
    };
    let chunks = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    (writer, Body::from_stream(chunks))
}

impl BodyWriter {
    fn send(&self, chunk: io::Result<Bytes>) -> io::Result<()> {
        self.tx
            .blocking_send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body closed"))
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(CHUNK_SIZE));
        self.send(Ok(Bytes::from(chunk)))
    }

    /// Ends the body with an error so the client sees a broken transfer
    pub fn abort(self, error: impl fmt::Display) {
        let _ = self.send(Err(io::Error::other(error.to_string())));
    }
}

impl Write for BodyWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.tx.is_closed() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "response body closed"));
        }
        self.buf.extend_from_slice(data);
        if self.buf.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

//! Byte accounting for the pass-through request body.
//!
//! The inbound body is handed to the upstream call as a stream, so the
//! handler never sees the bytes itself. The meter records how many bytes
//! actually crossed and the first read error, for the diagnostics line
//! written after the call completes.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use axum::body::{Body, BodyDataStream, Bytes};
use futures_util::Stream;

/// Shared counters for one body transfer.
///
/// Relaxed ordering is sufficient: the meter is only read after the
/// outbound call has completed.
#[derive(Debug, Default)]
pub struct TransferMeter {
    bytes: AtomicU64,
    error: Mutex<Option<String>>,
}

impl TransferMeter {
    /// Total bytes pulled from the inbound body so far.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// The first read error observed, if any.
    pub fn error(&self) -> Option<String> {
        self.error.lock().map(|guard| guard.clone()).unwrap_or(None)
    }
}

/// Stream adapter counting the bytes handed to the upstream call.
pub struct MeteredStream<S> {
    inner: S,
    meter: Arc<TransferMeter>,
}

/// Wrap a body's data stream, returning the stream and its meter.
pub fn metered(body: Body) -> (MeteredStream<BodyDataStream>, Arc<TransferMeter>) {
    let meter = Arc::new(TransferMeter::default());
    let stream = MeteredStream {
        inner: body.into_data_stream(),
        meter: Arc::clone(&meter),
    };
    (stream, meter)
}

impl<S> Stream for MeteredStream<S>
where
    S: Stream<Item = Result<Bytes, axum::Error>> + Unpin,
{
    type Item = Result<Bytes, axum::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(Some(item)) = &poll {
            match item {
                Ok(chunk) => {
                    self.meter
                        .bytes
                        .fetch_add(chunk.len() as u64, Ordering::Relaxed);
                }
                Err(error) => {
                    if let Ok(mut guard) = self.meter.error.lock() {
                        guard.get_or_insert_with(|| error.to_string());
                    }
                }
            }
        }
        poll
    }
}

/// Stream adapter for the upstream response body.
///
/// Counts relayed bytes and writes the diagnostics line when the relay
/// completes, fails mid-stream, or is abandoned by the caller. By the time
/// a failure shows up here the status line is already committed, so all
/// that is left to do is log and close.
pub struct RelayedStream<E: 'static> {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send>>,
    bytes: u64,
    finished: bool,
}

/// Wrap the upstream body stream for relay accounting.
pub fn relayed<S, E>(inner: S) -> RelayedStream<E>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: 'static,
{
    RelayedStream {
        inner: Box::pin(inner),
        bytes: 0,
        finished: false,
    }
}

impl<E> Stream for RelayedStream<E>
where
    E: std::fmt::Display + 'static,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = self.inner.as_mut().poll_next(cx);
        match &poll {
            Poll::Ready(Some(Ok(chunk))) => self.bytes += chunk.len() as u64,
            Poll::Ready(Some(Err(error))) => {
                self.finished = true;
                tracing::warn!(bytes = self.bytes, error = %error, "response relay failed");
            }
            Poll::Ready(None) => {
                self.finished = true;
                tracing::debug!(bytes = self.bytes, "response relay complete");
            }
            Poll::Pending => {}
        }
        poll
    }
}

impl<E: 'static> Drop for RelayedStream<E> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(bytes = self.bytes, "response relay abandoned");
        }
    }
}

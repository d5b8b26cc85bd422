//! Outbound send pipeline.
//!
//! All writes funnel through one queue drained by a single writer task,
//! so lines hit the wire in submission order whatever the callers were
//! doing between awaits. With flood protection on, the writer holds each
//! line until the configured delay since the previous write has passed.
//! Once a disconnect has been requested, further submissions are dropped
//! silently so draining embedder code can finish without errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

use crate::error::ProtocolError;
use crate::message::needs_trailing;

/// Compose a wire line from message parts.
///
/// The final part is sent as a trailing parameter when it contains
/// whitespace, begins with `:`, or is empty; everything else is joined
/// with single spaces. The CRLF terminator is the codec's job.
pub fn compose(parts: &[String]) -> String {
    let mut line = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        if i + 1 == parts.len() && needs_trailing(part) {
            line.push(':');
        }
        line.push_str(part);
    }
    line
}

/// Handle for submitting lines to the writer task.
#[derive(Clone)]
pub(crate) struct Pipeline {
    tx: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl Pipeline {
    /// Spawn the writer task over a line sink.
    ///
    /// `flood_delay` of `None` writes as fast as the sink accepts.
    pub fn spawn<S>(sink: S, flood_delay: Option<Duration>) -> (Self, JoinHandle<()>)
    where
        S: Sink<String, Error = ProtocolError> + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(sink, rx, flood_delay));
        (
            Self {
                tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
            writer,
        )
    }

    /// Queue a line composed from parts.
    pub fn send_parts(&self, parts: &[String]) {
        self.send_line(compose(parts));
    }

    /// Queue a pre-composed line.
    pub fn send_line(&self, line: String) {
        if self.closed.load(Ordering::Relaxed) {
            trace!(%line, "dropping write after disconnect");
            return;
        }
        // The writer only stops when every sender is gone or the sink
        // breaks; either way the line has nowhere to go.
        let _ = self.tx.send(line);
    }

    /// Drop all future submissions; already-queued lines still drain.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

async fn run_writer<S>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<String>,
    flood_delay: Option<Duration>,
) where
    S: Sink<String, Error = ProtocolError> + Send + Unpin,
{
    let mut last_write: Option<Instant> = None;

    while let Some(line) = rx.recv().await {
        if let Some(delay) = flood_delay {
            if let Some(prev) = last_write {
                tokio::time::sleep_until(prev + delay).await;
            }
        }

        if let Err(e) = sink.send(line).await {
            trace!(error = %e, "writer stopping");
            break;
        }
        last_write = Some(Instant::now());
    }

    let _ = sink.close().await;
}

//! WebSocket transport for the client.
//!
//! One task per connection attempt. The task reports what happens on the
//! socket as [`ClientEvent`]s tagged with its attempt number and writes the
//! frames handed to its [`TransportHandle`]. Protocol logic stays in the
//! Sans-IO [`Client`](crate::Client).
//!
//! Every attempt that is not released by its handle ends with exactly one
//! [`ClientEvent::TransportClosed`], whether the handshake failed, the server
//! closed, or the stream errored.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::{error::TransportError, event::ClientEvent};

/// Outbound frames buffered per connection before `send` reports backpressure.
const OUTBOUND_CAPACITY: usize = 64;

/// Upper bound on sending the close frame of a released connection.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// How the connection task ended without an error.
enum Exit {
    /// The server or the stream ended the connection.
    Closed,
    /// The handle released the connection.
    Released,
}

/// Handle to a running connection task.
///
/// Dropping the handle aborts the task without emitting further events.
/// [`TransportHandle::close`] lets it send a close frame first.
#[derive(Debug)]
pub struct TransportHandle {
    attempt: u64,
    /// `None` once [`TransportHandle::close`] handed the shutdown to the task.
    outbound: Option<mpsc::Sender<String>>,
    abort_handle: tokio::task::AbortHandle,
}

impl TransportHandle {
    /// Attempt this transport belongs to.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Queue a text frame.
    ///
    /// # Errors
    ///
    /// - `TransportError::Closed` if the task has exited
    /// - `TransportError::Stream` if the outbound queue is full
    pub fn send(&self, payload: String) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        outbound.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            mpsc::error::TrySendError::Full(_) => {
                TransportError::Stream("outbound queue full".to_string())
            },
        })
    }

    /// Release the connection gracefully.
    ///
    /// The task sends a close frame, bounded by a short grace period, and ends
    /// without reporting [`ClientEvent::TransportClosed`]. A handshake still in
    /// progress is abandoned.
    pub fn close(mut self) {
        self.outbound = None;
    }

    /// Stop the connection task immediately.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        if self.outbound.is_some() {
            self.stop();
        }
    }
}

/// Spawn the connection task for `attempt` against `url`.
///
/// Must be called within a tokio runtime.
pub fn spawn_connection(
    attempt: u64,
    url: String,
    events: mpsc::Sender<ClientEvent>,
) -> TransportHandle {
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let handle = tokio::spawn(run_connection(attempt, url, outbound_rx, events));

    TransportHandle { attempt, outbound: Some(outbound_tx), abort_handle: handle.abort_handle() }
}

async fn run_connection(
    attempt: u64,
    url: String,
    outbound: mpsc::Receiver<String>,
    events: mpsc::Sender<ClientEvent>,
) {
    match pump(attempt, &url, outbound, &events).await {
        Ok(Exit::Released) => {
            tracing::debug!(attempt, "room connection released");
            return;
        },
        Ok(Exit::Closed) => {},
        Err(error) => {
            tracing::debug!(attempt, %error, "transport task ending with error");
            let _ = events
                .send(ClientEvent::TransportError { attempt, reason: error.to_string() })
                .await;
        },
    }
    let _ = events.send(ClientEvent::TransportClosed { attempt }).await;
}

/// Bridge the socket and the channels until either side ends.
async fn pump(
    attempt: u64,
    url: &str,
    mut outbound: mpsc::Receiver<String>,
    events: &mpsc::Sender<ClientEvent>,
) -> Result<Exit, TransportError> {
    // Nothing is transmitted before the attempt is established, so the queue
    // can only yield `None` here: the handle was released mid-handshake.
    let stream = tokio::select! {
        connected = tokio_tungstenite::connect_async(url) => connected
            .map_err(|e| TransportError::Connection { url: url.to_string(), reason: e.to_string() })?
            .0,
        None = outbound.recv() => return Ok(Exit::Released),
    };

    if events.send(ClientEvent::TransportEstablished { attempt }).await.is_err() {
        return Ok(Exit::Released);
    }

    let (mut writer, mut reader) = stream.split();
    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(payload) => writer
                    .send(Message::text(payload))
                    .await
                    .map_err(|e| TransportError::Stream(e.to_string()))?,
                None => {
                    if tokio::time::timeout(CLOSE_GRACE, writer.send(Message::Close(None))).await.is_err() {
                        tracing::debug!(attempt, "close frame not flushed within grace period");
                    }
                    return Ok(Exit::Released);
                },
            },
            message = reader.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let event = ClientEvent::FrameReceived { attempt, payload: text.as_str().to_owned() };
                    if events.send(event).await.is_err() {
                        return Ok(Exit::Released);
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(attempt, ?frame, "server closed room connection");
                    return Ok(Exit::Closed);
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => return Err(TransportError::Stream(e.to_string())),
                None => return Ok(Exit::Closed),
            },
        }
    }
}

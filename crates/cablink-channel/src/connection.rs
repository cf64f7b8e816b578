//! The dial / serve / reconnect loop.
//!
//! One task owns the socket. While connected it multiplexes three sources:
//! frames from the controller, messages from the outgoing queue, and the
//! shutdown token. A read error, a close frame, or a failed write ends the
//! session and the loop dials again straight away; a failed dial waits
//! `reconnect_delay` first. Messages queued while disconnected stay in the
//! queue and are written once the next session is up.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::ReceiveCallback;

/// Connection parameters resolved from configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `WebSocket` URL of the controller.
    pub url: String,
    /// Wait after a failed dial.
    pub reconnect_delay: Duration,
}

/// How a connected session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The peer went away; dial again.
    Disconnected,
    /// Shutdown was requested.
    Stopped,
}

/// Run until `shutdown` is cancelled.
pub async fn run(
    settings: Settings,
    mut outgoing: mpsc::Receiver<String>,
    on_receive: ReceiveCallback,
    shutdown: CancellationToken,
) {
    loop {
        debug!(url = %settings.url, "Attempting to connect");
        let dialled = tokio::select! {
            () = shutdown.cancelled() => break,
            result = connect_async(settings.url.as_str()) => result,
        };

        match dialled {
            Ok((stream, _response)) => {
                info!(url = %settings.url, "Connected to controller");
                match serve(stream, &mut outgoing, &on_receive, &shutdown).await {
                    SessionEnd::Stopped => break,
                    SessionEnd::Disconnected => {
                        info!("Connection closed, reconnecting");
                    }
                }
            }
            Err(error) => {
                warn!(
                    url = %settings.url,
                    error = %error,
                    retry_in = ?settings.reconnect_delay,
                    "Failed to connect"
                );
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(settings.reconnect_delay) => {}
                }
            }
        }
    }
    info!("Message channel stopped");
}

async fn serve(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    outgoing: &mut mpsc::Receiver<String>,
    on_receive: &ReceiveCallback,
    shutdown: &CancellationToken,
) -> SessionEnd {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                if let Err(error) = write.send(Message::Close(None)).await {
                    debug!(error = %error, "Failed to send close frame");
                }
                return SessionEnd::Stopped;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    trace!(message = %text, "Received message");
                    on_receive(text.as_str());
                }
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Disconnected;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    warn!(error = %error, "Read failed");
                    return SessionEnd::Disconnected;
                }
            },
            queued = outgoing.recv() => {
                let Some(message) = queued else {
                    // Every sender is gone; nothing can be sent again.
                    if let Err(error) = write.send(Message::Close(None)).await {
                        debug!(error = %error, "Failed to send close frame");
                    }
                    return SessionEnd::Stopped;
                };
                trace!(message = %message, "Sending message");
                if let Err(error) = write.send(Message::text(message)).await {
                    warn!(error = %error, "Write failed");
                    return SessionEnd::Disconnected;
                }
            }
        }
    }
}

//! Reconnecting `WebSocket` message channel for the cablink bridge.
//!
//! The bridge is the client: it dials the controller's `WebSocket` server
//! and keeps dialling until told to stop. Text frames received from the
//! controller are handed to a callback on the connection task; outgoing
//! messages are queued through a bounded channel from any context and
//! written whenever a connection is up.
//!
//! # Modules
//!
//! - [`connection`] -- The dial / serve / reconnect loop.
//! - [`error`] -- [`ChannelError`].
//!
//! [`ChannelError`]: error::ChannelError

pub mod connection;
pub mod error;

use std::sync::Arc;
use std::time::Duration;

use cablink_core::config::ChannelConfig;
use cablink_core::forward::{MessageSink, SinkError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use error::ChannelError;

/// Callback invoked with every text frame received from the controller.
pub type ReceiveCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Cloneable handle for queueing outgoing messages.
///
/// Sending never blocks: a full queue or a stopped channel drops the
/// message and reports why.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    outgoing: mpsc::Sender<String>,
}

impl MessageSink for ChannelSender {
    fn send(&self, message: String) -> Result<(), SinkError> {
        self.outgoing.try_send(message).map_err(|error| match error {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

/// A running message channel.
///
/// Owns the background connection task. Dropping the channel without
/// calling [`stop`](Self::stop) leaves the task running until the runtime
/// shuts down.
#[derive(Debug)]
pub struct MessageChannel {
    sender: ChannelSender,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl MessageChannel {
    /// Spawn the connection task on the current Tokio runtime.
    ///
    /// `on_receive` runs on the connection task for each received text
    /// frame; it must return quickly.
    pub fn start<F>(config: &ChannelConfig, on_receive: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let (outgoing_tx, outgoing_rx) = mpsc::channel(config.outgoing_capacity.max(1));
        let shutdown = CancellationToken::new();

        let settings = connection::Settings {
            url: config.url.clone(),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        };
        info!(url = %settings.url, "Starting message channel");

        let task = tokio::spawn(connection::run(
            settings,
            outgoing_rx,
            Arc::new(on_receive),
            shutdown.clone(),
        ));

        Self {
            sender: ChannelSender {
                outgoing: outgoing_tx,
            },
            shutdown,
            task,
        }
    }

    /// A handle for queueing outgoing messages.
    pub fn sender(&self) -> ChannelSender {
        self.sender.clone()
    }

    /// Close the connection (sending a close frame if connected) and wait
    /// for the connection task to exit.
    pub async fn stop(self) -> Result<(), ChannelError> {
        info!("Stopping message channel");
        self.shutdown.cancel();
        self.task.await?;
        Ok(())
    }
}

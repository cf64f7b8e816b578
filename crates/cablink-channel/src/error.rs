//! Error types for the message channel.

/// Errors raised while shutting the channel down.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The connection task panicked or was aborted.
    #[error("connection task failed: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

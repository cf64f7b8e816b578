//! Error types for the bridge binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, the tick loop, and shutdown.

/// Top-level error for the bridge binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cablink_core::config::ConfigError,
    },

    /// The message channel did not shut down cleanly.
    #[error("channel error: {source}")]
    Channel {
        /// The underlying channel error.
        #[from]
        source: cablink_channel::ChannelError,
    },

    /// Listening for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

//! Error definitions for the configurator

use thiserror::Error;

/// Rejection of a single attempt; the session stays on the current entry.
///
/// The `Display` text is what the user gets to see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The input is already bound to another entry in this session
    #[error("Already in use by {description}")]
    Conflict { description: String },

    /// An axis entry whose first direction is a button cannot continue with an axis or hat
    #[error("{description}: {minus_label} was set with a button, use a button for {plus_label} as well")]
    AsymmetricAxisKind {
        description: String,
        minus_label: String,
        plus_label: String,
    },
}

/// Failures of the configurator task itself
#[derive(Debug, Error)]
pub enum ConfiguratorError {
    /// Command or notification channel closed
    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// The driver task panicked or was aborted
    #[error("Thread error: {0}")]
    ThreadError(String),
}

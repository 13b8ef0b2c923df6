//! Error types for the subscription/dispatch pipeline.

use thiserror::Error;

/// Errors a `ChainAdapter` implementation can return.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Upstream transport error, timeout, or 5xx — a soft failure the poller
    /// skips past rather than treats as fatal.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// Could not obtain the initial height at startup — fatal, the adapter
    /// cannot be used at all.
    #[error("could not determine chain height at startup: {0}")]
    StartupFailed(String),
}

/// Errors from `SubscriptionTable` operations.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SubError {
    #[error("address already subscribed on this connection")]
    AlreadySubscribed,

    #[error("address is not a valid account")]
    NotAnAccount,

    #[error("token address is not a contract")]
    NotAContract,

    #[error("subscription capacity exceeded")]
    CapacityExceeded,
}

/// Top-level gateway error — config/startup failures that should abort the process.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("fatal: {0}")]
    Fatal(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

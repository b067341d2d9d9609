//! Connector error taxonomy.
//!
//! Input and precondition failures are returned synchronously before any
//! external call is made. Transaction failures surface after the
//! confirmation wait and are never retried automatically. Transient RPC
//! failures in background paths (polling, push-triggered refresh) are traced
//! and dropped so they cannot interrupt the user.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// No compatible external wallet was detected.
    #[error("no compatible wallet detected")]
    WalletUnavailable,

    /// The user rejected the authorization prompt, or the wallet reported
    /// zero authorized accounts.
    #[error("wallet authorization denied or no accounts exposed")]
    AuthorizationDenied,

    /// The supplied board address is not `0x` + 40 hex digits.
    #[error("invalid board address: {0}")]
    InvalidAddress(String),

    /// Message content was empty after trimming.
    #[error("message content must not be empty")]
    EmptyContent,

    /// A feed operation was requested before any board address was set.
    #[error("no board address has been set")]
    NoTarget,

    /// A write was requested without a connected wallet.
    #[error("wallet is not connected")]
    NotConnected,

    /// The external chain rejected or reverted a submitted transaction. The
    /// message is whatever the adapter attached; revert-reason decoding is
    /// the adapter's concern.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// A read, subscription, or submission failed at the RPC boundary.
    #[error("rpc error: {0}")]
    Rpc(#[from] anyhow::Error),
}

impl ConnectorError {
    /// Whether this error is a local input/precondition failure that was
    /// raised before any external call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ConnectorError::InvalidAddress(_)
                | ConnectorError::EmptyContent
                | ConnectorError::NoTarget
                | ConnectorError::NotConnected
        )
    }
}

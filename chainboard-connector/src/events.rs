//! Typed payloads for the connector's internal event bus.
//!
//! External callbacks (push notifications from the contract, account and
//! network changes from the wallet) are normalized into these enums so the
//! session and feed components react to *what changed* without knowing which
//! client-library callback reported it.

use crate::types::Address;

/// A push notification emitted by the board contract.
///
/// The engine only uses these as refresh triggers; the carried id is kept
/// for logging and for adapters that want it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    Posted { id: u64 },
    Edited { id: u64 },
    Deleted { id: u64 },
}

/// A notification fired by the external wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The set of authorized accounts changed. An empty list means access
    /// was revoked entirely.
    AccountsChanged(Vec<Address>),
    /// The wallet switched networks. Message content and contract address
    /// validity are network-scoped, so this forces a full refresh.
    NetworkChanged(u64),
}

/// Emitted by the session whenever the account binding changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected(Address),
    Disconnected,
}

/// The typed status surface handed to the render port. The view decides how
/// to phrase each variant; tests assert on the variants themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Disconnected,
    Connected(Address),
    /// The interactive authorization prompt has been pending longer than the
    /// configured hint delay; the prompt may be hidden behind the browser's
    /// extension button.
    WalletPromptHint,
    TargetSet(Address),
    Submitting,
    /// Waiting for the transaction with this hash to be confirmed.
    AwaitingConfirmation(String),
    Confirmed,
    TransactionFailed,
    LoadFailed,
}

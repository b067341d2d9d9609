//! Ports onto the external chain stack.
//!
//! The connector never encodes ABI data, estimates gas, or talks to a wallet
//! extension itself; those concerns belong to a client-library adapter that
//! implements the traits below. Keeping the boundary here means the engine is
//! identical no matter which binding (or which major version of it) sits
//! underneath.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ConnectorError;
use crate::events::{BoardEvent, WalletEvent};
use crate::types::{Address, MessageRecord};

/// Read-only access to one board contract.
///
/// Implementations are bound to a single contract address at construction;
/// see [`WalletProvider::reader_for`].
#[async_trait]
pub trait BoardReader: Send + Sync {
    /// Total number of records ever appended, including soft-deleted ones.
    async fn total(&self) -> Result<u64, ConnectorError>;

    /// The fee, in wei, that must accompany a `post` transaction.
    async fn post_fee(&self) -> Result<u128, ConnectorError>;

    /// Minimum seconds the contract enforces between posts per author.
    async fn rate_limit_seconds(&self) -> Result<u64, ConnectorError>;

    /// Maximum content length, in bytes, the contract will accept.
    async fn max_content_length_bytes(&self) -> Result<u64, ConnectorError>;

    /// The newest `count` records, newest first.
    async fn get_latest(&self, count: u64) -> Result<Vec<MessageRecord>, ConnectorError>;

    /// Up to `count` records starting at index `start` in log order. Returns
    /// an empty vector once `start` is past the end of the log.
    async fn get_range(&self, start: u64, count: u64)
        -> Result<Vec<MessageRecord>, ConnectorError>;

    /// Subscribes to the contract's push notifications. Best-effort: many
    /// RPC providers refuse subscriptions, in which case this returns an
    /// error and polling remains the only freshness signal.
    async fn subscribe(&self) -> Result<BoxStream<'static, BoardEvent>, ConnectorError>;
}

impl std::fmt::Debug for dyn BoardReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn BoardReader")
    }
}

/// A submitted, not-yet-confirmed transaction.
#[async_trait]
pub trait PendingTx: Send {
    /// The transaction hash, available as soon as the wallet accepts the
    /// submission.
    fn hash(&self) -> &str;

    /// Waits for on-chain confirmation. A revert surfaces as
    /// [`ConnectorError::Transaction`].
    async fn confirm(self: Box<Self>) -> Result<(), ConnectorError>;
}

/// Write access to one board contract on behalf of one account.
#[async_trait]
pub trait BoardWriter: Send + Sync {
    /// Submits a `post` transaction carrying `fee_wei` as attached value.
    async fn post(
        &self,
        content: &str,
        parent_id: u64,
        fee_wei: u128,
    ) -> Result<Box<dyn PendingTx>, ConnectorError>;

    async fn edit(&self, id: u64, new_content: &str)
        -> Result<Box<dyn PendingTx>, ConnectorError>;

    async fn soft_delete(&self, id: u64) -> Result<Box<dyn PendingTx>, ConnectorError>;
}

/// The capability handle obtained from a successful wallet authorization.
///
/// Holding a `Signer` is what distinguishes a connected session from a
/// read-only one; it mints per-board writers on demand.
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    fn writer_for(&self, board: Address) -> Arc<dyn BoardWriter>;
}

/// The injected wallet/provider pair, as a single boundary object.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this origin. Never prompts.
    async fn authorized_accounts(&self) -> Result<Vec<Address>, ConnectorError>;

    /// Interactively requests authorization; may pop an external consent
    /// prompt and suspend until the user answers it.
    async fn request_accounts(&self) -> Result<Vec<Address>, ConnectorError>;

    /// Obtains the capability handle for an authorized account.
    async fn signer_for(&self, account: Address) -> Result<Arc<dyn Signer>, ConnectorError>;

    /// A read handle bound to the given board contract.
    fn reader_for(&self, board: Address) -> Arc<dyn BoardReader>;

    /// Account and network change notifications.
    fn wallet_events(&self) -> BoxStream<'static, WalletEvent>;
}

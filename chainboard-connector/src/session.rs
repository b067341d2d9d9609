//! # Connection Manager
//!
//! Maintains exactly one active (account, capability) pair or none, and
//! keeps it consistent with whatever the external wallet currently reports.
//! The binding is a single `Option`, so the invariant "address present iff
//! capability present" holds by construction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::ConnectorError;
use crate::events::{SessionEvent, StatusLine};
use crate::rpc::{Signer, WalletProvider};
use crate::types::Address;
use crate::view::BoardView;

/// The currently authorized identity and its capability handle.
#[derive(Clone)]
pub struct AccountBinding {
    pub address: Address,
    pub signer: Arc<dyn Signer>,
}

/// Result of an interactive connect attempt, delivered back to the engine
/// loop once the external prompt resolves.
pub type ConnectOutcome = Result<(Address, Arc<dyn Signer>), ConnectorError>;

pub struct Session {
    wallet: Arc<dyn WalletProvider>,
    view: Arc<dyn BoardView>,
    connect_hint: Duration,
    binding: Option<AccountBinding>,
    /// Guards the single-flight contract on interactive connects.
    connect_in_flight: Arc<AtomicBool>,
    outcome_tx: mpsc::Sender<ConnectOutcome>,
}

impl Session {
    /// Creates a session and the receiver on which connect outcomes arrive.
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        view: Arc<dyn BoardView>,
        connect_hint: Duration,
    ) -> (Self, mpsc::Receiver<ConnectOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::channel(1);
        let session = Self {
            wallet,
            view,
            connect_hint,
            binding: None,
            connect_in_flight: Arc::new(AtomicBool::new(false)),
            outcome_tx,
        };
        (session, outcome_rx)
    }

    pub fn binding(&self) -> Option<&AccountBinding> {
        self.binding.as_ref()
    }

    pub fn address(&self) -> Option<Address> {
        self.binding.as_ref().map(|b| b.address)
    }

    pub fn signer(&self) -> Option<Arc<dyn Signer>> {
        self.binding.as_ref().map(|b| b.signer.clone())
    }

    /// Silently restores the binding if the wallet already holds an
    /// authorization for this origin. Best-effort: every failure path is
    /// traced and swallowed, since this runs unprompted at startup.
    pub async fn restore_if_authorized(&mut self) -> Option<SessionEvent> {
        let accounts = match self.wallet.authorized_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::debug!("silent restore skipped: {e}");
                return None;
            }
        };
        let first = *accounts.first()?;
        match self.wallet.signer_for(first).await {
            Ok(signer) => Some(self.bind(first, signer)),
            Err(e) => {
                tracing::debug!("silent restore could not obtain signer: {e}");
                None
            }
        }
    }

    /// Starts an interactive connect. At most one request may be in flight;
    /// a second call while one is pending is a no-op.
    ///
    /// The wallet prompt can suspend indefinitely, so the request runs in a
    /// spawned task and its outcome is delivered through the channel
    /// returned by [`Session::new`]; feed it to [`Session::complete_connect`].
    /// If the prompt has not resolved after the configured hint delay, a
    /// status hint is shown without aborting the request.
    pub fn connect(&self) {
        if self.connect_in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("connect already in flight, ignoring");
            return;
        }

        let wallet = self.wallet.clone();
        let view = self.view.clone();
        let in_flight = self.connect_in_flight.clone();
        let outcome_tx = self.outcome_tx.clone();
        let hint_delay = self.connect_hint;

        tokio::spawn(async move {
            let request = wallet.request_accounts();
            tokio::pin!(request);
            let hint = tokio::time::sleep(hint_delay);
            tokio::pin!(hint);
            let mut hinted = false;

            let result = loop {
                tokio::select! {
                    res = &mut request => break res,
                    _ = &mut hint, if !hinted => {
                        hinted = true;
                        view.set_status(StatusLine::WalletPromptHint);
                    }
                }
            };

            let outcome = match result {
                Ok(accounts) => match accounts.first() {
                    Some(&first) => wallet.signer_for(first).await.map(|s| (first, s)),
                    None => Err(ConnectorError::AuthorizationDenied),
                },
                Err(e) => Err(e),
            };

            in_flight.store(false, Ordering::Release);
            let _ = outcome_tx.send(outcome).await;
        });
    }

    /// Applies the outcome of an interactive connect. Failures are surfaced
    /// to the user and leave the binding unset.
    pub fn complete_connect(&mut self, outcome: ConnectOutcome) -> Option<SessionEvent> {
        match outcome {
            Ok((address, signer)) => Some(self.bind(address, signer)),
            Err(e) => {
                tracing::warn!("connect failed: {e}");
                self.view.show_error(&e);
                None
            }
        }
    }

    /// Reacts to the wallet reporting a new (possibly empty) account list.
    pub async fn handle_accounts_changed(
        &mut self,
        accounts: Vec<Address>,
    ) -> Option<SessionEvent> {
        let Some(&first) = accounts.first() else {
            self.binding = None;
            self.view.set_status(StatusLine::Disconnected);
            return Some(SessionEvent::Disconnected);
        };
        match self.wallet.signer_for(first).await {
            Ok(signer) => Some(self.bind(first, signer)),
            Err(e) => {
                tracing::warn!("account change reported {first} but no signer: {e}");
                self.binding = None;
                self.view.set_status(StatusLine::Disconnected);
                Some(SessionEvent::Disconnected)
            }
        }
    }

    fn bind(&mut self, address: Address, signer: Arc<dyn Signer>) -> SessionEvent {
        tracing::info!("wallet connected: {}", address.short());
        self.binding = Some(AccountBinding { address, signer });
        self.view.set_status(StatusLine::Connected(address));
        SessionEvent::Connected(address)
    }
}

//! # Sync Engine & Background Workers
//!
//! This module defines the `SyncEngine`, the single cooperative task that
//! owns the connection manager and the feed synchronizer, plus the two
//! background workers feeding it.
//!
//! ## Core Components
//!
//! - [`SyncEngine`]: owns the `Session` and `FeedSynchronizer` and runs the
//!   event loop. It is consumed when its `run` method is called.
//! - [`SyncEngineHandle`]: a clonable handle providing the public API
//!   (connect, retarget, load more, post/edit/delete, shutdown).
//! - **Workers**:
//!   - `LiveWorker`: consumes the push notification stream for the current
//!     target and fires the refresh signal.
//!   - `PollWorker`: re-reads the total record count at a fixed interval as
//!     the freshness backstop.
//!
//! Every operation runs to completion inside the engine task, so an
//! in-flight page load and a refresh can never interleave. Refresh requests
//! from any trigger pass through a single-permit [`Notify`]: one refresh in
//! flight at most, and any number of requests arriving meanwhile merge into
//! at most one pending run.

mod live;
mod poll;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Notify};
use tokio_stream::StreamExt;

use crate::{
    config::ConnectorConfig,
    error::ConnectorError,
    events::{SessionEvent, WalletEvent},
    feed::FeedSynchronizer,
    rpc::{BoardReader, WalletProvider},
    session::{ConnectOutcome, Session},
    view::BoardView,
    workers::{live::LiveWorker, poll::PollWorker},
};

/// Commands accepted by the engine task. Each carries a reply channel so
/// callers observe the result of their own operation.
#[derive(Debug)]
pub enum EngineCommand {
    Connect {
        reply: oneshot::Sender<Result<(), ConnectorError>>,
    },
    SetTarget {
        address: String,
        reply: oneshot::Sender<Result<(), ConnectorError>>,
    },
    LoadMore {
        reply: oneshot::Sender<Result<usize, ConnectorError>>,
    },
    Post {
        content: String,
        parent_id: u64,
        reply: oneshot::Sender<Result<(), ConnectorError>>,
    },
    Edit {
        id: u64,
        new_content: String,
        reply: oneshot::Sender<Result<(), ConnectorError>>,
    },
    SoftDelete {
        id: u64,
        reply: oneshot::Sender<Result<(), ConnectorError>>,
    },
    Shutdown,
}

/// A clonable, thread-safe handle for interacting with a running
/// [`SyncEngine`]. This is the primary public entry point for applications
/// using the connector.
#[derive(Debug, Clone)]
pub struct SyncEngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
}

fn engine_gone() -> ConnectorError {
    ConnectorError::Rpc(anyhow::anyhow!("sync engine is not running"))
}

impl SyncEngineHandle {
    /// Starts an interactive wallet connect. Returns once the request has
    /// been *initiated*; the outcome arrives through the view's status
    /// surface, since the external prompt can suspend indefinitely.
    pub async fn connect(&self) -> Result<(), ConnectorError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::Connect { reply })
            .await
            .map_err(|_| engine_gone())?;
        reply_rx.await.map_err(|_| engine_gone())?
    }

    /// Points the feed at a board contract address (string form, validated
    /// by the engine).
    pub async fn set_target(&self, address: impl Into<String>) -> Result<(), ConnectorError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::SetTarget {
                address: address.into(),
                reply,
            })
            .await
            .map_err(|_| engine_gone())?;
        reply_rx.await.map_err(|_| engine_gone())?
    }

    /// Loads the next page; returns the number of records rendered.
    pub async fn load_more(&self) -> Result<usize, ConnectorError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::LoadMore { reply })
            .await
            .map_err(|_| engine_gone())?;
        reply_rx.await.map_err(|_| engine_gone())?
    }

    /// Posts a message, waiting for on-chain confirmation. `parent_id` of
    /// zero means no parent.
    pub async fn post(
        &self,
        content: impl Into<String>,
        parent_id: u64,
    ) -> Result<(), ConnectorError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::Post {
                content: content.into(),
                parent_id,
                reply,
            })
            .await
            .map_err(|_| engine_gone())?;
        reply_rx.await.map_err(|_| engine_gone())?
    }

    pub async fn edit(
        &self,
        id: u64,
        new_content: impl Into<String>,
    ) -> Result<(), ConnectorError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::Edit {
                id,
                new_content: new_content.into(),
                reply,
            })
            .await
            .map_err(|_| engine_gone())?;
        reply_rx.await.map_err(|_| engine_gone())?
    }

    pub async fn soft_delete(&self, id: u64) -> Result<(), ConnectorError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::SoftDelete { id, reply })
            .await
            .map_err(|_| engine_gone())?;
        reply_rx.await.map_err(|_| engine_gone())?
    }

    /// Signals the engine to tear down its workers and exit its loop.
    pub async fn shutdown(&self) {
        if self
            .command_tx
            .send(EngineCommand::Shutdown)
            .await
            .is_err()
        {
            tracing::warn!("failed to send shutdown: engine may already be down");
        }
    }
}

/// The engine task. Created once, its [`run()`](SyncEngine::run) method is
/// spawned as a background task, and it is then consumed, leaving the
/// [`SyncEngineHandle`] as the only way to interact with it.
pub struct SyncEngine {
    config: Arc<ConnectorConfig>,
    wallet: Arc<dyn WalletProvider>,
    view: Arc<dyn BoardView>,
    session: Session,
    feed: FeedSynchronizer,
    command_rx: mpsc::Receiver<EngineCommand>,
    connect_rx: mpsc::Receiver<ConnectOutcome>,
    totals_tx: mpsc::Sender<u64>,
    totals_rx: mpsc::Receiver<u64>,
    refresh: Arc<Notify>,
    live_task: Option<tokio::task::JoinHandle<()>>,
    poll_task: Option<tokio::task::JoinHandle<()>>,
}

impl SyncEngine {
    /// Creates a new engine and its handle. Nothing runs until
    /// [`run()`](SyncEngine::run) is spawned.
    pub fn new(
        config: Arc<ConnectorConfig>,
        wallet: Arc<dyn WalletProvider>,
        view: Arc<dyn BoardView>,
    ) -> (Self, SyncEngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.channels.command_buffer);
        let (totals_tx, totals_rx) = mpsc::channel(config.channels.observation_buffer);
        let (session, connect_rx) = Session::new(
            wallet.clone(),
            view.clone(),
            Duration::from_secs(config.feed.connect_hint_secs),
        );
        let feed = FeedSynchronizer::new(view.clone(), config.feed.page_size);

        let engine = Self {
            config,
            wallet,
            view,
            session,
            feed,
            command_rx,
            connect_rx,
            totals_tx,
            totals_rx,
            refresh: Arc::new(Notify::new()),
            live_task: None,
            poll_task: None,
        };
        let handle = SyncEngineHandle { command_tx };
        (engine, handle)
    }

    /// Runs the engine until shutdown. Consumes `self`; spawn this as a
    /// single long-running task.
    pub async fn run(mut self) {
        tracing::info!("sync engine started");

        // Best-effort silent restore of an existing wallet authorization.
        if let Some(SessionEvent::Connected(address)) = self.session.restore_if_authorized().await
        {
            self.feed.set_viewer(Some(address));
        }

        let mut wallet_events = self.wallet.wallet_events();

        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    if self.handle_command(command).await {
                        break;
                    }
                }
                Some(outcome) = self.connect_rx.recv() => {
                    if let Some(SessionEvent::Connected(address)) =
                        self.session.complete_connect(outcome)
                    {
                        self.feed.set_viewer(Some(address));
                    }
                }
                Some(event) = wallet_events.next() => {
                    self.handle_wallet_event(event).await;
                }
                Some(total) = self.totals_rx.recv() => {
                    if self.feed.observe_total(total) {
                        self.refresh.notify_one();
                    }
                }
                _ = self.refresh.notified() => {
                    if let Err(e) = self.feed.refresh_from_start().await {
                        tracing::debug!("background refresh failed: {e}");
                    }
                }
                else => break,
            }
        }

        self.teardown_workers();
        tracing::info!("sync engine shut down");
    }

    /// Handles one command. Returns `true` if the engine should shut down.
    async fn handle_command(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::Connect { reply } => {
                self.session.connect();
                let _ = reply.send(Ok(()));
            }
            EngineCommand::SetTarget { address, reply } => {
                match self.feed.set_target(self.wallet.as_ref(), &address).await {
                    Ok(reader) => {
                        self.restart_workers(reader);
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        self.view.show_error(&e);
                        let _ = reply.send(Err(e));
                    }
                }
            }
            EngineCommand::LoadMore { reply } => {
                let _ = reply.send(self.feed.load_next_page().await);
            }
            EngineCommand::Post {
                content,
                parent_id,
                reply,
            } => {
                let result = match self.session.signer() {
                    Some(signer) => self.feed.post(&signer, &content, parent_id).await,
                    None => Err(ConnectorError::NotConnected),
                };
                self.complete_write(result, reply);
            }
            EngineCommand::Edit {
                id,
                new_content,
                reply,
            } => {
                let result = match self.session.signer() {
                    Some(signer) => self.feed.edit(&signer, id, &new_content).await,
                    None => Err(ConnectorError::NotConnected),
                };
                self.complete_write(result, reply);
            }
            EngineCommand::SoftDelete { id, reply } => {
                let result = match self.session.signer() {
                    Some(signer) => self.feed.soft_delete(&signer, id).await,
                    None => Err(ConnectorError::NotConnected),
                };
                self.complete_write(result, reply);
            }
            EngineCommand::Shutdown => {
                tracing::info!("received shutdown command, exiting");
                return true;
            }
        }
        false
    }

    /// Finishes a write command: a confirmed write schedules a full refresh,
    /// a failed one is surfaced and the feed is left as it was.
    fn complete_write(
        &self,
        result: Result<(), ConnectorError>,
        reply: oneshot::Sender<Result<(), ConnectorError>>,
    ) {
        match &result {
            Ok(()) => self.refresh.notify_one(),
            Err(e) => {
                tracing::warn!("write failed: {e}");
                self.view.show_error(e);
            }
        }
        let _ = reply.send(result);
    }

    async fn handle_wallet_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                match self.session.handle_accounts_changed(accounts).await {
                    Some(SessionEvent::Connected(address)) => {
                        self.feed.set_viewer(Some(address));
                        // Stale per-account affordances must not linger.
                        self.refresh.notify_one();
                    }
                    Some(SessionEvent::Disconnected) => {
                        self.feed.set_viewer(None);
                    }
                    None => {}
                }
            }
            WalletEvent::NetworkChanged(chain_id) => {
                tracing::info!("network changed to chain {chain_id}, refreshing feed");
                self.refresh.notify_one();
            }
        }
    }

    /// Tears down the push and poll workers for the previous target and
    /// starts fresh ones against the new reader. Listeners and timers must
    /// never leak across targets.
    fn restart_workers(&mut self, reader: Arc<dyn BoardReader>) {
        self.teardown_workers();

        let poll = PollWorker::new(
            reader.clone(),
            Duration::from_secs(self.config.feed.poll_interval_secs),
            self.totals_tx.clone(),
        );
        self.poll_task = Some(tokio::spawn(poll.run()));

        let refresh = self.refresh.clone();
        self.live_task = Some(tokio::spawn(async move {
            match reader.subscribe().await {
                Ok(stream) => LiveWorker::new(stream, refresh).run().await,
                Err(e) => {
                    tracing::warn!("push subscription unavailable, polling remains: {e}");
                }
            }
        }));
    }

    fn teardown_workers(&mut self) {
        if let Some(task) = self.live_task.take() {
            task.abort();
        }
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}

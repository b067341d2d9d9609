//! Shared in-memory test doubles for the connector's external ports.
//!
//! `MockBoard` plays the contract: an append-only record log with paged
//! reads and an optional push channel. `MockWallet` plays the injected
//! wallet/provider pair, with a gate so tests can hold an interactive
//! authorization request open. `MockView` records everything the engine
//! pushes across the render boundary.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{mpsc, Semaphore};
use tokio_stream::wrappers::ReceiverStream;

use chainboard_connector::error::ConnectorError;
use chainboard_connector::events::{BoardEvent, StatusLine, WalletEvent};
use chainboard_connector::rpc::{BoardReader, BoardWriter, PendingTx, Signer, WalletProvider};
use chainboard_connector::types::{Address, BoardLimits, MessageRecord, RenderedMessage};
use chainboard_connector::view::BoardView;

pub fn addr(n: u8) -> Address {
    Address([n; 20])
}

pub fn record(id: u64, author: Address, content: &str) -> MessageRecord {
    MessageRecord {
        id,
        author,
        content: content.to_string(),
        created_at: 1_700_000_000 + id,
        edited_at: 0,
        is_deleted: false,
        parent_id: 0,
    }
}

pub fn records(count: u64, author: Address) -> Vec<MessageRecord> {
    (1..=count)
        .map(|id| record(id, author, &format!("message {id}")))
        .collect()
}

#[derive(Default)]
pub struct ReadCounts {
    pub total: AtomicUsize,
    pub post_fee: AtomicUsize,
    pub get_range: AtomicUsize,
}

pub struct MockBoard {
    pub records: Mutex<Vec<MessageRecord>>,
    pub fee: u128,
    pub rate_limit: u64,
    pub max_len: u64,
    pub counts: ReadCounts,
    /// When set, `get_range` fails with an RPC error.
    pub fail_range: std::sync::atomic::AtomicBool,
    pub last_post_fee: Mutex<Option<u128>>,
    subscribe_ok: bool,
    push_rx: Mutex<Option<mpsc::Receiver<BoardEvent>>>,
    pub push_tx: mpsc::Sender<BoardEvent>,
}

impl MockBoard {
    pub fn with_records(initial: Vec<MessageRecord>) -> Arc<Self> {
        Self::build(initial, true)
    }

    pub fn without_push(initial: Vec<MessageRecord>) -> Arc<Self> {
        Self::build(initial, false)
    }

    fn build(initial: Vec<MessageRecord>, subscribe_ok: bool) -> Arc<Self> {
        let (push_tx, push_rx) = mpsc::channel(16);
        Arc::new(Self {
            records: Mutex::new(initial),
            fee: 1_000_000,
            rate_limit: 60,
            max_len: 280,
            counts: ReadCounts::default(),
            fail_range: std::sync::atomic::AtomicBool::new(false),
            last_post_fee: Mutex::new(None),
            subscribe_ok,
            push_rx: Mutex::new(Some(push_rx)),
            push_tx,
        })
    }

    pub fn append(&self, record: MessageRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl BoardReader for MockBoard {
    async fn total(&self) -> Result<u64, ConnectorError> {
        self.counts.total.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn post_fee(&self) -> Result<u128, ConnectorError> {
        self.counts.post_fee.fetch_add(1, Ordering::SeqCst);
        Ok(self.fee)
    }

    async fn rate_limit_seconds(&self) -> Result<u64, ConnectorError> {
        Ok(self.rate_limit)
    }

    async fn max_content_length_bytes(&self) -> Result<u64, ConnectorError> {
        Ok(self.max_len)
    }

    async fn get_latest(&self, count: u64) -> Result<Vec<MessageRecord>, ConnectorError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().rev().take(count as usize).cloned().collect())
    }

    async fn get_range(
        &self,
        start: u64,
        count: u64,
    ) -> Result<Vec<MessageRecord>, ConnectorError> {
        self.counts.get_range.fetch_add(1, Ordering::SeqCst);
        if self.fail_range.load(Ordering::SeqCst) {
            return Err(ConnectorError::Rpc(anyhow::anyhow!("rpc hiccup")));
        }
        let records = self.records.lock().unwrap();
        let start = start as usize;
        if start >= records.len() {
            return Ok(Vec::new());
        }
        let end = (start + count as usize).min(records.len());
        Ok(records[start..end].to_vec())
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, BoardEvent>, ConnectorError> {
        if !self.subscribe_ok {
            return Err(ConnectorError::Rpc(anyhow::anyhow!(
                "provider refuses subscriptions"
            )));
        }
        let rx = self
            .push_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ConnectorError::Rpc(anyhow::anyhow!("already subscribed")))?;
        Ok(ReceiverStream::new(rx).boxed())
    }
}

struct MockPendingTx {
    hash: String,
    result: Result<(), String>,
}

#[async_trait]
impl PendingTx for MockPendingTx {
    fn hash(&self) -> &str {
        &self.hash
    }

    async fn confirm(self: Box<Self>) -> Result<(), ConnectorError> {
        self.result.map_err(ConnectorError::Transaction)
    }
}

pub struct MockWriter {
    board: Arc<MockBoard>,
    author: Address,
}

#[async_trait]
impl BoardWriter for MockWriter {
    async fn post(
        &self,
        content: &str,
        parent_id: u64,
        fee_wei: u128,
    ) -> Result<Box<dyn PendingTx>, ConnectorError> {
        *self.board.last_post_fee.lock().unwrap() = Some(fee_wei);
        if fee_wei != self.board.fee {
            return Ok(Box::new(MockPendingTx {
                hash: "0xdead".to_string(),
                result: Err("incorrect fee attached".to_string()),
            }));
        }
        let mut records = self.board.records.lock().unwrap();
        let id = records.len() as u64 + 1;
        records.push(MessageRecord {
            id,
            author: self.author,
            content: content.to_string(),
            created_at: 1_700_000_000 + id,
            edited_at: 0,
            is_deleted: false,
            parent_id,
        });
        Ok(Box::new(MockPendingTx {
            hash: format!("0xtx{id:04x}"),
            result: Ok(()),
        }))
    }

    async fn edit(
        &self,
        id: u64,
        new_content: &str,
    ) -> Result<Box<dyn PendingTx>, ConnectorError> {
        let mut records = self.board.records.lock().unwrap();
        let result = match records.iter_mut().find(|r| r.id == id) {
            Some(r) if r.author == self.author => {
                r.content = new_content.to_string();
                r.edited_at = r.created_at + 100;
                Ok(())
            }
            Some(_) => Err("not the author".to_string()),
            None => Err("no such message".to_string()),
        };
        Ok(Box::new(MockPendingTx {
            hash: format!("0xed{id:04x}"),
            result,
        }))
    }

    async fn soft_delete(&self, id: u64) -> Result<Box<dyn PendingTx>, ConnectorError> {
        let mut records = self.board.records.lock().unwrap();
        let result = match records.iter_mut().find(|r| r.id == id) {
            Some(r) if r.author == self.author => {
                r.is_deleted = true;
                Ok(())
            }
            Some(_) => Err("not the author".to_string()),
            None => Err("no such message".to_string()),
        };
        Ok(Box::new(MockPendingTx {
            hash: format!("0xdel{id:04x}"),
            result,
        }))
    }
}

pub struct MockSigner {
    pub address: Address,
    pub board: Arc<MockBoard>,
}

impl Signer for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn writer_for(&self, _board: Address) -> Arc<dyn BoardWriter> {
        Arc::new(MockWriter {
            board: self.board.clone(),
            author: self.address,
        })
    }
}

pub struct MockWallet {
    pub board: Arc<MockBoard>,
    /// Per-address boards for multi-target tests; falls back to `board`.
    routes: Mutex<Vec<(Address, Arc<MockBoard>)>>,
    pub authorized: Mutex<Vec<Address>>,
    /// When set, `authorized_accounts` fails, as a wallet with a broken RPC
    /// would.
    pub silent_fail: std::sync::atomic::AtomicBool,
    pub request_count: AtomicUsize,
    /// `request_accounts` holds on this until the test releases a permit,
    /// simulating the external consent prompt.
    pub request_gate: Semaphore,
    wallet_rx: Mutex<Option<mpsc::Receiver<WalletEvent>>>,
    pub wallet_tx: mpsc::Sender<WalletEvent>,
}

impl MockWallet {
    /// A wallet whose consent prompt resolves immediately.
    pub fn open(board: Arc<MockBoard>, authorized: Vec<Address>) -> Arc<Self> {
        let wallet = Self::gated(board, authorized);
        wallet.request_gate.add_permits(100);
        wallet
    }

    /// A wallet whose consent prompt stays open until the test calls
    /// [`MockWallet::answer_prompt`].
    pub fn gated(board: Arc<MockBoard>, authorized: Vec<Address>) -> Arc<Self> {
        let (wallet_tx, wallet_rx) = mpsc::channel(16);
        Arc::new(Self {
            board,
            routes: Mutex::new(Vec::new()),
            authorized: Mutex::new(authorized),
            silent_fail: std::sync::atomic::AtomicBool::new(false),
            request_count: AtomicUsize::new(0),
            request_gate: Semaphore::new(0),
            wallet_rx: Mutex::new(Some(wallet_rx)),
            wallet_tx,
        })
    }

    pub fn answer_prompt(&self) {
        self.request_gate.add_permits(1);
    }

    /// Serves `board` for reads against `address` instead of the default.
    pub fn route(&self, address: Address, board: Arc<MockBoard>) {
        self.routes.lock().unwrap().push((address, board));
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, ConnectorError> {
        if self.silent_fail.load(Ordering::SeqCst) {
            return Err(ConnectorError::Rpc(anyhow::anyhow!("wallet rpc broken")));
        }
        Ok(self.authorized.lock().unwrap().clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ConnectorError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .request_gate
            .acquire()
            .await
            .map_err(|_| ConnectorError::WalletUnavailable)?;
        permit.forget();
        Ok(self.authorized.lock().unwrap().clone())
    }

    async fn signer_for(&self, account: Address) -> Result<Arc<dyn Signer>, ConnectorError> {
        Ok(Arc::new(MockSigner {
            address: account,
            board: self.board.clone(),
        }))
    }

    fn reader_for(&self, board: Address) -> Arc<dyn BoardReader> {
        let routes = self.routes.lock().unwrap();
        match routes.iter().find(|(a, _)| *a == board) {
            Some((_, routed)) => routed.clone(),
            None => self.board.clone(),
        }
    }

    fn wallet_events(&self) -> BoxStream<'static, WalletEvent> {
        match self.wallet_rx.lock().unwrap().take() {
            Some(rx) => ReceiverStream::new(rx).boxed(),
            None => futures::stream::pending().boxed(),
        }
    }
}

#[derive(Default)]
pub struct MockView {
    pub statuses: Mutex<Vec<StatusLine>>,
    pub rendered: Mutex<Vec<RenderedMessage>>,
    pub clears: AtomicUsize,
    pub limits: Mutex<Option<BoardLimits>>,
    pub errors: Mutex<Vec<String>>,
}

impl MockView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rendered_ids(&self) -> Vec<u64> {
        self.rendered.lock().unwrap().iter().map(|m| m.id).collect()
    }

    pub fn rendered_len(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }

    pub fn saw_status(&self, wanted: &StatusLine) -> bool {
        self.statuses.lock().unwrap().iter().any(|s| s == wanted)
    }
}

impl BoardView for MockView {
    fn set_status(&self, status: StatusLine) {
        self.statuses.lock().unwrap().push(status);
    }

    fn show_limits(&self, limits: &BoardLimits) {
        *self.limits.lock().unwrap() = Some(*limits);
    }

    fn clear_messages(&self) {
        self.rendered.lock().unwrap().clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn render_message(&self, message: &RenderedMessage) {
        self.rendered.lock().unwrap().push(message.clone());
    }

    fn show_error(&self, error: &ConnectorError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

/// Polls a condition until it holds, yielding between checks. Panics after
/// a generous deadline so a broken engine fails the test instead of hanging
/// it.
pub async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    for _ in 0..750 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for: {what}");
}

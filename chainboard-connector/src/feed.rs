//! # Feed Synchronizer
//!
//! Renders the board's append-only, possibly-edited, possibly-soft-deleted
//! log as a paginated local list. Three independent triggers keep it fresh:
//! an explicit "load more", push notifications, and periodic polling. The
//! only consistency-recovery mechanism is a full re-render from offset zero;
//! no incremental reconciliation is attempted, because edits and deletions
//! can invalidate anything already rendered.

use std::sync::Arc;

use crate::error::ConnectorError;
use crate::events::StatusLine;
use crate::rpc::{BoardReader, PendingTx, Signer, WalletProvider};
use crate::types::{Address, BoardLimits, RenderedMessage};
use crate::view::BoardView;

/// Cursor lifecycle: `Empty → Loading → {HasMore, Terminal}`. Any mutation
/// trigger resets to `Empty`; `Terminal` is absorbing until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Empty,
    Loading,
    HasMore,
    Terminal,
}

/// Local pagination state over the remote log.
#[derive(Debug, Clone, Copy)]
pub struct PageCursor {
    /// Next unread index. Only ever advances by exactly the number of
    /// records rendered, so repeated loads neither duplicate nor skip.
    pub start: u64,
    pub page_size: u64,
    pub state: CursorState,
}

impl PageCursor {
    fn new(page_size: u64) -> Self {
        Self {
            start: 0,
            page_size,
            state: CursorState::Empty,
        }
    }

    fn reset(&mut self) {
        self.start = 0;
        self.state = CursorState::Empty;
    }

    pub fn is_terminal(&self) -> bool {
        self.state == CursorState::Terminal
    }
}

struct Target {
    address: Address,
    reader: Arc<dyn BoardReader>,
}

pub struct FeedSynchronizer {
    view: Arc<dyn BoardView>,
    cursor: PageCursor,
    target: Option<Target>,
    /// Freshness marker: last observed total record count.
    last_total: u64,
    /// The connected account, used to gate author-only affordances.
    viewer: Option<Address>,
}

impl FeedSynchronizer {
    pub fn new(view: Arc<dyn BoardView>, page_size: u64) -> Self {
        Self {
            view,
            cursor: PageCursor::new(page_size),
            target: None,
            last_total: 0,
            viewer: None,
        }
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn target_address(&self) -> Option<Address> {
        self.target.as_ref().map(|t| t.address)
    }

    pub fn viewer(&self) -> Option<Address> {
        self.viewer
    }

    /// Updates the viewer identity. Takes effect on the next render pass;
    /// already-rendered affordances are corrected by the following refresh.
    pub fn set_viewer(&mut self, viewer: Option<Address>) {
        self.viewer = viewer;
    }

    /// Points the feed at a board contract.
    ///
    /// A malformed address fails fast and leaves every piece of prior state
    /// untouched. On success the cursor and rendered list are reset, the
    /// board's advisory limits are fetched for display, the freshness marker
    /// is seeded, and the first page is loaded. Returns the new read handle
    /// so the caller can re-establish its push and poll workers against it.
    pub async fn set_target(
        &mut self,
        provider: &dyn WalletProvider,
        raw_address: &str,
    ) -> Result<Arc<dyn BoardReader>, ConnectorError> {
        let address: Address = raw_address.trim().parse()?;
        let reader = provider.reader_for(address);
        tracing::info!("feed retargeted to {address}");
        self.target = Some(Target {
            address,
            reader: reader.clone(),
        });
        self.view.set_status(StatusLine::TargetSet(address));
        self.cursor.reset();
        self.view.clear_messages();

        match read_limits(&*reader).await {
            Ok(limits) => self.view.show_limits(&limits),
            Err(e) => {
                tracing::warn!("failed to read board limits: {e}");
                self.view.set_status(StatusLine::LoadFailed);
                return Ok(reader);
            }
        }

        // Seed the freshness marker so the first poll tick does not force a
        // redundant refresh. Best-effort, as in every background read.
        match reader.total().await {
            Ok(total) => self.last_total = total,
            Err(e) => tracing::debug!("could not seed freshness marker: {e}"),
        }

        if let Err(e) = self.load_next_page().await {
            tracing::warn!("initial page load failed: {e}");
        }
        Ok(reader)
    }

    /// Fetches and renders the next page. No-op without a target or once the
    /// cursor is terminal. An empty read marks the cursor terminal; a
    /// non-empty read of length L renders L records and advances by L.
    pub async fn load_next_page(&mut self) -> Result<usize, ConnectorError> {
        let Some(target) = self.target.as_ref() else {
            return Ok(0);
        };
        if self.cursor.is_terminal() {
            return Ok(0);
        }

        let prior = self.cursor.state;
        self.cursor.state = CursorState::Loading;
        let page = match target
            .reader
            .get_range(self.cursor.start, self.cursor.page_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.cursor.state = prior;
                tracing::warn!("page load failed at offset {}: {e}", self.cursor.start);
                self.view.set_status(StatusLine::LoadFailed);
                return Err(e);
            }
        };

        if page.is_empty() {
            self.cursor.state = CursorState::Terminal;
            return Ok(0);
        }

        for record in &page {
            let message = RenderedMessage::project(record, self.viewer);
            self.view.render_message(&message);
        }
        self.cursor.start += page.len() as u64;
        self.cursor.state = CursorState::HasMore;
        Ok(page.len())
    }

    /// Drops the rendered list, resets the cursor, and loads the first page
    /// again. Idempotent when the remote log has not changed in between.
    pub async fn refresh_from_start(&mut self) -> Result<usize, ConnectorError> {
        if self.target.is_none() {
            return Ok(0);
        }
        self.cursor.reset();
        self.view.clear_messages();
        self.load_next_page().await
    }

    /// Feeds one poll observation into the freshness marker. Returns whether
    /// the total changed (and a refresh should therefore be scheduled).
    pub fn observe_total(&mut self, total: u64) -> bool {
        if total == self.last_total {
            return false;
        }
        tracing::debug!(
            "poll observed total {} (was {}), scheduling refresh",
            total,
            self.last_total
        );
        self.last_total = total;
        true
    }

    /// Submits a new message. Content is validated locally before any
    /// external call. The fee is read immediately before submission; a fee
    /// change in between can still fail the transaction externally, and that
    /// failure is surfaced rather than retried.
    pub async fn post(
        &mut self,
        signer: &Arc<dyn Signer>,
        content: &str,
        parent_id: u64,
    ) -> Result<(), ConnectorError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ConnectorError::EmptyContent);
        }
        let target = self.target.as_ref().ok_or(ConnectorError::NoTarget)?;
        let fee = target.reader.post_fee().await?;
        let writer = signer.writer_for(target.address);
        self.view.set_status(StatusLine::Submitting);
        let submitted = writer.post(content, parent_id, fee).await;
        self.track(submitted).await
    }

    /// Submits an edit. Authorship is enforced by the contract; the local
    /// affordance gating is a usability nicety, not a security boundary.
    pub async fn edit(
        &mut self,
        signer: &Arc<dyn Signer>,
        id: u64,
        new_content: &str,
    ) -> Result<(), ConnectorError> {
        let target = self.target.as_ref().ok_or(ConnectorError::NoTarget)?;
        let writer = signer.writer_for(target.address);
        self.view.set_status(StatusLine::Submitting);
        let submitted = writer.edit(id, new_content).await;
        self.track(submitted).await
    }

    /// Submits a soft delete.
    pub async fn soft_delete(
        &mut self,
        signer: &Arc<dyn Signer>,
        id: u64,
    ) -> Result<(), ConnectorError> {
        let target = self.target.as_ref().ok_or(ConnectorError::NoTarget)?;
        let writer = signer.writer_for(target.address);
        self.view.set_status(StatusLine::Submitting);
        let submitted = writer.soft_delete(id).await;
        self.track(submitted).await
    }

    /// Walks a submitted transaction through its status progression:
    /// submitted → awaiting confirmation (with hash) → confirmed or failed.
    async fn track(
        &self,
        submitted: Result<Box<dyn PendingTx>, ConnectorError>,
    ) -> Result<(), ConnectorError> {
        let pending = match submitted {
            Ok(pending) => pending,
            Err(e) => {
                self.view.set_status(StatusLine::TransactionFailed);
                return Err(e);
            }
        };
        self.view
            .set_status(StatusLine::AwaitingConfirmation(pending.hash().to_string()));
        match pending.confirm().await {
            Ok(()) => {
                self.view.set_status(StatusLine::Confirmed);
                Ok(())
            }
            Err(e) => {
                self.view.set_status(StatusLine::TransactionFailed);
                Err(e)
            }
        }
    }
}

async fn read_limits(reader: &dyn BoardReader) -> Result<BoardLimits, ConnectorError> {
    let (post_fee_wei, rate_limit_secs, max_content_bytes) = tokio::try_join!(
        reader.post_fee(),
        reader.rate_limit_seconds(),
        reader.max_content_length_bytes(),
    )?;
    Ok(BoardLimits {
        post_fee_wei,
        rate_limit_secs,
        max_content_bytes,
    })
}

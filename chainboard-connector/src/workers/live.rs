use std::sync::Arc;

use futures::stream::BoxStream;
use tokio::sync::Notify;
use tokio_stream::StreamExt;

use crate::events::BoardEvent;

/// Consumes the push notification stream for the current target and fires
/// the engine's coalesced refresh signal for every notification.
///
/// Payloads are not inspected beyond logging: posted, edited and deleted all
/// mean the same thing to the feed, a re-render from the start.
pub struct LiveWorker {
    events: BoxStream<'static, BoardEvent>,
    refresh: Arc<Notify>,
}

impl LiveWorker {
    pub fn new(events: BoxStream<'static, BoardEvent>, refresh: Arc<Notify>) -> Self {
        Self { events, refresh }
    }

    pub async fn run(mut self) {
        tracing::debug!("live worker attached to push stream");
        while let Some(event) = self.events.next().await {
            tracing::debug!(?event, "push notification received");
            self.refresh.notify_one();
        }
        // Polling remains the freshness backstop once the stream drops.
        tracing::debug!("push stream ended");
    }
}

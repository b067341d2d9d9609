use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::rpc::BoardReader;

/// The correctness backstop when push notifications are unavailable or
/// unreliable: reads the board's total record count at a fixed interval and
/// forwards each successful observation to the engine, which compares it
/// against the freshness marker.
///
/// Read failures are traced and dropped; a background poll must never
/// interrupt the user.
pub struct PollWorker {
    reader: Arc<dyn BoardReader>,
    interval: Duration,
    totals_tx: mpsc::Sender<u64>,
}

impl PollWorker {
    pub fn new(
        reader: Arc<dyn BoardReader>,
        interval: Duration,
        totals_tx: mpsc::Sender<u64>,
    ) -> Self {
        Self {
            reader,
            interval,
            totals_tx,
        }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately; consume
        // it so polling starts one full interval after the retarget.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.reader.total().await {
                Ok(total) => {
                    if self.totals_tx.send(total).await.is_err() {
                        tracing::debug!("engine gone, poll worker exiting");
                        return;
                    }
                }
                Err(e) => tracing::debug!("poll read failed: {e}"),
            }
        }
    }
}

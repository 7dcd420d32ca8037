//! Live view of one event

use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::board::EventBoard;
use crate::clock::Clock;
use crate::config::FiringlineConfig;
use crate::driver::Driver;
use crate::store::Store;
use crate::stream::SettleExt;
use crate::types::EventId;
use crate::Result;

#[cfg(test)]
mod tests;

const FIRST_BOARD_TIMEOUT: Duration = Duration::from_secs(5);

/// An open event: owns the tick task and exposes its boards.
///
/// Dropping the session cancels the tick.
pub struct EventSession {
    event_id: EventId,

    /// Board watch receiver
    boards: watch::Receiver<Option<Arc<EventBoard>>>,

    /// Cancellation token for stopping the tick
    cancel: CancellationToken,
}

impl EventSession {
    /// Spawn the tick for `event_id`.
    ///
    /// Waits for the first board before returning, so [`current_board`]
    /// is populated as soon as the session is handed out.
    ///
    /// [`current_board`]: EventSession::current_board
    pub(crate) async fn open<S: Store>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        event_id: EventId,
        config: &FiringlineConfig,
    ) -> Result<Self> {
        let channels = Driver::spawn(store, clock, event_id, config);

        let mut board_rx = channels.boards.clone();
        let wait_result = tokio::time::timeout(FIRST_BOARD_TIMEOUT, async {
            while board_rx.borrow_and_update().is_none() {
                if board_rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;

        if wait_result.is_err() {
            warn!(event = %event_id, "Timeout waiting for the first board");
        }

        info!(event = %event_id, "Event session opened");
        Ok(Self { event_id, boards: channels.boards, cancel: channels.cancel })
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Every board published from now on, starting with the current one.
    ///
    /// Slow consumers skip intermediate boards; the latest always wins.
    pub fn boards(&self) -> impl Stream<Item = Arc<EventBoard>> + 'static {
        WatchStream::new(self.boards.clone()).filter_map(|board| async move { board })
    }

    /// Boards up to and including the first one where every race finished.
    pub fn boards_until_settled(&self) -> impl Stream<Item = Arc<EventBoard>> + 'static {
        self.boards().until_settled()
    }

    /// Latest board, if one has been built.
    pub fn current_board(&self) -> Option<Arc<EventBoard>> {
        self.boards.borrow().clone()
    }

    /// Stop the tick now rather than on drop.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for EventSession {
    fn drop(&mut self) {
        debug!(event = %self.event_id, "Dropping event session");
        self.cancel.cancel();
    }
}

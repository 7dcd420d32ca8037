//! Driver spawns and manages the event tick task

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::board::EventBoard;
use crate::clock::Clock;
use crate::config::FiringlineConfig;
use crate::store::{Dependency, Store, WriteBatch, subscribe};
use crate::timing::pursuit::{TickSnapshot, apply_auto_start};
use crate::types::{EventId, Millis};
use crate::{RaceError, Result};

/// Result of spawning the tick task
pub struct DriverChannels {
    /// Latest board; `None` before the first tick and after the event vanished
    pub boards: watch::Receiver<Option<Arc<EventBoard>>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the periodic tick of one event
///
/// Each tick reads the event and its races once, starts every mass-start race
/// whose offset the master clock has reached, and publishes a fresh board. A
/// commit touching the event triggers the same step between ticks.
pub struct Driver;

impl Driver {
    pub fn spawn<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        event_id: EventId,
        config: &FiringlineConfig,
    ) -> DriverChannels
    where
        S: Store,
    {
        let (board_tx, board_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let cancel_tick = cancel.clone();
        let config = config.clone();
        tokio::spawn(async move {
            Self::tick_task(store, clock, event_id, config, board_tx, cancel_tick).await;
        });

        DriverChannels { boards: board_rx, cancel }
    }

    /// One synchronizer step at `now`.
    ///
    /// Auto-starts are committed one race at a time, each conditional on the
    /// race being unchanged since this step read it. A race somebody else
    /// wrote in between is skipped and picked up by the next step.
    pub async fn step<S>(store: &S, event_id: EventId, now: Millis) -> Result<EventBoard>
    where
        S: Store + ?Sized,
    {
        let event = store.event(event_id).await?.ok_or_else(|| RaceError::not_found("event", event_id))?;
        let mut races = store.races_for_event(event_id).await?;
        let snapshot = TickSnapshot::capture(&event, now);

        for race in races.iter_mut() {
            let mut started = race.clone();
            if !apply_auto_start(&mut started, &snapshot) {
                continue;
            }
            match store.commit(WriteBatch::new("auto_start").expect_race(race).put_race(started.clone())).await {
                Ok(_) => *race = started,
                Err(RaceError::Conflict { .. }) => {
                    debug!(race = %race.id, "Auto-start lost to a concurrent write, retrying next tick");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(EventBoard::build(&event, &races, now))
    }

    async fn tick_task<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        event_id: EventId,
        config: FiringlineConfig,
        board_tx: watch::Sender<Option<Arc<EventBoard>>>,
        cancel: CancellationToken,
    ) where
        S: Store,
    {
        info!(event = %event_id, interval_ms = config.tick_interval_ms, "Event tick started");
        let mut ticker = interval(config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut changes = Box::pin(subscribe(store.as_ref(), Dependency::Event(event_id)));

        let mut ticking = true;
        let mut tick_count = 0u64;
        let mut error_count = 0u32;
        const MAX_ERRORS: u32 = 10;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(event = %event_id, "Event tick cancelled");
                    break;
                }
                _ = ticker.tick(), if ticking => {
                    tick_count += 1;
                    trace!(event = %event_id, tick = tick_count, "Tick");
                }
                change = changes.next() => match change {
                    Some(change) => trace!(event = %event_id, revision = change.revision, "Records changed"),
                    None => {
                        debug!(event = %event_id, "Change feed closed");
                        break;
                    }
                },
            }

            match Self::step(store.as_ref(), event_id, clock.now()).await {
                Ok(board) => {
                    error_count = 0;
                    let settled = board.all_finished && config.stop_when_settled;
                    if settled && ticking {
                        info!(event = %event_id, ticks = tick_count, "Every race finished, tick paused");
                    } else if !settled && !ticking {
                        debug!(event = %event_id, "Event unsettled, tick resumed");
                        ticker.reset();
                    }
                    ticking = !settled;

                    if board_tx.send(Some(Arc::new(board))).is_err() {
                        debug!(event = %event_id, "Board receiver dropped, shutting down");
                        break;
                    }
                }
                Err(RaceError::NotFound { .. }) => {
                    info!(event = %event_id, "Event no longer exists");
                    let _ = board_tx.send(None);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!(event = %event_id, "Tick failed ({}/{}): {}", error_count, MAX_ERRORS, e);
                    if error_count >= MAX_ERRORS {
                        error!(event = %event_id, "Too many tick failures, shutting down");
                        let _ = board_tx.send(None);
                        break;
                    }
                    if !ticking {
                        warn!(event = %event_id, "Tick failed while paused, resuming");
                        ticking = true;
                    }
                }
            }
        }

        info!(event = %event_id, ticks = tick_count, "Event tick ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::test_utils::{event_of, pursuit_event, race_with_offset, seeded_store};
    use crate::timing::capture::capture_split;
    use crate::types::{Race, RaceMode};

    #[tokio::test]
    async fn step_starts_due_races_once() {
        let mut event = pursuit_event();
        event.start_time = Some(1_000);
        let early = race_with_offset(&event, 0);
        let late = race_with_offset(&event, 20_000);
        let store = seeded_store(&event, &[early.clone(), late.clone()]);

        let board = Driver::step(&store, event.id, 11_000).await.unwrap();
        assert_eq!(board.master_elapsed, Some(10_000));
        assert_eq!(store.race(early.id).await.unwrap().unwrap().splits.start, Some(11_000));
        assert_eq!(store.race(late.id).await.unwrap().unwrap().splits.start, None);

        let revision = store.revision().await;
        Driver::step(&store, event.id, 11_100).await.unwrap();
        assert_eq!(store.race(early.id).await.unwrap().unwrap().splits.start, Some(11_000));
        assert_eq!(store.revision().await, revision);
    }

    #[tokio::test]
    async fn step_without_running_clock_writes_nothing() {
        let event = pursuit_event();
        let race = race_with_offset(&event, 0);
        let store = seeded_store(&event, std::slice::from_ref(&race));

        let revision = store.revision().await;
        let board = Driver::step(&store, event.id, 5_000).await.unwrap();
        assert_eq!(board.master_elapsed, None);
        assert_eq!(board.awaiting().count(), 1);
        assert_eq!(store.revision().await, revision);
    }

    #[tokio::test]
    async fn step_reports_missing_event() {
        let store = MemoryStore::new();
        assert!(matches!(
            Driver::step(&store, EventId::new(), 0).await,
            Err(RaceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn step_keeps_the_other_writer() {
        let mut event = pursuit_event();
        event.start_time = Some(0);
        let race: Race = race_with_offset(&event, 0);
        let store = seeded_store(&event, std::slice::from_ref(&race));

        // Somebody captured the start by hand before this tick
        let mut manual = race.clone();
        manual.splits.start = Some(50);
        store.commit(WriteBatch::new("capture_split").put_race(manual)).await.unwrap();

        Driver::step(&store, event.id, 100).await.unwrap();
        assert_eq!(store.race(race.id).await.unwrap().unwrap().splits.start, Some(50));
    }

    #[tokio::test]
    async fn step_starts_only_the_first_relay_leg() {
        let mut event = event_of(RaceMode::Relay);
        event.start_time = Some(1_000_000);
        let legs: Vec<Race> = (1..=2)
            .map(|passage| {
                let mut race = Race::new(event.id, crate::types::CompetitorId::new(), event.mode);
                race.team_id = Some(1);
                race.passage_number = Some(passage);
                race
            })
            .collect();
        let store = seeded_store(&event, &legs);

        let board = Driver::step(&store, event.id, 1_000_100).await.unwrap();
        assert_eq!(store.race(legs[0].id).await.unwrap().unwrap().splits.start, Some(1_000_100));
        let second = store.race(legs[1].id).await.unwrap().unwrap();
        assert_eq!(second.splits.start, None);
        assert_eq!(board.awaiting().count(), 0);

        // the second leg starts on the handover capture
        let mut handover = second.clone();
        capture_split(&mut handover, 1_400_000).unwrap();
        store.commit(WriteBatch::new("capture_split").expect_race(&second).put_race(handover)).await.unwrap();
        Driver::step(&store, event.id, 1_400_100).await.unwrap();
        assert_eq!(store.race(legs[1].id).await.unwrap().unwrap().splits.start, Some(1_400_000));
    }
}

//! Tick and board propagation through an open event session
//!
//! Tokio time is paused, so intervals fire on demand; race time comes from a
//! `ManualClock` the tests move by hand.

use super::*;
use crate::board::EventBoard;
use crate::test_utils::{desk_at, race_day, roster};
use crate::timing::ManualEntry;
use crate::types::{Checkpoint, RaceMode};

async fn board_where(
    session: &EventSession,
    wanted: impl Fn(&EventBoard) -> bool,
) -> Arc<EventBoard> {
    let mut boards = Box::pin(session.boards());
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(board) = boards.next().await {
            if wanted(&board) {
                return board;
            }
        }
        panic!("board stream ended before the expected board");
    })
    .await
    .expect("expected board never arrived")
}

#[tokio::test(start_paused = true)]
async fn pursuit_races_start_at_their_offsets() {
    let _ = tracing_subscriber::fmt::try_init();

    let (desk, clock) = desk_at(0);
    let event = desk.create_event("Pursuit", race_day(), 2, RaceMode::Pursuit).await.unwrap();
    let [ada, bea] = roster(&desk, ["Ada", "Bea"]).await;
    let leader = desk.add_participant(event.id, ada, Some(0)).await.unwrap();
    let chaser = desk.add_participant(event.id, bea, Some(30_000)).await.unwrap();

    desk.start_master_clock(event.id).await.unwrap();
    let session = desk.open_event(event.id).await.unwrap();

    let board = board_where(&session, |b| b.awaiting().count() == 1).await;
    assert_eq!(board.rows[0].race_id, leader.id);
    assert_eq!(desk.race(leader.id).await.unwrap().splits.start, Some(0));

    clock.set(29_900);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(desk.race(chaser.id).await.unwrap().splits.start, None);

    clock.set(30_000);
    let board = board_where(&session, |b| b.awaiting().count() == 0).await;
    assert_eq!(board.master_elapsed, Some(30_000));
    assert_eq!(desk.race(chaser.id).await.unwrap().splits.start, Some(30_000));

    // many more ticks at later times do not move the start
    clock.set(31_000);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(desk.race(chaser.id).await.unwrap().splits.start, Some(30_000));
    assert_eq!(desk.race(leader.id).await.unwrap().splits.start, Some(0));
}

#[tokio::test(start_paused = true)]
async fn stopped_master_clock_freezes_race_clocks() {
    let _ = tracing_subscriber::fmt::try_init();

    let (desk, clock) = desk_at(0);
    let event = desk.create_event("Pursuit", race_day(), 2, RaceMode::Pursuit).await.unwrap();
    let [ada] = roster(&desk, ["Ada"]).await;
    let race = desk.add_participant(event.id, ada, Some(0)).await.unwrap();
    desk.start_master_clock(event.id).await.unwrap();
    let session = desk.open_event(event.id).await.unwrap();

    clock.set(10_000);
    board_where(&session, |b| b.row(race.id).and_then(|row| row.elapsed) == Some(10_000)).await;

    desk.stop_master_clock(event.id).await.unwrap();
    clock.set(25_000);
    let board = board_where(&session, |b| !b.clock_running).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let later = session.current_board().unwrap();

    for board in [board, later] {
        assert_eq!(board.master_elapsed, Some(10_000));
        assert_eq!(board.row(race.id).and_then(|row| row.elapsed), Some(10_000));
    }
}

#[tokio::test(start_paused = true)]
async fn board_stream_ends_once_every_race_finished() {
    let _ = tracing_subscriber::fmt::try_init();

    let (desk, _clock) = desk_at(0);
    let event = desk.create_event("Sprint", race_day(), 1, RaceMode::Sprint).await.unwrap();
    let [ada] = roster(&desk, ["Ada"]).await;
    let race = desk.add_participant(event.id, ada, None).await.unwrap();
    let session = desk.open_event(event.id).await.unwrap();
    let boards = session.boards_until_settled();

    let entry = ManualEntry::new().time(Checkpoint::Start, "0").time(Checkpoint::Finish, "8:45.0");
    desk.manual_entry(race.id, &entry).await.unwrap();

    let seen: Vec<_> =
        tokio::time::timeout(Duration::from_secs(10), boards.collect()).await.expect("stream never ended");
    let last = seen.last().expect("at least one board");
    assert!(last.all_finished);
    assert_eq!(last.row(race.id).and_then(|row| row.elapsed), Some(525_000));
    assert!(seen[..seen.len() - 1].iter().all(|board| !board.all_finished));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_session_stops_the_tick() {
    let (desk, _clock) = desk_at(0);
    let event = desk.create_event("Sprint", race_day(), 1, RaceMode::Sprint).await.unwrap();
    let session = desk.open_event(event.id).await.unwrap();
    let boards = session.boards();
    assert!(!session.is_closed());

    drop(session);
    let result = tokio::time::timeout(Duration::from_secs(10), boards.count()).await;
    assert!(result.is_ok(), "board stream kept running after drop");
}

#[tokio::test(start_paused = true)]
async fn deleting_the_event_ends_the_session() {
    let (desk, _clock) = desk_at(0);
    let event = desk.create_event("Sprint", race_day(), 1, RaceMode::Sprint).await.unwrap();
    let session = desk.open_event(event.id).await.unwrap();
    assert!(session.current_board().is_some());
    let boards = session.boards();

    desk.delete_event(event.id).await.unwrap();
    tokio::time::timeout(Duration::from_secs(10), boards.count()).await.expect("stream never ended");
    assert!(session.current_board().is_none());
}

#[tokio::test]
async fn opening_unknown_event_fails() {
    let (desk, _clock) = desk_at(0);
    assert!(matches!(
        desk.open_event(EventId::new()).await,
        Err(crate::RaceError::NotFound { .. })
    ));
}

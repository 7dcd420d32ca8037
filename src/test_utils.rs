//! Fixtures shared by unit tests, integration tests and benchmarks

#![cfg(any(test, feature = "benchmark"))]

use chrono::NaiveDate;
use std::sync::Arc;

use crate::clock::ManualClock;
use crate::config::FiringlineConfig;
use crate::desk::RaceDesk;
use crate::store::{Dataset, Store};
use crate::stores::MemoryStore;
use crate::types::{Checkpoint, CompetitorId, Event, Millis, Race, RaceMode, ShootingScore};

/// Date used by every fixture event.
pub fn race_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 18).unwrap_or_default()
}

pub fn event_of(mode: RaceMode) -> Event {
    Event::new(format!("{mode} fixture"), race_day(), 1, mode)
}

pub fn sprint_event() -> Event {
    event_of(RaceMode::Sprint)
}

pub fn pursuit_event() -> Event {
    event_of(RaceMode::Pursuit)
}

pub fn race_with_offset(event: &Event, offset: Millis) -> Race {
    let mut race = Race::new(event.id, CompetitorId::new(), event.mode);
    race.start_offset = Some(offset);
    race
}

/// A race of `event` with the first `captured` checkpoints of its course set,
/// one minute apart from `start`.
pub fn race_in_progress(event: &Event, start: Millis, captured: usize) -> Race {
    let mut race = Race::new(event.id, CompetitorId::new(), event.mode);
    for (n, &checkpoint) in Checkpoint::course(event.mode).iter().take(captured).enumerate() {
        race.splits.set(checkpoint, Some(start + n as Millis * 60_000));
    }
    if race.splits.finish.is_some() {
        race.total_time = race.splits.finish.zip(race.splits.start).map(|(f, s)| f - s);
    }
    for &bout in race.bouts() {
        if race.splits.get(Checkpoint::shoot(bout.number()).unwrap_or(Checkpoint::Finish)).is_some() {
            race.set_bout(bout, ShootingScore::from_errors((bout.number() % 3) as u8));
        }
    }
    crate::timing::penalty::recompute_penalties(&mut race);
    race
}

/// An event with `count` races spread over every phase of the course.
pub fn busy_event(mode: RaceMode, count: usize) -> (Event, Vec<Race>) {
    let mut event = event_of(mode);
    if mode.is_mass_start() {
        event.start_time = Some(0);
    }
    let course = Checkpoint::course(mode).len() + 1;
    let races = (0..count)
        .map(|i| {
            let mut race = race_in_progress(&event, (i as Millis) * 1_000, i % course);
            race.start_offset = Some((i as Millis) * 1_000);
            race
        })
        .collect();
    (event, races)
}

/// Store holding `event` and `races`.
pub fn seeded_store(event: &Event, races: &[Race]) -> MemoryStore {
    MemoryStore::with_dataset(Dataset {
        competitors: vec![],
        events: vec![event.clone()],
        races: races.to_vec(),
    })
}

/// In-memory desk on a manual clock set to `now`.
pub fn desk_at(now: Millis) -> (RaceDesk<MemoryStore>, ManualClock) {
    desk_with(now, FiringlineConfig::default())
}

pub fn desk_with(now: Millis, config: FiringlineConfig) -> (RaceDesk<MemoryStore>, ManualClock) {
    let clock = ManualClock::new(now);
    let desk = RaceDesk::with_clock(Arc::new(MemoryStore::new()), Arc::new(clock.clone()), config);
    (desk, clock)
}

/// Add competitors by name and return their ids in order.
///
/// # Panics
///
/// Panics if a name is rejected.
pub async fn roster<S: Store, const N: usize>(desk: &RaceDesk<S>, names: [&str; N]) -> [CompetitorId; N] {
    let mut ids = [CompetitorId::default(); N];
    for (slot, name) in ids.iter_mut().zip(names) {
        match desk.add_competitor(name).await {
            Ok(competitor) => *slot = competitor.id,
            Err(e) => panic!("fixture competitor {name} rejected: {e}"),
        }
    }
    ids
}

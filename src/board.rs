//! Display-ready view of one event
//!
//! A board is rebuilt from the current records on every tick. It holds only
//! values derived at build time, so it can be shared behind an `Arc`.

use serde::{Deserialize, Serialize};

use crate::timing::pursuit::{TickSnapshot, race_elapsed};
use crate::timing::{Phase, RaceTimes};
use crate::types::{CompetitorId, Event, EventId, Millis, Race, RaceId, RaceMode, TeamId};

/// One race on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub race_id: RaceId,
    pub competitor_id: CompetitorId,
    pub opponent_id: Option<CompetitorId>,
    pub team_id: Option<TeamId>,
    pub passage_number: Option<u32>,
    pub phase: Phase,
    /// The race's own running time, total once finished
    pub elapsed: Option<Millis>,
    pub times: RaceTimes,
    pub penalty_count: u32,
    pub start_offset: Option<Millis>,
    /// Mass-start race still waiting for its offset
    pub awaiting_start: bool,
}

impl BoardRow {
    fn build(race: &Race, event: &Event, now: Millis) -> Self {
        Self {
            race_id: race.id,
            competitor_id: race.competitor_id,
            opponent_id: race.opponent_id,
            team_id: race.team_id,
            passage_number: race.passage_number,
            phase: Phase::of(race),
            elapsed: race_elapsed(race, event, now),
            times: RaceTimes::of(race),
            penalty_count: race.penalty_count,
            start_offset: race.start_offset,
            awaiting_start: event.mode.is_mass_start()
                && race.starts_on_master_clock()
                && !race.is_started(),
        }
    }
}

/// Snapshot of an event as shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct EventBoard {
    pub event_id: EventId,
    pub mode: RaceMode,
    pub built_at: Millis,
    pub clock_running: bool,
    /// Master clock: running, frozen at the last stop, or `None`
    pub master_elapsed: Option<Millis>,
    pub rows: Vec<BoardRow>,
    /// Every race has its finish; the tick may stop
    pub all_finished: bool,
}

impl EventBoard {
    /// Build from the event and its races at `now`.
    ///
    /// Pursuit rows are ordered by start offset, relay rows by team then
    /// passage; other modes keep record order.
    pub fn build(event: &Event, races: &[Race], now: Millis) -> Self {
        let mut order: Vec<&Race> = races.iter().collect();
        match event.mode {
            RaceMode::Pursuit => order.sort_by_key(|race| race.start_offset.unwrap_or(0)),
            RaceMode::Relay => order.sort_by_key(|race| {
                (race.team_id.unwrap_or(TeamId::MAX), race.passage_number.unwrap_or(u32::MAX))
            }),
            RaceMode::Sprint | RaceMode::Individual => {}
        }

        Self {
            event_id: event.id,
            mode: event.mode,
            built_at: now,
            clock_running: event.clock_running(),
            master_elapsed: TickSnapshot::display_elapsed(event, now),
            rows: order.into_iter().map(|race| BoardRow::build(race, event, now)).collect(),
            all_finished: !races.is_empty() && races.iter().all(Race::is_finished),
        }
    }

    pub fn row(&self, race_id: RaceId) -> Option<&BoardRow> {
        self.rows.iter().find(|row| row.race_id == race_id)
    }

    /// Rows still waiting for an auto-start.
    pub fn awaiting(&self) -> impl Iterator<Item = &BoardRow> {
        self.rows.iter().filter(|row| row.awaiting_start)
    }
}

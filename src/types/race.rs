//! Race record: one competitor's participation in one event

use serde::{Deserialize, Serialize};

use super::{
    Bout, Checkpoint, CompetitorId, EventId, Millis, RaceId, RaceMode, ShootingScore, Splits,
    TeamId,
};

/// One competitor's participation in one event.
///
/// `total_time` and `penalty_count` are derived fields; they are recomputed
/// from `splits` and the bout scores on every write, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub id: RaceId,
    pub event_id: EventId,
    pub competitor_id: CompetitorId,
    /// Duel partner; the partner race references this competitor back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<CompetitorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage_number: Option<u32>,
    pub mode: RaceMode,
    #[serde(default)]
    pub splits: Splits,
    /// `None` until the bout has been shot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shooting1: Option<ShootingScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shooting2: Option<ShootingScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shooting3: Option<ShootingScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shooting4: Option<ShootingScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<Millis>,
    #[serde(default)]
    pub penalty_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

impl Race {
    /// Fresh race with no splits and no bouts shot.
    pub fn new(event_id: EventId, competitor_id: CompetitorId, mode: RaceMode) -> Self {
        Self {
            id: RaceId::new(),
            event_id,
            competitor_id,
            opponent_id: None,
            team_id: None,
            passage_number: None,
            mode,
            splits: Splits::default(),
            shooting1: None,
            shooting2: None,
            shooting3: None,
            shooting4: None,
            total_time: None,
            penalty_count: 0,
            start_offset: None,
            rank: None,
            points: None,
        }
    }

    pub fn bout(&self, bout: Bout) -> Option<ShootingScore> {
        match bout {
            Bout::First => self.shooting1,
            Bout::Second => self.shooting2,
            Bout::Third => self.shooting3,
            Bout::Fourth => self.shooting4,
        }
    }

    pub fn set_bout(&mut self, bout: Bout, score: Option<ShootingScore>) {
        match bout {
            Bout::First => self.shooting1 = score,
            Bout::Second => self.shooting2 = score,
            Bout::Third => self.shooting3 = score,
            Bout::Fourth => self.shooting4 = score,
        }
    }

    /// Bouts this race's mode carries.
    pub fn bouts(&self) -> &'static [Bout] {
        &Bout::ALL[..self.mode.bout_count()]
    }

    pub fn checkpoint(&self, checkpoint: Checkpoint) -> Option<Millis> {
        self.splits.get(checkpoint)
    }

    pub fn is_started(&self) -> bool {
        self.splits.start.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.splits.finish.is_some()
    }

    /// Whether the master clock starts this race.
    ///
    /// Relay legs after the first start on the handover, by capture.
    pub fn starts_on_master_clock(&self) -> bool {
        match self.mode {
            RaceMode::Pursuit => true,
            RaceMode::Relay => self.passage_number.is_none_or(|passage| passage <= 1),
            RaceMode::Sprint | RaceMode::Individual => false,
        }
    }
}

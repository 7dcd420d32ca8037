//! Segment and total durations derived from checkpoints
//!
//! Nothing here is stored: every value is recomputed from the current splits on
//! read. A duration whose inputs are missing, or whose inputs are out of order,
//! is `None` ("unavailable"), which is distinct from a genuine zero.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Checkpoint, Millis, Race, RaceMode, Splits};

/// Duration between two checkpoints, if both exist and are ordered.
fn span(splits: &Splits, from: Checkpoint, to: Checkpoint) -> Option<Millis> {
    let (start, end) = (splits.get(from)?, splits.get(to)?);
    let duration = end - start;
    if duration < 0 {
        warn!(%from, %to, duration, "Negative segment duration, treating as unavailable");
        return None;
    }
    Some(duration)
}

/// Number of skiing legs for `mode` (one more than the bouts).
pub fn leg_count(mode: RaceMode) -> usize {
    mode.bout_count() + 1
}

/// Checkpoints bounding leg `n` (1-based).
fn leg_bounds(mode: RaceMode, n: usize) -> Option<(Checkpoint, Checkpoint)> {
    let bouts = mode.bout_count();
    if n == 0 || n > bouts + 1 {
        return None;
    }
    let from = if n == 1 { Checkpoint::Start } else { Checkpoint::shoot(n - 1)? };
    let to = if n == bouts + 1 { Checkpoint::Finish } else { Checkpoint::lap(n)? };
    Some((from, to))
}

/// Skiing time of leg `n` (1-based); the final leg ends at the finish.
pub fn leg_duration(splits: &Splits, mode: RaceMode, n: usize) -> Option<Millis> {
    let (from, to) = leg_bounds(mode, n)?;
    span(splits, from, to)
}

/// Range time of bout `n` (1-based): range entry to range exit.
pub fn bout_duration(splits: &Splits, mode: RaceMode, n: usize) -> Option<Millis> {
    if n == 0 || n > mode.bout_count() {
        return None;
    }
    span(splits, Checkpoint::lap(n)?, Checkpoint::shoot(n)?)
}

fn sum_available(parts: &[Option<Millis>]) -> Option<Millis> {
    parts.iter().flatten().copied().reduce(|acc, d| acc + d)
}

/// All derived durations of one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct RaceTimes {
    pub legs: Vec<Option<Millis>>,
    pub bouts: Vec<Option<Millis>>,
    /// Sum of available legs, `None` if no leg is available
    pub total_ski: Option<Millis>,
    /// Sum of available bouts, `None` if no bout is available
    pub total_range: Option<Millis>,
    /// `finish - start`
    pub course_time: Option<Millis>,
}

impl RaceTimes {
    pub fn from_splits(splits: &Splits, mode: RaceMode) -> Self {
        let legs: Vec<_> = (1..=leg_count(mode)).map(|n| leg_duration(splits, mode, n)).collect();
        let bouts: Vec<_> =
            (1..=mode.bout_count()).map(|n| bout_duration(splits, mode, n)).collect();
        Self {
            total_ski: sum_available(&legs),
            total_range: sum_available(&bouts),
            course_time: span(splits, Checkpoint::Start, Checkpoint::Finish),
            legs,
            bouts,
        }
    }

    pub fn of(race: &Race) -> Self {
        Self::from_splits(&race.splits, race.mode)
    }

    /// Whether every leg and bout is available.
    pub fn is_complete(&self) -> bool {
        self.legs.iter().chain(&self.bouts).all(Option::is_some)
    }
}

//! Sequential split capture
//!
//! A capture writes the current time into the checkpoint the race's phase is
//! waiting for. Writing the finish also stores `total_time` in the same write.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase::Phase;
use crate::types::{Checkpoint, Millis, Race};
use crate::{RaceError, Result};

/// Result of a capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum CaptureOutcome {
    /// Checkpoint written
    #[serde(rename_all = "camelCase")]
    Captured { checkpoint: Checkpoint, at: Millis, next: Phase, total_time: Option<Millis> },
    /// Race already finished; nothing written
    AlreadyDone,
    /// Race moved past the phase the caller saw; nothing written
    #[serde(rename_all = "camelCase")]
    Stale { seen: Phase, actual: Phase },
}

impl CaptureOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, CaptureOutcome::Captured { .. })
    }
}

/// `finish - start` once the finish exists.
pub fn course_total(race: &Race) -> Option<Millis> {
    let finish = race.splits.finish?;
    Some(race.splits.start.map_or(finish, |start| finish - start))
}

/// Capture `at` into the race's pending checkpoint.
///
/// Leaves the race untouched when it is done, or when `at` would break the
/// temporal order of checkpoints already present (e.g. entered manually).
pub fn capture_split(race: &mut Race, at: Millis) -> Result<CaptureOutcome> {
    let phase = Phase::of(race);
    let Some(checkpoint) = phase.pending() else {
        debug!(race = %race.id, "Capture ignored, race already done");
        return Ok(CaptureOutcome::AlreadyDone);
    };

    let mut splits = race.splits;
    splits.set(checkpoint, Some(at));
    if let Some((before, after)) = splits.first_disorder(race.mode) {
        return Err(RaceError::validation(
            checkpoint.as_str(),
            format!("capture at {at} would place {after} before {before}"),
        ));
    }

    race.splits = splits;
    if checkpoint == Checkpoint::Finish {
        race.total_time = course_total(race);
    }

    let next = Phase::of(race);
    debug!(race = %race.id, %checkpoint, at, %next, "Checkpoint captured");
    Ok(CaptureOutcome::Captured { checkpoint, at, next, total_time: race.total_time })
}

/// Capture only if the race is still in the phase the caller saw.
///
/// A double press from the same screen state advances the race once.
pub fn capture_split_seen(race: &mut Race, seen: Phase, at: Millis) -> Result<CaptureOutcome> {
    let actual = Phase::of(race);
    if actual != seen {
        debug!(race = %race.id, %seen, %actual, "Capture ignored, phase moved on");
        return Ok(CaptureOutcome::Stale { seen, actual });
    }
    capture_split(race, at)
}

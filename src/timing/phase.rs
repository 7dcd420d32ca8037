//! Split capture phases
//!
//! The phase of a race is never stored. It is a pure function of which
//! checkpoints are populated, looked up through a per-mode transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Checkpoint, Race, RaceMode, Splits};

/// Where a race stands in its course.
///
/// Every phase except [`Phase::Done`] waits for exactly one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Ready,
    Lap1,
    Shoot1,
    Lap2,
    Shoot2,
    Lap3,
    Shoot3,
    Lap4,
    Shoot4,
    Finish,
    Done,
}

/// Phase → checkpoint it captures.
const TRANSITIONS: [(Phase, Checkpoint); 10] = [
    (Phase::Ready, Checkpoint::Start),
    (Phase::Lap1, Checkpoint::Lap1),
    (Phase::Shoot1, Checkpoint::Shoot1),
    (Phase::Lap2, Checkpoint::Lap2),
    (Phase::Shoot2, Checkpoint::Shoot2),
    (Phase::Lap3, Checkpoint::Lap3),
    (Phase::Shoot3, Checkpoint::Shoot3),
    (Phase::Lap4, Checkpoint::Lap4),
    (Phase::Shoot4, Checkpoint::Shoot4),
    (Phase::Finish, Checkpoint::Finish),
];

impl Phase {
    /// Derive the phase from populated checkpoints.
    ///
    /// A race with `finish` set is done; otherwise the phase is the first
    /// unset checkpoint of the mode's course.
    pub fn of_splits(splits: &Splits, mode: RaceMode) -> Phase {
        if splits.finish.is_some() {
            return Phase::Done;
        }
        Checkpoint::course(mode)
            .iter()
            .find(|&&cp| splits.get(cp).is_none())
            .map_or(Phase::Done, |&cp| Phase::awaiting(cp))
    }

    pub fn of(race: &Race) -> Phase {
        Self::of_splits(&race.splits, race.mode)
    }

    /// Phase that waits for `checkpoint`.
    pub fn awaiting(checkpoint: Checkpoint) -> Phase {
        TRANSITIONS
            .iter()
            .find(|(_, cp)| *cp == checkpoint)
            .map_or(Phase::Done, |(phase, _)| *phase)
    }

    /// Checkpoint this phase captures, `None` once done.
    pub fn pending(self) -> Option<Checkpoint> {
        TRANSITIONS.iter().find(|(phase, _)| *phase == self).map(|(_, cp)| *cp)
    }

    /// Phase after capturing this phase's checkpoint in `mode`.
    pub fn next(self, mode: RaceMode) -> Phase {
        let Some(current) = self.pending() else {
            return Phase::Done;
        };
        let course = Checkpoint::course(mode);
        course
            .iter()
            .position(|&cp| cp == current)
            .and_then(|index| course.get(index + 1))
            .map_or(Phase::Done, |&cp| Phase::awaiting(cp))
    }

    pub fn is_done(self) -> bool {
        self == Phase::Done
    }

    /// Operator-facing label for the capture button.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Ready => "Start",
            Phase::Lap1 => "End lap 1",
            Phase::Shoot1 => "Leave range 1",
            Phase::Lap2 => "End lap 2",
            Phase::Shoot2 => "Leave range 2",
            Phase::Lap3 => "End lap 3",
            Phase::Shoot3 => "Leave range 3",
            Phase::Lap4 => "End lap 4",
            Phase::Shoot4 => "Leave range 4",
            Phase::Finish => "Finish",
            Phase::Done => "Finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

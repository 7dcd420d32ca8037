//! Shooting penalty ledger
//!
//! `penalty_count` is always the sum of the recorded bout errors. It is
//! recomputed from scratch after every write rather than adjusted by a delta,
//! so repeated or out-of-order writes to the same bout cannot make it drift.

use crate::types::{Bout, Race, ShootingScore, TARGETS_PER_BOUT};
use crate::{RaceError, Result};

/// Sum of errors over the bouts that have been shot.
pub fn penalty_total(race: &Race) -> u32 {
    race.bouts().iter().filter_map(|&bout| race.bout(bout)).map(|s| u32::from(s.errors)).sum()
}

/// Recompute the derived penalty count in place.
pub fn recompute_penalties(race: &mut Race) {
    race.penalty_count = penalty_total(race);
}

fn check_bout(race: &Race, bout: Bout) -> Result<()> {
    if !race.bouts().contains(&bout) {
        return Err(RaceError::validation(
            "bout",
            format!("{} races have {} bouts, got {}", race.mode, race.mode.bout_count(), bout),
        ));
    }
    Ok(())
}

/// Record `hits` for `bout` (errors = 5 - hits) and recompute the total.
pub fn set_shooting_result(race: &mut Race, bout: Bout, hits: u8) -> Result<ShootingScore> {
    check_bout(race, bout)?;
    let score = ShootingScore::from_hits(hits).ok_or_else(|| {
        RaceError::validation("hits", format!("{hits} is outside 0..={TARGETS_PER_BOUT}"))
    })?;
    race.set_bout(bout, Some(score));
    recompute_penalties(race);
    Ok(score)
}

/// Record an error count directly, as manual entry does.
pub fn set_bout_errors(race: &mut Race, bout: Bout, errors: u8) -> Result<ShootingScore> {
    check_bout(race, bout)?;
    let score = ShootingScore::from_errors(errors).ok_or_else(|| {
        RaceError::validation("errors", format!("{errors} is outside 0..={TARGETS_PER_BOUT}"))
    })?;
    race.set_bout(bout, Some(score));
    recompute_penalties(race);
    Ok(score)
}

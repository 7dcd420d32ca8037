//! Timing and shooting commands on a single race

use tracing::{debug, info};

use super::RaceDesk;
use crate::store::Store;
use crate::timing::capture::{self, CaptureOutcome};
use crate::timing::manual::{ManualEntry, apply_manual_entry};
use crate::timing::pairing::standings;
use crate::timing::{Phase, penalty};
use crate::types::{Bout, EventId, Millis, Race, RaceId, ShootingScore};
use crate::{RaceError, Result};

impl<S: Store> RaceDesk<S> {
    /// Stamp the current time into the race's pending checkpoint.
    ///
    /// A race that is already done is left as it is and reports
    /// [`CaptureOutcome::AlreadyDone`].
    pub async fn capture_split(&self, race_id: RaceId) -> Result<CaptureOutcome> {
        let at = self.now();
        let (_, outcome) =
            self.update_race(race_id, "capture_split", |race| capture::capture_split(race, at)).await?;
        Ok(outcome)
    }

    /// Capture only if the race still shows `seen`.
    ///
    /// Two presses issued from the same screen state advance the race once:
    /// the second reports [`CaptureOutcome::Stale`].
    pub async fn capture_split_seen(&self, race_id: RaceId, seen: Phase) -> Result<CaptureOutcome> {
        let at = self.now();
        let (_, outcome) = self
            .update_race(race_id, "capture_split", |race| capture::capture_split_seen(race, seen, at))
            .await?;
        Ok(outcome)
    }

    /// Overwrite checkpoints and bout errors from typed-in values.
    ///
    /// Times count from the race start; an unstarted race starts now.
    pub async fn manual_entry(&self, race_id: RaceId, entry: &ManualEntry) -> Result<Race> {
        let now = self.now();
        let (race, ()) = self
            .update_race(race_id, "manual_entry", |race| apply_manual_entry(race, entry, now))
            .await?;
        Ok(race)
    }

    /// Record the hits of one bout. Returns the stored score.
    pub async fn set_shooting_result(&self, race_id: RaceId, bout: Bout, hits: u8) -> Result<ShootingScore> {
        let (race, score) = self
            .update_race(race_id, "set_shooting_result", |race| {
                penalty::set_shooting_result(race, bout, hits)
            })
            .await?;
        debug!(race = %race.id, %bout, errors = score.errors, penalties = race.penalty_count, "Shooting recorded");
        Ok(score)
    }

    /// Schedule a mass-start race `offset` ms after the master clock starts.
    pub async fn set_start_offset(&self, race_id: RaceId, offset: Millis) -> Result<Race> {
        if offset < 0 {
            return Err(RaceError::validation("startOffset", format!("{offset} ms is negative")));
        }
        let (race, ()) = self
            .update_race(race_id, "set_start_offset", |race| {
                if !race.mode.is_mass_start() {
                    return Err(RaceError::unsupported("Start offsets", race.mode));
                }
                if race.is_started() {
                    info!(race = %race.id, "Offset changed after start, it no longer applies");
                }
                race.start_offset = Some(offset);
                Ok(())
            })
            .await?;
        Ok(race)
    }

    /// Finished races of an event, fastest first.
    pub async fn standings(&self, event_id: EventId) -> Result<Vec<Race>> {
        let races = self.races(event_id).await?;
        Ok(standings(&races).into_iter().cloned().collect())
    }
}

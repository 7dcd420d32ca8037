//! Pursuit start synchronizer
//!
//! Mass-start events share one master clock. Each race carries a start offset;
//! once the master elapsed time reaches it, the race's own clock starts by
//! writing its `start` checkpoint, exactly once.
//!
//! The master clock is read once per tick into a [`TickSnapshot`] and that
//! immutable value is passed to every per-race check of the tick.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{ClockHalt, Event, Millis, Race};
use crate::{RaceError, Result};

/// What restarting a stopped master clock does to the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum ResumePolicy {
    /// New epoch at restart; offsets count from the restart
    #[default]
    Rebaseline,
    /// Epoch shifted so master elapsed continues from where it stopped
    PreserveElapsed,
}

/// Result of a master-clock command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum ClockTransition {
    Started { epoch: Millis },
    AlreadyRunning,
    Stopped { elapsed: Millis },
    NotRunning,
}

/// The master clock of one event at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSnapshot {
    pub now: Millis,
    /// `now - epoch`, `None` while the clock is not running
    pub master_elapsed: Option<Millis>,
}

impl TickSnapshot {
    pub fn capture(event: &Event, now: Millis) -> Self {
        Self { now, master_elapsed: event.start_time.map(|epoch| now - epoch) }
    }

    /// Master time to display: running, or frozen at the last stop.
    pub fn display_elapsed(event: &Event, now: Millis) -> Option<Millis> {
        match (event.start_time, event.halt) {
            (Some(epoch), _) => Some(now - epoch),
            (None, Some(halt)) => Some(halt.elapsed),
            (None, None) => None,
        }
    }
}

/// Whether the synchronizer should start `race` in this tick.
pub fn is_due(race: &Race, snapshot: &TickSnapshot) -> bool {
    let Some(master) = snapshot.master_elapsed else {
        return false;
    };
    race.starts_on_master_clock()
        && !race.is_started()
        && !race.is_finished()
        && master >= race.start_offset.unwrap_or(0)
}

/// Races to auto-start in this tick.
pub fn due_starts<'a>(
    races: &'a [Race],
    snapshot: &'a TickSnapshot,
) -> impl Iterator<Item = &'a Race> + 'a {
    races.iter().filter(move |race| is_due(race, snapshot))
}

/// Write `start = now` if the race is still due. Returns whether it wrote.
///
/// Re-checks `start` at write time, so repeated ticks start a race once.
pub fn apply_auto_start(race: &mut Race, snapshot: &TickSnapshot) -> bool {
    if !is_due(race, snapshot) {
        return false;
    }
    let mut splits = race.splits;
    splits.start = Some(snapshot.now);
    if let Some((before, after)) = splits.first_disorder(race.mode) {
        warn!(race = %race.id, %before, %after, "Auto-start skipped, would break checkpoint order");
        return false;
    }
    race.splits = splits;
    debug!(race = %race.id, offset = race.start_offset.unwrap_or(0), at = snapshot.now, "Auto-started");
    true
}

/// Start (or resume) the master clock of a mass-start event.
pub fn start_clock(event: &mut Event, now: Millis, policy: ResumePolicy) -> Result<ClockTransition> {
    if !event.mode.is_mass_start() {
        return Err(RaceError::unsupported("Master clock", event.mode));
    }
    if event.start_time.is_some() {
        return Ok(ClockTransition::AlreadyRunning);
    }

    let epoch = match (policy, event.halt) {
        (ResumePolicy::PreserveElapsed, Some(halt)) => now - halt.elapsed,
        _ => now,
    };
    event.start_time = Some(epoch);
    event.halt = None;
    info!(event = %event.id, epoch, ?policy, "Master clock started");
    Ok(ClockTransition::Started { epoch })
}

/// Stop the master clock. Captured checkpoints are kept.
pub fn stop_clock(event: &mut Event, now: Millis) -> Result<ClockTransition> {
    if !event.mode.is_mass_start() {
        return Err(RaceError::unsupported("Master clock", event.mode));
    }
    let Some(epoch) = event.start_time.take() else {
        return Ok(ClockTransition::NotRunning);
    };
    let elapsed = now - epoch;
    event.halt = Some(ClockHalt { at: now, elapsed });
    info!(event = %event.id, elapsed, "Master clock stopped");
    Ok(ClockTransition::Stopped { elapsed })
}

/// The race's own running time at `now`.
///
/// Finished races show their total. While a mass-start event's master clock is
/// stopped, unfinished race clocks are frozen at the stop instant.
pub fn race_elapsed(race: &Race, event: &Event, now: Millis) -> Option<Millis> {
    if race.is_finished() {
        return race.total_time;
    }
    let start = race.splits.start?;
    let until = match (event.mode.is_mass_start(), event.start_time, event.halt) {
        (true, None, Some(halt)) => halt.at,
        _ => now,
    };
    Some((until - start).max(0))
}

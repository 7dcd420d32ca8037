//! Manual time entry
//!
//! Operators type times as `minutes:seconds.fraction` or `seconds.fraction`.
//! Entered times are cumulative from the race start and bypass the sequential
//! capture machine. They are stored on the same absolute time base as captured
//! checkpoints, so captures and manual corrections can be mixed on one race.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::penalty;
use crate::types::{Bout, Checkpoint, Millis, Race};
use crate::{RaceError, Result};

/// Parse `"SS.fff"` into milliseconds. Digits past the third decimal are dropped.
fn parse_seconds(text: &str) -> Option<Millis> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let seconds: Millis = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let millis = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0, |acc, digit| acc * 10 + Millis::from(digit - b'0'));

    seconds.checked_mul(1_000)?.checked_add(millis)
}

/// Parse an operator-entered time into milliseconds.
///
/// Accepts `"2:15.5"` (135500) and `"65.25"` (65250). Returns `None` for empty
/// or malformed input; seconds must stay below 60 when minutes are given.
pub fn parse_time_input(input: &str) -> Option<Millis> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let mut parts = input.split(':');
    let first = parts.next()?;
    let second = parts.next();
    if parts.next().is_some() {
        return None;
    }

    match second {
        None => parse_seconds(first),
        Some(rest) => {
            if first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let minutes: Millis = first.parse().ok()?;
            let seconds = parse_seconds(rest)?;
            if seconds >= 60_000 {
                return None;
            }
            minutes.checked_mul(60_000)?.checked_add(seconds)
        }
    }
}

/// Parse an offset typed in seconds (`"12.5"` → 12500 ms).
pub fn parse_offset_seconds(input: &str) -> Option<Millis> {
    parse_seconds(input.trim())
}

fn split_tenths(ms: Millis) -> (Millis, Millis, Millis) {
    let total_seconds = ms / 1_000;
    (total_seconds / 60, total_seconds % 60, (ms % 1_000) / 100)
}

/// Running-clock display, `MM:SS.t`. Negative values show as zero.
pub fn format_elapsed(ms: Millis) -> String {
    let (minutes, seconds, tenths) = split_tenths(ms.max(0));
    format!("{minutes:02}:{seconds:02}.{tenths}")
}

/// Manual-entry display, `M:SS.t`, the inverse of [`parse_time_input`] at tenth precision.
pub fn format_manual(ms: Millis) -> String {
    let (minutes, seconds, tenths) = split_tenths(ms.max(0));
    format!("{minutes}:{seconds:02}.{tenths}")
}

/// A partial set of manually entered values.
///
/// Only checkpoints and bouts present here are written. Empty strings count as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ManualEntry {
    #[serde(default)]
    pub times: BTreeMap<Checkpoint, String>,
    #[serde(default)]
    pub errors: BTreeMap<Bout, u8>,
}

impl ManualEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(mut self, checkpoint: Checkpoint, text: impl Into<String>) -> Self {
        self.times.insert(checkpoint, text.into());
        self
    }

    pub fn errors(mut self, bout: Bout, errors: u8) -> Self {
        self.errors.insert(bout, errors);
        self
    }

    /// Parse every supplied time, failing on the first malformed one.
    pub fn parsed_times(&self) -> Result<Vec<(Checkpoint, Millis)>> {
        self.times
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(&checkpoint, text)| {
                parse_time_input(text).map(|ms| (checkpoint, ms)).ok_or_else(|| {
                    RaceError::validation(
                        checkpoint.as_str(),
                        format!("'{text}' is not a time (use m:ss.t or ss.t)"),
                    )
                })
            })
            .collect()
    }
}

/// Apply a manual entry to `race`, all or nothing.
///
/// Each time is stored as `start + value`. A race without a start is anchored
/// at `now`, so a typed `0` start lines up with later captures. A supplied
/// finish becomes `total_time` directly. Bout errors replace the recorded bouts
/// and the penalty count is recomputed.
pub fn apply_manual_entry(race: &mut Race, entry: &ManualEntry, now: Millis) -> Result<()> {
    let times = entry.parsed_times()?;
    let course = Checkpoint::course(race.mode);
    let base = race.splits.start.unwrap_or(now);

    let mut updated = race.clone();
    for &(checkpoint, ms) in &times {
        if !course.contains(&checkpoint) {
            return Err(RaceError::validation(
                checkpoint.as_str(),
                format!("{} races have no {checkpoint} checkpoint", race.mode),
            ));
        }
        updated.splits.set(checkpoint, Some(base + ms));
    }
    if let Some((before, after)) = updated.splits.first_disorder(race.mode) {
        return Err(RaceError::validation(
            after.as_str(),
            format!("{after} would come before {before}"),
        ));
    }

    for (&bout, &errors) in &entry.errors {
        penalty::set_bout_errors(&mut updated, bout, errors)?;
    }

    if let Some(&(_, finish)) = times.iter().find(|(cp, _)| *cp == Checkpoint::Finish) {
        updated.total_time = Some(finish);
    }

    debug!(
        race = %race.id,
        base,
        checkpoints = times.len(),
        bouts = entry.errors.len(),
        "Manual entry applied"
    );
    *race = updated;
    Ok(())
}

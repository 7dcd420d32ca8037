//! Checkpoint timestamps of a race

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Millis, RaceMode};

/// A named checkpoint within a race, in course order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum Checkpoint {
    Start,
    Lap1,
    Shoot1,
    Lap2,
    Shoot2,
    Lap3,
    Shoot3,
    Lap4,
    Shoot4,
    Finish,
}

const TWO_BOUT_COURSE: [Checkpoint; 6] = [
    Checkpoint::Start,
    Checkpoint::Lap1,
    Checkpoint::Shoot1,
    Checkpoint::Lap2,
    Checkpoint::Shoot2,
    Checkpoint::Finish,
];

const FOUR_BOUT_COURSE: [Checkpoint; 10] = [
    Checkpoint::Start,
    Checkpoint::Lap1,
    Checkpoint::Shoot1,
    Checkpoint::Lap2,
    Checkpoint::Shoot2,
    Checkpoint::Lap3,
    Checkpoint::Shoot3,
    Checkpoint::Lap4,
    Checkpoint::Shoot4,
    Checkpoint::Finish,
];

impl Checkpoint {
    /// Checkpoints a race of `mode` passes, in order.
    pub fn course(mode: RaceMode) -> &'static [Checkpoint] {
        match mode.bout_count() {
            4 => &FOUR_BOUT_COURSE,
            _ => &TWO_BOUT_COURSE,
        }
    }

    /// Range entry checkpoint for bout `n` (1-based).
    pub fn lap(n: usize) -> Option<Checkpoint> {
        match n {
            1 => Some(Checkpoint::Lap1),
            2 => Some(Checkpoint::Lap2),
            3 => Some(Checkpoint::Lap3),
            4 => Some(Checkpoint::Lap4),
            _ => None,
        }
    }

    /// Range exit checkpoint for bout `n` (1-based).
    pub fn shoot(n: usize) -> Option<Checkpoint> {
        match n {
            1 => Some(Checkpoint::Shoot1),
            2 => Some(Checkpoint::Shoot2),
            3 => Some(Checkpoint::Shoot3),
            4 => Some(Checkpoint::Shoot4),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Checkpoint::Start => "start",
            Checkpoint::Lap1 => "lap1",
            Checkpoint::Shoot1 => "shoot1",
            Checkpoint::Lap2 => "lap2",
            Checkpoint::Shoot2 => "shoot2",
            Checkpoint::Lap3 => "lap3",
            Checkpoint::Shoot3 => "shoot3",
            Checkpoint::Lap4 => "lap4",
            Checkpoint::Shoot4 => "shoot4",
            Checkpoint::Finish => "finish",
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional absolute timestamps, one per checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Splits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap1: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoot1: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap2: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoot2: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap3: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoot3: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap4: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoot4: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<Millis>,
}

impl Splits {
    pub fn get(&self, checkpoint: Checkpoint) -> Option<Millis> {
        match checkpoint {
            Checkpoint::Start => self.start,
            Checkpoint::Lap1 => self.lap1,
            Checkpoint::Shoot1 => self.shoot1,
            Checkpoint::Lap2 => self.lap2,
            Checkpoint::Shoot2 => self.shoot2,
            Checkpoint::Lap3 => self.lap3,
            Checkpoint::Shoot3 => self.shoot3,
            Checkpoint::Lap4 => self.lap4,
            Checkpoint::Shoot4 => self.shoot4,
            Checkpoint::Finish => self.finish,
        }
    }

    pub fn set(&mut self, checkpoint: Checkpoint, value: Option<Millis>) {
        let slot = match checkpoint {
            Checkpoint::Start => &mut self.start,
            Checkpoint::Lap1 => &mut self.lap1,
            Checkpoint::Shoot1 => &mut self.shoot1,
            Checkpoint::Lap2 => &mut self.lap2,
            Checkpoint::Shoot2 => &mut self.shoot2,
            Checkpoint::Lap3 => &mut self.lap3,
            Checkpoint::Shoot3 => &mut self.shoot3,
            Checkpoint::Lap4 => &mut self.lap4,
            Checkpoint::Shoot4 => &mut self.shoot4,
            Checkpoint::Finish => &mut self.finish,
        };
        *slot = value;
    }

    /// Populated checkpoints of the course, in course order.
    pub fn populated(&self, mode: RaceMode) -> impl Iterator<Item = (Checkpoint, Millis)> + '_ {
        Checkpoint::course(mode).iter().filter_map(|&cp| self.get(cp).map(|at| (cp, at)))
    }

    /// First pair of populated checkpoints that are out of order, if any.
    pub fn first_disorder(&self, mode: RaceMode) -> Option<(Checkpoint, Checkpoint)> {
        let mut previous: Option<(Checkpoint, Millis)> = None;
        for (cp, at) in self.populated(mode) {
            if let Some((prev_cp, prev_at)) = previous {
                if at < prev_at {
                    return Some((prev_cp, cp));
                }
            }
            previous = Some((cp, at));
        }
        None
    }

    /// Whether populated checkpoints respect course order.
    pub fn is_ordered(&self, mode: RaceMode) -> bool {
        self.first_disorder(mode).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_length_depends_on_mode() {
        assert_eq!(Checkpoint::course(RaceMode::Sprint).len(), 6);
        assert_eq!(Checkpoint::course(RaceMode::Individual).len(), 10);
        assert_eq!(Checkpoint::course(RaceMode::Relay).last(), Some(&Checkpoint::Finish));
    }

    #[test]
    fn ordering_ignores_gaps() {
        let splits = Splits { start: Some(0), shoot1: Some(50), finish: Some(300), ..Default::default() };
        assert!(splits.is_ordered(RaceMode::Sprint));

        let broken = Splits { start: Some(100), lap1: Some(50), ..Default::default() };
        assert_eq!(broken.first_disorder(RaceMode::Sprint), Some((Checkpoint::Start, Checkpoint::Lap1)));
    }

    #[test]
    fn set_and_get_are_symmetric() {
        let mut splits = Splits::default();
        for (i, &cp) in Checkpoint::course(RaceMode::Individual).iter().enumerate() {
            splits.set(cp, Some(i as Millis));
        }
        assert_eq!(splits.get(Checkpoint::Shoot3), Some(6));
        assert_eq!(splits.populated(RaceMode::Sprint).count(), 6);
    }
}

//! Shooting bouts and their scores

use serde::{Deserialize, Serialize};
use std::fmt;

/// Targets per bout.
pub const TARGETS_PER_BOUT: u8 = 5;

/// Error count of one completed bout, in `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ShootingScore {
    pub errors: u8,
}

impl ShootingScore {
    /// Score from an error count; `None` if it exceeds the target count.
    pub fn from_errors(errors: u8) -> Option<Self> {
        (errors <= TARGETS_PER_BOUT).then_some(Self { errors })
    }

    /// Score from a hit count; `None` if it exceeds the target count.
    pub fn from_hits(hits: u8) -> Option<Self> {
        (hits <= TARGETS_PER_BOUT).then(|| Self { errors: TARGETS_PER_BOUT - hits })
    }

    pub fn hits(self) -> u8 {
        TARGETS_PER_BOUT.saturating_sub(self.errors)
    }
}

/// One shooting session of a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Bout {
    First,
    Second,
    Third,
    Fourth,
}

impl Bout {
    pub const ALL: [Bout; 4] = [Bout::First, Bout::Second, Bout::Third, Bout::Fourth];

    /// Bout from its 1-based number.
    pub fn from_number(n: usize) -> Option<Bout> {
        n.checked_sub(1).and_then(|index| Self::ALL.get(index).copied())
    }

    /// 1-based bout number.
    pub fn number(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for Bout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bout {}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_convert_to_errors() {
        assert_eq!(ShootingScore::from_hits(2), Some(ShootingScore { errors: 3 }));
        assert_eq!(ShootingScore::from_hits(5), Some(ShootingScore { errors: 0 }));
        assert_eq!(ShootingScore::from_hits(6), None);
        assert_eq!(ShootingScore::from_errors(6), None);
        assert_eq!(ShootingScore { errors: 1 }.hits(), 4);
    }

    #[test]
    fn bout_numbers_are_one_based() {
        assert_eq!(Bout::from_number(0), None);
        assert_eq!(Bout::from_number(1), Some(Bout::First));
        assert_eq!(Bout::from_number(4), Some(Bout::Fourth));
        assert_eq!(Bout::from_number(5), None);
        assert_eq!(Bout::Third.number(), 3);
    }
}

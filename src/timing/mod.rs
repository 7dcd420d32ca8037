//! Race timing and scoring core.
//!
//! Pure functions over [`Race`](crate::types::Race) and
//! [`Event`](crate::types::Event) values. Nothing in this module touches
//! storage; the [`RaceDesk`](crate::desk::RaceDesk) reads records, applies one
//! of these transitions and commits the result atomically.
//!
//! - [`phase`]: which checkpoint a race waits for, derived from its splits
//! - [`capture`]: sequential split capture
//! - [`manual`]: typed-in times and bout errors
//! - [`derived`]: leg, range and total durations
//! - [`penalty`]: shooting errors and the penalty count
//! - [`pursuit`]: master clock and per-race auto-start
//! - [`pairing`]: duel pairs, relay teams and standings
//!
//! ```rust
//! use firingline::timing::{capture, derived::RaceTimes, phase::Phase};
//! use firingline::types::{CompetitorId, EventId, Race, RaceMode};
//!
//! let mut race = Race::new(EventId::new(), CompetitorId::new(), RaceMode::Sprint);
//! for at in [0, 135_000, 185_000, 320_000, 370_000, 525_000] {
//!     capture::capture_split(&mut race, at).unwrap();
//! }
//! assert_eq!(Phase::of(&race), Phase::Done);
//! assert_eq!(race.total_time, Some(525_000));
//! assert_eq!(RaceTimes::of(&race).total_ski, Some(425_000));
//! ```

pub mod capture;
pub mod derived;
pub mod manual;
pub mod pairing;
pub mod penalty;
pub mod phase;
pub mod pursuit;

pub use capture::CaptureOutcome;
pub use derived::RaceTimes;
pub use manual::{ManualEntry, format_elapsed, format_manual, parse_time_input};
pub use phase::Phase;
pub use pursuit::{ClockTransition, ResumePolicy, TickSnapshot};

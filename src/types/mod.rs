//! Core data model for race timing.
//!
//! This module holds the records the timing core reads and writes. Storage of
//! these records belongs to a [`Store`](crate::store::Store); the types here are
//! plain serde values so they travel unchanged through the store, the export
//! document and (with the `tauri` feature) a TypeScript front end.
//!
//! ## Records
//!
//! - [`Competitor`]: catalog entry, referenced by id
//! - [`Event`]: a competition day with a [`RaceMode`] and optional master clock
//! - [`Race`]: one competitor in one event, carrying [`Splits`] and bout scores
//!
//! ## Time representation
//!
//! All timestamps and durations are [`Millis`]. Captured checkpoints are Unix
//! epoch milliseconds; manually entered checkpoints are race-relative.
//!
//! ```rust
//! use firingline::types::{Checkpoint, RaceMode, Splits};
//!
//! let splits = Splits { start: Some(0), lap1: Some(135_000), ..Default::default() };
//! assert!(splits.is_ordered(RaceMode::Sprint));
//! assert_eq!(splits.get(Checkpoint::Lap1), Some(135_000));
//! ```

mod competitor;
mod event;
mod ids;
mod race;
mod shooting;
mod splits;

pub use competitor::Competitor;
pub use event::{ClockHalt, Event, EventStatus, RaceMode};
pub use ids::{CompetitorId, EventId, RaceId, TeamId};
pub use race::Race;
pub use shooting::{Bout, ShootingScore, TARGETS_PER_BOUT};
pub use splits::{Checkpoint, Splits};

/// Milliseconds, used for both epoch timestamps and durations.
pub type Millis = i64;

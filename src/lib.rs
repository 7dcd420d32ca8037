//! Race timing and scoring for biathlon-style events.
//!
//! Firingline records ordered checkpoint times for every competitor, derives
//! leg and range durations from them, keeps the shooting penalty tally, and
//! for mass-start formats starts each competitor's clock from a shared master
//! clock at their scheduled offset.
//!
//! # Features
//!
//! - **Sequential capture**: one press stamps the next checkpoint of the course
//! - **Atomic commands**: every command lands as one all-or-nothing batch
//! - **Pursuit synchronizer**: auto-starts driven by a periodic tick
//! - **Pluggable storage**: any [`Store`] implementation; [`MemoryStore`] ships in the box
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use firingline::{Firingline, FiringlineConfig, RaceMode};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> firingline::Result<()> {
//!     let desk = Firingline::in_memory(FiringlineConfig::default());
//!     let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 18).unwrap();
//!     let event = desk.create_event("Pursuit", date, 2, RaceMode::Pursuit).await?;
//!     let ada = desk.add_competitor("Ada").await?;
//!     desk.add_participant(event.id, ada.id, Some(30_000)).await?;
//!
//!     desk.start_master_clock(event.id).await?;
//!     let session = desk.open_event(event.id).await?;
//!     let mut boards = Box::pin(session.boards_until_settled());
//!     while let Some(board) = boards.next().await {
//!         println!("master {:?}, {} waiting", board.master_elapsed, board.awaiting().count());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod clock;
pub mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod timing;
pub mod types;

// Storage and commands
pub mod desk;
pub mod interchange;
pub mod store;
pub mod stores;

// Live event view
pub mod board;
pub mod driver;
pub mod session;
pub mod stream;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use board::{BoardRow, EventBoard};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FiringlineConfig;
pub use desk::RaceDesk;
pub use interchange::{ExportDocument, ImportDocument};
pub use session::EventSession;
pub use store::{ChangeSet, Dataset, Dependency, Store, WriteBatch};
pub use stores::MemoryStore;
pub use timing::{CaptureOutcome, ManualEntry, Phase, RaceTimes, ResumePolicy};

use std::sync::Arc;

/// Entry point for building a [`RaceDesk`].
///
/// # Examples
///
/// ```rust
/// use firingline::{Firingline, FiringlineConfig};
///
/// let desk = Firingline::in_memory(FiringlineConfig::default());
/// assert_eq!(desk.config().tick_interval_ms, 100);
/// ```
pub struct Firingline;

impl Firingline {
    /// Desk over a fresh [`MemoryStore`] and the system clock.
    pub fn in_memory(config: FiringlineConfig) -> RaceDesk<MemoryStore> {
        RaceDesk::new(Arc::new(MemoryStore::new()), config)
    }

    /// Desk over a caller-provided store.
    pub fn with_store<S: Store>(store: Arc<S>, config: FiringlineConfig) -> RaceDesk<S> {
        RaceDesk::new(store, config)
    }

    /// In-memory desk configured from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// holds out of range values.
    pub fn from_config_file(
        path: impl AsRef<std::path::Path>,
    ) -> anyhow::Result<RaceDesk<MemoryStore>> {
        Ok(Self::in_memory(FiringlineConfig::load(path)?))
    }
}

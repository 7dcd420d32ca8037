//! Race desk: the commands an operator issues
//!
//! Every command reads the records it needs, applies a pure transition from
//! [`timing`](crate::timing), and commits the result as one [`WriteBatch`]
//! guarded by preconditions on the records it read. A command either lands
//! completely or leaves the store untouched.
//!
//! - [`roster`]: competitors, events, participants, duels, relay teams, deletes
//! - [`scoring`]: split capture, manual entry, shooting, start offsets
//! - [`master_clock`]: mass-start master clock

use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::FiringlineConfig;
use crate::session::EventSession;
use crate::store::{Store, WriteBatch};
use crate::types::{Competitor, CompetitorId, Event, EventId, Millis, Race, RaceId};
use crate::{RaceError, Result};

pub mod master_clock;
pub mod roster;
pub mod scoring;

/// Command surface over one store.
pub struct RaceDesk<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: FiringlineConfig,
}

impl<S: Store> Clone for RaceDesk<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), clock: Arc::clone(&self.clock), config: self.config.clone() }
    }
}

impl<S: Store> RaceDesk<S> {
    /// Desk reading the system wall clock.
    pub fn new(store: Arc<S>, config: FiringlineConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>, config: FiringlineConfig) -> Self {
        Self { store, clock, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &FiringlineConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> Millis {
        self.clock.now()
    }

    pub async fn competitor(&self, id: CompetitorId) -> Result<Competitor> {
        self.store.competitor(id).await?.ok_or_else(|| RaceError::not_found("competitor", id))
    }

    pub async fn event(&self, id: EventId) -> Result<Event> {
        self.store.event(id).await?.ok_or_else(|| RaceError::not_found("event", id))
    }

    pub async fn race(&self, id: RaceId) -> Result<Race> {
        self.store.race(id).await?.ok_or_else(|| RaceError::not_found("race", id))
    }

    pub async fn races(&self, event_id: EventId) -> Result<Vec<Race>> {
        self.store.races_for_event(event_id).await
    }

    /// Read a race, apply `change` to a copy and commit it if anything moved.
    ///
    /// The commit is conditional on the race being unchanged since the read,
    /// so two commands racing on one record cannot both apply.
    pub(crate) async fn update_race<T>(
        &self,
        race_id: RaceId,
        label: &'static str,
        change: impl FnOnce(&mut Race) -> Result<T>,
    ) -> Result<(Race, T)> {
        let current = self.race(race_id).await?;
        let mut updated = current.clone();
        let outcome = change(&mut updated)?;

        if updated != current {
            self.store
                .commit(WriteBatch::new(label).expect_race(&current).put_race(updated.clone()))
                .await?;
            debug!(race = %race_id, command = label, "Race updated");
        }
        Ok((updated, outcome))
    }

    /// Event counterpart of [`RaceDesk::update_race`].
    pub(crate) async fn update_event<T>(
        &self,
        event_id: EventId,
        label: &'static str,
        change: impl FnOnce(&mut Event) -> Result<T>,
    ) -> Result<(Event, T)> {
        let current = self.event(event_id).await?;
        let mut updated = current.clone();
        let outcome = change(&mut updated)?;

        if updated != current {
            self.store
                .commit(WriteBatch::new(label).expect_event(&current).put_event(updated.clone()))
                .await?;
            debug!(event = %event_id, command = label, "Event updated");
        }
        Ok((updated, outcome))
    }

    /// Open the live view of an event.
    ///
    /// The session runs the periodic tick (auto-starts and board refresh)
    /// until it is dropped.
    pub async fn open_event(&self, event_id: EventId) -> Result<EventSession> {
        let event = self.event(event_id).await?;
        info!(event = %event.id, name = %event.name, mode = %event.mode, "Opening event");
        EventSession::open(Arc::clone(&self.store), Arc::clone(&self.clock), event.id, &self.config).await
    }
}

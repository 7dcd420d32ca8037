//! Storage collaborator contract
//!
//! The core owns no storage format. It reads through [`Store`], groups every
//! mutation into one [`WriteBatch`] committed all-or-nothing, and learns about
//! changes through [`ChangeSet`] notifications.

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::Result;
use crate::types::{Competitor, CompetitorId, Event, EventId, Race, RaceId};

/// Every record the store holds, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Dataset {
    pub competitors: Vec<Competitor>,
    pub events: Vec<Event>,
    pub races: Vec<Race>,
}

/// One write inside a batch. `Put*` inserts or replaces by id.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    PutCompetitor(Competitor),
    PutEvent(Event),
    PutRace(Race),
    DeleteCompetitor(CompetitorId),
    DeleteEvent(EventId),
    DeleteRace(RaceId),
    /// Delete every race whose `event_id` matches
    DeleteRacesOf(EventId),
    /// Remove every record of every table
    Clear,
}

/// Condition the store checks, under the same lock, before applying a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// The stored race equals this value
    RaceUnchanged(Box<Race>),
    /// The stored event equals this value
    EventUnchanged(Box<Event>),
}

/// An all-or-nothing group of writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub label: &'static str,
    pub preconditions: Vec<Precondition>,
    pub writes: Vec<Write>,
}

impl WriteBatch {
    /// Empty batch; `label` names the command in logs.
    pub fn new(label: &'static str) -> Self {
        Self { label, ..Default::default() }
    }

    /// Fail the batch if `race` changed since it was read.
    pub fn expect_race(mut self, race: &Race) -> Self {
        self.preconditions.push(Precondition::RaceUnchanged(Box::new(race.clone())));
        self
    }

    /// Fail the batch if `event` changed since it was read.
    pub fn expect_event(mut self, event: &Event) -> Self {
        self.preconditions.push(Precondition::EventUnchanged(Box::new(event.clone())));
        self
    }

    pub fn write(mut self, write: Write) -> Self {
        self.writes.push(write);
        self
    }

    pub fn put_race(self, race: Race) -> Self {
        self.write(Write::PutRace(race))
    }

    pub fn put_event(self, event: Event) -> Self {
        self.write(Write::PutEvent(event))
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Which record a committed write touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Competitor(CompetitorId),
    Event(EventId),
    Race { id: RaceId, event_id: EventId },
    /// Every record (clear, import, or a lagging subscriber)
    All,
}

/// A reader's dependency set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// The event record and all of its races
    Event(EventId),
    Race(RaceId),
    Competitors,
    Everything,
}

/// The records one committed batch touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Store revision after the commit
    pub revision: u64,
    pub keys: Vec<RecordKey>,
}

impl ChangeSet {
    /// Whether a reader depending on `dependency` must re-read.
    pub fn touches(&self, dependency: &Dependency) -> bool {
        self.keys.iter().any(|key| match (key, dependency) {
            (RecordKey::All, _) | (_, Dependency::Everything) => true,
            (RecordKey::Event(id), Dependency::Event(dep)) => id == dep,
            (RecordKey::Race { event_id, .. }, Dependency::Event(dep)) => event_id == dep,
            (RecordKey::Race { id, .. }, Dependency::Race(dep)) => id == dep,
            (RecordKey::Competitor(_), Dependency::Competitors) => true,
            _ => false,
        })
    }

    fn lagged() -> Self {
        Self { revision: 0, keys: vec![RecordKey::All] }
    }
}

/// Storage collaborator.
///
/// Implementations must apply a [`WriteBatch`] atomically: either every
/// precondition holds and every write lands, or nothing changes. Successful
/// commits are announced on [`Store::changes`].
#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    async fn competitor(&self, id: CompetitorId) -> Result<Option<Competitor>>;

    async fn event(&self, id: EventId) -> Result<Option<Event>>;

    async fn race(&self, id: RaceId) -> Result<Option<Race>>;

    /// Races whose `event_id` equals `event_id`, in insertion order.
    async fn races_for_event(&self, event_id: EventId) -> Result<Vec<Race>>;

    /// Bulk read of every table.
    async fn snapshot(&self) -> Result<Dataset>;

    /// Apply a batch all-or-nothing.
    ///
    /// Returns:
    /// - `Ok(changes)` - every write applied
    /// - `Err(RaceError::Conflict)` - a precondition failed, nothing applied
    /// - `Err(RaceError::Transaction)` - the backend failed, nothing applied
    async fn commit(&self, batch: WriteBatch) -> Result<ChangeSet>;

    /// Receiver of every committed change set.
    fn changes(&self) -> broadcast::Receiver<Arc<ChangeSet>>;
}

/// Change sets touching `dependency`.
///
/// A subscriber that falls behind receives a change set touching everything,
/// so it re-reads rather than missing a write.
pub fn subscribe<S>(store: &S, dependency: Dependency) -> impl Stream<Item = Arc<ChangeSet>> + Send + 'static
where
    S: Store + ?Sized,
{
    BroadcastStream::new(store.changes()).filter_map(move |item| {
        let relevant = match item {
            Ok(changes) => changes.touches(&dependency).then_some(changes),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Change subscriber lagged, forcing a full refresh");
                Some(Arc::new(ChangeSet::lagged()))
            }
        };
        async move { relevant }
    })
}

/// Invoke `callback` after every commit touching `dependency`.
///
/// The returned token stops the observer.
pub fn observe<S, F>(store: &S, dependency: Dependency, mut callback: F) -> CancellationToken
where
    S: Store + ?Sized,
    F: FnMut(&ChangeSet) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    let mut changes = Box::pin(subscribe(store, dependency));

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                next = changes.next() => match next {
                    Some(change_set) => callback(&change_set),
                    None => break,
                },
            }
        }
        debug!(?dependency, "Observer stopped");
    });

    cancel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_dependency_sees_its_races() {
        let event = EventId::new();
        let other = EventId::new();
        let changes = ChangeSet {
            revision: 3,
            keys: vec![RecordKey::Race { id: RaceId::new(), event_id: event }],
        };
        assert!(changes.touches(&Dependency::Event(event)));
        assert!(!changes.touches(&Dependency::Event(other)));
        assert!(!changes.touches(&Dependency::Competitors));
        assert!(changes.touches(&Dependency::Everything));
    }

    #[test]
    fn clear_touches_everyone() {
        let changes = ChangeSet { revision: 1, keys: vec![RecordKey::All] };
        assert!(changes.touches(&Dependency::Race(RaceId::new())));
        assert!(changes.touches(&Dependency::Competitors));
    }

    #[test]
    fn batch_builder_collects_in_order() {
        let race = Race::new(EventId::new(), CompetitorId::new(), crate::types::RaceMode::Sprint);
        let batch = WriteBatch::new("test")
            .expect_race(&race)
            .put_race(race.clone())
            .write(Write::DeleteRace(race.id));
        assert_eq!(batch.preconditions.len(), 1);
        assert_eq!(batch.writes.len(), 2);
        assert!(!batch.is_empty());
    }
}

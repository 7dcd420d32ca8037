//! In-process store
//!
//! Keeps every table in memory behind one lock. A commit checks its
//! preconditions and applies its writes to a working copy, which replaces the
//! live tables only when every write succeeded.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, trace, warn};

use crate::store::{ChangeSet, Dataset, Precondition, RecordKey, Store, Write, WriteBatch};
use crate::types::{Competitor, CompetitorId, Event, EventId, Race, RaceId};
use crate::{RaceError, Result};

const CHANGE_CAPACITY: usize = 256;
const NO_FAULT: usize = usize::MAX;

#[derive(Debug, Default)]
struct State {
    tables: Dataset,
    revision: u64,
}

/// Store backed by in-memory tables.
pub struct MemoryStore {
    state: RwLock<State>,
    changes: broadcast::Sender<Arc<ChangeSet>>,
    /// Index of the write at which the next commit fails
    fault_at: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_dataset(Dataset::default())
    }

    /// Store pre-filled with `dataset`.
    pub fn with_dataset(dataset: Dataset) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            state: RwLock::new(State { tables: dataset, revision: 0 }),
            changes,
            fault_at: AtomicUsize::new(NO_FAULT),
        }
    }

    /// Make the next commit fail while applying its `index`-th write.
    ///
    /// Used to exercise rollback. The fault is used up by the next commit whose
    /// preconditions hold.
    pub fn fail_next_commit_at(&self, index: usize) {
        self.fault_at.store(index, Ordering::SeqCst);
    }

    /// Current revision (number of successful commits).
    pub async fn revision(&self) -> u64 {
        self.state.read().await.revision
    }
}

fn check(tables: &Dataset, precondition: &Precondition) -> Result<()> {
    match precondition {
        Precondition::RaceUnchanged(expected) => {
            match tables.races.iter().find(|race| race.id == expected.id) {
                Some(current) if current == expected.as_ref() => Ok(()),
                Some(_) => Err(RaceError::conflict("race", expected.id, "changed since it was read")),
                None => Err(RaceError::not_found("race", expected.id)),
            }
        }
        Precondition::EventUnchanged(expected) => {
            match tables.events.iter().find(|event| event.id == expected.id) {
                Some(current) if current == expected.as_ref() => Ok(()),
                Some(_) => Err(RaceError::conflict("event", expected.id, "changed since it was read")),
                None => Err(RaceError::not_found("event", expected.id)),
            }
        }
    }
}

fn upsert<T>(rows: &mut Vec<T>, row: T, same: impl Fn(&T) -> bool) {
    match rows.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
}

fn apply(tables: &mut Dataset, write: Write, keys: &mut Vec<RecordKey>) {
    let mut touched = |key: RecordKey| {
        if !keys.contains(&key) {
            keys.push(key);
        }
    };
    match write {
        Write::PutCompetitor(competitor) => {
            let id = competitor.id;
            upsert(&mut tables.competitors, competitor, |c: &Competitor| c.id == id);
            touched(RecordKey::Competitor(id));
        }
        Write::PutEvent(event) => {
            let id = event.id;
            upsert(&mut tables.events, event, |e: &Event| e.id == id);
            touched(RecordKey::Event(id));
        }
        Write::PutRace(race) => {
            let key = RecordKey::Race { id: race.id, event_id: race.event_id };
            let id = race.id;
            upsert(&mut tables.races, race, |r: &Race| r.id == id);
            touched(key);
        }
        Write::DeleteCompetitor(id) => {
            tables.competitors.retain(|c| c.id != id);
            touched(RecordKey::Competitor(id));
        }
        Write::DeleteEvent(id) => {
            tables.events.retain(|e| e.id != id);
            touched(RecordKey::Event(id));
        }
        Write::DeleteRace(id) => {
            if let Some(race) = tables.races.iter().find(|r| r.id == id) {
                touched(RecordKey::Race { id, event_id: race.event_id });
            }
            tables.races.retain(|r| r.id != id);
        }
        Write::DeleteRacesOf(event_id) => {
            tables.races.retain(|race| {
                let keep = race.event_id != event_id;
                if !keep {
                    touched(RecordKey::Race { id: race.id, event_id });
                }
                keep
            });
        }
        Write::Clear => {
            *tables = Dataset::default();
            touched(RecordKey::All);
        }
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn competitor(&self, id: CompetitorId) -> Result<Option<Competitor>> {
        let state = self.state.read().await;
        Ok(state.tables.competitors.iter().find(|c| c.id == id).cloned())
    }

    async fn event(&self, id: EventId) -> Result<Option<Event>> {
        let state = self.state.read().await;
        Ok(state.tables.events.iter().find(|e| e.id == id).cloned())
    }

    async fn race(&self, id: RaceId) -> Result<Option<Race>> {
        let state = self.state.read().await;
        Ok(state.tables.races.iter().find(|r| r.id == id).cloned())
    }

    async fn races_for_event(&self, event_id: EventId) -> Result<Vec<Race>> {
        let state = self.state.read().await;
        Ok(state.tables.races.iter().filter(|r| r.event_id == event_id).cloned().collect())
    }

    async fn snapshot(&self) -> Result<Dataset> {
        Ok(self.state.read().await.tables.clone())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<ChangeSet> {
        let mut state = self.state.write().await;

        for precondition in &batch.preconditions {
            if let Err(e) = check(&state.tables, precondition) {
                debug!(batch = batch.label, "Precondition failed: {}", e);
                return Err(e);
            }
        }
        let fault_at = self.fault_at.swap(NO_FAULT, Ordering::SeqCst);

        let mut working = state.tables.clone();
        let mut keys = Vec::with_capacity(batch.writes.len());
        for (index, write) in batch.writes.into_iter().enumerate() {
            if index == fault_at {
                warn!(batch = batch.label, index, "Injected storage fault, rolling back");
                return Err(RaceError::transaction_failed_with_source(
                    format!("{} failed at write {}", batch.label, index),
                    Box::new(std::io::Error::other("injected storage fault")),
                ));
            }
            apply(&mut working, write, &mut keys);
        }

        state.tables = working;
        state.revision += 1;
        let changes = ChangeSet { revision: state.revision, keys };
        trace!(batch = batch.label, revision = state.revision, touched = changes.keys.len(), "Committed");

        // No subscribers is fine
        let _ = self.changes.send(Arc::new(changes.clone()));
        Ok(changes)
    }

    fn changes(&self) -> broadcast::Receiver<Arc<ChangeSet>> {
        self.changes.subscribe()
    }
}

//! Export and import of the whole dataset
//!
//! The document is JSON with a schema `version`, the export `date` and the
//! three record arrays. Import replaces every table in one batch; a document
//! missing any array is refused before anything is written.

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::desk::RaceDesk;
use crate::store::{Dataset, Store, Write, WriteBatch};
use crate::types::{Competitor, Event, Millis, Race};
use crate::{RaceError, Result};

/// Schema revision written by [`RaceDesk::export`].
pub const EXPORT_VERSION: u32 = 1;

/// A full dataset as exchanged with other installations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ExportDocument {
    pub version: u32,
    /// Export instant, RFC 3339
    pub date: String,
    pub competitors: Vec<Competitor>,
    pub events: Vec<Event>,
    pub races: Vec<Race>,
}

/// An incoming document before its arrays are checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportDocument {
    pub version: Option<u32>,
    pub date: Option<String>,
    pub competitors: Option<Vec<Competitor>>,
    pub events: Option<Vec<Event>>,
    pub races: Option<Vec<Race>>,
}

impl ExportDocument {
    pub fn new(dataset: Dataset, exported_at: Millis) -> Result<Self> {
        let date = DateTime::from_timestamp_millis(exported_at)
            .ok_or_else(|| RaceError::validation("date", format!("{exported_at} ms is out of range")))?
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        Ok(Self {
            version: EXPORT_VERSION,
            date,
            competitors: dataset.competitors,
            events: dataset.events,
            races: dataset.races,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn into_dataset(self) -> Dataset {
        Dataset { competitors: self.competitors, events: self.events, races: self.races }
    }
}

impl ImportDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the document and extract its records.
    pub fn into_dataset(self) -> Result<Dataset> {
        match self.version {
            Some(version) if version > EXPORT_VERSION => {
                return Err(RaceError::validation(
                    "version",
                    format!("document version {version} is newer than {EXPORT_VERSION}"),
                ));
            }
            _ => {}
        }
        let missing = |name: &str| RaceError::validation(name, "array missing from document");
        Ok(Dataset {
            competitors: self.competitors.ok_or_else(|| missing("competitors"))?,
            events: self.events.ok_or_else(|| missing("events"))?,
            races: self.races.ok_or_else(|| missing("races"))?,
        })
    }
}

impl From<ExportDocument> for ImportDocument {
    fn from(document: ExportDocument) -> Self {
        Self {
            version: Some(document.version),
            date: Some(document.date),
            competitors: Some(document.competitors),
            events: Some(document.events),
            races: Some(document.races),
        }
    }
}

impl<S: Store> RaceDesk<S> {
    /// Snapshot every table into an export document.
    pub async fn export(&self) -> Result<ExportDocument> {
        let dataset = self.store().snapshot().await?;
        let document = ExportDocument::new(dataset, self.now())?;
        info!(
            competitors = document.competitors.len(),
            events = document.events.len(),
            races = document.races.len(),
            "Dataset exported"
        );
        Ok(document)
    }

    /// Replace every table with the document's records, in one batch.
    pub async fn import(&self, document: impl Into<ImportDocument>) -> Result<()> {
        let dataset = document.into().into_dataset()?;
        let counts = (dataset.competitors.len(), dataset.events.len(), dataset.races.len());

        let batch = WriteBatch::new("import").write(Write::Clear);
        let batch = dataset.competitors.into_iter().fold(batch, |b, c| b.write(Write::PutCompetitor(c)));
        let batch = dataset.events.into_iter().fold(batch, WriteBatch::put_event);
        let batch = dataset.races.into_iter().fold(batch, WriteBatch::put_race);
        self.store().commit(batch).await?;

        info!(competitors = counts.0, events = counts.1, races = counts.2, "Dataset imported");
        Ok(())
    }

    pub async fn import_json(&self, json: &str) -> Result<()> {
        self.import(ImportDocument::from_json(json)?).await
    }
}

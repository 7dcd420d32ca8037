//! Catalog competitor record

use serde::{Deserialize, Serialize};

use super::{CompetitorId, Millis};

/// A competitor as held by the catalog.
///
/// Races only reference competitors by id; the core never mutates career stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
    #[serde(default)]
    pub total_races: u32,
    #[serde(default)]
    pub podiums: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_time: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_position: Option<u32>,
}

impl Competitor {
    /// New competitor with empty career stats.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CompetitorId::new(),
            name: name.into(),
            total_races: 0,
            podiums: 0,
            best_time: None,
            best_position: None,
        }
    }
}

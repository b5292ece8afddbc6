//! Match history: the external provider seam and the per-match data the
//! registry consumes (end time, per-player APM, criteria matching).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single finished match, as reported by the history provider.
///
/// The registry only relies on the end time, the APM lookup, and
/// field-by-field criteria matching; everything else is carried opaquely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub map_name: String,
    /// Player names (normalized lower-case) that took part.
    pub participants: Vec<String>,
    pub end_time: DateTime<Utc>,
    /// Actions per minute, per participant name.
    pub apm_by_player: BTreeMap<String, f64>,
}

impl MatchRecord {
    pub fn new(
        map_name: impl Into<String>,
        participants: Vec<String>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            map_name: map_name.into(),
            participants,
            end_time,
            apm_by_player: BTreeMap::new(),
        }
    }

    /// Set one participant's APM (builder style, for providers and tests).
    pub fn with_apm(mut self, player: impl Into<String>, apm: f64) -> Self {
        self.apm_by_player.insert(player.into().to_lowercase(), apm);
        self
    }

    /// APM this match contributes for the named player; 0 when unknown.
    pub fn apm(&self, player: &str) -> f64 {
        self.apm_by_player
            .get(&player.to_lowercase())
            .copied()
            .unwrap_or(0.0)
    }

    /// Check one filter criterion against this match: equality, or containment
    /// for list/string fields. An unknown field never matches.
    pub fn matches_criterion(&self, field: &str, value: &str) -> bool {
        match field {
            "map_name" => self.map_name == value || self.map_name.contains(value),
            "participants" => self.participants.iter().any(|p| p == value),
            "end_time" => self.end_time.to_rfc3339() == value,
            "id" => self.id.to_string() == value,
            _ => false,
        }
    }
}

/// Filter criteria for match queries: field name to expected value.
#[derive(Clone, Debug, Default)]
pub struct MatchCriteria {
    fields: BTreeMap<String, String>,
}

impl MatchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.fields.iter()
    }

    /// True when every criterion matches the given match record.
    pub fn accepts(&self, record: &MatchRecord) -> bool {
        self.iter().all(|(k, v)| record.matches_criterion(k, v))
    }
}

/// External match-history provider: yields a player's finished matches.
pub trait MatchHistory {
    fn player_history(&self, name: &str) -> Vec<MatchRecord>;
}

/// Provider with no recorded history; the default until a real store is wired in.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyHistory;

impl MatchHistory for EmptyHistory {
    fn player_history(&self, _name: &str) -> Vec<MatchRecord> {
        Vec::new()
    }
}

//! The player registry: an in-memory cache of records backed by one JSON
//! file per player, with create/update/delete/list and stale-record expiry.

mod stale;

use crate::config::RegistryConfig;
use crate::models::{
    BuiltPlayer, Difficulty, EmptyHistory, Fields, MatchHistory, OptionValue, PlayerError,
    PlayerPreGame, PlayerRecord, PlayerType, Race,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Typed inputs for [`PlayerRegistry::build_player`].
#[derive(Clone, Debug)]
pub struct BuildParams {
    pub name: String,
    pub kind: PlayerType,
    pub init_cmd: String,
    pub init_options: BTreeMap<String, OptionValue>,
    /// Normalized to the default difficulty for computers when unset.
    pub difficulty: Option<Difficulty>,
    /// Normalized to the configured default rating when unset.
    pub rating: Option<u32>,
    /// Any of these three being set upgrades the result to a pre-game view.
    pub race: Option<Race>,
    pub observe: bool,
    pub player_id: u32,
    pub race_default: Race,
}

impl BuildParams {
    pub fn new(name: impl Into<String>, kind: PlayerType) -> Self {
        Self {
            name: name.into(),
            kind,
            init_cmd: String::new(),
            init_options: BTreeMap::new(),
            difficulty: None,
            rating: None,
            race: None,
            observe: false,
            player_id: 0,
            race_default: Race::Random,
        }
    }
}

/// Process-wide player repository: cache of name → record, lazily populated
/// from the players directory. Single-writer; all I/O is synchronous.
pub struct PlayerRegistry {
    pub(crate) config: RegistryConfig,
    pub(crate) cache: HashMap<String, PlayerRecord>,
    pub(crate) populated: bool,
    pub(crate) history: Box<dyn MatchHistory>,
}

impl PlayerRegistry {
    /// Registry with no match-history provider wired in.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_history(config, EmptyHistory)
    }

    pub fn with_history(config: RegistryConfig, history: impl MatchHistory + 'static) -> Self {
        Self {
            config,
            cache: HashMap::new(),
            populated: false,
            history: Box::new(history),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Define a new player from a field map, persist it, and cache it.
    pub fn add_player(&mut self, fields: &Fields) -> Result<PlayerRecord, PlayerError> {
        reject_system_fields(fields)?;
        let record = PlayerRecord::from_fields(fields, &self.config)?;
        record.save(&self.config.players_dir)?;
        self.populate(false);
        self.cache.insert(record.name.clone(), record.clone());
        Ok(record)
    }

    /// Update an existing player: detach it, apply the fields, persist, and
    /// re-insert under its (possibly changed) name.
    pub fn update_player(&mut self, name: &str, fields: &Fields) -> Result<PlayerRecord, PlayerError> {
        let mut record = self.delete_player(name)?;
        reject_system_fields(fields)?;
        record.update(fields)?;
        record.validate()?;
        record.save(&self.config.players_dir)?;
        self.cache.insert(record.name.clone(), record.clone());
        Ok(record)
    }

    /// Look up a cached record by (case-insensitive) name.
    pub fn get_player(&mut self, name: &str) -> Result<&PlayerRecord, PlayerError> {
        self.populate(false);
        self.cache
            .get(&name.to_lowercase())
            .ok_or_else(|| PlayerError::NotFound(name.to_string()))
    }

    /// Forget a player: best-effort delete of its backing file, eviction from
    /// the cache, and the detached record handed back to the caller.
    pub fn delete_player(&mut self, name: &str) -> Result<PlayerRecord, PlayerError> {
        let record = self.get_player(name)?.clone();
        let path = record.filename(&self.config.players_dir);
        if let Err(e) = std::fs::remove_file(&path) {
            // The end state (record absent) is reached either way.
            log::warn!("could not remove {}: {e}", path.display());
        }
        self.cache.remove(&record.name);
        Ok(record)
    }

    /// Convenience constructor: a bare record, or a pre-game view when any
    /// session selection (race, observer, seat) is supplied. Does not persist.
    pub fn build_player(&mut self, params: BuildParams) -> Result<BuiltPlayer, PlayerError> {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::String(params.name.clone()));
        fields.insert(
            "type".to_string(),
            Value::String(params.kind.label().to_string()),
        );
        fields.insert("initCmd".to_string(), Value::String(params.init_cmd.clone()));
        if !params.init_options.is_empty() {
            let opts: serde_json::Map<String, Value> = params
                .init_options
                .iter()
                .map(|(k, v)| {
                    let val = serde_json::to_value(v).unwrap_or(Value::Null);
                    (k.clone(), val)
                })
                .collect();
            fields.insert("initOptions".to_string(), Value::Object(opts));
        }
        if let Some(diff) = params.difficulty {
            fields.insert(
                "difficulty".to_string(),
                Value::String(diff.label().to_string()),
            );
        }
        let rating = params.rating.unwrap_or(self.config.default_rating);
        fields.insert("rating".to_string(), Value::Number(rating.into()));
        fields.insert(
            "raceDefault".to_string(),
            Value::String(params.race_default.label().to_string()),
        );
        let record = PlayerRecord::from_fields(&fields, &self.config)?;

        if params.race.is_some() || params.observe || params.player_id > 0 {
            Ok(BuiltPlayer::PreGame(PlayerPreGame::new(
                record,
                params.race.unwrap_or(Race::Random),
                params.observe,
                params.player_id,
            )))
        } else {
            Ok(BuiltPlayer::Record(record))
        }
    }

    /// All currently defined players, keyed by normalized name. Scans the
    /// players directory only when the cache is unpopulated or `reset` is set.
    pub fn known_players(&mut self, reset: bool) -> &HashMap<String, PlayerRecord> {
        self.populate(reset);
        &self.cache
    }

    /// Cached players whose type is computer, sorted by name.
    pub fn computer_players(&mut self) -> Vec<PlayerRecord> {
        self.populate(false);
        let mut out: Vec<PlayerRecord> = self
            .cache
            .values()
            .filter(|p| p.is_computer())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Players inactive long enough to qualify for removal, under the dual
    /// time horizon: last-match age for played records, creation age (with
    /// the shorter no-activity horizon) for matchless ones. `limit_days`
    /// falls back to the configured staleness horizon.
    pub fn stale_records(&mut self, limit_days: Option<f64>) -> Vec<PlayerRecord> {
        let limit = limit_days.unwrap_or(self.config.stale_after_days);
        stale::stale_records(self, limit)
    }

    /// Delete every stale player, returning the removed records.
    pub fn remove_stale_records(
        &mut self,
        limit_days: Option<f64>,
    ) -> Result<Vec<PlayerRecord>, PlayerError> {
        let stale = self.stale_records(limit_days);
        let mut removed = Vec::with_capacity(stale.len());
        for record in stale {
            removed.push(self.delete_player(&record.name)?);
        }
        Ok(removed)
    }

    /// Fill the cache from the players directory. The directory scan is the
    /// source of truth: on `reset` the cache is rebuilt from scratch.
    pub(crate) fn populate(&mut self, reset: bool) {
        if self.populated && !reset {
            return;
        }
        self.cache.clear();
        let dir = self.config.players_dir.clone();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("players directory {} not readable: {e}", dir.display());
                self.populated = true;
                return;
            }
        };
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|f| f.strip_prefix("player_"))
                .and_then(|f| f.strip_suffix(".json"))
            else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            match PlayerRecord::load(&dir, name) {
                Ok(record) => {
                    self.cache.insert(record.name.clone(), record);
                }
                Err(e) => log::warn!("skipping player file {name}: {e}"),
            }
        }
        self.populated = true;
        log::debug!("loaded {} player record(s) from {}", self.cache.len(), dir.display());
    }
}

/// Registry entry points never accept system-managed fields.
fn reject_system_fields(fields: &Fields) -> Result<(), PlayerError> {
    if fields.contains_key("created") {
        return Err(PlayerError::SystemField("created".to_string()));
    }
    for key in ["matches", "_matches"] {
        if fields.contains_key(key) {
            return Err(PlayerError::SystemField(key.to_string()));
        }
    }
    Ok(())
}

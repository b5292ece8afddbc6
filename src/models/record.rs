//! PlayerRecord: the persisted player profile, its field schema and value
//! coercion, JSON file save/load, and match-history derived queries.

use crate::config::{RegistryConfig, DEFAULT_RATING};
use crate::models::enums::{Difficulty, OptionValue, PlayerControl, PlayerType, Race};
use crate::models::history::{MatchCriteria, MatchHistory, MatchRecord};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A set of field overrides keyed by JSON field name.
pub type Fields = serde_json::Map<String, Value>;

/// Errors from record construction, update, lookup, and persistence.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerError {
    /// A record ended up without a name.
    EmptyName,
    /// AI and bot players must carry a launch command.
    MissingInitCmd(PlayerType),
    /// Field key is not part of the record schema (closed set).
    UnknownField(String),
    /// Field is system-managed and cannot be supplied by callers.
    SystemField(String),
    /// A difficulty was supplied for a player that is not a computer.
    DifficultyNotAllowed(PlayerType),
    /// Label is not a member of the restricted value set.
    InvalidLabel { kind: &'static str, value: String },
    /// Value cannot be coerced to the field's kind.
    InvalidValue { field: String, value: String },
    /// No player with this name (in the cache or on disk).
    NotFound(String),
    /// Backing file could not be written or parsed.
    Storage { path: PathBuf, reason: String },
}

impl std::fmt::Display for PlayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerError::EmptyName => write!(f, "A player record must have a non-empty name"),
            PlayerError::MissingInitCmd(t) => {
                write!(f, "Player type '{t}' requires a non-empty initCmd")
            }
            PlayerError::UnknownField(k) => write!(f, "'{k}' is not a valid player attribute"),
            PlayerError::SystemField(k) => {
                write!(f, "'{k}' is system-managed and cannot be set directly")
            }
            PlayerError::DifficultyNotAllowed(t) => {
                write!(f, "Player type '{t}' does not have a difficulty")
            }
            PlayerError::InvalidLabel { kind, value } => {
                write!(f, "'{value}' is not a recognized {kind}")
            }
            PlayerError::InvalidValue { field, value } => {
                write!(f, "Cannot interpret '{value}' as a value for '{field}'")
            }
            PlayerError::NotFound(name) => {
                write!(f, "'{name}' is not a known player definition")
            }
            PlayerError::Storage { path, reason } => {
                write!(f, "Storage failure at {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for PlayerError {}

/// Static field schema: which coercion each settable key uses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FieldKind {
    Name,
    Type,
    Difficulty,
    InitCmd,
    InitOptions,
    RaceDefault,
    Rating,
    Created,
}

/// Closed attribute set: any key outside this table is rejected.
fn field_kind(key: &str) -> Option<FieldKind> {
    match key {
        "name" => Some(FieldKind::Name),
        "type" => Some(FieldKind::Type),
        "difficulty" => Some(FieldKind::Difficulty),
        "initCmd" => Some(FieldKind::InitCmd),
        "initOptions" => Some(FieldKind::InitOptions),
        "raceDefault" => Some(FieldKind::RaceDefault),
        "rating" => Some(FieldKind::Rating),
        "created" => Some(FieldKind::Created),
        _ => None,
    }
}

/// A persisted player profile: identity, type, launch parameters, rating.
///
/// Mutation goes through [`PlayerRecord::update`]; the record never saves
/// itself on mutation, callers persist explicitly via [`PlayerRecord::save`].
#[derive(Clone, Debug)]
pub struct PlayerRecord {
    /// Lower-cased identity; also derives the on-disk file name.
    pub name: String,
    /// Field name is `type` on disk; `kind` in Rust.
    pub kind: PlayerType,
    /// Set if and only if `kind` is `Computer`.
    pub difficulty: Option<Difficulty>,
    /// Launch command for AI/bot players. Stored verbatim, never case-folded.
    pub init_cmd: String,
    /// Key/scalar options passed to the launch command.
    pub init_options: BTreeMap<String, OptionValue>,
    /// Race preference when the session supplies no override.
    pub race_default: Race,
    pub rating: u32,
    /// Set once at construction; not caller-settable through the registry.
    pub created: DateTime<Utc>,
    /// Lazily resolved match history. `None` = never fetched (an empty
    /// fetch result is cached as `Some(vec![])` and not refetched).
    matches: Option<Vec<MatchRecord>>,
}

impl PlayerRecord {
    fn defaults(default_rating: u32) -> Self {
        Self {
            name: String::new(),
            kind: PlayerType::Human,
            difficulty: None,
            init_cmd: String::new(),
            init_options: BTreeMap::new(),
            race_default: Race::Random,
            rating: default_rating,
            created: Utc::now(),
            matches: None,
        }
    }

    /// Build a record from a field map, then validate it as a whole.
    pub fn from_fields(fields: &Fields, config: &RegistryConfig) -> Result<Self, PlayerError> {
        let mut record = Self::defaults(config.default_rating);
        record.update(fields)?;
        record.validate()?;
        Ok(record)
    }

    /// Load a record from its backing file under `dir`.
    pub fn load(dir: &Path, name: &str) -> Result<Self, PlayerError> {
        let mut record = Self::defaults(DEFAULT_RATING);
        record.name = name.to_lowercase();
        record.reload(dir)?;
        record.validate()?;
        Ok(record)
    }

    /// Re-read this record's fields from disk, discarding the match cache.
    pub fn reload(&mut self, dir: &Path) -> Result<(), PlayerError> {
        let path = self.filename(dir);
        let raw =
            std::fs::read_to_string(&path).map_err(|_| PlayerError::NotFound(self.name.clone()))?;
        let parsed: Value = serde_json::from_str(&raw).map_err(|e| PlayerError::Storage {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let Value::Object(fields) = parsed else {
            return Err(PlayerError::Storage {
                path,
                reason: "expected a top-level JSON object".to_string(),
            });
        };
        self.update(&fields)?;
        self.matches = None; // force history re-resolution for the reloaded identity
        Ok(())
    }

    /// Whole-record validation applied after construction and updates.
    pub(crate) fn validate(&self) -> Result<(), PlayerError> {
        if self.name.is_empty() {
            return Err(PlayerError::EmptyName);
        }
        if self.kind.requires_init_cmd() && self.init_cmd.is_empty() {
            return Err(PlayerError::MissingInitCmd(self.kind));
        }
        Ok(())
    }

    /// Apply a field map: every key must be in the schema, every value is
    /// coerced by the key's kind. After applying, the difficulty/type
    /// invariant is re-established: non-computers lose their difficulty and
    /// may not have had one supplied; computers get the default difficulty
    /// when none is set.
    pub fn update(&mut self, fields: &Fields) -> Result<(), PlayerError> {
        // Reject unknown keys before coercing anything.
        for key in fields.keys() {
            if field_kind(key).is_none() {
                return Err(PlayerError::UnknownField(key.clone()));
            }
        }
        for (key, value) in fields {
            // Checked above; unreachable arm keeps this total.
            if let Some(kind) = field_kind(key) {
                self.apply(kind, key, value)?;
            }
        }
        if self.kind == PlayerType::Computer {
            if self.difficulty.is_none() {
                self.difficulty = Some(Difficulty::default());
            }
        } else {
            let supplied = fields.get("difficulty").map(|v| !v.is_null()).unwrap_or(false);
            if supplied {
                return Err(PlayerError::DifficultyNotAllowed(self.kind));
            }
            self.difficulty = None;
        }
        Ok(())
    }

    /// Coerce and assign one field.
    fn apply(&mut self, kind: FieldKind, key: &str, value: &Value) -> Result<(), PlayerError> {
        match kind {
            FieldKind::Name => {
                self.name = expect_str(key, value)?.to_lowercase();
            }
            FieldKind::Type => {
                self.kind = PlayerType::parse(expect_str(key, value)?)?;
            }
            FieldKind::Difficulty => {
                self.difficulty = match value {
                    Value::Null => None,
                    other => Some(Difficulty::parse(expect_str(key, other)?)?),
                };
            }
            FieldKind::InitCmd => {
                // The launch command is the one string field kept verbatim.
                self.init_cmd = expect_str(key, value)?.to_string();
            }
            FieldKind::InitOptions => {
                self.init_options = match value {
                    Value::Object(map) => options_from_object(map)?,
                    Value::String(raw) => parse_compact_options(raw)?,
                    Value::Null => BTreeMap::new(),
                    other => {
                        return Err(invalid(key, other));
                    }
                };
            }
            FieldKind::RaceDefault => {
                self.race_default = Race::parse(expect_str(key, value)?)?;
            }
            FieldKind::Rating => {
                self.rating = match value {
                    Value::Number(n) => n
                        .as_u64()
                        .and_then(|v| u32::try_from(v).ok())
                        .ok_or_else(|| invalid(key, value))?,
                    Value::String(s) => s.trim().parse().map_err(|_| invalid(key, value))?,
                    other => return Err(invalid(key, other)),
                };
            }
            FieldKind::Created => {
                self.created = match value {
                    Value::String(s) => DateTime::parse_from_rfc3339(s)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|_| invalid(key, value))?,
                    Value::Number(n) => {
                        let secs = n.as_f64().ok_or_else(|| invalid(key, value))?;
                        DateTime::from_timestamp(secs as i64, 0)
                            .ok_or_else(|| invalid(key, value))?
                    }
                    other => return Err(invalid(key, other)),
                };
            }
        }
        Ok(())
    }

    // --- identity-to-storage mapping -------------------------------------

    /// The backing file for a player name under the players directory.
    /// This is the sole identity-to-storage rule; there is no index file.
    pub fn file_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("player_{name}.json"))
    }

    /// Absolute path of this record's backing file under `dir`.
    pub fn filename(&self, dir: &Path) -> PathBuf {
        Self::file_path(dir, &self.name)
    }

    /// Flattened, human-readable view: enum labels, `difficulty` present only
    /// for computers, match cache excluded. Sorted keys via BTreeMap.
    pub fn to_fields(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        out.insert("name".to_string(), Value::String(self.name.clone()));
        out.insert("type".to_string(), Value::String(self.kind.label().to_string()));
        if self.kind == PlayerType::Computer {
            if let Some(diff) = self.difficulty {
                out.insert("difficulty".to_string(), Value::String(diff.label().to_string()));
            }
        }
        out.insert("initCmd".to_string(), Value::String(self.init_cmd.clone()));
        let options: serde_json::Map<String, Value> = self
            .init_options
            .iter()
            .map(|(k, v)| (k.clone(), option_to_value(v)))
            .collect();
        out.insert("initOptions".to_string(), Value::Object(options));
        out.insert(
            "raceDefault".to_string(),
            Value::String(self.race_default.label().to_string()),
        );
        out.insert("rating".to_string(), Value::Number(self.rating.into()));
        out.insert("created".to_string(), Value::String(self.created.to_rfc3339()));
        out
    }

    /// Write this record to its backing file, fully replacing prior content.
    pub fn save(&self, dir: &Path) -> Result<(), PlayerError> {
        let path = self.filename(dir);
        std::fs::create_dir_all(dir).map_err(|e| PlayerError::Storage {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let contents =
            serde_json::to_string_pretty(&self.to_fields()).map_err(|e| PlayerError::Storage {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        std::fs::write(&path, contents).map_err(|e| PlayerError::Storage {
            path,
            reason: e.to_string(),
        })
    }

    // --- type predicates ---------------------------------------------------

    pub fn is_human(&self) -> bool {
        self.kind == PlayerType::Human
    }

    pub fn is_computer(&self) -> bool {
        self.kind == PlayerType::Computer
    }

    pub fn is_ai(&self) -> bool {
        self.kind == PlayerType::Ai
    }

    /// An AI with pre-defined, scripted actions.
    pub fn is_bot(&self) -> bool {
        self.kind == PlayerType::Bot
    }

    /// Two humans sharing one seat.
    pub fn is_multi(&self) -> bool {
        self.kind == PlayerType::Archon
    }

    /// Base-record control mode: machine-controlled or an active participant.
    /// The pre-game view refines this with the observer flag.
    pub fn control(&self) -> PlayerControl {
        if self.is_computer() {
            PlayerControl::Computer
        } else {
            PlayerControl::Participant
        }
    }

    /// Launch options rendered as `key=value` pairs for the command line.
    pub fn init_options_str(&self) -> String {
        self.init_options
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // --- match history -----------------------------------------------------

    /// This player's match history, fetched from the provider on first
    /// access and cached for the record's lifetime (reset by [`reload`]).
    ///
    /// [`reload`]: PlayerRecord::reload
    pub fn matches(&mut self, history: &dyn MatchHistory) -> &[MatchRecord] {
        let name = self.name.clone();
        self.matches
            .get_or_insert_with(|| history.player_history(&name))
    }

    /// Matches from this player's history that satisfy every criterion.
    pub fn match_subset(
        &mut self,
        history: &dyn MatchHistory,
        criteria: &MatchCriteria,
    ) -> Vec<MatchRecord> {
        self.matches(history)
            .iter()
            .filter(|m| criteria.accepts(m))
            .cloned()
            .collect()
    }

    /// Filtered matches sorted ascending by end time, truncated to the first
    /// `max_matches` entries.
    // TODO: confirm with the session-manager maintainers whether this should
    // keep the newest rather than the oldest entries when over the limit.
    pub fn recent_matches(
        &mut self,
        history: &dyn MatchHistory,
        criteria: &MatchCriteria,
        max_matches: usize,
    ) -> Vec<MatchRecord> {
        let mut selected = self.match_subset(history, criteria);
        selected.sort_by_key(|m| m.end_time);
        selected.truncate(max_matches);
        selected
    }

    /// Mean APM over the recent-match selection; 0 when no matches qualify.
    pub fn apm_recent(
        &mut self,
        history: &dyn MatchHistory,
        criteria: &MatchCriteria,
        max_matches: usize,
    ) -> f64 {
        let name = self.name.clone();
        mean_apm(&self.recent_matches(history, criteria, max_matches), &name)
    }

    /// Mean APM over the entire (filtered) history; 0 when no matches qualify.
    pub fn apm_aggregate(&mut self, history: &dyn MatchHistory, criteria: &MatchCriteria) -> f64 {
        let name = self.name.clone();
        mean_apm(&self.match_subset(history, criteria), &name)
    }
}

impl std::fmt::Display for PlayerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.difficulty {
            Some(diff) if self.is_computer() => {
                write!(f, "<{} {}-{}>", self.name, self.kind, diff)
            }
            _ => write!(f, "<{} {}-{}>", self.name, self.kind, self.rating),
        }
    }
}

fn mean_apm(matches: &[MatchRecord], player: &str) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    let total: f64 = matches.iter().map(|m| m.apm(player)).sum();
    total / matches.len() as f64
}

fn invalid(field: &str, value: &Value) -> PlayerError {
    PlayerError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn expect_str<'a>(field: &str, value: &'a Value) -> Result<&'a str, PlayerError> {
    value.as_str().ok_or_else(|| invalid(field, value))
}

fn option_to_value(v: &OptionValue) -> Value {
    match v {
        OptionValue::Bool(b) => Value::Bool(*b),
        OptionValue::Int(i) => Value::Number((*i).into()),
        OptionValue::Float(x) => serde_json::Number::from_f64(*x)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        OptionValue::Str(s) => Value::String(s.clone()),
    }
}

/// Convert a native JSON object into the option map. String values go
/// through scalar inference so `{"speed": "2.5"}` and `"speed:2.5"` agree.
fn options_from_object(
    map: &serde_json::Map<String, Value>,
) -> Result<BTreeMap<String, OptionValue>, PlayerError> {
    let mut out = BTreeMap::new();
    for (k, v) in map {
        let value = match v {
            Value::Bool(b) => OptionValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    OptionValue::Int(i)
                } else {
                    OptionValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => OptionValue::infer(s),
            other => return Err(invalid("initOptions", other)),
        };
        out.insert(k.clone(), value);
    }
    Ok(out)
}

/// Parse the compact `"key:value, key:value"` option form. Braces and quote
/// marks are stripped; each scalar is inferred (bool, then float when it
/// contains '.', then int, else string).
fn parse_compact_options(raw: &str) -> Result<BTreeMap<String, OptionValue>, PlayerError> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '{' | '}')).collect();
    let mut out = BTreeMap::new();
    for term in cleaned
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (key, value) = term.split_once(':').ok_or_else(|| PlayerError::InvalidValue {
            field: "initOptions".to_string(),
            value: term.to_string(),
        })?;
        let key = key.trim().trim_matches(|c| c == '\'' || c == '"');
        if key.is_empty() {
            return Err(PlayerError::InvalidValue {
                field: "initOptions".to_string(),
                value: term.to_string(),
            });
        }
        out.insert(key.to_string(), OptionValue::infer(value));
    }
    Ok(out)
}

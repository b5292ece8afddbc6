//! Closed, validated value sets: player type, computer difficulty, race,
//! control mode, and launch-option scalars.
//!
//! Each restricted type parses case-insensitively from its canonical label
//! and renders back to it; an unrecognized label is a validation error.

use crate::models::record::PlayerError;
use serde::{Deserialize, Serialize};

/// Normalize a label for matching: lower-cased, separators stripped.
fn fold(label: &str) -> String {
    label
        .trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// What kind of entity operates a player profile.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerType {
    #[default]
    Human,
    /// Built-in scripted opponent; the only type that carries a difficulty.
    Computer,
    Ai,
    Bot,
    /// Two players sharing control of a single seat.
    Archon,
}

impl PlayerType {
    pub fn parse(label: &str) -> Result<Self, PlayerError> {
        match fold(label).as_str() {
            "human" => Ok(PlayerType::Human),
            "computer" => Ok(PlayerType::Computer),
            "ai" => Ok(PlayerType::Ai),
            "bot" => Ok(PlayerType::Bot),
            "archon" => Ok(PlayerType::Archon),
            _ => Err(PlayerError::InvalidLabel {
                kind: "player type",
                value: label.to_string(),
            }),
        }
    }

    /// Canonical lower-case label (the persisted form).
    pub fn label(&self) -> &'static str {
        match self {
            PlayerType::Human => "human",
            PlayerType::Computer => "computer",
            PlayerType::Ai => "ai",
            PlayerType::Bot => "bot",
            PlayerType::Archon => "archon",
        }
    }

    /// Types that are launched via an init command.
    pub fn requires_init_cmd(&self) -> bool {
        matches!(self, PlayerType::Ai | PlayerType::Bot)
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Built-in computer opponent difficulty. Only meaningful on computer players.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    #[default]
    Medium,
    MediumHard,
    Hard,
    Harder,
    VeryHard,
    Elite,
    CheatVision,
    CheatMoney,
    CheatInsane,
}

impl Difficulty {
    pub fn parse(label: &str) -> Result<Self, PlayerError> {
        match fold(label).as_str() {
            "veryeasy" => Ok(Difficulty::VeryEasy),
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "mediumhard" => Ok(Difficulty::MediumHard),
            "hard" => Ok(Difficulty::Hard),
            "harder" => Ok(Difficulty::Harder),
            "veryhard" => Ok(Difficulty::VeryHard),
            "elite" => Ok(Difficulty::Elite),
            "cheatvision" => Ok(Difficulty::CheatVision),
            "cheatmoney" => Ok(Difficulty::CheatMoney),
            "cheatinsane" => Ok(Difficulty::CheatInsane),
            _ => Err(PlayerError::InvalidLabel {
                kind: "difficulty",
                value: label.to_string(),
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::VeryEasy => "very_easy",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::MediumHard => "medium_hard",
            Difficulty::Hard => "hard",
            Difficulty::Harder => "harder",
            Difficulty::VeryHard => "very_hard",
            Difficulty::Elite => "elite",
            Difficulty::CheatVision => "cheat_vision",
            Difficulty::CheatMoney => "cheat_money",
            Difficulty::CheatInsane => "cheat_insane",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// In-game race selection.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    Protoss,
    Terran,
    Zerg,
    #[default]
    Random,
}

impl Race {
    pub fn parse(label: &str) -> Result<Self, PlayerError> {
        match fold(label).as_str() {
            "protoss" => Ok(Race::Protoss),
            "terran" => Ok(Race::Terran),
            "zerg" => Ok(Race::Zerg),
            "random" => Ok(Race::Random),
            _ => Err(PlayerError::InvalidLabel {
                kind: "race",
                value: label.to_string(),
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Race::Protoss => "protoss",
            Race::Terran => "terran",
            Race::Zerg => "zerg",
            Race::Random => "random",
        }
    }
}

impl std::fmt::Display for Race {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a session seat is operated. Derived, never persisted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerControl {
    Computer,
    Observer,
    Participant,
}

impl PlayerControl {
    pub fn label(&self) -> &'static str {
        match self {
            PlayerControl::Computer => "computer",
            PlayerControl::Observer => "observer",
            PlayerControl::Participant => "participant",
        }
    }
}

impl std::fmt::Display for PlayerControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Scalar value in a launch-option map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl OptionValue {
    /// Infer the scalar type from a bare string: case-insensitive true/false,
    /// then float when it contains a '.', then integer, else string.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim().trim_matches(|c| c == '\'' || c == '"');
        if trimmed.eq_ignore_ascii_case("true") {
            return OptionValue::Bool(true);
        }
        // "False" as a bare string must become false, not a truthy non-empty string.
        if trimmed.eq_ignore_ascii_case("false") {
            return OptionValue::Bool(false);
        }
        if trimmed.contains('.') {
            if let Ok(f) = trimmed.parse::<f64>() {
                return OptionValue::Float(f);
            }
        } else if let Ok(i) = trimmed.parse::<i64>() {
            return OptionValue::Int(i);
        }
        OptionValue::Str(trimmed.to_string())
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Str(s) => f.write_str(s),
        }
    }
}

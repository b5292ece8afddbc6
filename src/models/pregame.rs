//! PlayerPreGame: a transient, per-session decoration of a stored record
//! with the choices made right before a match starts. Never persisted.

use crate::models::enums::{PlayerControl, Race};
use crate::models::record::PlayerRecord;

/// A stored profile plus per-session selections: race, observer flag, seat.
#[derive(Clone, Debug)]
pub struct PlayerPreGame {
    pub record: PlayerRecord,
    pub selected_race: Race,
    pub is_observer: bool,
    /// Session seat number; 0 = unassigned.
    pub player_id: u32,
}

impl PlayerPreGame {
    /// Decorate a base record with fresh session parameters.
    pub fn new(record: PlayerRecord, selected_race: Race, is_observer: bool, player_id: u32) -> Self {
        Self {
            record,
            selected_race,
            is_observer,
            player_id,
        }
    }

    /// Carry another view's session parameters over a re-derived base record.
    pub fn from_pre_game(other: &PlayerPreGame, record: PlayerRecord) -> Self {
        Self {
            record,
            selected_race: other.selected_race,
            is_observer: other.is_observer,
            player_id: other.player_id,
        }
    }

    /// How this seat is operated: computer beats observer beats participant.
    pub fn control(&self) -> PlayerControl {
        if self.record.is_computer() {
            PlayerControl::Computer
        } else if self.is_observer {
            PlayerControl::Observer
        } else {
            PlayerControl::Participant
        }
    }

    /// The race this seat will play. An accessor so specialized views could
    /// derive it differently (e.g. from the base record's preference).
    pub fn race(&self) -> Race {
        self.selected_race
    }
}

impl std::fmt::Display for PlayerPreGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let control = self.control();
        if control == PlayerControl::Computer {
            // The base label already says everything about a computer seat.
            return write!(f, "{}", self.record);
        }
        let mut parts = Vec::new();
        if self.player_id > 0 {
            parts.push(self.player_id.to_string());
        }
        if !self.is_observer {
            parts.push(self.race().label().to_string());
        }
        parts.push(control.label().to_string());
        write!(
            f,
            "<{} {}-{}>",
            parts.join(" "),
            self.record.kind,
            self.record.name
        )
    }
}

/// What `build_player` produced: a bare record, or the richer pre-game view
/// when the caller supplied any session selection.
#[derive(Clone, Debug)]
pub enum BuiltPlayer {
    Record(PlayerRecord),
    PreGame(PlayerPreGame),
}

impl BuiltPlayer {
    /// The underlying stored record, for either variant.
    pub fn record(&self) -> &PlayerRecord {
        match self {
            BuiltPlayer::Record(r) => r,
            BuiltPlayer::PreGame(p) => &p.record,
        }
    }

    pub fn is_pre_game(&self) -> bool {
        matches!(self, BuiltPlayer::PreGame(_))
    }
}

impl std::fmt::Display for BuiltPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuiltPlayer::Record(r) => write!(f, "{r}"),
            BuiltPlayer::PreGame(p) => write!(f, "{p}"),
        }
    }
}

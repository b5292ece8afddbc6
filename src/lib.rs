//! Player profile registry: JSON-file-backed player records for game
//! session setup, with typed field updates, pre-game session views, and
//! time-based stale-record expiry.

pub mod config;
pub mod models;
pub mod registry;

pub use config::RegistryConfig;
pub use models::{
    BuiltPlayer, Difficulty, EmptyHistory, Fields, MatchCriteria, MatchHistory, MatchRecord,
    OptionValue, PlayerControl, PlayerError, PlayerPreGame, PlayerRecord, PlayerType, Race,
};
pub use registry::{BuildParams, PlayerRegistry};

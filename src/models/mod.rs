//! Data structures for the player registry: records, restricted types,
//! pre-game views, and match history.

mod enums;
mod history;
mod pregame;
mod record;

pub use enums::{Difficulty, OptionValue, PlayerControl, PlayerType, Race};
pub use history::{EmptyHistory, MatchCriteria, MatchHistory, MatchRecord};
pub use pregame::{BuiltPlayer, PlayerPreGame};
pub use record::{Fields, PlayerError, PlayerRecord};

//! Registry configuration: storage directory, staleness horizons, defaults.

use std::path::{Path, PathBuf};

/// Default skill rating for new records.
pub const DEFAULT_RATING: u32 = 500;
/// Days without a match before a played record is considered stale.
pub const DEFAULT_TIME_LIMIT_DAYS: f64 = 90.0;
/// Days a matchless record may exist before it is considered stale.
pub const NO_ACTIVITY_LIMIT_DAYS: f64 = 10.0;
/// How many matches count as "recent" when no explicit limit is given.
pub const RECENT_MATCHES: usize = 15;

/// Externally supplied knobs for a [`PlayerRegistry`](crate::PlayerRegistry).
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Directory holding one `player_<name>.json` file per player.
    pub players_dir: PathBuf,
    pub stale_after_days: f64,
    pub no_activity_days: f64,
    pub recent_matches: usize,
    pub default_rating: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            players_dir: PathBuf::from("dataPlayers"),
            stale_after_days: DEFAULT_TIME_LIMIT_DAYS,
            no_activity_days: NO_ACTIVITY_LIMIT_DAYS,
            recent_matches: RECENT_MATCHES,
            default_rating: DEFAULT_RATING,
        }
    }
}

impl RegistryConfig {
    /// Defaults with a specific storage directory.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            players_dir: dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }
}

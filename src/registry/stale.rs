//! Staleness policy: which cached records have been inactive long enough
//! to qualify for automatic removal.

use super::PlayerRegistry;
use crate::models::PlayerRecord;
use chrono::{Duration, Utc};

fn days_to_duration(days: f64) -> Duration {
    Duration::seconds((days * 24.0 * 60.0 * 60.0) as i64)
}

/// Records stale under a dual time horizon:
///
/// - With match history: stale when the most recent match ended more than
///   `limit_days` ago.
/// - Without match history: stale when created more than
///   `min(limit_days, no-activity horizon)` ago. Creation-without-activity
///   never gets a longer grace period than the match-based horizon.
pub(crate) fn stale_records(registry: &mut PlayerRegistry, limit_days: f64) -> Vec<PlayerRecord> {
    registry.populate(false);
    let now = Utc::now();
    let match_horizon = days_to_duration(limit_days);
    let no_activity_horizon = days_to_duration(limit_days.min(registry.config.no_activity_days));

    let PlayerRegistry { cache, history, .. } = registry;
    let mut out = Vec::new();
    for record in cache.values_mut() {
        let matches = record.matches(&**history);
        if let Some(latest) = matches.iter().map(|m| m.end_time).max() {
            if now - latest > match_horizon {
                out.push(record.clone());
            }
        } else if now - record.created > no_activity_horizon {
            out.push(record.clone());
        }
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

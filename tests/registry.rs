//! Integration tests for the registry: CRUD end-to-end, cache population and
//! reset, the pre-game build policy, and stale-record expiry.

use chrono::{Duration, Utc};
use player_registry::{
    BuildParams, Difficulty, Fields, MatchHistory, MatchRecord, PlayerControl, PlayerError,
    PlayerRecord, PlayerRegistry, PlayerType, Race, RegistryConfig,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;

fn fields(pairs: &[(&str, Value)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn registry(dir: &Path) -> PlayerRegistry {
    PlayerRegistry::new(RegistryConfig::with_dir(dir))
}

/// Provider with a fixed per-player history.
struct FixedHistory(HashMap<String, Vec<MatchRecord>>);

impl FixedHistory {
    fn new() -> Self {
        Self(HashMap::new())
    }

    fn with(mut self, player: &str, matches: Vec<MatchRecord>) -> Self {
        self.0.insert(player.to_string(), matches);
        self
    }
}

impl MatchHistory for FixedHistory {
    fn player_history(&self, name: &str) -> Vec<MatchRecord> {
        self.0.get(name).cloned().unwrap_or_default()
    }
}

/// Persist a player whose `created` lies `days` in the past. Records accept
/// `created` at this level (the registry forbids it as caller input).
fn seed_player_created_days_ago(dir: &Path, name: &str, days: i64) {
    let created = (Utc::now() - Duration::days(days)).to_rfc3339();
    let rec = PlayerRecord::from_fields(
        &fields(&[("name", json!(name)), ("created", json!(created))]),
        &RegistryConfig::default(),
    )
    .unwrap();
    rec.save(dir).unwrap();
}

fn match_ended_days_ago(days: i64, player: &str) -> MatchRecord {
    MatchRecord::new(
        "test map",
        vec![player.to_string()],
        Utc::now() - Duration::days(days),
    )
}

#[test]
fn add_get_delete_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());

    let added = reg
        .add_player(&fields(&[("name", json!("Bob")), ("type", json!("human"))]))
        .unwrap();
    assert_eq!(added.name, "bob");
    assert!(dir.path().join("player_bob.json").exists());

    // Lookup is case-insensitive.
    let fetched = reg.get_player("BOB").unwrap();
    assert_eq!(fetched.name, "bob");
    assert_eq!(fetched.kind, PlayerType::Human);
    assert_eq!(fetched.difficulty, None);

    let removed = reg.delete_player("bob").unwrap();
    assert_eq!(removed.name, "bob");
    assert!(!dir.path().join("player_bob.json").exists());
    assert!(matches!(
        reg.get_player("bob"),
        Err(PlayerError::NotFound(_))
    ));
}

#[test]
fn system_fields_are_rejected_at_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());

    let err = reg.add_player(&fields(&[
        ("name", json!("bob")),
        ("created", json!("2020-01-01T00:00:00Z")),
    ]));
    assert!(matches!(err, Err(PlayerError::SystemField(k)) if k == "created"));

    let err = reg.add_player(&fields(&[("name", json!("bob")), ("matches", json!([]))]));
    assert!(matches!(err, Err(PlayerError::SystemField(k)) if k == "matches"));
}

#[test]
fn update_persists_and_rekeys_on_rename() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());
    reg.add_player(&fields(&[("name", json!("bob"))])).unwrap();

    let updated = reg
        .update_player("bob", &fields(&[("rating", json!(800))]))
        .unwrap();
    assert_eq!(updated.rating, 800);

    let renamed = reg
        .update_player("bob", &fields(&[("name", json!("Robert"))]))
        .unwrap();
    assert_eq!(renamed.name, "robert");
    assert!(dir.path().join("player_robert.json").exists());
    assert!(!dir.path().join("player_bob.json").exists());
    assert!(matches!(
        reg.get_player("bob"),
        Err(PlayerError::NotFound(_))
    ));
    assert_eq!(reg.get_player("robert").unwrap().rating, 800);
}

#[test]
fn readding_a_deleted_computer_does_not_retain_difficulty() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());

    reg.add_player(&fields(&[
        ("name", json!("cpu1")),
        ("type", json!("computer")),
        ("difficulty", json!("hard")),
    ]))
    .unwrap();
    let computers = reg.computer_players();
    assert_eq!(computers.len(), 1);
    assert_eq!(computers[0].name, "cpu1");
    assert_eq!(computers[0].difficulty, Some(Difficulty::Hard));

    reg.delete_player("cpu1").unwrap();
    let readded = reg
        .add_player(&fields(&[("name", json!("cpu1")), ("type", json!("human"))]))
        .unwrap();
    assert_eq!(readded.difficulty, None);
    assert!(reg.computer_players().is_empty());
}

#[test]
fn known_players_is_memoized_until_reset() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());
    reg.add_player(&fields(&[("name", json!("bob"))])).unwrap();
    reg.add_player(&fields(&[("name", json!("alice"))])).unwrap();

    assert_eq!(reg.known_players(false).len(), 2);

    // Out-of-band file: invisible without a reset.
    let rec = PlayerRecord::from_fields(
        &fields(&[("name", json!("mallory"))]),
        &RegistryConfig::default(),
    )
    .unwrap();
    rec.save(dir.path()).unwrap();
    assert_eq!(reg.known_players(false).len(), 2);

    let rescanned = reg.known_players(true);
    assert_eq!(rescanned.len(), 3);
    assert!(rescanned.contains_key("mallory"));
}

#[test]
fn scan_recovers_names_from_file_names() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut reg = registry(dir.path());
        reg.add_player(&fields(&[("name", json!("bob"))])).unwrap();
    }
    // A fresh registry sees only what the directory holds.
    let mut reg = registry(dir.path());
    let known = reg.known_players(false);
    assert_eq!(known.len(), 1);
    assert!(known.contains_key("bob"));
}

#[test]
fn matchless_players_use_the_no_activity_horizon() {
    let dir = tempfile::tempdir().unwrap();
    seed_player_created_days_ago(dir.path(), "idle11", 11);
    seed_player_created_days_ago(dir.path(), "idle9", 9);

    let mut reg = registry(dir.path());
    let stale = reg.stale_records(Some(90.0));
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].name, "idle11");
}

#[test]
fn no_activity_horizon_never_exceeds_the_limit() {
    let dir = tempfile::tempdir().unwrap();
    seed_player_created_days_ago(dir.path(), "idle6", 6);

    let mut reg = registry(dir.path());
    // min(limit, no-activity) = 5 days here, so 6 idle days is stale.
    assert_eq!(reg.stale_records(Some(5.0)).len(), 1);
    assert!(reg.stale_records(Some(90.0)).is_empty());
}

#[test]
fn played_players_use_the_last_match_horizon() {
    let dir = tempfile::tempdir().unwrap();
    seed_player_created_days_ago(dir.path(), "rusty", 400);
    seed_player_created_days_ago(dir.path(), "active", 400);

    let history = FixedHistory::new()
        .with("rusty", vec![match_ended_days_ago(91, "rusty")])
        .with(
            "active",
            vec![
                match_ended_days_ago(200, "active"),
                match_ended_days_ago(89, "active"),
            ],
        );
    let mut reg =
        PlayerRegistry::with_history(RegistryConfig::with_dir(dir.path()), history);

    let stale = reg.stale_records(Some(90.0));
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].name, "rusty");
}

#[test]
fn remove_stale_records_deletes_files_and_cache_entries() {
    let dir = tempfile::tempdir().unwrap();
    seed_player_created_days_ago(dir.path(), "idle11", 11);
    seed_player_created_days_ago(dir.path(), "fresh", 1);

    let mut reg = registry(dir.path());
    let removed = reg.remove_stale_records(Some(90.0)).unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].name, "idle11");
    assert!(!dir.path().join("player_idle11.json").exists());
    assert!(matches!(
        reg.get_player("idle11"),
        Err(PlayerError::NotFound(_))
    ));
    assert!(reg.get_player("fresh").is_ok());
}

#[test]
fn build_player_without_session_choices_is_a_bare_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());

    let built = reg
        .build_player(BuildParams::new("bob", PlayerType::Human))
        .unwrap();
    assert!(!built.is_pre_game());
    assert_eq!(built.record().name, "bob");
    // build_player constructs but never persists.
    assert!(!dir.path().join("player_bob.json").exists());
}

#[test]
fn build_player_with_any_session_choice_is_a_pre_game_view() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());

    let mut params = BuildParams::new("bob", PlayerType::Human);
    params.race = Some(Race::Zerg);
    let built = reg.build_player(params).unwrap();
    assert!(built.is_pre_game());

    let mut params = BuildParams::new("watcher", PlayerType::Human);
    params.observe = true;
    match reg.build_player(params).unwrap() {
        player_registry::BuiltPlayer::PreGame(view) => {
            assert_eq!(view.control(), PlayerControl::Observer);
            assert_eq!(view.race(), Race::Random);
        }
        other => panic!("expected a pre-game view, got {other}"),
    }

    // Computer wins the control precedence even for an observer seat.
    let mut params = BuildParams::new("cpu1", PlayerType::Computer);
    params.observe = true;
    match reg.build_player(params).unwrap() {
        player_registry::BuiltPlayer::PreGame(view) => {
            assert_eq!(view.control(), PlayerControl::Computer);
            assert_eq!(view.record.difficulty, Some(Difficulty::Medium));
        }
        other => panic!("expected a pre-game view, got {other}"),
    }
}

#[test]
fn build_player_rejects_difficulty_for_non_computers() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());

    let mut params = BuildParams::new("bob", PlayerType::Human);
    params.difficulty = Some(Difficulty::Hard);
    assert!(matches!(
        reg.build_player(params),
        Err(PlayerError::DifficultyNotAllowed(PlayerType::Human))
    ));
}

#[test]
fn deleting_with_a_missing_backing_file_still_evicts() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry(dir.path());
    reg.add_player(&fields(&[("name", json!("bob"))])).unwrap();

    // Out-of-band removal: deletion is best-effort and must not fail.
    std::fs::remove_file(dir.path().join("player_bob.json")).unwrap();
    let removed = reg.delete_player("bob").unwrap();
    assert_eq!(removed.name, "bob");
    assert!(matches!(
        reg.get_player("bob"),
        Err(PlayerError::NotFound(_))
    ));
}

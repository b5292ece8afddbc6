//! Command-line front end for the player registry.
//! Run with: cargo run --bin players -- --get bob
//!
//! Picks at most one action (--add, --update, --get, --rm, --stale,
//! --rmstale; default lists everything). Remaining `key=value` arguments are
//! field values for --add/--update and match filters for the display flags.

use clap::Parser;
use player_registry::{
    EmptyHistory, Fields, MatchCriteria, PlayerError, PlayerRecord, PlayerRegistry, RegistryConfig,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "players", about = "Manage persisted player profile records")]
struct Cli {
    /// Players storage directory (default: ./dataPlayers)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Add the key=value criteria as a new player definition
    #[arg(long)]
    add: bool,

    /// Update the named record with the key=value criteria
    #[arg(long, value_name = "NAME")]
    update: Option<String>,

    /// Show one specific player
    #[arg(long, value_name = "NAME")]
    get: Option<String>,

    /// Remove the named player from the player database
    #[arg(long, value_name = "NAME")]
    rm: Option<String>,

    /// Select all records stale for more than DAYS days
    #[arg(long, value_name = "DAYS")]
    stale: Option<f64>,

    /// Remove all records stale for more than DAYS days
    #[arg(long, value_name = "DAYS")]
    rmstale: Option<f64>,

    /// Show details of each player identified
    #[arg(long)]
    details: bool,

    /// Show an additional count summary
    #[arg(long)]
    summary: bool,

    /// Display the most recent N matches
    #[arg(long, value_name = "N")]
    matches: Option<usize>,

    /// Calculate APM (over --matches N when given, else all matches)
    #[arg(long)]
    apm: bool,

    /// Additional key=value pairs
    criteria: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let cli = Cli::parse();

    let pairs = match parse_pairs(&cli.criteria) {
        Ok(pairs) => pairs,
        Err(key) => {
            eprintln!("ERROR: '{key}' must specify a value as key=value (no whitespace).");
            return ExitCode::FAILURE;
        }
    };

    let config = match &cli.dir {
        Some(dir) => RegistryConfig::with_dir(dir),
        None => RegistryConfig::default(),
    };
    let mut registry = PlayerRegistry::new(config);

    match run(&mut registry, &cli, &pairs) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Key=value pairs split once on '='. Returns the offending key on failure.
fn parse_pairs(args: &[String]) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    for arg in args {
        match arg.split_once('=') {
            Some((k, v)) if !k.is_empty() => pairs.push((k.to_string(), v.to_string())),
            _ => return Err(arg.clone()),
        }
    }
    Ok(pairs)
}

fn to_fields(pairs: &[(String, String)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

fn to_criteria(pairs: &[(String, String)]) -> MatchCriteria {
    pairs
        .iter()
        .fold(MatchCriteria::new(), |c, (k, v)| c.with(k, v))
}

fn run(registry: &mut PlayerRegistry, cli: &Cli, pairs: &[(String, String)]) -> Result<(), PlayerError> {
    let fields = to_fields(pairs);

    // Identify which records the chosen action touches.
    let mut action = true;
    let records: Vec<PlayerRecord> = if cli.stale.is_some() {
        registry.stale_records(cli.stale)
    } else if cli.rmstale.is_some() {
        registry.remove_stale_records(cli.rmstale)?
    } else if let Some(name) = &cli.get {
        vec![registry.get_player(name)?.clone()]
    } else if cli.add {
        vec![registry.add_player(&fields)?]
    } else if let Some(name) = &cli.update {
        vec![registry.update_player(name, &fields)?]
    } else if let Some(name) = &cli.rm {
        vec![registry.delete_player(name)?]
    } else {
        action = false;
        let mut all: Vec<PlayerRecord> = registry.known_players(true).values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    };

    let criteria = to_criteria(pairs);
    let history = EmptyHistory;
    let count = records.len();

    for mut record in records {
        println!("{record}");
        if cli.details {
            println!("{:>15} : {}", "type", record.kind);
            if record.kind.requires_init_cmd() {
                println!("{:>15} : {}", "init command", record.init_cmd);
            }
            println!("{:>15} : {}", "total matches", record.matches(&history).len());
            println!("{:>15} : {}", "creation", record.created.format("%Y-%m-%d %H:%M:%S"));
        }
        if cli.apm {
            let apm = match cli.matches {
                Some(n) => record.apm_recent(&history, &criteria, n),
                None => record.apm_aggregate(&history, &criteria),
            };
            println!("{:>15} : {apm}", "apm");
        }
        if let Some(n) = cli.matches {
            let found = record.recent_matches(&history, &criteria, n);
            println!("{:>15} : {}", "recent matches", found.len());
            for m in found {
                println!("            {} on {} ({})", m.end_time.format("%Y-%m-%d"), m.map_name, m.id);
            }
        }
    }

    if cli.summary {
        let suffix = if action { " affected by action" } else { "" };
        println!("num player(s){suffix}: {count}");
    }
    Ok(())
}

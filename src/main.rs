//! GAFFER — fantasy-football squad optimizer
//!
//! Entry point. Loads configuration, initialises structured logging and
//! runs one command:
//!
//! - `gaffer refresh`: pull the player catalog from the game API into the cache
//! - `gaffer squad [chip]`: build the best squad for a chip (default from config)
//! - `gaffer transfers`: rank single transfers for the saved `my-team` squad
//! - `gaffer rank [entry]`: a manager's overall rank
//! - `gaffer leagues [entry]`: classic leagues a manager is in
//! - `gaffer league <id>`: a classic league table

use anyhow::{Context, Result};
use tracing::{info, warn};

use gaffer::config::AppConfig;
use gaffer::optimizer::chips::{bench_boost_value, choose_captains, ChipType};
use gaffer::optimizer::SquadOptimizer;
use gaffer::rating::RatingEngine;
use gaffer::solver::HighsSolver;
use gaffer::sources::fpl::FplClient;
use gaffer::sources::my_team::MyTeamFile;
use gaffer::sources::{PlayerSource, SquadSource};
use gaffer::storage::{self, CachedCatalog, CatalogSnapshot};
use gaffer::transfers::TransferRecommender;
use gaffer::types::{OwnedSquad, Player};

const BANNER: &str = r#"
   ____    _    _____ _____ _____ ____
  / ___|  / \  |  ___|  ___| ____|  _ \
 | |  _  / _ \ | |_  | |_  |  _| | |_) |
 | |_| |/ ___ \|  _| |  _| | |___|  _ <
  \____/_/   \_\_|   |_|   |_____|_| \_\

  Squad optimizer & transfer planner
  v0.1.0
"#;

const DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path = std::env::var("GAFFER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.into());
    let cfg = AppConfig::load_or_default(&config_path)?;

    println!("{BANNER}");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str).unwrap_or("squad") {
        "refresh" => {
            refresh(&cfg).await?;
        }
        "squad" => {
            let chip = match args.get(1) {
                Some(raw) => raw.parse::<ChipType>()?,
                None => cfg.squad.chip,
            };
            build_squad(&cfg, chip).await?;
        }
        "transfers" => {
            suggest_transfers(&cfg).await?;
        }
        "rank" => {
            let entry = entry_id(&cfg, args.get(1))?;
            match api_client(&cfg)?.current_user_rank(entry).await? {
                Some(rank) => println!("Entry {entry}: overall rank {rank}"),
                None => println!("Entry {entry}: not ranked yet"),
            }
        }
        "leagues" => {
            let entry = entry_id(&cfg, args.get(1))?;
            for league in api_client(&cfg)?.current_user_leagues(entry).await? {
                let rank = league.entry_rank.map_or("-".to_string(), |r| r.to_string());
                println!("{:>8}  {:<30} rank {rank}", league.id, league.name);
            }
        }
        "league" => {
            let league_id: u64 = args
                .get(1)
                .context("Usage: gaffer league <league id>")?
                .parse()
                .context("League id must be a number")?;
            for row in api_client(&cfg)?.league_standings(league_id).await? {
                println!(
                    "{:>4}. {:<28} {:<24} {:>5}",
                    row.rank, row.entry_name, row.player_name, row.total
                );
            }
        }
        other => anyhow::bail!(
            "Unknown command '{other}'. Use: refresh | squad [chip] | transfers | rank [entry] | leagues [entry] | league <id>"
        ),
    }

    Ok(())
}

fn api_client(cfg: &AppConfig) -> Result<FplClient> {
    FplClient::new(
        Some(cfg.source.api_base_url.clone()),
        cfg.source.timeout_secs,
        RatingEngine::new(cfg.rating),
    )
}

/// Manager id from the command line, else `source.entry_id`.
fn entry_id(cfg: &AppConfig, arg: Option<&String>) -> Result<u64> {
    match arg {
        Some(raw) => raw.parse().context("Entry id must be a number"),
        None => cfg
            .source
            .entry_id
            .context("Pass an entry id or set `source.entry_id` in the config"),
    }
}

/// Fetch the catalog from the API and write the cache.
async fn refresh(cfg: &AppConfig) -> Result<Vec<Player>> {
    let client = api_client(cfg)?;
    let players = client.fetch_players().await?;
    storage::save_catalog(&CatalogSnapshot::new(players.clone()), Some(&cfg.source.cache_path))?;
    info!(
        players = players.len(),
        path = %cfg.source.cache_path,
        source = client.name(),
        "Catalog refreshed"
    );
    Ok(players)
}

/// Cached catalog, refreshing from the API when there is none.
async fn load_players(cfg: &AppConfig) -> Result<Vec<Player>> {
    let cache = CachedCatalog::new(cfg.source.cache_path.clone())
        .with_max_age_hours(cfg.source.max_cache_age_hours);
    match cache.fetch_players().await {
        Ok(players) => Ok(players),
        Err(e) => {
            warn!(error = %e, "Cache unavailable, fetching from API");
            refresh(cfg).await
        }
    }
}

async fn load_owned(cfg: &AppConfig, players: &[Player]) -> Result<Option<OwnedSquad>> {
    let Some(path) = cfg.source.my_team_path.as_deref() else {
        return Ok(None);
    };
    let source = MyTeamFile::new(path, players.to_vec(), cfg.rules.squad_size());
    let owned = source
        .fetch_squad()
        .await
        .with_context(|| format!("Failed to load squad via {}", source.name()))?;
    Ok(Some(owned))
}

async fn build_squad(cfg: &AppConfig, chip: ChipType) -> Result<()> {
    let players = load_players(cfg).await?;
    let budget = match load_owned(cfg, &players).await? {
        Some(owned) => {
            let budget = owned.rebuild_budget();
            info!(budget = %budget, bank = %owned.bank, "Using rebuild budget");
            budget
        }
        None => cfg.squad.budget,
    };

    let optimizer = SquadOptimizer::with_solver(cfg.rules.clone(), HighsSolver::new(cfg.solver));
    let squad = optimizer.build_squad(&players, budget, cfg.squad.bench_importance, chip)?;
    let captains = choose_captains(&squad.starters)?;
    let all = squad.clone().into_players();

    println!("{} squad (budget £{budget:.1}m)\n", chip);
    println!("{squad}\n");
    println!("Captain: {}", captains.captain.name);
    println!("Vice-captain: {}", captains.vice_captain.name);
    println!(
        "Bench boost value: {:.2}",
        bench_boost_value(&all, cfg.rules.lineup_size)
    );
    Ok(())
}

async fn suggest_transfers(cfg: &AppConfig) -> Result<()> {
    let players = load_players(cfg).await?;
    let owned = load_owned(cfg, &players)
        .await?
        .context("Transfers need `source.my_team_path` in the config")?;

    let recommender = TransferRecommender::new(cfg.transfers.clone(), cfg.rules.team_max);
    let transfers = recommender.top(&owned.players, &players, owned.bank);

    if transfers.is_empty() {
        println!("No legal transfers found.");
        return Ok(());
    }
    println!("Top {} transfers (bank £{:.1}m):\n", transfers.len(), owned.bank);
    for (rank, t) in transfers.iter().enumerate() {
        println!("{:>2}. {t}", rank + 1);
    }
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gaffer=info"));

    let json_logging = std::env::var("GAFFER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

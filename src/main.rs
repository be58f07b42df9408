use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use league_standings::api::{build_router, state::AppState};
use league_standings::config::{AppConfig, API_KEY_ENV};
use league_standings::fetch::GamesApiClient;
use league_standings::ingest::fetch_and_store_games;
use league_standings::models::{default_roster, GroupBy};
use league_standings::season::validate_requested_date;
use league_standings::standings::StandingsService;
use league_standings::storage::{JsonlStore, LeagueStore, StorageConfig};

#[derive(Parser)]
#[command(name = "league-standings")]
#[command(about = "League standings by date with cached snapshots")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error), overrides config
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print standings for a date
    Standings {
        /// Date in YYYY-MM-DD format
        #[arg(long)]
        date: String,

        /// DIVISION or CONFERENCE
        #[arg(long, default_value = "DIVISION")]
        group_by: String,

        /// Print the raw JSON grouping
        #[arg(long)]
        json: bool,
    },

    /// Fetch and store final games for a date range
    Fetch {
        /// Start date (inclusive)
        #[arg(long)]
        from: String,

        /// End date (inclusive)
        #[arg(long)]
        to: String,
    },

    /// Write the default roster if none is stored
    SeedTeams,
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

fn open_store(config: &AppConfig) -> Result<Arc<JsonlStore>> {
    let store = JsonlStore::open(StorageConfig::new(config.data_dir.clone()))
        .with_context(|| format!("Failed to open data directory {:?}", config.data_dir))?;
    store.seed_teams(&default_roster())?;
    Ok(Arc::new(store))
}

fn api_client(config: &AppConfig) -> Result<GamesApiClient> {
    if config.upstream.api_key.is_none() {
        tracing::warn!(
            "No upstream API key configured; set upstream.api_key or {}",
            API_KEY_ENV
        );
    }
    Ok(GamesApiClient::new(config.upstream.fetcher_config()?)?)
}

fn build_service(config: &AppConfig) -> Result<StandingsService> {
    let store = open_store(config)?;
    let client = api_client(config)?;
    Ok(StandingsService::new(
        store.clone(),
        store,
        Arc::new(client),
        config.season,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?
        .with_overrides(cli.data_dir.clone(), cli.log_level.clone())?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting league-standings v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port } => {
            let service = build_service(&config)?;
            let state = AppState::new(Arc::new(service))
                .with_cors_origin(config.server.cors_origin.clone());
            let app = build_router(state);

            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Standings {
            date,
            group_by,
            json,
        } => {
            let date = parse_date(&date)?;
            let group_by: GroupBy = group_by.parse()?;
            let today = chrono::Local::now().date_naive();
            validate_requested_date(date, today, &config.season)?;

            let service = build_service(&config)?;
            let standings = service.get_standings(date, group_by).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&standings)?);
            } else {
                println!("Standings as of {} by {}", date, group_by);
                for (group, entries) in &standings {
                    println!("\n{}", group);
                    println!("{:>4}  {:<28} {:>4} {:>4} {:>6}", "RK", "TEAM", "W", "L", "PCT");
                    for entry in entries {
                        println!(
                            "{:>4}  {:<28} {:>4} {:>4} {:>6}",
                            entry.rank,
                            entry.team_name,
                            entry.wins,
                            entry.losses,
                            entry.win_pct.to_string()
                        );
                    }
                }
            }
        }
        Commands::Fetch { from, to } => {
            let start = parse_date(&from)?;
            let end = parse_date(&to)?;
            anyhow::ensure!(start <= end, "--from must not be after --to");

            let store = open_store(&config)?;
            let client = api_client(&config)?;
            let summary = fetch_and_store_games(&client, &*store, start, end).await?;

            println!("\n=== Fetch Results ===");
            println!("Received:              {}", summary.received);
            println!("Stored:                {}", summary.stored);
            println!("Already stored:        {}", summary.skipped_existing);
            println!("Not final:             {}", summary.skipped_not_final);
            println!("Unknown team:          {}", summary.skipped_unknown_team);
        }
        Commands::SeedTeams => {
            let store = JsonlStore::open(StorageConfig::new(config.data_dir.clone()))?;
            let written = store.seed_teams(&default_roster())?;
            if written == 0 {
                println!("Roster already present in {:?}", config.data_dir);
            } else {
                println!("Seeded {} teams into {:?}", written, config.data_dir);
            }
        }
    }

    Ok(())
}

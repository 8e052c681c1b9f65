use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtside::api::{build_router, state::AppState};
use courtside::calculate::SeriesSummary;
use courtside::commentary::CommentaryGenerator;
use courtside::config::AppConfig;
use courtside::engine::SimulationEngine;
use courtside::models::{MatchResult, PlayerGameStats, TeamGameStats, TeamSide};
use courtside::storage::{load_team, MatchStore, StorageConfig};

#[derive(Parser)]
#[command(name = "courtside")]
#[command(about = "Stochastic basketball match simulator")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./courtside.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
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
    /// Simulate one match between two roster files
    Simulate {
        /// Home roster (JSON)
        #[arg(long)]
        team1: PathBuf,

        /// Away roster (JSON)
        #[arg(long)]
        team2: PathBuf,

        /// Seed for a reproducible match
        #[arg(long)]
        seed: Option<u64>,

        /// Store the result in the match log
        #[arg(long)]
        save: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Ask the configured provider for commentary
        #[arg(long)]
        commentary: bool,
    },

    /// Play the same matchup repeatedly and report the aggregate
    Series {
        #[arg(long)]
        team1: PathBuf,

        #[arg(long)]
        team2: PathBuf,

        /// Number of games (defaults to the config value)
        #[arg(long)]
        games: Option<u32>,

        /// Base seed; game n uses seed + n
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting courtside v{}", env!("CARGO_PKG_VERSION"));

    let store = MatchStore::new(StorageConfig::new(config.data_dir.clone()));

    match cli.command {
        Commands::Simulate {
            team1,
            team2,
            seed,
            save,
            json,
            commentary,
        } => {
            let mut engine = build_engine(&team1, &team2, seed.or(config.simulation.seed))?;

            let result = if commentary {
                let mut commentary_config = config.commentary.clone();
                commentary_config.enabled = true;
                let generator = CommentaryGenerator::from_config(&commentary_config)?;
                generator.check_provider().await;
                engine = engine.with_commentary(generator);
                engine.simulate_match_with_commentary().await
            } else {
                engine.simulate_match()
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result, &engine);
            }

            if save {
                let record = store.save(&result)?;
                println!("\nSaved match {}", record.id);
            }
        }
        Commands::Series {
            team1,
            team2,
            games,
            seed,
        } => {
            let games = games.unwrap_or(config.simulation.series_games);
            anyhow::ensure!(games > 0, "--games must be at least 1");
            let base_seed = seed.or(config.simulation.seed);

            let mut summary = SeriesSummary::default();
            let mut engine = build_engine(&team1, &team2, base_seed)?;
            for game in 0..games {
                if let Some(base) = base_seed {
                    engine = engine.with_seed(base.wrapping_add(game as u64));
                }
                let result = engine.simulate_match();
                tracing::debug!("Game {}: {}", game + 1, result.scoreline());
                summary.record(&result);
            }

            let team1_name = load_team(&team1)?.name;
            let team2_name = load_team(&team2)?.name;

            println!("\n=== Series Results ({} games) ===", summary.games);
            for (side, name) in [(TeamSide::Team1, &team1_name), (TeamSide::Team2, &team2_name)] {
                let wins = match side {
                    TeamSide::Team1 => summary.team1_wins,
                    TeamSide::Team2 => summary.team2_wins,
                };
                println!(
                    "{:<24} {:>4} wins ({:>5.1}%)  {:>6.1} ppg",
                    name,
                    wins,
                    summary.win_rate(side) * 100.0,
                    summary.average_points(side)
                );
            }
            println!("Overtime games:          {}", summary.overtime_games);
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let commentary = CommentaryGenerator::from_config(&config.commentary)?;
            commentary.check_provider().await;
            let state = AppState {
                store: Arc::new(store),
                commentary,
                config: Arc::new(config),
            };

            let app = build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn build_engine(team1: &Path, team2: &Path, seed: Option<u64>) -> Result<SimulationEngine> {
    let team1 = load_team(team1).with_context(|| format!("loading roster {}", team1.display()))?;
    let team2 = load_team(team2).with_context(|| format!("loading roster {}", team2.display()))?;

    let engine = SimulationEngine::new(team1, team2)?;
    Ok(match seed {
        Some(seed) => engine.with_seed(seed),
        None => engine,
    })
}

fn print_result(result: &MatchResult, engine: &SimulationEngine) {
    println!("\n=== Final ===");
    println!("{}", result.scoreline());

    let labels: Vec<String> = result.quarters.iter().map(|q| q.label()).collect();
    println!("\n{:<20} {}", "", labels.iter().map(|l| format!("{:>4}", l)).collect::<String>());
    for side in [TeamSide::Team1, TeamSide::Team2] {
        let line: String = result
            .quarters
            .iter()
            .map(|q| format!("{:>4}", q.score(side)))
            .collect();
        println!("{:<20} {}", result.team(side).name, line);
    }

    println!("\nMVP: {}", result.mvp.stat_line());

    for side in [TeamSide::Team1, TeamSide::Team2] {
        println!("\n--- {} ---", result.team(side).name);
        print_box_score(engine.player_stats(side), &engine.team_stats(side));
    }

    if let Some(highlights) = &result.highlights {
        println!("\n=== Highlights ===");
        for moment in &highlights.moments {
            println!(
                "  Q{} {:>5} [{}] {}",
                moment.quarter, moment.clock, moment.importance, moment.description
            );
        }
        println!("\n{}", highlights.narrative);
        println!("{}", highlights.summary);
    }
}

fn print_box_score(players: &[PlayerGameStats], totals: &TeamGameStats) {
    println!(
        "{:<22} {:>3} {:>4} {:>4} {:>4} {:>4} {:>4} {:>3} {:>7} {:>7} {:>7}",
        "Player", "POS", "PTS", "REB", "AST", "STL", "BLK", "TO", "FG", "3P", "FT"
    );
    for p in players {
        println!(
            "{:<22} {:>3} {:>4} {:>4} {:>4} {:>4} {:>4} {:>3} {:>7} {:>7} {:>7}",
            p.player_name,
            p.position.abbreviation(),
            p.points,
            p.rebounds,
            p.assists,
            p.steals,
            p.blocks,
            p.turnovers,
            format!("{}-{}", p.field_goals_made, p.field_goals_attempted),
            format!("{}-{}", p.three_pointers_made, p.three_pointers_attempted),
            format!("{}-{}", p.free_throws_made, p.free_throws_attempted),
        );
    }
    println!(
        "{:<22} {:>3} {:>4} {:>4} {:>4} {:>4} {:>4} {:>3} {:>6.1}% {:>6.1}% {:>6.1}%",
        "Totals",
        "",
        totals.points,
        totals.rebounds,
        totals.assists,
        totals.steals,
        totals.blocks,
        totals.turnovers,
        totals.field_goal_percentage * 100.0,
        totals.three_point_percentage * 100.0,
        totals.free_throw_percentage * 100.0,
    );
}

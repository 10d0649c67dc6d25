mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::SandboxState;
use config::CliConfig;
use rpsls_core::{Address, GameError, GameId, Move};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rpsls")]
#[command(about = "Commit-reveal Rock-Paper-Scissors-Lizard-Spock against a sandbox ledger")]
#[command(version)]
struct Cli {
    /// Data directory for sessions and the sandbox ledger
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Account to act as
    #[arg(short, long, global = true)]
    account: Option<Address>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commit to a move and open a game
    Create {
        /// Opponent address
        opponent: Address,
        /// Stake in ether
        stake: String,
        /// Move (rock, paper, scissors, spock, lizard); prompted if omitted
        #[arg(short, long = "move")]
        choice: Option<Move>,
    },
    /// Answer a game as player 2
    Play {
        /// Game address
        game: GameId,
        /// Stake in ether, must equal player 1's
        stake: String,
        /// Move; prompted if omitted
        #[arg(short, long = "move")]
        choice: Option<Move>,
    },
    /// Reveal your committed move
    Reveal {
        /// Game address, defaults to the current game
        game: Option<GameId>,
    },
    /// Claim the pot from a stalled opponent
    Timeout {
        /// Game address, defaults to the current game
        game: Option<GameId>,
    },
    /// Show game status
    Status {
        /// Game address, defaults to the current game
        game: Option<GameId>,
    },
    /// List local games
    List,
    /// Show the current game
    Current,
    /// Show sandbox payouts
    Payouts,
    /// Move the sandbox clock forward
    Advance {
        /// Seconds to skip
        seconds: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let defaults = CliConfig::default();
    let config = CliConfig {
        data_dir: cli.data_dir.unwrap_or(defaults.data_dir),
        account: cli.account,
        verbose: cli.verbose,
    };

    // Initialize logging
    let log_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "rpsls={},rpsls_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("creating {}", config.data_dir.display()))?;

    let sandbox_path = config.sandbox_path();
    let mut sandbox = SandboxState::load(&sandbox_path)
        .with_context(|| format!("loading {}", sandbox_path.display()))?;

    let result = run(cli.command, &config, &mut sandbox).await;

    // Ledger effects are kept even when a later local step failed.
    sandbox
        .save(&sandbox_path)
        .with_context(|| format!("saving {}", sandbox_path.display()))?;

    if let Err(e) = result {
        match e {
            GameError::TimeoutNotElapsed { remaining_secs } => {
                eprintln!("Error: Timeout not reached yet");
                eprintln!("Try again in {}s, or use 'rpsls advance'", remaining_secs);
            }
            GameError::StakeMismatch { expected, offered } => {
                eprintln!("Error: Stake mismatch");
                eprintln!("Game requires: {}, offered: {}", expected, offered);
            }
            GameError::MissingSecret(game) => {
                eprintln!("Error: No local secret for game {}", game);
                eprintln!("Only the data directory that created the game can reveal it");
            }
            GameError::LedgerRejected(reason) => {
                eprintln!("Error: Ledger rejected the transaction: {}", reason);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    command: Commands,
    config: &CliConfig,
    sandbox: &mut SandboxState,
) -> rpsls_core::Result<()> {
    match command {
        Commands::Payouts => return commands::show_payouts(sandbox),
        Commands::Advance { seconds } => return commands::advance_clock(sandbox, seconds),
        _ => {}
    }

    let client = commands::open_client(config, sandbox)?;
    let result = match command {
        Commands::Create {
            opponent,
            stake,
            choice,
        } => commands::create_game(&client, opponent, &stake, choice).await,
        Commands::Play {
            game,
            stake,
            choice,
        } => commands::play_game(&client, &game, &stake, choice).await,
        Commands::Reveal { game } => commands::reveal_move(&client, game).await,
        Commands::Timeout { game } => commands::claim_timeout(&client, game).await,
        Commands::Status { game } => commands::show_status(&client, game).await,
        Commands::List => commands::list_games(&client),
        Commands::Current => commands::show_current(&client),
        Commands::Payouts | Commands::Advance { .. } => Ok(()),
    };

    sandbox.book = client.ledger().book();
    result
}

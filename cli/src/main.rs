//! CLI entrypoint for plenum
//!
//! This is the main binary that wires together all layers using
//! dependency injection: config loading, gateway construction, the
//! Ctrl-C cancel signal, and a console subscriber for the event stream.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plenum_application::{
    DeliberateInput, DeliberateUseCase, EngineConfig, EventSink, ModelGateway, NullSink,
};
use plenum_domain::election::schulze::rank_by_victories;
use plenum_domain::{DeliberationEvent, VotingStrategy};
use plenum_infrastructure::{ConfigLoader, HttpModelGateway};

#[derive(Parser)]
#[command(
    name = "plenum",
    about = "Synthesize one consensus statement from a group of opinions",
    version
)]
struct Cli {
    /// The question the group deliberates on
    question: String,

    /// File with one opinion per line (blank lines ignored), or '-' for stdin
    #[arg(short, long)]
    opinions: PathBuf,

    /// Force the hierarchical procedure even when one group would do
    #[arg(long)]
    recursive: bool,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip config files, use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Gateway endpoint override (both generation and ranking)
    #[arg(long)]
    endpoint: Option<String>,

    /// Model identifier override (both generation and ranking)
    #[arg(long)]
    model: Option<String>,

    /// Candidates per group election
    #[arg(long)]
    candidates: Option<usize>,

    /// Partitioner cap on group size
    #[arg(long)]
    max_group_size: Option<usize>,

    /// Voting strategy: own_group_only or all_participants
    #[arg(long)]
    strategy: Option<String>,

    /// Session seed for reproducible shuffles and fallbacks
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output, print only the winner
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_opinions(path: &PathBuf) -> Result<Vec<String>> {
    let text = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading opinions from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading opinions from {}", path.display()))?
    };
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Apply CLI overrides on top of the loaded configuration
fn apply_overrides(config: &mut EngineConfig, cli: &Cli) -> Result<()> {
    if let Some(endpoint) = &cli.endpoint {
        config.generation.endpoint = endpoint.clone();
        config.ranking.endpoint = endpoint.clone();
    }
    if let Some(model) = &cli.model {
        config.generation.model = model.clone();
        config.ranking.model = model.clone();
    }
    if let Some(candidates) = cli.candidates {
        config.num_candidates = candidates;
    }
    if let Some(max_group_size) = cli.max_group_size {
        if max_group_size < 2 {
            bail!("--max-group-size must be at least 2");
        }
        config.max_group_size = max_group_size;
    }
    if let Some(strategy) = &cli.strategy {
        config.voting_strategy = strategy
            .parse::<VotingStrategy>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(())
}

/// Console subscriber for the event stream: one compact line per
/// milestone, chunks skipped.
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: &DeliberationEvent) {
        match event {
            DeliberationEvent::LevelStart {
                level,
                items,
                groups,
            } => eprintln!("level {level}: {items} items in {groups} group(s)"),
            DeliberationEvent::GroupStart {
                level,
                group,
                members,
                voters,
            } => eprintln!("  [{level}.{group}] election: {members} member(s), {voters} voter(s)"),
            DeliberationEvent::CandidateDone {
                level,
                group,
                candidate,
                ..
            } => eprintln!("  [{level}.{group}] candidate {candidate} ready"),
            DeliberationEvent::OracleFallback {
                level,
                group,
                voter,
            } => eprintln!("  [{level}.{group}] voter {voter}: fallback ballot"),
            DeliberationEvent::ElectionDone {
                level,
                group,
                winner,
                strongest,
                ..
            } => {
                let order = rank_by_victories(strongest);
                eprintln!(
                    "  [{level}.{group}] winner: candidate {winner} (full order: {order:?})"
                );
            }
            DeliberationEvent::LevelDone { level, winners } => {
                eprintln!("level {level} done: {winners} winner(s)");
            }
            DeliberationEvent::Cancelled => eprintln!("cancelled"),
            DeliberationEvent::Failed { error } => eprintln!("failed: {error}"),
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config file: {e}");
            ConfigLoader::load_defaults()
        })
    };
    let mut config = file_config.into_engine_config();
    apply_overrides(&mut config, &cli)?;

    let opinions = read_opinions(&cli.opinions)?;
    info!(opinions = opinions.len(), "starting deliberation");

    // One gateway per distinct endpoint
    let generation: Arc<dyn ModelGateway> =
        Arc::new(HttpModelGateway::new(&config.generation.endpoint));
    let ranking: Arc<dyn ModelGateway> = if config.ranking.endpoint == config.generation.endpoint {
        Arc::clone(&generation)
    } else {
        Arc::new(HttpModelGateway::new(&config.ranking.endpoint))
    };

    // Ctrl-C trips the session cancel signal
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, finishing in-flight chunks...");
            shutdown.cancel();
        }
    });

    let run_recursive = cli.recursive || opinions.len() > config.max_group_size;
    let use_case = DeliberateUseCase::with_gateways(generation, ranking, config);
    let input = DeliberateInput::new(cli.question, opinions);

    let console = ConsoleSink;
    let null = NullSink;
    let sink: &dyn EventSink = if cli.quiet { &null } else { &console };

    let result = if run_recursive {
        use_case.recursive(input, sink, cancel).await
    } else {
        use_case.single_run(input, sink, cancel).await
    };

    match result {
        Ok(outcome) => match outcome.winner {
            Some(winner) => {
                if outcome.degraded {
                    eprintln!(
                        "Note: some ballots fell back to random permutations; \
                         the result is degraded."
                    );
                }
                println!("{winner}");
                Ok(())
            }
            None => {
                eprintln!("Session {} cancelled.", outcome.session_id);
                Ok(())
            }
        },
        Err(e) if e.is_cancelled() => {
            eprintln!("Operation cancelled.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

//! DirectorOS Smoke - Main Entry Point
//!
//! Runs the smoke and end-to-end suites against a deployed Actions API and
//! exits non-zero on the first failure.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use directoros_contract::{AlbumInfo, Engine};
use directoros_smoke::config::{BASE_URL_VAR, BEARER_VAR};
use directoros_smoke::output::{self, OutputFormat};
use directoros_smoke::{HarnessOptions, HarnessRunner, ScenarioConfig, Suite};

/// Contract harness for the DirectorOS Actions API
#[derive(Parser)]
#[command(name = "directoros-smoke")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API base URL
    #[arg(long, env = BASE_URL_VAR, global = true)]
    base_url: Option<String>,

    /// Bearer credential for protected endpoints
    #[arg(long, env = BEARER_VAR, hide_env_values = true, global = true)]
    bearer: Option<String>,

    /// Output format
    #[arg(long, default_value = "plain", global = true)]
    format: OutputFormat,

    /// Write the run report as JSON to this path
    #[arg(long, global = true)]
    results: Option<PathBuf>,

    /// Privacy page alias to probe (repeatable; replaces the defaults)
    #[arg(long = "privacy-path", global = true)]
    privacy_paths: Vec<String>,

    /// Health probe alias (repeatable; replaces the defaults)
    #[arg(long = "health-path", global = true)]
    health_paths: Vec<String>,

    #[command(flatten)]
    scenario: ScenarioArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Public probes, OpenAPI contract and auth guard
    Smoke,

    /// Full derive -> compose -> expand -> QA chain
    E2e,

    /// Smoke followed by e2e
    All,
}

/// Scenario overrides; anything left unset keeps the built-in scenario
#[derive(Args)]
struct ScenarioArgs {
    /// Album title sent to derive-concepts
    #[arg(long, global = true)]
    title: Option<String>,

    /// Album style sent to derive-concepts
    #[arg(long, global = true)]
    style: Option<String>,

    /// Album lyrics sent to derive-concepts
    #[arg(long, global = true)]
    lyrics: Option<String>,

    /// Concept variants to request (1-6)
    #[arg(long, global = true)]
    variants: Option<u32>,

    /// Stills to compose (1-6)
    #[arg(long, global = true)]
    stills: Option<u32>,

    /// Scene brief sent to expand-scene
    #[arg(long, global = true)]
    brief: Option<String>,

    /// Scene duration in seconds
    #[arg(long, global = true)]
    duration_sec: Option<f64>,

    /// Timeline beats (1-12)
    #[arg(long, global = true)]
    beats: Option<u32>,

    /// Engine for qa-validate (SORA, VEO)
    #[arg(long, global = true)]
    engine: Option<Engine>,
}

impl From<ScenarioArgs> for ScenarioConfig {
    fn from(args: ScenarioArgs) -> Self {
        let defaults = ScenarioConfig::default();
        Self {
            album: AlbumInfo {
                title: args.title.unwrap_or(defaults.album.title),
                style: args.style.unwrap_or(defaults.album.style),
                lyrics: args.lyrics.unwrap_or(defaults.album.lyrics),
            },
            variants: args.variants.or(defaults.variants),
            stills_count: args.stills.unwrap_or(defaults.stills_count),
            brief: args.brief.unwrap_or(defaults.brief),
            duration_sec: args.duration_sec.unwrap_or(defaults.duration_sec),
            beats: args.beats.unwrap_or(defaults.beats),
            engine: args.engine.unwrap_or(defaults.engine),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = run(cli).await;
    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let suite = match cli.command {
        Commands::Smoke => Suite::Smoke,
        Commands::E2e => Suite::E2e,
        Commands::All => Suite::All,
    };

    let defaults = HarnessOptions::default();
    let options = HarnessOptions {
        privacy_paths: if cli.privacy_paths.is_empty() {
            defaults.privacy_paths
        } else {
            cli.privacy_paths
        },
        health_paths: if cli.health_paths.is_empty() {
            defaults.health_paths
        } else {
            cli.health_paths
        },
        scenario: cli.scenario.into(),
    };

    let base_url = cli.base_url;
    let bearer = cli.bearer;
    let outcome = HarnessRunner::new(suite, options)
        .run(|name| match name {
            BASE_URL_VAR => base_url.clone(),
            BEARER_VAR => bearer.clone(),
            _ => std::env::var(name).ok(),
        })
        .await;

    output::conclude(&outcome, cli.results.as_deref(), cli.format)
}

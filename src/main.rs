//! linear-sync - Bidirectional GitHub <-> Linear issue sync
//!
//! Main entry point for the linear-sync CLI.

use clap::{Parser, Subcommand};
use linear_sync::config::{self, Credentials, SyncConfig};
use linear_sync::events::{LinearWebhook, TicketEvent};
use linear_sync::integrations::{GitHubAdapter, LinearAdapter};
use linear_sync::server::{WebhookServer, DEFAULT_MAX_BODY_SIZE};
use linear_sync::sync::{SyncEngine, SyncReport};
use linear_sync::SyncError;
use std::io::Read;
use std::path::PathBuf;
use std::process;

/// linear-sync - Keep GitHub issues and Linear issues in sync
#[derive(Parser, Debug)]
#[command(name = "linear-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/linear-sync/config.yaml)
    #[arg(short, long, env = "LINEAR_SYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync one GitHub issue/PR event to Linear (GitHub Actions step)
    GithubEvent {
        /// Event JSON written by GitHub Actions
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event_path: PathBuf,

        /// Account that triggered the event (defaults to the payload's sender)
        #[arg(long, env = "GITHUB_ACTOR")]
        actor: Option<String>,
    },

    /// Receive Linear webhooks and sync them to GitHub
    Serve {
        /// Address to listen on
        #[arg(long, env = "LINEAR_SYNC_ADDR", default_value = "127.0.0.1:8080")]
        addr: String,

        /// Maximum webhook body size in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_BODY_SIZE)]
        max_body_size: usize,
    },

    /// Sync one Linear webhook payload to GitHub (replay/debugging)
    LinearEvent {
        /// Payload file, or `-` for stdin
        #[arg(long)]
        payload: String,
    },

    /// Load and validate the configuration
    CheckConfig,
}

fn main() {
    // Initialize logging
    if let Err(e) = linear_sync::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> linear_sync::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    if let Commands::CheckConfig = cli.command {
        return handle_check_config(&config);
    }

    config::validate_config_result(&config)?;
    for warning in config::config_warnings(&config) {
        tracing::warn!("{}", warning);
    }
    let engine = build_engine(&config)?;
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::GithubEvent { event_path, actor } => {
            let event = TicketEvent::from_path(&event_path, actor)?;
            let report = runtime.block_on(engine.handle_ticket_event(&event))?;
            print_report(&report)
        }
        Commands::LinearEvent { payload } => {
            let webhook: LinearWebhook = serde_json::from_str(&read_payload(&payload)?)?;
            let report = runtime.block_on(engine.handle_tracker_event(&webhook))?;
            print_report(&report)
        }
        Commands::Serve {
            addr,
            max_body_size,
        } => {
            let server = WebhookServer::new(engine).with_max_body_size(max_body_size);
            runtime
                .block_on(server.run(&addr))
                .map_err(|e| SyncError::Other(e.to_string()))
        }
        Commands::CheckConfig => Ok(()),
    }
}

/// Load the configuration file and apply environment overrides.
///
/// A missing default file is not an error; an explicit path must exist.
fn load_config(path: Option<&PathBuf>) -> linear_sync::Result<SyncConfig> {
    let mut config = match path {
        Some(path) => SyncConfig::load(path)?,
        None => match SyncConfig::load_default() {
            Ok(config) => config,
            Err(SyncError::Config(msg)) if msg.contains("Config file not found") => {
                tracing::info!("No configuration file found, using defaults");
                SyncConfig::new()
            }
            Err(e) => return Err(e),
        },
    };
    config.apply_env_overrides();
    Ok(config)
}

fn build_engine(config: &SyncConfig) -> linear_sync::Result<SyncEngine<GitHubAdapter, LinearAdapter>> {
    let credentials = Credentials::from_env(config)?;

    let github = GitHubAdapter::new(&config.github)?.with_token(credentials.github_token);
    let linear = LinearAdapter::new(&config.linear)?.with_api_key(credentials.linear_api_key);

    Ok(SyncEngine::new(
        github,
        linear,
        config.identity_map()?,
        config.engine_settings(),
    )
    .with_maintainers(config.maintainer_identities()?))
}

fn read_payload(source: &str) -> linear_sync::Result<String> {
    if source == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    Ok(std::fs::read_to_string(source)?)
}

fn print_report(report: &SyncReport) -> linear_sync::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn handle_check_config(config: &SyncConfig) -> linear_sync::Result<()> {
    match config::validate_config(config) {
        Ok(()) => {
            println!("Configuration OK");
            println!("  GitHub:      {}", config.github.url);
            println!("  Linear:      {}", config.linear.api_url);
            println!(
                "  Team:        {}",
                config.linear.team_id.as_deref().unwrap_or("(not set)")
            );
            println!("  Users:       {}", config.users.len());
            println!("  Maintainers: {}", config.maintainers.len());

            for warning in config::config_warnings(config) {
                println!("  Warning: {}", warning);
            }

            if let Err(e) = Credentials::from_env(config) {
                println!("  Warning: {}", e);
            }
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("  - {}", error);
            }
            Err(SyncError::Config(format!(
                "{} configuration problem(s) found",
                errors.len()
            )))
        }
    }
}

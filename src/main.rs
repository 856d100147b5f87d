//! Shellcache CLI entry point

use clap::Parser;
use console::style;
use shellcache::cli::commands::{self, Overrides};
use shellcache::cli::args::{ConfigAction, ConfigArgs};
use shellcache::cli::{Cli, Commands};
use shellcache::config::{Config, ConfigManager};
use shellcache::error::ShellcacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ShellcacheResult<()> {
    let cli = Cli::parse();

    let manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    // A broken config file must not prevent `config init --force` or `config path`
    let config = if skips_config_load(&cli.command) {
        Config::default()
    } else {
        manager.load().await?
    };

    init_tracing(cli.verbose, &config.general.log_format);
    debug!("Using config {}", manager.path().display());

    let overrides = Overrides {
        origin: cli.origin,
        deployment: cli.deployment,
    };

    match cli.command {
        Commands::Install => commands::install(&config, &overrides).await,
        Commands::Activate => commands::activate(&config, &overrides).await,
        Commands::Deploy => commands::deploy(&config, &overrides).await,
        Commands::Fetch(args) => commands::fetch(args, &config, &overrides).await,
        Commands::Message(args) => commands::message(args, &config, &overrides).await,
        Commands::Status(args) => commands::status(args, &config, &overrides).await,
        Commands::Config(args) => commands::config(args, &manager, &config).await,
    }
}

fn skips_config_load(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Config(ConfigArgs {
            action: Some(ConfigAction::Init { .. } | ConfigAction::Path)
        })
    )
}

/// 0 = warn, 1 = info, 2+ = debug. Logs go to stderr so fetched bodies
/// can be piped from stdout.
fn init_tracing(verbose: u8, log_format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("shellcache=warn"),
        1 => EnvFilter::new("shellcache=info"),
        _ => EnvFilter::new("shellcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

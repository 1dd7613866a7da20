mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rotate-join-token",
    about = "Create a fresh cluster join token on the control plane and publish it to Parameter Store",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: built-in settings)
    #[arg(long, global = true, env = "ROTATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rotate the join token once (the scheduled entry point; default)
    Run,

    /// Show which control-plane instance a rotation would target
    Locate,

    /// Validate the config for common mistakes
    Validate,
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the trigger response.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = cmd::load_config(cli.config.as_deref()).and_then(|config| {
        match cli.command.unwrap_or(Commands::Run) {
            Commands::Run => cmd::run::run(&config),
            Commands::Locate => cmd::locate::run(&config, cli.json),
            Commands::Validate => cmd::validate::run(&config, cli.json),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

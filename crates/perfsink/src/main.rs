//! `perfsink` - CLI for the performance run sink
//!
//! Runs the HTTP ingest server, stores a single payload from standard input,
//! or inspects configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;

use perfsink::cli::{Cli, Command, ConfigCommand};
use perfsink::{init_logging, Config, IngestOutcome, RunStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match &cli.command {
        Command::Config(config_cmd) => handle_config(cli.config.clone(), config_cmd),
        Command::Serve(_) => {
            let config = load_config(&cli)?;
            handle_serve(&config)
        }
        Command::Ingest(_) => {
            let config = load_config(&cli)?;
            handle_ingest(&config)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load_from(cli.config.clone())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn handle_serve(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(perfsink::server::serve(config))?;
    Ok(())
}

fn handle_ingest(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = RunStore::open(&config.storage)?;

    // Nothing goes to stdout either way; the outcome is only logged
    if let IngestOutcome::Dropped(reason) = store.ingest_reader(std::io::stdin().lock())? {
        tracing::debug!("Payload from stdin dropped ({reason})");
    }
    Ok(())
}

fn handle_config(
    config_path: Option<std::path::PathBuf>,
    cmd: &ConfigCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind);
                println!("  Max body (bytes):   {}", config.server.max_body_bytes);
                println!();
                println!("[Storage]");
                println!("  Run directory:      {}", config.run_dir().display());
                println!(
                    "  File name pattern:  {}<unix-seconds>{}",
                    config.storage.file_prefix, config.storage.file_extension
                );
                println!("  Create directory:   {}", config.storage.create_dir);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .clone()
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

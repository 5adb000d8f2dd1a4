//! covloop CLI entry point.

use clap::Parser;

use covloop::cli::{handle_error, Cli, Commands};
use covloop::infrastructure::config::ConfigLoader;
use covloop::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    // Held until exit so buffered file logs are flushed.
    let _logger = match LogConfig::from_settings(&config.logging).and_then(|c| LoggerImpl::init(&c)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => covloop::cli::commands::run::execute(args, &config, cli.json).await,
        Commands::Batch(args) => {
            covloop::cli::commands::batch::execute(args, &config, cli.json).await
        }
        Commands::Show(args) => covloop::cli::commands::show::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}

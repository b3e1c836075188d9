use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use twitch_recorder::configuration::{Args, Config};
use twitch_recorder::controller::controller_handler::TwitchController;
use twitch_recorder::controller::shutdown::forward_shutdown_signals;
use twitch_recorder::logging;

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit with status 2 from clap.
    let args = Args::parse();

    let username = args.normalized_username();
    if username.is_empty() {
        eprintln!("No username given");
        return ExitCode::FAILURE;
    }

    let config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Unable to import configuration from {}: {}",
                args.config.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    let level = match args.log_level_filter() {
        Ok(level) => level.unwrap_or_else(|| config.log_level_filter()),
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    match logging::init(&config.logging_dir, &username, level) {
        Ok(path) => info!("Logging to {}", path.display()),
        Err(e) => {
            eprintln!("Unable to set up logging: {}", e);
            return ExitCode::FAILURE;
        }
    }
    info!("Configuration imported from {}", args.config.display());

    if let Err(e) = config.check_executables() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let mut controller = match TwitchController::from_config(&config, &username) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create the controller: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown_rx = forward_shutdown_signals();

    match controller.run(shutdown_rx).await {
        Ok(()) => {
            info!("Stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error occurred in the controller: {}, exiting...", e);
            ExitCode::FAILURE
        }
    }
}

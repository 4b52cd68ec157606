use camsnap::configuration::config::{CliArgs, Config};
use camsnap::controller::controller_handler::Controller;
use clap::Parser;
use log::{error, info, warn};
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // https://docs.rs/env_logger/latest/env_logger/
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    info!("camsnap v{}", env!("CARGO_PKG_VERSION"));

    let args = CliArgs::parse();

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration imported successfully");

    let controller = match Controller::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, finishing in-flight rounds");
                let _ = shutdown_tx.send(true);
            }
            // Dropping the sender leaves the scheduler running.
            Err(e) => warn!("Unable to listen for interrupt: {}", e),
        }
    });

    let rounds = controller.run(shutdown_rx).await;
    info!("Stopped after {} rounds", rounds);
}

#![allow(non_snake_case)]

mod cli;

use std::env;
use std::process::ExitCode;

use chrono::Utc;
use syncZone::config::{AppConfig, SchedulerConfig};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(%path, error = %err, "Could not read config file, using environment only");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
    .with_env();

    let config = match SchedulerConfig::from_app_config(&app_config) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match cli::cli(config, Utc::now().date_naive()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

mod commands;
mod config;

use std::sync::Arc;

use anyhow::Context;
use jobboard_engine::{FileKeyValueStore, KeyValueStore};
use jobboard_logging::board_info;

use crate::commands::{parse_args, Command};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = parse_args(std::env::args().skip(1))?;
    if command == Command::Help {
        println!("{}", commands::USAGE);
        return Ok(());
    }

    let config = AppConfig::load().context("loading configuration")?;
    jobboard_logging::initialize(config.log_destination, config.log_level(), None);
    board_info!("Using data directory {:?}", config.data_dir);

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(config.data_dir.clone()));
    commands::run(command, &config, storage).await
}

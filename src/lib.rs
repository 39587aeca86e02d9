pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use crate::core::config::AppConfig;
use crate::core::{Direction, Domain};
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Prices {
        domains: Vec<Domain>,
    },
    Watch,
    Calc {
        domain: Domain,
        direction: Direction,
        items: Vec<String>,
    },
    Serve {
        port: Option<u16>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("altinkur starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Prices { domains } => cli::prices::run(&config, &domains).await,
        AppCommand::Watch => cli::prices::watch(&config).await,
        AppCommand::Calc {
            domain,
            direction,
            items,
        } => cli::calc::run(&config, domain, direction, &items).await,
        AppCommand::Serve { port } => {
            let port = port.unwrap_or_else(|| {
                config
                    .server
                    .effective_port(std::env::var("PORT").ok().as_deref())
            });
            server::serve(&config, port).await
        }
    }
}

use altinkur::core::log::init_logging;
use altinkur::core::{Direction, Domain};
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for altinkur::AppCommand {
    fn from(cmd: Commands) -> altinkur::AppCommand {
        match cmd {
            Commands::Prices { domain } => altinkur::AppCommand::Prices {
                domains: domain.map_or_else(|| vec![Domain::Gold, Domain::Currency], |d| vec![d]),
            },
            Commands::Watch => altinkur::AppCommand::Watch,
            Commands::Calc {
                domain,
                direction,
                items,
            } => altinkur::AppCommand::Calc {
                domain,
                direction,
                items,
            },
            Commands::Serve { port } => altinkur::AppCommand::Serve { port },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show current gold and currency quotes
    Prices {
        /// Only show one domain (gold or currency)
        #[arg(short, long)]
        domain: Option<Domain>,
    },
    /// Keep quotes on screen, refreshing on the configured interval
    Watch,
    /// Calculate the cost or value of a set of instruments
    Calc {
        /// Market the instruments belong to (gold or currency)
        #[arg(short, long, default_value = "gold")]
        domain: Domain,
        /// Trade direction from your side (buy or sell)
        #[arg(short = 'D', long, default_value = "buy")]
        direction: Direction,
        /// Items as CODE=QUANTITY or "LABEL=QUANTITY", e.g. GA=2 C=1 "Reşat=1"
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Run the proxy server and host the web frontend
    Serve {
        /// Port to listen on, overrides PORT and the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let serving = matches!(cli.command, Some(Commands::Serve { .. }));
    init_logging(cli.verbose, serving);

    let result = match cli.command {
        Some(Commands::Setup) => altinkur::cli::setup::setup(),
        Some(cmd) => altinkur::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

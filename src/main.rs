use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use finctx::core::log::init_logging;
use std::path::Path;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Aggregate and display the financial context of one or more links
    Context {
        /// Provider link identifiers
        #[arg(required = true)]
        link_ids: Vec<String>,

        /// Print the aggregated views as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => {
            finctx::cli::setup::write_example_config(cli.config_path.as_deref().map(Path::new))
                .map(|path| println!("Example configuration written to {}", path.display()))
        }
        Some(Commands::Context { link_ids, json }) => {
            finctx::run_command(
                finctx::AppCommand::Context { link_ids, json },
                cli.config_path.as_deref(),
            )
            .await
        }
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

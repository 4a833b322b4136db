use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use car_catalog::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    // Log settings come from the config file when it loads; commands report config errors themselves
    let (level, format) = match config::load_config(&args.config) {
        Ok(cfg) => (cfg.server.log_level, cfg.server.log_format),
        Err(_) => ("info".to_string(), "text".to_string()),
    };
    init_tracing(&level, &format);

    // Dispatch to appropriate command handler
    match args.get_command() {
        cli::Commands::Start => {
            commands::start::execute(&args.config).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config)?;
        }
        cli::Commands::Quote {
            price,
            state,
            fuel,
            no_hypothecation,
            no_fastag,
            json,
        } => {
            commands::quote::execute(
                &args.config,
                commands::quote::QuoteArgs {
                    price,
                    state,
                    fuel,
                    hypothecation: !no_hypothecation,
                    fastag: !no_fastag,
                    json,
                },
            )?;
        }
        cli::Commands::Import { file } => {
            commands::import::execute(&args.config, &file).await?;
        }
        cli::Commands::Version => {
            println!("Car Catalog v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "car-catalog", version, about = "Car catalog and on-road price service")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the catalog server (default)
    Start,

    /// Test configuration file validity
    Test,

    /// Print an on-road price breakup
    Quote {
        /// Ex-showroom price in rupees
        price: f64,

        /// Registration state or "City, State"
        #[arg(short, long)]
        state: Option<String>,

        /// Petrol, Diesel, CNG or Electric
        #[arg(short, long, default_value = "Petrol")]
        fuel: String,

        /// Leave out the hypothecation fee
        #[arg(long)]
        no_hypothecation: bool,

        /// Leave out the FASTag fee
        #[arg(long)]
        no_fastag: bool,

        /// Print the breakup as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import a JSON catalog file ({brands, models, variants})
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_start() {
        let cli = Cli {
            config: PathBuf::from("config.toml"),
            command: None,
        };

        assert!(matches!(cli.get_command(), Commands::Start));
    }

    #[test]
    fn test_cli_parsing_quote() {
        let args = vec![
            "car-catalog",
            "quote",
            "1200000",
            "--state",
            "Pune, Maharashtra",
            "--fuel",
            "Diesel",
            "--no-fastag",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Quote {
                price,
                state,
                fuel,
                no_hypothecation,
                no_fastag,
                json,
            } => {
                assert_eq!(price, 1_200_000.0);
                assert_eq!(state.as_deref(), Some("Pune, Maharashtra"));
                assert_eq!(fuel, "Diesel");
                assert!(!no_hypothecation);
                assert!(no_fastag);
                assert!(!json);
            }
            _ => panic!("Expected Quote command"),
        }
    }

    #[test]
    fn test_cli_parsing_import_with_global_config() {
        let args = vec!["car-catalog", "import", "catalog.json", "--config", "prod.toml"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.config, PathBuf::from("prod.toml"));
        match cli.get_command() {
            Commands::Import { file } => assert_eq!(file, PathBuf::from("catalog.json")),
            _ => panic!("Expected Import command"),
        }
    }
}

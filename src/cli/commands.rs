//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "litcode")]
#[command(about = "LitCode: pandas and data science code answers grounded in the Python Data Science Handbook")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a question with a code example
    Ask {
        /// The question, e.g. "How do I filter a DataFrame?"
        question: String,
        /// Also print the retrieved book context
        #[arg(long)]
        show_context: bool,
    },
    /// Show the book section retrieved for a question
    Retrieve {
        /// The question to retrieve context for
        question: String,
        /// Maximum context length in characters
        #[arg(short, long)]
        max_chars: Option<usize>,
    },
    /// Answer a random practice question
    Random {
        /// Seed for reproducible question selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Ask questions one per line until 'exit'
    Interactive,
    /// Load the generation backend and report which model answered
    Backend,
    /// Show current configuration
    Config,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_global_flags() {
        let cli = Cli::parse_from([
            "litcode",
            "ask",
            "How do I use groupby?",
            "--show-context",
            "--verbose",
            "--config",
            "custom.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Ask {
                question,
                show_context,
            } => {
                assert_eq!(question, "How do I use groupby?");
                assert!(show_context);
            }
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn test_parse_retrieve_max_chars() {
        let cli = Cli::parse_from(["litcode", "retrieve", "plot", "-m", "80"]);
        assert!(matches!(
            cli.command,
            Commands::Retrieve {
                max_chars: Some(80),
                ..
            }
        ));
    }
}

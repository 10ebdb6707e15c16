use clap::Parser;
use litcode::cli::handle_ask;
use litcode::cli::handle_backend;
use litcode::cli::handle_config;
use litcode::cli::handle_interactive;
use litcode::cli::handle_random;
use litcode::cli::handle_retrieve;
use litcode::cli::Cli;
use litcode::cli::Commands;
use litcode::config::AppConfig;
use litcode::CodeAssistant;
use litcode::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load_or_default()?,
    };

    // Initialize logging
    litcode::logging::apply_backtrace_setting(&config.logging);
    if cli.verbose {
        litcode::logging::init_logging_with_level("debug")?;
    } else {
        litcode::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Ask {
            question,
            show_context,
        } => {
            let assistant = CodeAssistant::new(config);
            handle_ask(&assistant, question, show_context).await?;
        }
        Commands::Retrieve {
            question,
            max_chars,
        } => {
            let assistant = CodeAssistant::new(config);
            handle_retrieve(&assistant, question, max_chars).await?;
        }
        Commands::Random { seed } => {
            let assistant = CodeAssistant::new(config);
            handle_random(&assistant, seed).await?;
        }
        Commands::Interactive => {
            let assistant = CodeAssistant::new(config);
            handle_interactive(&assistant).await?;
        }
        Commands::Backend => {
            handle_backend(&config).await?;
        }
        Commands::Config => {
            handle_config(&config, cli.verbose).await?;
        }
    }

    Ok(())
}

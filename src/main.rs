use clap::{Parser, Subcommand};
use dbchat::Result;
use dbchat::commands::{refresh_index, run_chat, run_verify, show_status};
use dbchat::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "dbchat")]
#[command(about = "Conversational question answering over a MySQL database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure MySQL, Gemini, and Ollama settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start an interactive chat over the indexed data
    Chat,
    /// Re-fetch all tables from MySQL and rebuild the vector index
    Refresh,
    /// Show configuration and index state
    Status,
    /// Check connectivity to MySQL, Gemini, Ollama, and the vector store
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Chat => {
            run_chat().await?;
        }
        Commands::Refresh => {
            refresh_index().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
        Commands::Verify => {
            if !run_verify().await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["dbchat", "chat"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Chat);
        }
    }

    #[test]
    fn refresh_command() {
        let cli = Cli::try_parse_from(["dbchat", "refresh"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Refresh);
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["dbchat", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["dbchat", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["dbchat", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, get_config_dir};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("dbchat configuration setup").bold().cyan());
    eprintln!();

    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    let mut config = Config::load(&config_dir).context("Failed to load existing configuration")?;

    eprintln!("{}", style("MySQL Connection").bold().yellow());
    configure_database(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Gemini API").bold().yellow());
    configure_gemini(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Ollama Embeddings").bold().yellow());
    configure_ollama(&mut config)?;

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

fn configure_database(config: &mut Config) -> Result<()> {
    config.database.host = Input::new()
        .with_prompt("MySQL host")
        .default(config.database.host.clone())
        .interact_text()?;

    config.database.port = Input::new()
        .with_prompt("MySQL port")
        .default(config.database.port)
        .interact_text()?;

    config.database.user = Input::new()
        .with_prompt("MySQL user")
        .default(config.database.user.clone())
        .interact_text()?;

    config.database.password = Input::new()
        .with_prompt("MySQL password")
        .allow_empty(true)
        .default(config.database.password.clone())
        .interact_text()?;

    config.database.database = Input::new()
        .with_prompt("Database name")
        .default(config.database.database.clone())
        .interact_text()?;

    Ok(())
}

fn configure_gemini(config: &mut Config) -> Result<()> {
    eprintln!("Leave the API key empty to use the GEMINI_API_KEY environment variable.");

    let api_key: String = Input::new()
        .with_prompt("Gemini API key")
        .allow_empty(true)
        .default(config.gemini.api_key.clone().unwrap_or_default())
        .interact_text()?;

    config.gemini.api_key = if api_key.trim().is_empty() {
        None
    } else {
        Some(api_key)
    };

    Ok(())
}

fn configure_ollama(config: &mut Config) -> Result<()> {
    config.ollama.host = Input::new()
        .with_prompt("Ollama host")
        .default(config.ollama.host.clone())
        .interact_text()?;

    config.ollama.port = Input::new()
        .with_prompt("Ollama port")
        .default(config.ollama.port)
        .interact_text()?;

    config.ollama.model = Input::new()
        .with_prompt("Embedding model")
        .default(config.ollama.model.clone())
        .interact_text()?;

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("MySQL:").bold().yellow());
    eprintln!("  Host: {}", style(&config.database.host).cyan());
    eprintln!("  Port: {}", style(config.database.port).cyan());
    eprintln!("  User: {}", style(&config.database.user).cyan());
    eprintln!("  Database: {}", style(&config.database.database).cyan());

    eprintln!();
    eprintln!("{}", style("Gemini:").bold().yellow());
    eprintln!("  Endpoint: {}", style(&config.gemini.endpoint).cyan());
    let key_source = if config.gemini.api_key.is_some() {
        "config file"
    } else if config.gemini.resolve_api_key().is_some() {
        "environment"
    } else {
        "not set"
    };
    eprintln!("  API key: {}", style(key_source).cyan());

    eprintln!();
    eprintln!("{}", style("Ollama:").bold().yellow());
    eprintln!("  Host: {}", style(&config.ollama.host).cyan());
    eprintln!("  Port: {}", style(config.ollama.port).cyan());
    eprintln!("  Model: {}", style(&config.ollama.model).cyan());
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Index:").bold().yellow());
    eprintln!("  Collection: {}", style(&config.index.collection).cyan());
    eprintln!(
        "  Path: {}",
        style(config.vector_database_path().display()).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Chunking:").bold().yellow());
    eprintln!("  Window: {}", style(config.chunking.window).cyan());
    eprintln!("  Overlap: {}", style(config.chunking.overlap).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).cyan()
    );

    Ok(())
}

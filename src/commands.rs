use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::ProgressBar;
use tracing::warn;

use crate::chat::ChatSession;
use crate::config::{Config, get_config_dir};
use crate::database::{MySqlDatabase, Record, VectorStore};
use crate::embeddings::ollama::OllamaClient;
use crate::llm::GeminiClient;
use crate::retriever::Retriever;

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    Config::load(config_dir)
}

async fn build_retriever(config: &Config) -> Result<Retriever> {
    let ollama = OllamaClient::new(&config.ollama)?;
    let store = VectorStore::new(config)
        .await
        .context("Failed to initialize vector store")?;
    Ok(Retriever::new(ollama, store, config.chunking.clone()))
}

async fn build_llm(config: &Config) -> Result<GeminiClient> {
    let gemini_config = config.gemini.clone();
    tokio::task::spawn_blocking(move || GeminiClient::new(&gemini_config))
        .await
        .context("Client construction task failed")?
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Fetch every row from MySQL; any failure degrades to an empty set
async fn fetch_records(config: &Config) -> Vec<Record> {
    match MySqlDatabase::connect(&config.database).await {
        Ok(database) => match database.fetch_all_records().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Error fetching data from MySQL: {e:#}");
                Vec::new()
            }
        },
        Err(e) => {
            warn!("Error connecting to MySQL: {e:#}");
            Vec::new()
        }
    }
}

/// Re-run the full fetch -> chunk -> embed -> index pipeline over all tables
#[inline]
pub async fn refresh_index() -> Result<()> {
    let config = load_config()?;

    let bar = spinner("Fetching data from MySQL and indexing...");
    let records = fetch_records(&config).await;

    if records.is_empty() {
        bar.finish_and_clear();
        println!(
            "{}",
            style("No data found in MySQL or connection failed.").yellow()
        );
        return Ok(());
    }

    let mut retriever = build_retriever(&config).await?;
    let chunks = retriever
        .rebuild(&records)
        .await
        .context("Failed to rebuild index")?;

    bar.finish_and_clear();
    println!(
        "{}",
        style(format!(
            "Indexed {} records from MySQL ({} chunks).",
            records.len(),
            chunks
        ))
        .green()
    );

    Ok(())
}

/// Interactive chat loop over the indexed data
#[inline]
pub async fn run_chat() -> Result<()> {
    let config = load_config()?;
    let retriever = build_retriever(&config).await?;
    let llm = build_llm(&config).await?;

    if retriever.indexed_chunks().await? == 0 {
        println!(
            "{}",
            style("The index is empty. Run `dbchat refresh` to load data from MySQL.").yellow()
        );
    }

    println!(
        "{}",
        style("Ask me anything about your database data (type 'exit' to quit).").bold()
    );

    let mut session = ChatSession::new(retriever, llm);

    loop {
        let input: String = Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()?;
        let question = input.trim();

        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let bar = spinner("Generating answer...");
        let answer = session.ask(question).await;
        bar.finish_and_clear();

        println!("{} {}", style("assistant:").bold().cyan(), answer);
    }

    Ok(())
}

/// Show configuration summary and index/database state
#[inline]
pub async fn show_status() -> Result<()> {
    let config = load_config()?;

    println!("{}", style("dbchat status").bold().cyan());
    println!();
    println!(
        "Config file: {}",
        style(config.config_file_path().display()).cyan()
    );
    println!(
        "Vector index: {}",
        style(config.vector_database_path().display()).cyan()
    );

    match VectorStore::new(&config).await {
        Ok(store) => {
            let count = store.count_embeddings().await?;
            println!("Indexed chunks: {}", style(count).green());
        }
        Err(e) => {
            println!("Indexed chunks: {} ({e})", style("unavailable").red());
        }
    }

    match MySqlDatabase::connect(&config.database).await {
        Ok(database) => match database.list_tables().await {
            Ok(tables) => {
                println!(
                    "MySQL: {} ({} tables)",
                    style("reachable").green(),
                    tables.len()
                );
            }
            Err(e) => println!("MySQL: {} ({e:#})", style("error").red()),
        },
        Err(e) => println!("MySQL: {} ({e:#})", style("unreachable").red()),
    }

    Ok(())
}

/// Connectivity diagnostic for every external dependency.
///
/// Returns whether all checks passed so the caller can set the exit code.
#[inline]
pub async fn run_verify() -> Result<bool> {
    let config = load_config()?;

    println!("{}", style("--- Testing MySQL ---").bold());
    println!(
        "Connecting to {} as {}...",
        config.database.host, config.database.user
    );
    let mysql_ok = match MySqlDatabase::connect(&config.database).await {
        Ok(database) => match database.list_tables().await {
            Ok(tables) => {
                println!("{}", style("OK: MySQL Connection Successful").green());
                println!("Tables found: {:?}", tables);
                true
            }
            Err(e) => {
                println!("{}", style(format!("FAIL: MySQL query failed: {e:#}")).red());
                false
            }
        },
        Err(e) => {
            println!(
                "{}",
                style(format!("FAIL: MySQL Connection Failed: {e:#}")).red()
            );
            false
        }
    };

    println!();
    println!("{}", style("--- Testing Gemini API ---").bold());
    let gemini_ok = match build_llm(&config).await {
        Ok(llm) => {
            let response = tokio::task::spawn_blocking(move || {
                llm.generate_text("Say 'Gemini is ready!'")
            })
            .await
            .context("Generation task failed")?;
            match response {
                Ok(Some(text)) => {
                    println!("{}", style(format!("OK: Gemini API Response: {text}")).green());
                    true
                }
                Ok(None) => {
                    println!("{}", style("FAIL: Gemini returned an empty response").red());
                    false
                }
                Err(e) => {
                    println!("{}", style(format!("FAIL: Gemini API Failed: {e:#}")).red());
                    false
                }
            }
        }
        Err(e) => {
            println!("{}", style(format!("FAIL: {e:#}")).red());
            false
        }
    };

    println!();
    println!("{}", style("--- Testing Ollama ---").bold());
    let ollama_ok = match OllamaClient::new(&config.ollama) {
        Ok(client) => {
            let health = tokio::task::spawn_blocking(move || client.health_check())
                .await
                .context("Health check task failed")?;
            match health {
                Ok(()) => {
                    println!("{}", style("OK: Ollama server and model available").green());
                    true
                }
                Err(e) => {
                    println!("{}", style(format!("FAIL: Ollama check failed: {e:#}")).red());
                    false
                }
            }
        }
        Err(e) => {
            println!("{}", style(format!("FAIL: {e:#}")).red());
            false
        }
    };

    println!();
    println!("{}", style("--- Testing Vector Store ---").bold());
    let store_ok = match VectorStore::new(&config).await {
        Ok(_) => {
            println!(
                "{}",
                style(format!(
                    "OK: Vector store initialized at {}",
                    config.vector_database_path().display()
                ))
                .green()
            );
            true
        }
        Err(e) => {
            println!(
                "{}",
                style(format!("FAIL: Vector store initialization failed: {e}")).red()
            );
            false
        }
    };

    println!();
    let all_ok = mysql_ok && gemini_ok && ollama_ok && store_ok;
    if all_ok {
        println!("{}", style("All systems ready!").bold().green());
    } else {
        println!(
            "{}",
            style("Some systems are not ready. Please check the errors above.")
                .bold()
                .red()
        );
    }

    Ok(all_ok)
}

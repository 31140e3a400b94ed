//! BakeBuddy - CLI entry point

use anyhow::{Context, Result};
use bakebuddy::{
    cli::{Args, Commands, Verbosity},
    config::Config,
    index::{load_recipes, Bm25Encoder, HttpEmbedder, Ingestor, QdrantIndex},
    rag::Pipeline,
    repl::{ChatSession, DisplayManager},
    store::{ConversationStore, SqliteStore},
    types::{FeedbackRecord, FeedbackSignal},
};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbosity());

    if let Err(err) = run(args).await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match &args.command {
        Commands::Ask {
            question,
            model,
            json,
        } => ask(&args, &config, question, model.as_deref(), *json).await,
        Commands::Chat => chat(&args, &config).await,
        Commands::Ingest { path } => ingest(&args, &config, path).await,
        Commands::InitDb { reset } => init_db(&config, *reset),
        Commands::Feedback { id, signal } => feedback(&config, id, (*signal).into()),
        Commands::Config => show_config(&args, &config),
    }
}

fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let path = config.database_path()?;
    let store = SqliteStore::open(&path)
        .with_context(|| format!("Failed to open conversation store {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn ask(
    args: &Args,
    config: &Config,
    question: &str,
    model: Option<&str>,
    json: bool,
) -> Result<()> {
    let store = open_store(config)?;
    let pipeline = Pipeline::from_config(config)?.with_store(store);

    let mut display = if args.verbosity().show_progress() && !json {
        DisplayManager::new()
    } else {
        DisplayManager::without_progress()
    };
    display.start_spinner("Mixing ideas in the kitchen...");
    let result = pipeline.run(question, model).await;
    display.finish_spinner();
    let record = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        display.show_answer(&record);
    }
    Ok(())
}

async fn chat(args: &Args, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let pipeline = Pipeline::from_config(config)?.with_store(store.clone());

    let display = if args.verbosity().show_progress() {
        DisplayManager::new()
    } else {
        DisplayManager::without_progress()
    };
    let history = Config::home_dir()?.join("history");
    let mut session = ChatSession::with_history(display, history)?.with_store(store);
    session.run(&pipeline).await
}

async fn ingest(args: &Args, config: &Config, path: &Path) -> Result<()> {
    let recipes = load_recipes(path)
        .with_context(|| format!("Failed to load recipes from {}", path.display()))?;

    let index = Arc::new(QdrantIndex::new(&config.index)?);
    let embedder = Arc::new(HttpEmbedder::new(
        &config.embedding.base_url,
        &config.embedding.model,
        config.embedding.api_key(),
    )?);
    let ingestor = Ingestor::new(embedder, Bm25Encoder::new(), index.clone())
        .with_batch_size(config.embedding.batch_size);

    let spinner = if args.verbosity().show_progress() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        pb.set_message(format!("Indexing {} recipes...", recipes.len()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = ingestor.ingest(&recipes).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    println!(
        "{} Indexed {} recipes in {} batches ({} points in '{}')",
        "✓".green(),
        report.recipes,
        report.batches,
        report.indexed,
        index.collection()
    );
    Ok(())
}

fn init_db(config: &Config, reset: bool) -> Result<()> {
    let path = config.database_path()?;
    let store = SqliteStore::open(&path)?;
    if reset {
        store.reset()?;
    }
    println!(
        "{} Conversation store ready at {} ({} conversations)",
        "✓".green(),
        path.display(),
        store.conversation_count()?
    );
    Ok(())
}

fn feedback(config: &Config, id: &str, signal: FeedbackSignal) -> Result<()> {
    let store = open_store(config)?;
    store
        .insert_feedback(&FeedbackRecord::new(id, signal))
        .with_context(|| format!("Could not record feedback for conversation {}", id))?;
    println!("{} Feedback recorded", "✓".green());
    Ok(())
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    println!("{}", "BakeBuddy Configuration".bold().cyan());
    println!("{}", "-".repeat(60).cyan());
    println!("File:      {}", path.display());
    println!("Database:  {}", config.database_path()?.display());
    println!("Verbosity: {:?}", args.verbosity());
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

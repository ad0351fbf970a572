//! clausewise CLI: analyze legal documents and manage saved analyses.
//!
//! Usage:
//!   clausewise analyze <file> [--lang ko|en|vi] [--config path] [--db path] [--save] [--offline]
//!   clausewise list [--db path]
//!   clausewise show <id> [--db path]
//!   clausewise delete <id> [--db path]

use clap::{Parser, Subcommand};
use clausewise::{
    AnalysisCache, DocumentId, GeminiClient, LlmClient, MockLlmClient, MockTermProvider,
    MolegClient, OpenStore, OutputLanguage, Pipeline, PipelineConfig, ResultStore, SqliteStore,
    TermProvider,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(
    name = "clausewise",
    version,
    about = "Clause-level analysis of contracts and legal documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log pipeline progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a UTF-8 text file and print the result as JSON
    Analyze {
        /// Document to analyze
        file: PathBuf,
        /// Output language (ko, en, vi)
        #[arg(long, default_value = "ko")]
        lang: OutputLanguage,
        /// Configuration file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Save the result to the database
        #[arg(long)]
        save: bool,
        /// Use local mock providers instead of the network
        #[arg(long)]
        offline: bool,
    },
    /// List saved analyses
    List,
    /// Print a saved analysis as JSON
    Show {
        /// Document id
        id: String,
    },
    /// Delete a saved analysis
    Delete {
        /// Document id
        id: String,
    },
}

/// Get the default database path (~/.local/share/clausewise/clausewise.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("clausewise").join("clausewise.db")
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path)
        .map(Arc::new)
        .map_err(|e| format!("Failed to open database {}: {}", db_path.display(), e))
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Reply for offline runs: valid JSON without an analysis, so the pipeline
/// degrades to a preprocessing-only result.
const OFFLINE_REPLY: &str = "{}";

fn offline_llm() -> Arc<dyn LlmClient> {
    Arc::new(
        MockLlmClient::new()
            .with_model("offline")
            .with_default_reply(OFFLINE_REPLY),
    )
}

fn providers(config: &PipelineConfig, offline: bool) -> (Arc<dyn TermProvider>, Arc<dyn LlmClient>) {
    if offline {
        return (Arc::new(MockTermProvider::new()), offline_llm());
    }

    let terms: Arc<dyn TermProvider> = match MolegClient::from_config(&config.terms) {
        Some(client) => Arc::new(client),
        None => {
            warn!("MOLEG_API_KEY not set; term definitions will be unavailable");
            Arc::new(MockTermProvider::new())
        }
    };
    let llm: Arc<dyn LlmClient> = match GeminiClient::from_config(&config.llm) {
        Some(client) => Arc::new(client),
        None => {
            warn!("GEMINI_API_KEY not set; running without LLM analysis");
            offline_llm()
        }
    };
    (terms, llm)
}

fn cmd_analyze(
    file: &Path,
    lang: OutputLanguage,
    config_path: Option<&Path>,
    db: Option<PathBuf>,
    save: bool,
    offline: bool,
) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };
    let config = match PipelineConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let store = match open_store(db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let (terms, llm) = providers(&config, offline);
    let pipeline = match Pipeline::builder()
        .config(config)
        .term_provider(terms)
        .llm_client(llm)
        .cache(AnalysisCache::new(store.clone()))
        .build()
    {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };
    let result = match rt.block_on(pipeline.analyze(&text, lang)) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    if save {
        match store.save(&result, None) {
            Ok(id) => {
                info!(id = %id, "analysis saved");
                eprintln!("Saved as {}", id);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }
    0
}

fn cmd_list(store: &SqliteStore) -> i32 {
    match store.list() {
        Ok(documents) => {
            if documents.is_empty() {
                println!("No saved analyses");
            }
            for doc in documents {
                let risk = doc
                    .risk_score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {}  {:<8} {:>3}  {}",
                    doc.id,
                    doc.created_at.format("%Y-%m-%d %H:%M"),
                    doc.domain,
                    risk,
                    doc.title.as_deref().unwrap_or("(untitled)")
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_show(store: &SqliteStore, id: &str) -> i32 {
    match store.get(&DocumentId::from_string(id)) {
        Ok(Some(doc)) => match serde_json::to_string_pretty(&doc) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Ok(None) => {
            eprintln!("Error: analysis '{}' not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_delete(store: &SqliteStore, id: &str) -> i32 {
    match store.delete(&DocumentId::from_string(id)) {
        Ok(true) => {
            println!("Deleted analysis {}", id);
            0
        }
        Ok(false) => {
            eprintln!("Error: analysis '{}' not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn with_store(db: Option<PathBuf>, run: impl FnOnce(&SqliteStore) -> i32) -> i32 {
    match open_store(db) {
        Ok(store) => run(store.as_ref()),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Analyze {
            file,
            lang,
            config,
            save,
            offline,
        } => cmd_analyze(&file, lang, config.as_deref(), cli.db, save, offline),
        Commands::List => with_store(cli.db, cmd_list),
        Commands::Show { id } => with_store(cli.db, |store| cmd_show(store, &id)),
        Commands::Delete { id } => with_store(cli.db, |store| cmd_delete(store, &id)),
    };
    std::process::exit(code);
}

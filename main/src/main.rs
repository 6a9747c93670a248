//! CLI entry point (spec.md §6.4). Two subcommands: `ingest` drives one
//! run of the orchestrator for a document type and date range; `delete`
//! tears down tracker/vector-store state for a document type.
use std::io::{self, Write as _};

use async_openai::config::OpenAIConfig;
use async_openai::Client as OpenAiClient;
use clap::{Parser, Subcommand};
use clients::{CourtListenerClient, FederalRegisterClient, TextCache};
use common::error::AppError;
use common::storage::tracker::Tracker;
use common::storage::types::document::DocumentKind;
use common::storage::vector_store::VectorStore;
use common::utils::config::get_config;
use ingestion_pipeline::embedding::EmbeddingGenerator;
use ingestion_pipeline::llm_extractor::LlmExtractor;
use ingestion_pipeline::orchestrator::{FederalRegisterSource, Orchestrator, OrchestratorConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ingest", version, about = "Federal document ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest Supreme Court opinions.
    Scotus {
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
        #[arg(long, default_value_t = 25)]
        batch_size: usize,
        #[arg(long, default_value_t = 1)]
        workers: usize,
        #[arg(long)]
        dry_run: bool,
    },
    /// Ingest Executive Orders.
    Eo {
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
        #[arg(long, default_value_t = 25)]
        batch_size: usize,
        #[arg(long, default_value_t = 1)]
        workers: usize,
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete tracker and vector-store state.
    Delete {
        #[arg(long)]
        all: bool,
        #[arg(long)]
        scotus: bool,
        #[arg(long)]
        eo: bool,
        #[arg(long)]
        collection: Option<String>,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    if let Err(err) = run().await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = get_config().map_err(|e| AppError::Config(e.to_string()))?;

    match cli.command {
        Command::Scotus {
            start_date,
            end_date,
            batch_size,
            workers,
            dry_run,
        } => {
            let token = config.require_court_listener_token()?;
            let openai_key = config.require_openai_key()?;
            let budget = config.scotus_budget();
            budget.validate()?;

            let client = CourtListenerClient::new(token);
            let tracker = Tracker::open(DocumentKind::ScotusOpinion, &config.data_dir).await?;
            let vector_store = VectorStore::connect(&config.vector_store_url).await?;
            let openai = openai_client(openai_key, &config.openai_base_url);
            let llm_extractor = LlmExtractor::new(openai.clone(), "gpt-4o-mini");
            let embedder = EmbeddingGenerator::new(openai);

            let orchestrator = Orchestrator {
                client: &client,
                tracker: &tracker,
                vector_store: &vector_store,
                llm_extractor: &llm_extractor,
                embedder: &embedder,
                kind: DocumentKind::ScotusOpinion,
                budget,
            };
            let stats = orchestrator
                .run(
                    &start_date,
                    &end_date,
                    OrchestratorConfig {
                        batch_size,
                        worker_concurrency: workers,
                        dry_run,
                    },
                )
                .await?;
            print_summary(&stats);
        }
        Command::Eo {
            start_date,
            end_date,
            batch_size,
            workers,
            dry_run,
        } => {
            let openai_key = config.require_openai_key()?;
            let budget = config.eo_budget();
            budget.validate()?;

            let client = FederalRegisterSource {
                client: FederalRegisterClient::new(),
                cache: TextCache::new(),
            };
            let tracker = Tracker::open(DocumentKind::ExecutiveOrder, &config.data_dir).await?;
            let vector_store = VectorStore::connect(&config.vector_store_url).await?;
            let openai = openai_client(openai_key, &config.openai_base_url);
            let llm_extractor = LlmExtractor::new(openai.clone(), "gpt-4o-mini");
            let embedder = EmbeddingGenerator::new(openai);

            let orchestrator = Orchestrator {
                client: &client,
                tracker: &tracker,
                vector_store: &vector_store,
                llm_extractor: &llm_extractor,
                embedder: &embedder,
                kind: DocumentKind::ExecutiveOrder,
                budget,
            };
            let stats = orchestrator
                .run(
                    &start_date,
                    &end_date,
                    OrchestratorConfig {
                        batch_size,
                        worker_concurrency: workers,
                        dry_run,
                    },
                )
                .await?;
            print_summary(&stats);
        }
        Command::Delete {
            all,
            scotus,
            eo,
            collection,
            yes,
        } => {
            delete(
                &config.vector_store_url,
                &config.data_dir,
                all,
                scotus,
                eo,
                collection,
                yes,
            )
            .await?
        }
    }

    Ok(())
}

fn openai_client(api_key: &str, base_url: &str) -> OpenAiClient<OpenAIConfig> {
    OpenAiClient::with_config(
        OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url),
    )
}

fn print_summary(stats: &ingestion_pipeline::orchestrator::IngestionStats) {
    info!(
        processed = stats.processed,
        failed = stats.failed,
        skipped = stats.skipped,
        total = stats.total,
        elapsed_secs = stats.elapsed.as_secs_f64(),
        rate_per_minute = stats.rate_per_minute(),
        success_rate = stats.success_rate(),
        "run summary"
    );
    println!(
        "processed {}/{} (failed {}, skipped {}) in {:.1}s - {:.1}/min, {:.1}% success",
        stats.processed,
        stats.total,
        stats.failed,
        stats.skipped,
        stats.elapsed.as_secs_f64(),
        stats.rate_per_minute(),
        stats.success_rate() * 100.0,
    );
}

async fn delete(
    vector_store_url: &str,
    data_dir: &str,
    all: bool,
    scotus: bool,
    eo: bool,
    collection: Option<String>,
    yes: bool,
) -> Result<(), AppError> {
    let mut kinds = Vec::new();
    if all || scotus {
        kinds.push(DocumentKind::ScotusOpinion);
    }
    if all || eo {
        kinds.push(DocumentKind::ExecutiveOrder);
    }

    let mut collections: Vec<String> = kinds.iter().map(|k| k.vector_collection().to_string()).collect();
    if let Some(name) = collection {
        collections.push(name);
    }
    collections.sort();
    collections.dedup();

    if collections.is_empty() {
        println!("nothing selected; pass --all, --scotus, --eo, or --collection NAME");
        return Ok(());
    }

    if !yes {
        print!("delete collections {collections:?}? [y/N] ");
        io::stdout().flush().ok();
        let mut answer = String::new();
        io::stdin().read_line(&mut answer).ok();
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("aborted");
            return Ok(());
        }
    }

    // Vector delete first, then the tracker file, per spec.md §6.3: if the
    // tracker file were removed first and the collection delete failed, a
    // re-run would re-ingest documents whose vectors still exist.
    let vector_store = VectorStore::connect(vector_store_url).await?;
    for name in &collections {
        vector_store.delete_collection(name).await?;
        info!(collection = name, "deleted collection");
    }

    for kind in &kinds {
        let path = format!("{data_dir}/{}", Tracker::file_name_for(*kind));
        match std::fs::remove_file(&path) {
            Ok(()) => info!(path, "deleted tracker file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AppError::Internal(format!("removing tracker file {path}: {e}"))),
        }
    }

    Ok(())
}

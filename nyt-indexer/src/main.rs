use clap::{Parser, Subcommand};
use tracing::{error, info};

use nyt_indexer::commands::{self, IndexStatus};
use nyt_indexer::{Dependencies, IndexingError, Settings};
use nyt_indexer_shared::{init_tracing, SourceKind};

#[derive(Parser)]
#[command(name = "nyt-indexer")]
#[command(about = "Harvests the NYT developer APIs into OpenSearch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OpenSearch URL (overrides OPENSEARCH_URL)
    #[arg(long, global = true)]
    opensearch_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest the given sources once, in order
    Harvest {
        /// Sources to harvest (news-sections, news, books, movies); all by default
        #[arg(value_delimiter = ',')]
        sources: Vec<SourceKind>,

        /// Starting offset of paginated sources, ignoring saved cursors
        #[arg(long)]
        start_offset: Option<u64>,
    },
    /// Create the index of every source, skipping existing ones
    CreateIndices,
    /// Delete one index
    DeleteIndex {
        /// Index name
        name: String,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    if let Some(url) = cli.opensearch_url.clone() {
        settings.opensearch_url = url;
    }

    init_tracing(settings.log_format);

    if let Err(e) = run(cli.command, settings).await {
        error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}

async fn run(command: Commands, settings: Settings) -> Result<(), IndexingError> {
    match command {
        Commands::Harvest {
            sources,
            start_offset,
        } => {
            settings.require_api_key()?;
            let sources = if sources.is_empty() {
                SourceKind::ALL.to_vec()
            } else {
                sources
            };

            let dependencies = Dependencies::new(&settings, start_offset).await?;
            let harvester = dependencies
                .harvester
                .ok_or_else(|| IndexingError::config("NYT_API_KEY is not set"))?;

            let shutdown = async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Received shutdown signal");
            };
            let summary = commands::harvest(&harvester, &sources, settings.quota, shutdown).await?;
            for report in &summary.reports {
                info!(collection = %report.collection, outcome = %report.outcome, "Harvest report");
            }
            let state = &summary.state;
            info!(
                interrupted = summary.interrupted,
                calls_this_run = state.quota.calls_this_run,
                remaining_today = state.quota.remaining_today(),
                documents_written = state.stats.documents_written,
                documents_failed = state.stats.documents_failed,
                "Harvest complete"
            );
        }
        Commands::CreateIndices => {
            let store = Dependencies::connect_store(&settings).await?;
            let results = commands::create_indices(store.as_ref(), &SourceKind::ALL).await?;
            let created = results
                .iter()
                .filter(|(_, status)| *status == IndexStatus::Created)
                .count();
            info!(created = created, total = results.len(), "Indices provisioned");
        }
        Commands::DeleteIndex { name } => {
            let store = Dependencies::connect_store(&settings).await?;
            commands::delete_index(store.as_ref(), &name).await?;
        }
    }

    Ok(())
}
